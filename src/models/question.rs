use serde::{Deserialize, Serialize};

/// The closed set of recovery prompts a user can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityPrompt {
    MotherMaiden,
    FirstPet,
    FavoriteColor,
}

impl SecurityPrompt {
    pub const ALL: [Self; 3] = [Self::MotherMaiden, Self::FirstPet, Self::FavoriteColor];

    /// Key stored in `security_questions.text`.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::MotherMaiden => "mother_maiden",
            Self::FirstPet => "first_pet",
            Self::FavoriteColor => "favorite_color",
        }
    }

    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::MotherMaiden => "What is your mother's maiden name?",
            Self::FirstPet => "What was the name of your first pet?",
            Self::FavoriteColor => "What is your favorite color?",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

impl std::fmt::Display for SecurityPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prompt())
    }
}

/// A stored question as shown in the recovery forms.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: i32,
    pub key: String,
    pub text: String,
}

impl From<crate::entities::security_questions::Model> for QuestionView {
    fn from(model: crate::entities::security_questions::Model) -> Self {
        Self {
            id: model.id,
            text: model.display_text(),
            key: model.text,
        }
    }
}

/// A user's saved answer, used to pre-select the form.
#[derive(Debug, Clone, Serialize)]
pub struct PriorAnswer {
    pub question_id: Option<i32>,
    pub saved_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_round_trip() {
        for prompt in SecurityPrompt::ALL {
            assert_eq!(SecurityPrompt::from_key(prompt.key()), Some(prompt));
        }
        assert_eq!(SecurityPrompt::from_key("shoe_size"), None);
    }

    #[test]
    fn test_prompt_text() {
        assert_eq!(
            SecurityPrompt::FirstPet.to_string(),
            "What was the name of your first pet?"
        );
    }
}
