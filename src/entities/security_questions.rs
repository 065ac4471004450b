use sea_orm::entity::prelude::*;

use crate::models::question::SecurityPrompt;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "security_questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Key of a [`SecurityPrompt`], e.g. `mother_maiden`.
    #[sea_orm(unique, column_type = "String(StringLen::N(50))")]
    pub text: String,
}

impl Model {
    #[must_use]
    pub fn prompt(&self) -> Option<SecurityPrompt> {
        SecurityPrompt::from_key(&self.text)
    }

    /// Human readable prompt, falling back to the stored key.
    #[must_use]
    pub fn display_text(&self) -> String {
        self.prompt()
            .map_or_else(|| self.text.clone(), |p| p.prompt().to_string())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::security_answers::Entity")]
    SecurityAnswers,
}

impl Related<super::security_answers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SecurityAnswers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
