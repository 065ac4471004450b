//! Tera templates compiled into the binary.

use anyhow::Context as _;
use axum::response::Html;
use rust_embed::RustEmbed;
use tera::{Context, Tera};
use tower_sessions::Session;

use super::{WebError, csrf, flash};
use crate::db::User;

#[derive(RustEmbed)]
#[folder = "templates/"]
struct TemplateAssets;

pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn load() -> anyhow::Result<Self> {
        let mut raw = Vec::new();
        for name in TemplateAssets::iter() {
            let file = TemplateAssets::get(&name)
                .with_context(|| format!("Embedded template vanished: {name}"))?;
            let body = String::from_utf8(file.data.into_owned())
                .with_context(|| format!("Template is not UTF-8: {name}"))?;
            raw.push((name.to_string(), body));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(raw)
            .context("Failed to compile templates")?;

        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<Html<String>, WebError> {
        Ok(Html(self.tera.render(name, context)?))
    }
}

/// Context every page extends: pending flash messages, the CSRF token and
/// the signed-in user.
pub async fn base_context(session: &Session, user: Option<&User>) -> Result<Context, WebError> {
    let mut context = Context::new();
    context.insert("messages", &flash::take(session).await?);
    context.insert("csrf_token", &csrf::token(session).await?);
    context.insert("user", &user);
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_compile() {
        let templates = Templates::load().unwrap();
        for name in [
            "index.html",
            "appointments.html",
            "question.html",
            "forgot.html",
            "changepswd.html",
            "login.html",
            "admin.html",
        ] {
            assert!(
                templates.tera.get_template_names().any(|n| n == name),
                "missing template {name}"
            );
        }
    }

    #[test]
    fn test_note_is_escaped() {
        let templates = Templates::load().unwrap();
        let mut context = Context::new();
        context.insert("messages", &Vec::<flash::FlashMessage>::new());
        context.insert("csrf_token", "t");
        context.insert("user", &Option::<User>::None);
        context.insert(
            "appointments",
            &vec![crate::models::appointment::AppointmentView {
                id: 1,
                start_date: "2030-01-01 10:00 UTC".to_string(),
                book_date: String::new(),
                note: "<script>alert(1)</script>".to_string(),
                owner: Some("alice".to_string()),
                open: false,
                summary: "ID 1".to_string(),
            }],
        );

        let html = templates.render("appointments.html", &context).unwrap().0;
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
