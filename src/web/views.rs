use axum::response::Html;
use rust_embed::RustEmbed;
use tera::{Context, Tera};

use crate::web::error::AppError;

#[derive(RustEmbed)]
#[folder = "templates/"]
struct Templates;

/// Server-rendered pages, compiled once from the embedded templates.
pub struct Views {
    tera: Tera,
}

impl Views {
    pub fn load() -> Result<Self, tera::Error> {
        let mut sources = Vec::new();
        for name in Templates::iter() {
            let Some(file) = Templates::get(&name) else {
                continue;
            };
            let source = String::from_utf8(file.data.into_owned())
                .map_err(|e| tera::Error::msg(format!("template {name} is not UTF-8: {e}")))?;
            sources.push((name.to_string(), source));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(sources)?;
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<Html<String>, AppError> {
        Ok(Html(self.tera.render(name, context)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_compile() {
        let views = Views::load().unwrap();
        let mut names: Vec<&str> = views.tera.get_template_names().collect();
        names.sort();
        assert!(names.contains(&"base.html"));
        assert!(names.contains(&"pricing.html"));
        assert!(names.contains(&"panel.html"));
    }

    #[test]
    fn test_error_page_renders() {
        let views = Views::load().unwrap();
        let mut context = Context::new();
        context.insert("user", &Option::<String>::None);
        context.insert("message", "Nothing to see here.");
        let Html(body) = views.render("error.html", &context).unwrap();
        assert!(body.contains("Nothing to see here."));
    }
}
