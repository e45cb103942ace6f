use serde::Serialize;
use tera::{Context, Tera};

const TEMPLATE: &str = include_str!("../../templates/email.html");

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Block {
    Heading { text: String },
    List { title: String, items: Vec<String> },
}

/// Builds a small HTML email body. Every piece of text is escaped.
#[derive(Default)]
pub struct EmailContent {
    blocks: Vec<Block>,
}

impl EmailContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_heading(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Heading { text: text.into() });
        self
    }

    pub fn add_unordered_list<I, S>(mut self, title: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocks.push(Block::List {
            title: title.into(),
            items: items.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn build(&self) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("blocks", &self.blocks);
        Tera::one_off(TEMPLATE, &context, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(html: &str, needle: &str) -> usize {
        html.find(needle).unwrap_or_else(|| panic!("{needle} missing from {html}"))
    }

    #[test]
    fn test_blocks_render_in_order() {
        let html = EmailContent::new()
            .add_heading("Hello")
            .add_unordered_list("Details", ["one", "two"])
            .add_heading("Bye")
            .build()
            .unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        let positions: Vec<usize> = ["<h2>Hello</h2>", "<p>Details</p>", "<li>one</li>", "<li>two</li>", "</ul>", "<h2>Bye</h2>", "</body>"]
            .iter()
            .map(|needle| position(&html, needle))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "{html}");
    }

    #[test]
    fn test_text_is_escaped() {
        let html = EmailContent::new().add_heading("<b>Tom & Jerry</b>").build().unwrap();
        assert!(html.contains("&lt;b&gt;Tom &amp; Jerry&lt;&#x2F;b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_empty_content_is_a_bare_page() {
        let html = EmailContent::new().build().unwrap();
        assert!(!html.contains("<h2>"));
        assert!(html.trim_end().ends_with("</html>"));
    }
}
