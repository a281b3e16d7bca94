//! User-facing messages
//!
//! A `Message` is what a caller shows after an operation: a kind and a short
//! text. Rendering produces a dismissible Bootstrap alert with the text escaped.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Success,
    Error,
    Alert,
    Notify,
}

impl MessageKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            MessageKind::Success => "alert alert-success",
            MessageKind::Error => "alert alert-danger",
            MessageKind::Alert => "alert alert-warning",
            MessageKind::Notify => "container alert alert-primary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    kind: MessageKind,
    text: String,
}

impl Message {
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, text)
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Alert, text)
    }

    pub fn notify(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Notify, text)
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn render(&self) -> String {
        let button = r#"<div class="col-auto"><button type="button" class="btn-close" data-bs-dismiss="alert" aria-label="Close"></button></div>"#;

        format!(
            "<div class='{}'><div class='row d-flex justify-content-between align-items-center'><div class='col'>{}</div> {}</div></div>",
            self.kind.css_class(),
            escape_html(&self.text),
            button
        )
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Escape text for use inside HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_uses_kind_class() {
        let html = Message::success("Corretor salvo").render();
        assert!(html.starts_with("<div class='alert alert-success'>"));
        assert!(html.contains("Corretor salvo"));
        assert!(html.contains("btn-close"));

        assert!(Message::notify("x").render().contains("container alert alert-primary"));
        assert_eq!(Message::alert("x").kind().css_class(), "alert alert-warning");
    }

    #[test]
    fn render_escapes_text() {
        let html = Message::error("<script>alert('x')</script>").to_string();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }
}
