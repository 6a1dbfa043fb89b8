//! Lightweight Markdown-to-HTML rendering for chat messages.
//!
//! Not a CommonMark implementation: nested emphasis, escaped asterisks and
//! mixed list types are rendered on a best-effort basis.

pub mod passes;

use crate::chat::{Conversation, Role};
pub use passes::{Concern, Pass, PASSES};

/// Render message text to HTML. Pure and deterministic.
pub fn render(text: &str) -> String {
    PASSES.iter().fold(text.to_string(), |acc, pass| {
        let out = (pass.apply)(&acc);
        if out != acc {
            tracing::trace!("markdown pass {} rewrote {} bytes", pass.name, acc.len());
        }
        out
    })
}

/// Render only the passes of one concern, in pipeline order. Useful when
/// auditing how a single kind of syntax is handled.
pub fn render_concern(text: &str, concern: Concern) -> String {
    PASSES
        .iter()
        .filter(|p| p.concern == concern)
        .fold(text.to_string(), |acc, pass| (pass.apply)(&acc))
}

/// A standalone HTML transcript of a conversation.
pub fn render_document(conversation: &Conversation, assistant_name: &str) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>{}</title>\n",
        passes::escape_html(&conversation.title)
    ));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!(
        "<h1>{}</h1>\n",
        passes::escape_html(&conversation.title)
    ));

    for msg in &conversation.messages {
        // Pending placeholders have nothing to show yet.
        if msg.is_placeholder() {
            continue;
        }
        let (class, author) = match msg.role {
            Role::User => ("user", "You"),
            Role::Assistant => ("assistant", assistant_name),
        };
        html.push_str(&format!(
            "<section class=\"message {class}\">\n<header>{}</header>\n<div class=\"chat-markdown\">{}</div>\n</section>\n",
            passes::escape_html(author),
            render(&msg.content)
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}
