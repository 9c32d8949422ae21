//! HTML markup for message bubbles and the page shell.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::config::{Labels, WidgetConfig};
use crate::widget::{Message, MessageMeta, Sender};

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Footer text, e.g. `Catégorie: GENERAL | Niveau de confiance: 87%`.
pub fn meta_line(meta: &MessageMeta, labels: &Labels) -> String {
    format!(
        "{}: {} | {}: {}",
        labels.category,
        meta.category_display(),
        labels.confidence,
        meta.confidence_display()
    )
}

/// Markup for one message bubble.
///
/// User bubbles put the icon on the right, bot bubbles on the left. Only bot
/// bubbles carry the category/confidence footer.
pub fn message_html(message: &Message, labels: &Labels) -> String {
    let text = escape_html(&message.text);
    let time = escape_html(&message.timestamp);

    match message.sender {
        Sender::User => format!(
            r#"<div class="message user-message">
    <div class="d-flex align-items-start gap-3">
        <div class="flex-grow-1">
            <div class="message-container">
                <div class="message-content">{text}</div>
                <div class="message-time">{time}</div>
            </div>
        </div>
        <div class="user-icon-message"><i class="fas fa-user"></i></div>
    </div>
</div>"#
        ),
        Sender::Bot => {
            let footer = message.meta.as_ref().map_or_else(String::new, |meta| {
                format!(
                    "\n                <div class=\"message-meta\">{}</div>",
                    escape_html(&meta_line(meta, labels))
                )
            });
            format!(
                r#"<div class="message bot-message">
    <div class="d-flex align-items-start gap-3">
        <div class="bot-icon-message"><i class="fas fa-robot"></i></div>
        <div class="flex-grow-1">
            <div class="message-container">
                <div class="message-content">{text}</div>
                <div class="message-time">{time}</div>{footer}
            </div>
        </div>
    </div>
</div>"#
            )
        }
    }
}

/// Full HTML page carrying the widget's element ids.
pub fn page_shell(config: &WidgetConfig, suggestions: &[&str]) -> String {
    let ids = &config.elements;
    let list = escape_html(&ids.message_list);
    let input = escape_html(&ids.input);
    let send = escape_html(&ids.send_button);
    let typing = escape_html(&ids.typing_indicator);
    let suggestion_class = escape_html(&ids.suggestion_class);

    let mut buttons = String::new();
    for label in suggestions {
        let _ = write!(
            buttons,
            "\n            <button type=\"button\" class=\"btn btn-outline-primary btn-sm {suggestion_class}\">{}</button>",
            escape_html(label)
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Assistant bancaire</title>
</head>
<body>
    <div class="chat-shell">
        <div id="{list}" class="chat-messages"></div>
        <div id="{typing}" class="typing-indicator" style="display: none;">
            <span></span><span></span><span></span>
        </div>
        <div class="suggestions">{buttons}
        </div>
        <div class="chat-input d-flex gap-2">
            <input id="{input}" type="text" class="form-control" placeholder="Tapez votre question..." autocomplete="off">
            <button id="{send}" type="button" class="btn btn-primary"><i class="fas fa-paper-plane"></i></button>
        </div>
    </div>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Labels {
        Labels::default()
    }

    #[test]
    fn test_escape_passthrough_borrows() {
        assert!(matches!(escape_html("plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_special_chars() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_user_bubble_icon_on_the_right() {
        let html = message_html(&Message::user("Hello", "10:42"), &labels());
        assert!(html.contains("user-message"));
        assert!(html.contains(r#"<div class="message-content">Hello</div>"#));
        assert!(html.contains(r#"<div class="message-time">10:42</div>"#));
        let content = html.find("message-content").unwrap();
        let icon = html.find("user-icon-message").unwrap();
        assert!(icon > content);
        assert!(!html.contains("message-meta"));
    }

    #[test]
    fn test_bot_bubble_icon_on_the_left_with_footer() {
        let meta = MessageMeta::from_parts(Some("general".into()), Some(0.87));
        let html = message_html(&Message::bot("Hi", "10:42", meta), &labels());
        let icon = html.find("bot-icon-message").unwrap();
        let content = html.find("message-content").unwrap();
        assert!(icon < content);
        assert!(html.contains("Catégorie: GENERAL | Niveau de confiance: 87%"));
    }

    #[test]
    fn test_bot_bubble_without_meta_has_no_footer() {
        let html = message_html(&Message::bot("Salut", "08:00", None), &labels());
        assert!(html.contains("bot-message"));
        assert!(!html.contains("message-meta"));
    }

    #[test]
    fn test_message_text_is_escaped() {
        let html = message_html(&Message::user("<b>gras</b>", "08:00"), &labels());
        assert!(html.contains("&lt;b&gt;gras&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_page_shell_carries_contract_ids() {
        let config = WidgetConfig::default();
        let html = page_shell(&config, &["Mon solde", "Carte perdue"]);
        assert!(html.contains(r#"id="chatMessages""#));
        assert!(html.contains(r#"id="userInput""#));
        assert!(html.contains(r#"id="sendButton""#));
        assert!(html.contains(r#"id="typingIndicator""#));
        assert_eq!(html.matches("suggestion-btn").count(), 2);
        assert!(html.contains(">Carte perdue</button>"));
    }
}
