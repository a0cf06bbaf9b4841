use etymo_core::{OutboundAction, UserId};
use thiserror::Error;

use crate::api::{InlineKeyboardMarkup, ParseMode, SendMessage};

pub const SAVE_CALLBACK_DATA: &str = "save";
pub const SAVE_BUTTON_TEXT: &str = "💾 Save";
pub const ERROR_PREFIX: &str = "❌";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("user id `{0}` is not a telegram chat id")]
    InvalidChatId(String),
}

pub fn render(action: &OutboundAction) -> Result<SendMessage, RenderError> {
    let chat_id = chat_id(action.user_id())?;

    let message = match action {
        OutboundAction::ShowExplanationWithSaveButton { word, explanation, .. } => SendMessage {
            chat_id,
            text: format!("<b>{}</b>\n\n{}", escape_html(word), escape_html(explanation)),
            parse_mode: Some(ParseMode::Html),
            reply_markup: Some(InlineKeyboardMarkup::single_button(
                SAVE_BUTTON_TEXT,
                SAVE_CALLBACK_DATA,
            )),
        },
        OutboundAction::Confirm { message, .. } => SendMessage {
            chat_id,
            text: escape_html(message),
            parse_mode: Some(ParseMode::Html),
            reply_markup: None,
        },
        OutboundAction::ReportError { message, .. } => SendMessage {
            chat_id,
            text: format!("{ERROR_PREFIX} {}", escape_html(message)),
            parse_mode: Some(ParseMode::Html),
            reply_markup: None,
        },
    };
    Ok(message)
}

fn chat_id(user_id: &UserId) -> Result<i64, RenderError> {
    user_id.as_str().parse().map_err(|_| RenderError::InvalidChatId(user_id.to_string()))
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use etymo_core::{OutboundAction, UserId};

    use super::{escape_html, render, RenderError, SAVE_CALLBACK_DATA};
    use crate::api::ParseMode;

    #[test]
    fn explanation_gets_exactly_one_save_button() {
        let message = render(&OutboundAction::ShowExplanationWithSaveButton {
            user_id: UserId::from("42"),
            word: "מכין".to_owned(),
            explanation: "participle of To prepare".to_owned(),
        })
        .expect("renders");

        assert_eq!(message.chat_id, 42);
        assert_eq!(message.text, "<b>מכין</b>\n\nparticiple of To prepare");
        assert_eq!(message.parse_mode, Some(ParseMode::Html));

        let markup = message.reply_markup.expect("keyboard attached");
        let buttons: Vec<_> = markup.buttons().collect();
        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].callback_data, SAVE_CALLBACK_DATA);
    }

    #[test]
    fn explanation_text_is_escaped() {
        let message = render(&OutboundAction::ShowExplanationWithSaveButton {
            user_id: UserId::from("42"),
            word: "<i>".to_owned(),
            explanation: "a < b & c > d".to_owned(),
        })
        .expect("renders");

        assert_eq!(message.text, "<b>&lt;i&gt;</b>\n\na &lt; b &amp; c &gt; d");
    }

    #[test]
    fn errors_are_prefixed_and_have_no_keyboard() {
        let message = render(&OutboundAction::report_error(UserId::from("-1001"), "nothing to save"))
            .expect("renders");

        assert_eq!(message.chat_id, -1001);
        assert_eq!(message.text, "❌ nothing to save");
        assert!(message.reply_markup.is_none());
    }

    #[test]
    fn confirmations_are_plain() {
        let message =
            render(&OutboundAction::confirm(UserId::from("42"), "saved")).expect("renders");

        assert_eq!(message.text, "saved");
        assert!(message.reply_markup.is_none());
    }

    #[test]
    fn non_numeric_user_id_is_rejected() {
        let error = render(&OutboundAction::confirm(UserId::from("u1"), "saved"))
            .expect_err("not a chat id");
        assert_eq!(error, RenderError::InvalidChatId("u1".to_owned()));
    }

    #[test]
    fn escape_leaves_hebrew_and_quotes_alone() {
        assert_eq!(escape_html("\"כון\" 'x'"), "\"כון\" 'x'");
    }
}
