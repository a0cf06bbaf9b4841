use etymo_core::{InboundEvent, OutboundAction, UserId};

use crate::api::Update;
use crate::render::SAVE_CALLBACK_DATA;

pub const UNKNOWN_COMMAND_MESSAGE: &str =
    "unknown command: send a single word, /start for help or /cancel to drop the pending word";
pub const NON_TEXT_MESSAGE: &str = "please send a word as text";

/// What the poller needs to know about one update before dispatching it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifiedUpdate {
    pub update_id: i64,
    pub chat_id: Option<i64>,
    pub callback_query_id: Option<String>,
    pub event: Option<InboundEvent>,
    /// Direct answer for a user message that never reaches the interaction core.
    pub reply: Option<OutboundAction>,
    pub ignored_reason: Option<&'static str>,
}

impl ClassifiedUpdate {
    fn dispatch(update_id: i64, chat_id: i64, event: InboundEvent) -> Self {
        Self {
            update_id,
            chat_id: Some(chat_id),
            callback_query_id: None,
            event: Some(event),
            reply: None,
            ignored_reason: None,
        }
    }

    fn ignore(update_id: i64, chat_id: Option<i64>, reason: &'static str) -> Self {
        Self {
            update_id,
            chat_id,
            callback_query_id: None,
            event: None,
            reply: None,
            ignored_reason: Some(reason),
        }
    }

    fn reject(update_id: i64, chat_id: i64, reason: &'static str, message: &str) -> Self {
        let reply = OutboundAction::report_error(UserId::from(chat_id), message);
        Self { reply: Some(reply), ..Self::ignore(update_id, Some(chat_id), reason) }
    }

    fn with_callback(mut self, callback_query_id: &str) -> Self {
        self.callback_query_id = Some(callback_query_id.to_owned());
        self
    }

    pub fn kind(&self) -> &'static str {
        match (&self.event, &self.callback_query_id, &self.reply) {
            (Some(_), Some(_), _) => "callback",
            (Some(_), None, _) => "message",
            (None, _, Some(_)) => "rejected",
            (None, _, None) => "ignored",
        }
    }
}

pub fn classify(update: &Update) -> ClassifiedUpdate {
    if let Some(message) = &update.message {
        let chat_id = message.chat.id;
        let Some(text) = message.text.as_deref() else {
            return ClassifiedUpdate::reject(
                update.update_id,
                chat_id,
                "non_text_message",
                NON_TEXT_MESSAGE,
            );
        };

        let user_id = UserId::from(chat_id);
        let event = match command(text) {
            Some("start") => InboundEvent::StartRequested { user_id },
            Some("cancel") => InboundEvent::DismissRequested { user_id },
            Some(_) => {
                return ClassifiedUpdate::reject(
                    update.update_id,
                    chat_id,
                    "unknown_command",
                    UNKNOWN_COMMAND_MESSAGE,
                )
            }
            None => InboundEvent::WordSubmitted { user_id, text: text.to_owned() },
        };
        return ClassifiedUpdate::dispatch(update.update_id, chat_id, event);
    }

    if let Some(callback) = &update.callback_query {
        let chat_id = callback.message.as_ref().map(|message| message.chat.id);
        let classified = match (chat_id, callback.data.as_deref()) {
            (Some(chat_id), Some(SAVE_CALLBACK_DATA)) => ClassifiedUpdate::dispatch(
                update.update_id,
                chat_id,
                InboundEvent::SaveRequested { user_id: UserId::from(chat_id) },
            ),
            (None, _) => ClassifiedUpdate::ignore(update.update_id, None, "callback_without_message"),
            (Some(chat_id), _) => {
                ClassifiedUpdate::ignore(update.update_id, Some(chat_id), "unknown_callback_data")
            }
        };
        return classified.with_callback(&callback.id);
    }

    ClassifiedUpdate::ignore(update.update_id, None, "unsupported_update")
}

/// Command name for `/name` or `/name@botname`, `None` for ordinary text.
fn command(text: &str) -> Option<&str> {
    let first = text.trim().split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split_once('@').map_or(name, |(name, _)| name);
    Some(name)
}

#[cfg(test)]
mod tests {
    use etymo_core::{InboundEvent, OutboundAction, UserId};

    use super::{classify, command, NON_TEXT_MESSAGE, UNKNOWN_COMMAND_MESSAGE};
    use crate::api::{CallbackQuery, Chat, Message, Update, User};

    fn text_update(update_id: i64, chat_id: i64, text: Option<&str>) -> Update {
        Update {
            update_id,
            message: Some(Message {
                message_id: 1,
                chat: Chat { id: chat_id, kind: "private".to_owned() },
                from: None,
                text: text.map(str::to_owned),
            }),
            callback_query: None,
        }
    }

    fn callback_update(update_id: i64, chat_id: Option<i64>, data: &str) -> Update {
        Update {
            update_id,
            message: None,
            callback_query: Some(CallbackQuery {
                id: format!("cb-{update_id}"),
                from: User { id: 5, is_bot: false, first_name: "Dana".to_owned(), username: None },
                message: chat_id.map(|id| Message {
                    message_id: 2,
                    chat: Chat { id, kind: "private".to_owned() },
                    from: None,
                    text: None,
                }),
                data: Some(data.to_owned()),
            }),
        }
    }

    #[test]
    fn plain_text_becomes_word_submission() {
        let classified = classify(&text_update(10, 42, Some("מכין")));

        assert_eq!(
            classified.event,
            Some(InboundEvent::WordSubmitted { user_id: UserId::from("42"), text: "מכין".into() })
        );
        assert_eq!(classified.chat_id, Some(42));
        assert_eq!(classified.kind(), "message");
    }

    #[test]
    fn start_and_cancel_commands_map_to_events() {
        assert_eq!(
            classify(&text_update(1, 42, Some("/start"))).event,
            Some(InboundEvent::StartRequested { user_id: UserId::from("42") })
        );
        assert_eq!(
            classify(&text_update(2, 42, Some("/start@etymo_bot"))).event,
            Some(InboundEvent::StartRequested { user_id: UserId::from("42") })
        );
        assert_eq!(
            classify(&text_update(3, 42, Some("/cancel"))).event,
            Some(InboundEvent::DismissRequested { user_id: UserId::from("42") })
        );
    }

    #[test]
    fn unknown_commands_and_non_text_get_a_direct_reply() {
        for (update_id, body) in [(4, "/help"), (5, "/מכין"), (6, "/help@etymo_bot now")] {
            let unknown = classify(&text_update(update_id, 42, Some(body)));
            assert_eq!(unknown.event, None);
            assert_eq!(unknown.ignored_reason, Some("unknown_command"));
            assert_eq!(unknown.kind(), "rejected");
            assert_eq!(
                unknown.reply,
                Some(OutboundAction::report_error(UserId::from("42"), UNKNOWN_COMMAND_MESSAGE))
            );
        }

        let sticker = classify(&text_update(7, 42, None));
        assert_eq!(sticker.event, None);
        assert_eq!(sticker.ignored_reason, Some("non_text_message"));
        assert_eq!(
            sticker.reply,
            Some(OutboundAction::report_error(UserId::from("42"), NON_TEXT_MESSAGE))
        );
    }

    #[test]
    fn updates_without_a_user_message_get_no_reply() {
        assert_eq!(classify(&callback_update(8, Some(42), "save:3")).reply, None);
        assert_eq!(classify(&callback_update(9, None, "save")).reply, None);
    }

    #[test]
    fn save_callback_becomes_save_request() {
        let classified = classify(&callback_update(6, Some(42), "save"));

        assert_eq!(
            classified.event,
            Some(InboundEvent::SaveRequested { user_id: UserId::from("42") })
        );
        assert_eq!(classified.callback_query_id.as_deref(), Some("cb-6"));
        assert_eq!(classified.kind(), "callback");
    }

    #[test]
    fn other_callback_data_is_ignored_but_still_answerable() {
        let classified = classify(&callback_update(7, Some(42), "save:3"));

        assert_eq!(classified.event, None);
        assert_eq!(classified.callback_query_id.as_deref(), Some("cb-7"));
        assert_eq!(classified.ignored_reason, Some("unknown_callback_data"));

        let orphan = classify(&callback_update(8, None, "save"));
        assert_eq!(orphan.event, None);
        assert_eq!(orphan.callback_query_id.as_deref(), Some("cb-8"));
    }

    #[test]
    fn empty_update_is_unsupported() {
        let update = Update { update_id: 9, message: None, callback_query: None };
        assert_eq!(classify(&update).ignored_reason, Some("unsupported_update"));
    }

    #[test]
    fn command_parsing() {
        assert_eq!(command("/start"), Some("start"));
        assert_eq!(command("  /cancel now"), Some("cancel"));
        assert_eq!(command("/start@bot"), Some("start"));
        assert_eq!(command("שלום"), None);
        assert_eq!(command(""), None);
    }
}
