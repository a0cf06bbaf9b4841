use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use etymo_core::{ExplanationProvider, InteractionCore, ProviderError};
use etymo_sheets::InMemoryRowStore;
use etymo_telegram::api::{
    AnswerCallbackQuery, CallbackQuery, Chat, GetUpdates, Message, SendChatAction, SendMessage,
    Update, User,
};
use etymo_telegram::{BotApi, LongPollRunner, ReconnectPolicy, TelegramApiError};
use tokio::sync::{watch, Mutex};

struct FixedProvider;

#[async_trait]
impl ExplanationProvider for FixedProvider {
    async fn generate(&self, word: &str) -> Result<String, ProviderError> {
        match word {
            "מכין" => Ok("participle of To prepare".to_owned()),
            _ => Err(ProviderError::network("timed out")),
        }
    }
}

struct ScriptedBot {
    batches: Mutex<VecDeque<Vec<Update>>>,
    sent: Mutex<Vec<SendMessage>>,
    shutdown: watch::Sender<bool>,
    reject_keyboards: bool,
}

#[async_trait]
impl BotApi for ScriptedBot {
    async fn get_updates(&self, _request: &GetUpdates) -> Result<Vec<Update>, TelegramApiError> {
        match self.batches.lock().await.pop_front() {
            Some(batch) => Ok(batch),
            None => {
                let _ = self.shutdown.send(true);
                Ok(Vec::new())
            }
        }
    }

    async fn send_message(&self, message: &SendMessage) -> Result<(), TelegramApiError> {
        self.sent.lock().await.push(message.clone());
        if self.reject_keyboards && message.reply_markup.is_some() {
            return Err(TelegramApiError::Api {
                code: 400,
                description: "Bad Request: message is too long".to_owned(),
            });
        }
        Ok(())
    }

    async fn answer_callback_query(
        &self,
        _answer: &AnswerCallbackQuery,
    ) -> Result<(), TelegramApiError> {
        Ok(())
    }

    async fn send_chat_action(&self, _action: &SendChatAction) -> Result<(), TelegramApiError> {
        Ok(())
    }
}

fn chat(id: i64) -> Chat {
    Chat { id, kind: "private".to_owned() }
}

fn word(update_id: i64, chat_id: i64, text: &str) -> Update {
    Update {
        update_id,
        message: Some(Message {
            message_id: update_id,
            chat: chat(chat_id),
            from: None,
            text: Some(text.to_owned()),
        }),
        callback_query: None,
    }
}

fn save_tap(update_id: i64, chat_id: i64) -> Update {
    Update {
        update_id,
        message: None,
        callback_query: Some(CallbackQuery {
            id: format!("cb-{update_id}"),
            from: User { id: chat_id, is_bot: false, first_name: "Dana".to_owned(), username: None },
            message: Some(Message { message_id: 1, chat: chat(chat_id), from: None, text: None }),
            data: Some("save".to_owned()),
        }),
    }
}

fn sticker(update_id: i64, chat_id: i64) -> Update {
    Update {
        update_id,
        message: Some(Message { message_id: update_id, chat: chat(chat_id), from: None, text: None }),
        callback_query: None,
    }
}

async fn run_script(batches: Vec<Vec<Update>>) -> (Vec<SendMessage>, Arc<InMemoryRowStore>) {
    run_bot(batches, false).await
}

async fn run_bot(
    batches: Vec<Vec<Update>>,
    reject_keyboards: bool,
) -> (Vec<SendMessage>, Arc<InMemoryRowStore>) {
    let (shutdown, receiver) = watch::channel(false);
    let bot = Arc::new(ScriptedBot {
        batches: Mutex::new(batches.into()),
        sent: Mutex::new(Vec::new()),
        shutdown,
        reject_keyboards,
    });
    let store = Arc::new(InMemoryRowStore::default());
    let core = Arc::new(InteractionCore::new(FixedProvider, store.clone()));

    let runner = LongPollRunner::new(
        bot.clone(),
        core,
        ReconnectPolicy { max_retries: 0, base_delay_ms: 0, max_delay_ms: 0 },
        1,
    );
    runner.run(receiver).await.expect("runner stops cleanly");

    let sent = bot.sent.lock().await.clone();
    (sent, store)
}

#[tokio::test]
async fn word_then_save_appends_the_shown_explanation() {
    let (sent, store) =
        run_script(vec![vec![word(1, 42, "מכין")], vec![save_tap(2, 42)]]).await;

    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].text, "<b>מכין</b>\n\nparticiple of To prepare");
    assert!(sent[0].reply_markup.is_some());
    assert_eq!(sent[1].text, "saved");

    let rows = store.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].word, "מכין");
    assert_eq!(rows[0].explanation, "participle of To prepare");
    assert!(rows[0].timestamp.is_some());
}

#[tokio::test]
async fn save_without_pending_word_reports_error_and_writes_nothing() {
    let (sent, store) = run_script(vec![vec![save_tap(1, 42)]]).await;

    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, "❌ nothing to save");
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn users_keep_independent_pending_words() {
    let (sent, store) = run_script(vec![
        vec![word(1, 1, "מכין"), word(2, 2, "מכין")],
        vec![save_tap(3, 2), save_tap(4, 1), save_tap(5, 1)],
    ])
    .await;

    assert_eq!(sent.len(), 5);
    assert_eq!(sent[4].chat_id, 1);
    assert_eq!(sent[4].text, "❌ nothing to save");
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn provider_failure_is_reported_once() {
    let (sent, store) = run_script(vec![vec![word(1, 9, "שלום")]]).await;

    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.starts_with("❌ could not reach the explanation service"));
    assert!(sent[0].reply_markup.is_none());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn unsupported_messages_are_each_answered_once() {
    let (sent, store) =
        run_script(vec![vec![word(1, 7, "/help"), word(2, 7, "/מכין"), sticker(3, 7)]]).await;

    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|message| message.chat_id == 7 && message.text.starts_with("❌ ")));
    assert!(sent[0].text.contains("/start"));
    assert_eq!(sent[2].text, "❌ please send a word as text");
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn undelivered_explanation_cannot_be_saved() {
    let (sent, store) =
        run_bot(vec![vec![word(1, 5, "מכין")], vec![save_tap(2, 5)]], true).await;

    assert_eq!(sent.len(), 3);
    assert!(sent[0].reply_markup.is_some());
    assert!(sent[1].text.starts_with("❌ the explanation could not be displayed"));
    assert_eq!(sent[2].text, "❌ nothing to save");
    assert!(store.is_empty().await);
}
