use std::{sync::Arc, time::Duration};

use etymo_core::config::TelegramConfig;
use etymo_core::{InboundEvent, InteractionHandler, OutboundAction, UserId};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{AnswerCallbackQuery, ChatAction, GetUpdates, SendChatAction, Update};
use crate::client::{BotApi, TelegramApiError};
use crate::events::{classify, ClassifiedUpdate};
use crate::render::render;

const CALLBACK_ACCEPTED: &str = "✔️";
const CALLBACK_REJECTED: &str = "❌";
pub const UNDELIVERED_EXPLANATION_MESSAGE: &str =
    "the explanation could not be displayed (it may be too long), please send another word";

#[derive(Debug, Error)]
pub enum PollError {
    #[error("bot token rejected by telegram")]
    Unauthorized,
    #[error("polling gave up after {attempts} consecutive failures: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: TelegramApiError },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 8, base_delay_ms: 500, max_delay_ms: 30_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Pulls updates with `getUpdates` and feeds them to the interaction handler one at a time.
pub struct LongPollRunner {
    api: Arc<dyn BotApi>,
    handler: Arc<dyn InteractionHandler>,
    reconnect_policy: ReconnectPolicy,
    poll_timeout_secs: u64,
}

impl LongPollRunner {
    pub fn new(
        api: Arc<dyn BotApi>,
        handler: Arc<dyn InteractionHandler>,
        reconnect_policy: ReconnectPolicy,
        poll_timeout_secs: u64,
    ) -> Self {
        Self { api, handler, reconnect_policy, poll_timeout_secs }
    }

    pub fn from_config(
        api: Arc<dyn BotApi>,
        handler: Arc<dyn InteractionHandler>,
        config: &TelegramConfig,
    ) -> Self {
        Self::new(api, handler, ReconnectPolicy::default(), config.poll_timeout_secs)
    }

    /// Runs until `shutdown` flips to `true` or polling fails for good.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), PollError> {
        let mut offset: Option<i64> = None;
        let mut failures: u32 = 0;
        info!(
            event_name = "ingress.telegram.polling_started",
            poll_timeout_secs = self.poll_timeout_secs,
            "telegram long polling started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let request = GetUpdates::new(offset, self.poll_timeout_secs);
            let result = tokio::select! {
                result = self.api.get_updates(&request) => result,
                _ = shutdown.changed() => break,
            };

            let updates = match result {
                Ok(updates) => {
                    failures = 0;
                    updates
                }
                Err(error) if error.is_unauthorized() => return Err(PollError::Unauthorized),
                Err(error) => {
                    warn!(
                        event_name = "ingress.telegram.poll_failed",
                        attempt = failures,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %error,
                        "telegram getUpdates failed"
                    );
                    if failures >= self.reconnect_policy.max_retries {
                        return Err(PollError::RetriesExhausted {
                            attempts: failures + 1,
                            last_error: error,
                        });
                    }

                    let delay = self.reconnect_policy.backoff(failures);
                    failures += 1;
                    if !delay.is_zero() {
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = shutdown.changed() => break,
                        }
                    }
                    continue;
                }
            };

            for update in updates {
                offset = Some(next_offset(offset, &update));
                self.process(update).await;
            }
        }

        info!(event_name = "ingress.telegram.polling_stopped", "telegram long polling stopped");
        Ok(())
    }

    async fn process(&self, update: Update) {
        let classified = classify(&update);
        let user_id = classified
            .event
            .as_ref()
            .map(|event| event.user_id())
            .or_else(|| classified.reply.as_ref().map(|reply| reply.user_id()))
            .map(ToString::to_string);

        info!(
            event_name = "ingress.telegram.update_received",
            update_id = classified.update_id,
            correlation_id = classified.update_id,
            kind = classified.kind(),
            user_id = user_id.as_deref().unwrap_or("unknown"),
            "received telegram update"
        );

        self.acknowledge(&classified).await;

        let event = match (classified.event, classified.reply) {
            (Some(event), _) => event,
            (None, Some(reply)) => {
                debug!(
                    event_name = "ingress.telegram.update_rejected",
                    update_id = classified.update_id,
                    reason = classified.ignored_reason.unwrap_or("unknown"),
                    "answering unsupported user message"
                );
                self.deliver(&reply, classified.update_id).await;
                return;
            }
            (None, None) => {
                debug!(
                    event_name = "ingress.telegram.update_ignored",
                    update_id = classified.update_id,
                    reason = classified.ignored_reason.unwrap_or("unknown"),
                    "ignoring telegram update"
                );
                return;
            }
        };

        if let (InboundEvent::WordSubmitted { .. }, Some(chat_id)) = (&event, classified.chat_id) {
            let typing = SendChatAction { chat_id, action: ChatAction::Typing };
            if let Err(error) = self.api.send_chat_action(&typing).await {
                debug!(
                    update_id = classified.update_id,
                    error = %error,
                    "failed to send typing indicator"
                );
            }
        }

        let action = self.handler.handle(event).await;
        let delivered = self.deliver(&action, classified.update_id).await;
        if !delivered && matches!(action, OutboundAction::ShowExplanationWithSaveButton { .. }) {
            self.withdraw(action.user_id(), classified.update_id).await;
        }
    }

    /// Renders and sends `action`; failures are logged and never stop the poll loop.
    async fn deliver(&self, action: &OutboundAction, update_id: i64) -> bool {
        let message = match render(action) {
            Ok(message) => message,
            Err(error) => {
                warn!(
                    event_name = "egress.telegram.render_failed",
                    update_id,
                    correlation_id = update_id,
                    error = %error,
                    "could not render outbound action; continuing poll loop"
                );
                return false;
            }
        };

        match self.api.send_message(&message).await {
            Ok(()) => {
                debug!(
                    event_name = "egress.telegram.message_sent",
                    update_id,
                    correlation_id = update_id,
                    chat_id = message.chat_id,
                    is_error = action.is_error(),
                    "sent reply"
                );
                true
            }
            Err(error) => {
                warn!(
                    event_name = "egress.telegram.message_sent",
                    update_id,
                    correlation_id = update_id,
                    chat_id = message.chat_id,
                    error = %error,
                    "failed to send reply; continuing poll loop"
                );
                false
            }
        }
    }

    /// An explanation the user never saw must not stay saveable.
    async fn withdraw(&self, user_id: &UserId, update_id: i64) {
        let dismissed =
            self.handler.handle(InboundEvent::DismissRequested { user_id: user_id.clone() }).await;
        info!(
            event_name = "egress.telegram.explanation_withdrawn",
            update_id,
            correlation_id = update_id,
            user_id = %user_id,
            pending_dropped = !dismissed.is_error(),
            "explanation could not be shown; pending word dropped"
        );

        let notice = OutboundAction::report_error(user_id.clone(), UNDELIVERED_EXPLANATION_MESSAGE);
        self.deliver(&notice, update_id).await;
    }

    async fn acknowledge(&self, classified: &ClassifiedUpdate) {
        let Some(callback_query_id) = &classified.callback_query_id else {
            return;
        };

        let mark = if classified.event.is_some() { CALLBACK_ACCEPTED } else { CALLBACK_REJECTED };
        let answer = AnswerCallbackQuery {
            callback_query_id: callback_query_id.clone(),
            text: Some(mark.to_owned()),
            show_alert: false,
        };

        if let Err(error) = self.api.answer_callback_query(&answer).await {
            warn!(
                event_name = "ingress.telegram.ack_sent",
                update_id = classified.update_id,
                correlation_id = classified.update_id,
                error = %error,
                "failed to answer callback query"
            );
        } else {
            debug!(
                event_name = "ingress.telegram.ack_sent",
                update_id = classified.update_id,
                correlation_id = classified.update_id,
                "answered callback query"
            );
        }
    }
}

fn next_offset(current: Option<i64>, update: &Update) -> i64 {
    let candidate = update.update_id + 1;
    current.map_or(candidate, |offset| offset.max(candidate))
}
