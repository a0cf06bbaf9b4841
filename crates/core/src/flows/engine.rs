use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};

use crate::domain::{
    event::{InboundEvent, InboundEventType, OutboundAction, UserId},
    save::PendingSave,
    word::WordPolicy,
};
use crate::errors::{InteractionError, StateError};
use crate::flows::states::{plan, settle, FlowAction, SessionState};
use crate::ports::{ExplanationProvider, InteractionHandler, RowStore};
use crate::session::{SessionGuard, SessionStore};

pub const DEFAULT_GREETING: &str = "Welcome to Etymo!\n\n\
Send me a single word and I will look up its root and etymology.\n\
Tap Save to add the explanation to the shared sheet, or send /cancel to drop it.";

pub const SAVED_MESSAGE: &str = "saved";
pub const DISMISSED_MESSAGE: &str = "dismissed";

/// Decides what to do with each inbound event and owns the per-user pending saves.
///
/// The provider and the store are reached only through their port traits, so the
/// core never performs network I/O itself.
pub struct InteractionCore<P, S> {
    provider: P,
    store: S,
    sessions: Arc<SessionStore>,
    word_policy: WordPolicy,
    greeting: String,
}

impl<P, S> InteractionCore<P, S>
where
    P: ExplanationProvider,
    S: RowStore,
{
    pub fn new(provider: P, store: S) -> Self {
        Self {
            provider,
            store,
            sessions: Arc::new(SessionStore::new()),
            word_policy: WordPolicy::default(),
            greeting: DEFAULT_GREETING.to_owned(),
        }
    }

    pub fn with_sessions(mut self, sessions: Arc<SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_word_policy(mut self, word_policy: WordPolicy) -> Self {
        self.word_policy = word_policy;
        self
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub async fn handle(&self, event: InboundEvent) -> OutboundAction {
        debug!(
            event_name = "interaction.event.received",
            event_type = ?event.event_type(),
            user_id = %event.user_id(),
            "dispatching inbound event"
        );

        match event {
            InboundEvent::StartRequested { user_id } => self.handle_start(user_id),
            InboundEvent::WordSubmitted { user_id, text } => {
                self.handle_word_submitted(user_id, &text).await
            }
            InboundEvent::SaveRequested { user_id } => self.handle_save_requested(user_id).await,
            InboundEvent::DismissRequested { user_id } => {
                self.handle_dismiss_requested(user_id).await
            }
        }
    }

    pub fn handle_start(&self, user_id: UserId) -> OutboundAction {
        OutboundAction::confirm(user_id, self.greeting.clone())
    }

    pub async fn handle_word_submitted(&self, user_id: UserId, text: &str) -> OutboundAction {
        let word = match self.word_policy.normalize(text) {
            Ok(word) => word,
            Err(error) => return self.report(user_id, error.into()),
        };

        let mut session = self.sessions.lock(&user_id).await;
        let step = plan(session.state(), InboundEventType::WordSubmitted);

        let explanation = match self.provider.generate(word).await {
            Ok(explanation) => explanation,
            Err(error) => return self.report(user_id, error.into()),
        };

        let superseded = session.replace(PendingSave {
            user_id: user_id.clone(),
            word: word.to_owned(),
            explanation: explanation.clone(),
        });
        log_transition(&session, step.from, &step.action);

        info!(
            event_name = "interaction.word.explained",
            user_id = %user_id,
            word,
            superseded = superseded.as_ref().map(|p| p.word.as_str()).unwrap_or("none"),
            "explanation ready, awaiting save decision"
        );

        OutboundAction::ShowExplanationWithSaveButton {
            user_id,
            word: word.to_owned(),
            explanation,
        }
    }

    pub async fn handle_save_requested(&self, user_id: UserId) -> OutboundAction {
        let mut session = self.sessions.lock(&user_id).await;
        let step = plan(session.state(), InboundEventType::SaveRequested);

        let pending = match (&step.action, session.pending()) {
            (FlowAction::AppendRow, Some(pending)) => pending.clone(),
            _ => return self.report(user_id, StateError::NothingToSave.into()),
        };

        let word = pending.word.clone();
        let row = pending.into_row(Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)));
        if let Err(error) = self.store.append(&row).await {
            return self.report(user_id, error.into());
        }

        session.clear();
        log_transition(&session, step.from, &step.action);

        info!(
            event_name = "interaction.row.saved",
            user_id = %user_id,
            word = %word,
            "pending word appended to row store"
        );

        OutboundAction::confirm(user_id, SAVED_MESSAGE)
    }

    pub async fn handle_dismiss_requested(&self, user_id: UserId) -> OutboundAction {
        let mut session = self.sessions.lock(&user_id).await;
        let step = plan(session.state(), InboundEventType::DismissRequested);

        if let FlowAction::Reject(error) = &step.action {
            return self.report(user_id, error.clone().into());
        }

        session.clear();
        log_transition(&session, step.from, &step.action);
        OutboundAction::confirm(user_id, DISMISSED_MESSAGE)
    }

    fn report(&self, user_id: UserId, error: InteractionError) -> OutboundAction {
        warn!(
            event_name = "interaction.event.failed",
            user_id = %user_id,
            error_class = error.error_class(),
            error = %error,
            "reporting failure to user"
        );
        OutboundAction::report_error(user_id, error.user_message())
    }
}

fn log_transition(session: &SessionGuard, from: SessionState, action: &FlowAction) {
    let to = settle(from, action, true);
    debug_assert_eq!(to, session.state());
    debug!(
        event_name = "interaction.session.transition",
        user_id = %session.user_id(),
        from = ?from,
        to = ?to,
        "session state updated"
    );
}

#[async_trait]
impl<P, S> InteractionHandler for InteractionCore<P, S>
where
    P: ExplanationProvider,
    S: RowStore,
{
    async fn handle(&self, event: InboundEvent) -> OutboundAction {
        InteractionCore::handle(self, event).await
    }
}
