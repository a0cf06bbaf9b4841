use serde::{Deserialize, Serialize};

use crate::domain::event::InboundEventType;
use crate::errors::StateError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingSaveDecision,
}

/// Work the engine has to perform for an event in a given state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowAction {
    Greet,
    RequestExplanation,
    AppendRow,
    ClearPending,
    Reject(StateError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionPlan {
    pub from: SessionState,
    pub event: InboundEventType,
    pub action: FlowAction,
}

pub fn plan(current: SessionState, event: InboundEventType) -> TransitionPlan {
    use InboundEventType::*;
    use SessionState::*;

    let action = match (current, event) {
        (_, StartRequested) => FlowAction::Greet,
        (_, WordSubmitted) => FlowAction::RequestExplanation,
        (Idle, SaveRequested) => FlowAction::Reject(StateError::NothingToSave),
        (AwaitingSaveDecision, SaveRequested) => FlowAction::AppendRow,
        (Idle, DismissRequested) => FlowAction::Reject(StateError::NothingToDismiss),
        (AwaitingSaveDecision, DismissRequested) => FlowAction::ClearPending,
    };

    TransitionPlan { from: current, event, action }
}

/// State after `action` ran from `current` and either succeeded or failed.
pub fn settle(current: SessionState, action: &FlowAction, succeeded: bool) -> SessionState {
    match (action, succeeded) {
        (FlowAction::RequestExplanation, true) => SessionState::AwaitingSaveDecision,
        (FlowAction::AppendRow, true) | (FlowAction::ClearPending, _) => SessionState::Idle,
        _ => current,
    }
}
