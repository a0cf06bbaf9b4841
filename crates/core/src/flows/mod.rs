pub mod engine;
pub mod states;

pub use engine::{InteractionCore, DEFAULT_GREETING};
pub use states::{plan, settle, FlowAction, SessionState, TransitionPlan};
