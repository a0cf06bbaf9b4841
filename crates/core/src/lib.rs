pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod ports;
pub mod session;

pub use domain::event::{InboundEvent, InboundEventType, OutboundAction, UserId};
pub use domain::save::{PendingSave, Row};
pub use domain::word::WordPolicy;
pub use errors::{
    InputError, InteractionError, ProviderError, ProviderErrorKind, StateError, StoreError,
    StoreErrorKind,
};
pub use flows::{InteractionCore, SessionState};
pub use ports::{ExplanationProvider, InteractionHandler, RowStore};
pub use session::SessionStore;
