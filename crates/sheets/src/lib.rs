//! Row store backed by a Google spreadsheet
//!
//! - **Credentials** (`credentials`) - service account JSON key loading and checks
//! - **Auth** (`auth`) - signed JWT assertion exchanged for a cached bearer token
//! - **Store** (`store`) - `values:append` of one row per save
//! - **Memory** (`memory`) - in-process store for tests and dry runs
//!
//! Rows are only ever appended. The same word saved twice produces two rows.

pub mod auth;
pub mod credentials;
pub mod memory;
pub mod store;

use etymo_core::{StoreError, StoreErrorKind};
use thiserror::Error;

pub use auth::{signing_key, AccessTokenSource, ServiceAccountTokenSource, StaticTokenSource};
pub use credentials::{CredentialError, ServiceAccountKey};
pub use memory::InMemoryRowStore;
pub use store::SheetsRowStore;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SheetsError {
    #[error("could not sign token assertion: {0}")]
    Signing(String),
    #[error("token exchange rejected (status {status}): {body}")]
    TokenExchange { status: u16, body: String },
    #[error("sheets transport failed: {0}")]
    Transport(String),
    #[error("sheets api returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("sheets response was malformed: {0}")]
    MalformedResponse(String),
}

impl From<SheetsError> for StoreError {
    fn from(error: SheetsError) -> Self {
        let kind = match &error {
            SheetsError::Signing(_) | SheetsError::TokenExchange { .. } => {
                StoreErrorKind::Authentication
            }
            SheetsError::Status { status: 401, .. } => StoreErrorKind::Authentication,
            SheetsError::Status { status: 403, .. } => StoreErrorKind::PermissionDenied,
            SheetsError::Status { status: 404, .. } => StoreErrorKind::NotFound,
            SheetsError::Status { .. }
            | SheetsError::Transport(_)
            | SheetsError::MalformedResponse(_) => StoreErrorKind::Network,
        };
        StoreError::new(kind, error.to_string())
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(200) {
        Some((idx, _)) => body[..idx].to_owned(),
        None => body.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use etymo_core::{StoreError, StoreErrorKind};

    use super::{truncate_body, SheetsError};

    #[test]
    fn status_codes_map_to_store_error_kinds() {
        let kind = |status| {
            StoreError::from(SheetsError::Status { status, body: String::new() }).kind
        };

        assert_eq!(kind(401), StoreErrorKind::Authentication);
        assert_eq!(kind(403), StoreErrorKind::PermissionDenied);
        assert_eq!(kind(404), StoreErrorKind::NotFound);
        assert_eq!(kind(500), StoreErrorKind::Network);
    }

    #[test]
    fn token_problems_are_authentication_failures() {
        let error = StoreError::from(SheetsError::TokenExchange {
            status: 400,
            body: "invalid_grant".to_owned(),
        });
        assert_eq!(error.kind, StoreErrorKind::Authentication);
        assert_eq!(
            StoreError::from(SheetsError::Signing("bad pem".to_owned())).kind,
            StoreErrorKind::Authentication
        );
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        assert_eq!(truncate_body(&body).len(), 200);
        assert_eq!(truncate_body("  short  "), "short");
    }
}
