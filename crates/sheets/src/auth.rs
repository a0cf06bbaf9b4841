use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::credentials::ServiceAccountKey;
use crate::{truncate_body, SheetsError, SPREADSHEETS_SCOPE};

pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<SecretString, SheetsError>;
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    ASSERTION_LIFETIME_SECS as u64
}

struct CachedToken {
    token: SecretString,
    refresh_at: Instant,
}

impl CachedToken {
    fn new(token: SecretString, expires_in: Duration, now: Instant) -> Self {
        Self { token, refresh_at: now + expires_in.saturating_sub(REFRESH_MARGIN) }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now < self.refresh_at
    }
}

/// RS256 key for the assertion. Fails when the PEM in the key file is not a usable RSA key.
pub fn signing_key(key: &ServiceAccountKey) -> Result<EncodingKey, SheetsError> {
    EncodingKey::from_rsa_pem(key.private_key_pem())
        .map_err(|error| SheetsError::Signing(error.to_string()))
}

/// Exchanges a signed service-account assertion for a bearer token.
pub struct ServiceAccountTokenSource {
    http: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(http: Client, key: ServiceAccountKey) -> Result<Self, SheetsError> {
        let encoding_key = signing_key(&key)?;
        Ok(Self { http, key, encoding_key, cached: Mutex::new(None) })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn assertion(&self, issued_at: i64) -> Result<String, SheetsError> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|error| SheetsError::Signing(error.to_string()))
    }

    async fn exchange(&self) -> Result<TokenResponse, SheetsError> {
        let assertion = self.assertion(Utc::now().timestamp())?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|error| SheetsError::Transport(error.to_string()))?;

        let status = response.status();
        let body =
            response.text().await.map_err(|error| SheetsError::Transport(error.to_string()))?;
        if !status.is_success() {
            return Err(SheetsError::TokenExchange {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body)
            .map_err(|error| SheetsError::MalformedResponse(format!("token response: {error}")))
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<SecretString, SheetsError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh(Instant::now())) {
            return Ok(token.token.clone());
        }

        let response = self.exchange().await?;
        debug!(
            event_name = "sheets.token.refreshed",
            client_email = %self.key.client_email,
            expires_in = response.expires_in,
            "service account token refreshed"
        );

        let token = SecretString::from(response.access_token);
        *cached = Some(CachedToken::new(
            token.clone(),
            Duration::from_secs(response.expires_in),
            Instant::now(),
        ));
        Ok(token)
    }
}

/// Fixed token, for tests and pre-authorised environments.
pub struct StaticTokenSource {
    token: SecretString,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: SecretString::from(token.into()) }
    }
}

#[async_trait]
impl AccessTokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<SecretString, SheetsError> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::{Duration, Instant};

    use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
    use reqwest::Client;
    use secrecy::{ExposeSecret, SecretString};

    use super::{
        AccessTokenSource, CachedToken, ServiceAccountTokenSource, StaticTokenSource,
        ASSERTION_LIFETIME_SECS,
    };
    use crate::credentials::ServiceAccountKey;
    use crate::SheetsError;

    const TEST_KEY_PEM: &str = include_str!("../tests/fixtures/test_service_account_key.pem");
    const TEST_PUBLIC_PEM: &str =
        include_str!("../tests/fixtures/test_service_account_key.pub.pem");

    fn key_with_pem(pem: &str) -> ServiceAccountKey {
        let raw = serde_json::json!({
            "client_email": "bot@etymo-test.iam.gserviceaccount.com",
            "private_key": pem,
            "token_uri": "https://oauth2.example.test/token",
        })
        .to_string();
        ServiceAccountKey::parse(Path::new("sa.json"), &raw).expect("key parses")
    }

    #[test]
    fn assertion_is_rs256_with_one_hour_lifetime() {
        let source = ServiceAccountTokenSource::new(Client::new(), key_with_pem(TEST_KEY_PEM))
            .expect("pem accepted");
        let assertion = source.assertion(1_700_000_000).expect("assertion signs");

        let header = decode_header(&assertion).expect("header decodes");
        assert_eq!(header.alg, Algorithm::RS256);

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.set_audience(&["https://oauth2.example.test/token"]);
        let public = DecodingKey::from_rsa_pem(TEST_PUBLIC_PEM.as_bytes()).expect("public pem");
        let claims = decode::<serde_json::Value>(&assertion, &public, &validation)
            .expect("signature verifies")
            .claims;
        assert_eq!(claims["iss"], "bot@etymo-test.iam.gserviceaccount.com");
        assert_eq!(claims["scope"], "https://www.googleapis.com/auth/spreadsheets");
        assert_eq!(claims["aud"], "https://oauth2.example.test/token");
        assert_eq!(claims["exp"].as_i64(), Some(1_700_000_000 + ASSERTION_LIFETIME_SECS));
    }

    #[test]
    fn invalid_pem_is_a_signing_error() {
        let result = ServiceAccountTokenSource::new(Client::new(), key_with_pem("not a key"));
        assert!(matches!(result, Err(SheetsError::Signing(_))));
    }

    #[test]
    fn cached_token_refreshes_a_minute_early() {
        let now = Instant::now();
        let cached =
            CachedToken::new(SecretString::from("t".to_owned()), Duration::from_secs(3600), now);

        assert!(cached.is_fresh(now + Duration::from_secs(3500)));
        assert!(!cached.is_fresh(now + Duration::from_secs(3540)));
    }

    #[test]
    fn short_lived_token_is_never_fresh() {
        let now = Instant::now();
        let cached =
            CachedToken::new(SecretString::from("t".to_owned()), Duration::from_secs(30), now);
        assert!(!cached.is_fresh(now));
    }

    #[tokio::test]
    async fn static_source_returns_its_token() {
        let token = StaticTokenSource::new("ya29.test").access_token().await.expect("token");
        assert_eq!(token.expose_secret(), "ya29.test");
    }
}
