use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use etymo_core::config::SheetsConfig;
use etymo_core::{Row, RowStore, StoreError};
use reqwest::{Client, StatusCode, Url};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::auth::{AccessTokenSource, ServiceAccountTokenSource};
use crate::credentials::ServiceAccountKey;
use crate::{truncate_body, SheetsError};

pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    #[serde(default)]
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    #[serde(default)]
    updated_range: Option<String>,
}

/// Appends one row per save to the first worksheet columns `A:C`.
pub struct SheetsRowStore {
    http: Client,
    base_url: String,
    spreadsheet_id: String,
    worksheet: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl SheetsRowStore {
    pub fn new(
        http: Client,
        spreadsheet_id: impl Into<String>,
        worksheet: impl Into<String>,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Self {
        Self {
            http,
            base_url: DEFAULT_SHEETS_BASE_URL.to_owned(),
            spreadsheet_id: spreadsheet_id.into(),
            worksheet: worksheet.into(),
            tokens,
        }
    }

    /// Builds the store with a service-account token source sharing one HTTP client.
    pub fn from_config(config: &SheetsConfig, key: ServiceAccountKey) -> Result<Self, SheetsError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| SheetsError::Transport(error.to_string()))?;
        let tokens = ServiceAccountTokenSource::new(http.clone(), key)?;

        Ok(Self::new(http, &config.spreadsheet_id, &config.worksheet, Arc::new(tokens)))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn append_url(&self) -> Result<Url, SheetsError> {
        let range = format!("{}!A1:append", self.worksheet);
        let mut url = Url::parse(&self.base_url)
            .map_err(|error| SheetsError::Transport(format!("invalid sheets base url: {error}")))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Transport("sheets base url cannot carry a path".to_owned()))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                range.as_str(),
            ]);
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");
        Ok(url)
    }

    async fn append_row(&self, row: &Row) -> Result<Option<String>, SheetsError> {
        let url = self.append_url()?;
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(&append_body(row))
            .send()
            .await
            .map_err(|error| SheetsError::Transport(error.to_string()))?;

        let status = response.status();
        let body =
            response.text().await.map_err(|error| SheetsError::Transport(error.to_string()))?;
        check_status(status, &body)?;

        let parsed: AppendResponse = serde_json::from_str(&body).unwrap_or_default();
        Ok(parsed.updates.and_then(|updates| updates.updated_range))
    }
}

#[async_trait]
impl RowStore for SheetsRowStore {
    async fn append(&self, row: &Row) -> Result<(), StoreError> {
        debug!(
            event_name = "sheets.row.append_started",
            spreadsheet_id = %self.spreadsheet_id,
            word = %row.word,
            "appending row"
        );

        let updated_range = self.append_row(row).await?;
        info!(
            event_name = "sheets.row.appended",
            spreadsheet_id = %self.spreadsheet_id,
            word = %row.word,
            updated_range = updated_range.as_deref().unwrap_or("unknown"),
            "row appended"
        );
        Ok(())
    }
}

fn append_body(row: &Row) -> Value {
    json!({ "values": [row.cells()] })
}

fn check_status(status: StatusCode, body: &str) -> Result<(), SheetsError> {
    if status.is_success() {
        return Ok(());
    }
    Err(SheetsError::Status { status: status.as_u16(), body: truncate_body(body) })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use etymo_core::{Row, StoreError, StoreErrorKind};
    use reqwest::{Client, StatusCode};

    use super::{append_body, check_status, SheetsRowStore};
    use crate::auth::StaticTokenSource;

    fn store(worksheet: &str) -> SheetsRowStore {
        SheetsRowStore::new(
            Client::new(),
            "1AbC-sheet",
            worksheet,
            Arc::new(StaticTokenSource::new("token")),
        )
    }

    #[test]
    fn append_url_targets_first_cell_of_worksheet() {
        let url = store("Sheet1").append_url().expect("url builds");

        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/1AbC-sheet/values/Sheet1!A1:append\
             ?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS"
        );
    }

    #[test]
    fn worksheet_names_are_percent_encoded() {
        let url = store("My Words")
            .with_base_url("http://127.0.0.1:9000/")
            .append_url()
            .expect("url builds");

        assert!(url
            .as_str()
            .starts_with("http://127.0.0.1:9000/v4/spreadsheets/1AbC-sheet/values/My%20Words!A1"));
    }

    #[test]
    fn body_holds_one_row_of_three_cells() {
        let row = Row {
            timestamp: Some("2024-05-01T10:00:00Z".to_owned()),
            ..Row::new("מכין", "participle of To prepare")
        };
        let body = append_body(&row);

        assert_eq!(
            body,
            serde_json::json!({
                "values": [["מכין", "participle of To prepare", "2024-05-01T10:00:00Z"]]
            })
        );
    }

    #[test]
    fn failing_statuses_map_to_store_kinds() {
        let kind = |status: StatusCode| {
            StoreError::from(check_status(status, "{\"error\":{}}").expect_err("fails")).kind
        };

        assert!(check_status(StatusCode::OK, "{}").is_ok());
        assert_eq!(kind(StatusCode::UNAUTHORIZED), StoreErrorKind::Authentication);
        assert_eq!(kind(StatusCode::FORBIDDEN), StoreErrorKind::PermissionDenied);
        assert_eq!(kind(StatusCode::NOT_FOUND), StoreErrorKind::NotFound);
        assert_eq!(kind(StatusCode::BAD_GATEWAY), StoreErrorKind::Network);
    }
}
