use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::Session;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::Verdict;

use super::{ReviewStore, FIRST_COLUMN, FIRST_DATA_ROW, REVIEW_COLUMN};

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeUpdate<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: [[&'static str; 1]; 1],
}

/// Which spreadsheet and tab the reviewer works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTarget {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub api_base: Url,
}

impl SheetTarget {
    /// `Ok(None)` when no spreadsheet is configured yet.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let Some(spreadsheet_id) = config
            .spreadsheet_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
        else {
            return Ok(None);
        };

        let api_base = Url::parse(&config.api_base)
            .map_err(|e| AppError::Config(format!("invalid api_base {:?}: {e}", config.api_base)))?;

        Ok(Some(Self {
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: config.sheet_name.clone(),
            api_base,
        }))
    }

    /// Data rows below the header, open-ended so the API stops at the last filled row.
    pub fn read_range(&self) -> String {
        format!(
            "{}!{FIRST_COLUMN}{FIRST_DATA_ROW}:{REVIEW_COLUMN}",
            self.quoted_sheet_name()
        )
    }

    pub fn review_cell(&self, row: u32) -> String {
        format!("{}!{REVIEW_COLUMN}{row}", self.quoted_sheet_name())
    }

    pub fn values_url(&self, range: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.api_base.as_str().trim_end_matches('/'),
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    // A1 notation needs quotes around names that are not plain identifiers.
    fn quoted_sheet_name(&self) -> String {
        let plain = !self.sheet_name.is_empty()
            && self
                .sheet_name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_');
        if plain {
            self.sheet_name.clone()
        } else {
            format!("'{}'", self.sheet_name.replace('\'', "''"))
        }
    }
}

pub struct SheetsClient {
    client: Client,
    target: Option<SheetTarget>,
    session: Session,
}

impl SheetsClient {
    pub fn new(target: Option<SheetTarget>, session: Session, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Remote(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            target,
            session,
        })
    }

    fn target(&self) -> Result<&SheetTarget> {
        self.target.as_ref().ok_or_else(|| {
            AppError::Config(format!(
                "spreadsheet_id is not set. Add it to {}",
                Config::config_path().display()
            ))
        })
    }
}

#[async_trait]
impl ReviewStore for SheetsClient {
    async fn read_all(&self) -> Result<Vec<Vec<String>>> {
        let target = self.target()?;
        let token = self.session.access_token()?;
        let range = target.read_range();

        tracing::debug!(%range, "Reading sheet");

        let response = self
            .client
            .get(target.values_url(&range))
            .bearer_auth(token)
            .send()
            .await?;

        let body = check_status(response).await?.text().await?;
        let rows = parse_value_range(&body)?;
        tracing::info!(rows = rows.len(), "Loaded sheet rows");
        Ok(rows)
    }

    async fn write_review_flag(&self, row: u32, verdict: Verdict) -> Result<()> {
        let target = self.target()?;
        let token = self.session.access_token()?;
        let range = target.review_cell(row);
        let value = verdict.as_cell();

        tracing::info!(row, value, "Writing review flag");

        let request = ValueRangeUpdate {
            range: &range,
            major_dimension: "ROWS",
            values: [[value]],
        };

        let response = self
            .client
            .put(target.values_url(&range))
            .bearer_auth(token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&request)
            .send()
            .await?;

        check_status(response).await?;
        tracing::info!(row, value, "Review flag written");
        Ok(())
    }
}

/// A sheet with no data rows comes back without a `values` key.
fn parse_value_range(body: &str) -> Result<Vec<Vec<String>>> {
    let range: ValueRange = serde_json::from_str(body)?;
    Ok(range.values)
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    Err(status_error(status, &error_text))
}

fn status_error(status: StatusCode, body: &str) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AppError::Auth(format!("Sheets API rejected the token ({status}): {body}"))
        }
        _ => AppError::Remote(format!("Sheets API error ({status}): {body}")),
    }
}
