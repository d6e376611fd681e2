use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;

use trivia_core::config::SheetsConfig;
use trivia_core::domain::link::MirrorRow;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("sheets request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sheets append rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("sheets mirror is not configured: {0}")]
    Configuration(String),
}

/// Append-only spreadsheet replica of the archive.
#[async_trait]
pub trait MirrorSink: Send + Sync {
    async fn append_rows(&self, rows: &[MirrorRow]) -> Result<(), MirrorError>;
}

#[derive(Default)]
pub struct NoopMirrorSink;

#[async_trait]
impl MirrorSink for NoopMirrorSink {
    async fn append_rows(&self, _rows: &[MirrorRow]) -> Result<(), MirrorError> {
        Ok(())
    }
}

pub struct SheetsMirror {
    client: reqwest::Client,
    api_base_url: String,
    spreadsheet_id: String,
    range: String,
    access_token: SecretString,
}

#[derive(Serialize)]
struct AppendBody<'a> {
    values: Vec<[&'a str; 5]>,
}

impl SheetsMirror {
    pub fn from_config(config: &SheetsConfig) -> Result<Self, MirrorError> {
        let spreadsheet_id = config
            .spreadsheet_id
            .clone()
            .ok_or_else(|| MirrorError::Configuration("sheets.spreadsheet_id".to_owned()))?;
        let access_token = config
            .access_token
            .clone()
            .ok_or_else(|| MirrorError::Configuration("sheets.access_token".to_owned()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            spreadsheet_id,
            range: config.range.clone(),
            access_token,
        })
    }

    fn append_url(&self) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}:append",
            self.api_base_url, self.spreadsheet_id, self.range
        )
    }
}

#[async_trait]
impl MirrorSink for SheetsMirror {
    async fn append_rows(&self, rows: &[MirrorRow]) -> Result<(), MirrorError> {
        if rows.is_empty() {
            return Ok(());
        }

        let body = AppendBody { values: rows.iter().map(MirrorRow::cells).collect() };
        let response = self
            .client
            .post(self.append_url())
            .bearer_auth(self.access_token.expose_secret())
            .query(&[("valueInputOption", "USER_ENTERED"), ("insertDataOption", "INSERT_ROWS")])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MirrorError::Rejected { status: status.as_u16(), body });
        }

        Ok(())
    }
}
