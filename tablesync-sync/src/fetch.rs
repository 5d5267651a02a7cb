//! Remote record source.
//!
//! The endpoint answers `{"result": [...]}`. Items are handed to the engine
//! untouched; malformed items are its concern, not the fetcher's.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde_json::Value;

use tablesync_core::{settings::DEFAULT_TIMEOUT_SECS, Settings};

use crate::error::FetchError;

/// Characters of a failed response body kept in [`FetchError::Status`].
pub const ERROR_BODY_LIMIT: usize = 200;

/// Anything that can produce the raw fetched record list.
pub trait RecordSource {
    fn fetch(&self) -> Result<Vec<Value>, FetchError>;
}

/// Blocking HTTP GET with Basic auth.
#[derive(Debug, Clone)]
pub struct HttpRecordSource {
    url: String,
    user: String,
    pass: String,
    timeout: Duration,
}

impl HttpRecordSource {
    pub fn new(url: impl Into<String>, user: impl Into<String>, pass: impl Into<String>) -> Self {
        HttpRecordSource {
            url: url.into(),
            user: user.into(),
            pass: pass.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.api_url, &settings.api_user, &settings.api_pass)
            .with_timeout(Duration::from_secs(settings.timeout_secs))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl RecordSource for HttpRecordSource {
    fn fetch(&self) -> Result<Vec<Value>, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        tracing::info!("fetching records from {}", self.url);
        let response = client
            .get(&self.url)
            .basic_auth(&self.user, Some(&self.pass))
            .header(ACCEPT, "application/json")
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                code: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }
        let records = parse_result(&body)?;
        tracing::info!("fetched {} record(s)", records.len());
        Ok(records)
    }
}

/// Extract the `result` list from a response body.
///
/// A body that is not JSON is an error; a missing or non-list `result` is an
/// empty fetch.
pub fn parse_result(body: &str) -> Result<Vec<Value>, FetchError> {
    let mut payload: Value = serde_json::from_str(body)?;
    match payload.get_mut("result").map(Value::take) {
        Some(Value::Array(items)) => Ok(items),
        _ => {
            tracing::warn!("response has no result list; treating as empty");
            Ok(Vec::new())
        }
    }
}
