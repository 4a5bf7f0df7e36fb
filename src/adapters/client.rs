use serde::de::DeserializeOwned;

use crate::config::Settings;
use crate::error::AdapterError;
use crate::soql::WhereClause;

/// Thin GET client for `{base}/resource/{dataset}.json` Socrata endpoints.
#[derive(Clone)]
pub struct OpenDataClient {
    client:    reqwest::Client,
    base_url:  String,
    app_token: Option<String>,
}

impl OpenDataClient {
    pub fn new(settings: &Settings) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url:  settings.open_data_base_url.trim_end_matches('/').to_string(),
            app_token: settings.open_data_app_token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Fetches every row of `dataset` matching `filter`.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        dataset: &str,
        filter:  &WhereClause,
    ) -> Result<Vec<T>, AdapterError> {
        let url = format!("{}/resource/{}.json", self.base_url, dataset);
        let mut params: Vec<(&str, String)> = Vec::new();
        if !filter.is_empty() {
            params.push(("$where", filter.build()));
        }
        if let Some(token) = &self.app_token {
            params.push(("$$app_token", token.clone()));
        }

        tracing::debug!(%url, filter = %filter, "open data request");

        let response = self.client.get(&url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "open data request failed");
            return Err(AdapterError::Status { status: status.as_u16() });
        }

        let rows: Vec<T> = response.json().await?;
        tracing::info!(dataset, rows = rows.len(), "open data rows received");
        Ok(rows)
    }
}
