// Appliance REST client. The runner only sees the ReportClient trait.

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::instrument;

use crate::auth::AccessToken;
use crate::config::ApplianceConfig;
use crate::error::ClientError;
use crate::models::{DataPayload, ReportDefinition, ReportInstance, Site, SiteSearch, StatusPayload};
use crate::version;

pub const INSTANCES_PATH: &str = "/api/npm.reports/1.0/instances";
pub const SEARCH_PATH: &str = "/api/npm.search/1.0/search";

/// Path of one sub-report resource; `/status` and `/data` hang off it, DELETE removes it.
pub fn data_def_path(job_id: &str, item_id: &str) -> String {
    format!(
        "{}/items/{}/data_defs/items/{}",
        INSTANCES_PATH, job_id, item_id
    )
}

/// Operations the report runner and site iterator need from the appliance.
pub trait ReportClient {
    fn submit(
        &self,
        definition: &ReportDefinition,
    ) -> impl Future<Output = Result<ReportInstance, ClientError>>;

    fn status(
        &self,
        job_id: &str,
        item_id: &str,
    ) -> impl Future<Output = Result<StatusPayload, ClientError>>;

    fn data(
        &self,
        job_id: &str,
        item_id: &str,
    ) -> impl Future<Output = Result<DataPayload, ClientError>>;

    fn delete(&self, job_id: &str, item_id: &str) -> impl Future<Output = Result<(), ClientError>>;

    fn search_sites(&self, limit: u32) -> impl Future<Output = Result<Vec<Site>, ClientError>>;
}

/// Shared reqwest client for login and report calls.
pub fn build_http(config: &ApplianceConfig) -> Result<reqwest::Client, ClientError> {
    let http = reqwest::Client::builder()
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(version::user_agent())
        .build()?;
    Ok(http)
}

/// Returns the body text for 200/201/204, otherwise logs and fails with the status and body.
pub(crate) async fn check_status(
    method: &str,
    path: &str,
    response: reqwest::Response,
) -> Result<String, ClientError> {
    let status = response.status();
    let body = response.text().await?;
    if matches!(status.as_u16(), 200 | 201 | 204) {
        return Ok(body);
    }
    tracing::warn!(
        method,
        path,
        status = status.as_u16(),
        body = %body,
        "appliance request failed"
    );
    Err(ClientError::Status {
        method: method.to_string(),
        path: path.to_string(),
        status: status.as_u16(),
        body,
    })
}

pub struct HttpReportClient {
    http: reqwest::Client,
    base_url: String,
    authorization: String,
}

impl HttpReportClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, token: &AccessToken) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            authorization: token.authorization(),
        }
    }

    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<String, ClientError> {
        let mut builder = self
            .http
            .request(method.clone(), format!("{}{}", self.base_url, path))
            .header(reqwest::header::AUTHORIZATION, &self.authorization);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        check_status(method.as_str(), path, response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let text = self.request::<()>(Method::GET, path, None).await?;
        decode(path, &text)
    }
}

fn decode<T: DeserializeOwned>(path: &str, text: &str) -> Result<T, ClientError> {
    serde_json::from_str(text).map_err(|source| ClientError::Decode {
        path: path.to_string(),
        source,
    })
}

impl ReportClient for HttpReportClient {
    #[instrument(skip(self, definition), fields(operation = "submit", data_defs = definition.data_defs.len()))]
    async fn submit(&self, definition: &ReportDefinition) -> Result<ReportInstance, ClientError> {
        let text = self
            .request(Method::POST, INSTANCES_PATH, Some(definition))
            .await?;
        decode(INSTANCES_PATH, &text)
    }

    async fn status(&self, job_id: &str, item_id: &str) -> Result<StatusPayload, ClientError> {
        self.get_json(&format!("{}/status", data_def_path(job_id, item_id)))
            .await
    }

    async fn data(&self, job_id: &str, item_id: &str) -> Result<DataPayload, ClientError> {
        self.get_json(&format!("{}/data", data_def_path(job_id, item_id)))
            .await
    }

    async fn delete(&self, job_id: &str, item_id: &str) -> Result<(), ClientError> {
        self.request::<()>(Method::DELETE, &data_def_path(job_id, item_id), None)
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(operation = "search_sites"))]
    async fn search_sites(&self, limit: u32) -> Result<Vec<Site>, ClientError> {
        let path = format!("{}?types=sdwan.site.name&limit={}", SEARCH_PATH, limit);
        let search: SiteSearch = self.get_json(&path).await?;
        Ok(search.items)
    }
}
