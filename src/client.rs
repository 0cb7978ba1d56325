//! The submission client: the HTTP boundary to the execution backend's
//! template catalog, choice source, upload endpoint, and prompt queue.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::BackendError;
use crate::graph::Graph;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the backend lives.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// The streaming status channel endpoint derived from the base URL.
    pub fn ws_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            format!("ws://{}", self.base_url)
        };
        format!("{ws_base}/ws")
    }
}

#[derive(Debug, Deserialize)]
struct TemplateListResponse {
    #[serde(default)]
    workflows: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChoicesResponse {
    #[serde(default)]
    choices: Vec<String>,
}

/// One entry of the backend's output gallery, used by image inputs to pick
/// an existing result as input.
#[derive(Debug, Clone, Deserialize)]
pub struct GalleryEntry {
    pub filename: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(default)]
    pub metadata: Option<JsonValue>,
}

/// HTTP client for the execution backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    config: BackendConfig,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Lists the names of the templates in the backend's catalog.
    pub async fn list_templates(&self) -> Result<Vec<String>, BackendError> {
        let url = format!("{}/tenkai/workflows", self.config.base_url);
        let response = check(self.http.get(url).send().await?)?;
        let body: TemplateListResponse = response.json().await?;
        Ok(body.workflows)
    }

    /// Fetches a named template and parses it into a [`Graph`].
    pub async fn get_template(&self, name: &str) -> Result<Graph, BackendError> {
        let url = format!("{}/tenkai/workflows/{}", self.config.base_url, name);
        let response = check(self.http.get(url).send().await?)?;
        let value: JsonValue = response.json().await?;
        Ok(Graph::from_value(value)?)
    }

    /// Fetches the valid string choices for a named choice category.
    pub async fn get_choices(&self, category: &str) -> Result<Vec<String>, BackendError> {
        let url = format!("{}/tenkai/get_choices", self.config.base_url);
        let response = check(
            self.http
                .get(url)
                .query(&[("type", category)])
                .send()
                .await?,
        )?;
        let body: ChoicesResponse = response.json().await?;
        Ok(body.choices)
    }

    /// Lists the backend's output gallery, directory-style.
    pub async fn list_gallery(&self, subfolder: &str) -> Result<Vec<GalleryEntry>, BackendError> {
        let url = format!("{}/tenkai/gallery", self.config.base_url);
        let response = check(
            self.http
                .get(url)
                .query(&[("subfolder", subfolder)])
                .send()
                .await?,
        )?;
        Ok(response.json().await?)
    }

    /// Uploads an image and returns the backend-assigned filename, which
    /// becomes the resolved value of an image input slot.
    pub async fn upload_image(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BackendError> {
        let url = format!("{}/upload/image", self.config.base_url);
        let form = Form::new().part("image", Part::bytes(bytes).file_name(filename.to_string()));
        let response = check(self.http.post(url).multipart(form).send().await?)?;
        let body: JsonValue = response.json().await?;
        body.get("name")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or(BackendError::MalformedResponse { field: "name" })
    }

    /// Submits a resolved graph and returns the backend's correlation id.
    pub async fn submit(
        &self,
        resolved: &Graph,
        session_id: &str,
    ) -> Result<String, BackendError> {
        let url = format!("{}/prompt", self.config.base_url);
        let body = serde_json::json!({
            "prompt": resolved.to_value(),
            "client_id": session_id,
        });
        debug!(session_id, nodes = resolved.len(), "submitting resolved graph");
        let response = check(self.http.post(url).json(&body).send().await?)?;
        let body: JsonValue = response.json().await?;
        body.get("prompt_id")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or(BackendError::MalformedResponse { field: "prompt_id" })
    }
}

/// Non-2xx responses carry no guaranteed body shape; only the status is kept.
fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(BackendError::Status {
            status: status.as_u16(),
        })
    }
}
