//! Uptime Kuma API client
//!
//! Talks to an Uptime Kuma REST gateway: `/monitors`, `/monitors/{id}`,
//! `/tags` and `/monitors/{id}/tag`.

use crate::error::UptimeKumaError;
use crate::kuma_trait::UptimeKumaClientTrait;
use crate::models::{
    CreateTagRequest, Listing, Monitor, MonitorCreated, MonitorRequest, MonitorTagRequest, Tag,
    TagCreated,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Uptime Kuma API client
#[derive(Clone)]
pub struct UptimeKumaClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for UptimeKumaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UptimeKumaClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl UptimeKumaClient {
    /// Create a new Uptime Kuma client
    ///
    /// # Arguments
    /// * `base_url` - Gateway base URL (e.g., "http://uptime-kuma-api:8000")
    /// * `token` - Optional bearer token; requests are unauthenticated without it
    pub fn new(base_url: String, token: Option<String>) -> Result<Self, UptimeKumaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self
            .client
            .request(method, url)
            .header("Accept", "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Map non-2xx responses onto error variants
    async fn check_status(response: Response, what: &str) -> Result<Response, UptimeKumaError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => UptimeKumaError::NotFound(format!("{what}: {body}")),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                UptimeKumaError::Authentication(format!("{what}: {status} - {body}"))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                UptimeKumaError::InvalidRequest(format!("{what}: {status} - {body}"))
            }
            _ => UptimeKumaError::Api(format!("Failed to {what}: {status} - {body}")),
        })
    }

    /// Decode a JSON body, keeping a prefix of the raw text in the error
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, UptimeKumaError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            UptimeKumaError::Api(format!(
                "error decoding response body: {} - Response (first 500 chars): {}",
                e,
                text.chars().take(500).collect::<String>()
            ))
        })
    }
}

#[async_trait::async_trait]
impl UptimeKumaClientTrait for UptimeKumaClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list_monitors(&self) -> Result<Vec<Monitor>, UptimeKumaError> {
        debug!("Listing monitors");
        let response = self.request(Method::GET, "/monitors").send().await?;
        let response = Self::check_status(response, "list monitors").await?;
        let listing: Listing<Monitor> = Self::decode(response).await?;
        Ok(listing.into_items())
    }

    async fn create_monitor(&self, request: &MonitorRequest) -> Result<u64, UptimeKumaError> {
        debug!("Creating monitor {} -> {}", request.name, request.url);
        let response = self
            .request(Method::POST, "/monitors")
            .json(request)
            .send()
            .await?;
        let response = Self::check_status(response, "create monitor").await?;
        let created: MonitorCreated = Self::decode(response).await?;
        Ok(created.monitor_id)
    }

    async fn edit_monitor(&self, id: u64, request: &MonitorRequest) -> Result<(), UptimeKumaError> {
        debug!("Editing monitor {} ({})", id, request.name);
        let response = self
            .request(Method::PATCH, &format!("/monitors/{id}"))
            .json(request)
            .send()
            .await?;
        Self::check_status(response, &format!("edit monitor {id}")).await?;
        Ok(())
    }

    async fn delete_monitor(&self, id: u64) -> Result<(), UptimeKumaError> {
        debug!("Deleting monitor {}", id);
        let response = self
            .request(Method::DELETE, &format!("/monitors/{id}"))
            .send()
            .await?;
        Self::check_status(response, &format!("delete monitor {id}")).await?;
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, UptimeKumaError> {
        debug!("Listing tags");
        let response = self.request(Method::GET, "/tags").send().await?;
        let response = Self::check_status(response, "list tags").await?;
        let listing: Listing<Tag> = Self::decode(response).await?;
        Ok(listing.into_items())
    }

    async fn create_tag(&self, name: &str, color: &str) -> Result<Tag, UptimeKumaError> {
        debug!("Creating tag {}", name);
        let response = self
            .request(Method::POST, "/tags")
            .json(&CreateTagRequest { name, color })
            .send()
            .await?;
        let response = Self::check_status(response, &format!("create tag {name}")).await?;
        let created: TagCreated = Self::decode(response).await?;
        Ok(created.into_tag(name, color))
    }

    async fn add_monitor_tag(&self, monitor_id: u64, tag_id: u64) -> Result<(), UptimeKumaError> {
        debug!("Attaching tag {} to monitor {}", tag_id, monitor_id);
        let response = self
            .request(Method::POST, &format!("/monitors/{monitor_id}/tag"))
            .json(&MonitorTagRequest { tag_id, value: String::new() })
            .send()
            .await?;
        Self::check_status(
            response,
            &format!("attach tag {tag_id} to monitor {monitor_id}"),
        )
        .await?;
        Ok(())
    }

    async fn delete_monitor_tag(
        &self,
        monitor_id: u64,
        tag_id: u64,
    ) -> Result<(), UptimeKumaError> {
        debug!("Detaching tag {} from monitor {}", tag_id, monitor_id);
        let response = self
            .request(Method::DELETE, &format!("/monitors/{monitor_id}/tag"))
            .json(&MonitorTagRequest { tag_id, value: String::new() })
            .send()
            .await?;
        Self::check_status(
            response,
            &format!("detach tag {tag_id} from monitor {monitor_id}"),
        )
        .await?;
        Ok(())
    }
}
