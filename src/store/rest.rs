use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::json;

use async_trait::async_trait;

use super::{ResourceKind, ResourceStore, StoreError};
use crate::model::comment::{Comment, NewComment};
use crate::model::item::BoardItem;

/// Every request times out rather than hanging on a dead connection.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// `ResourceStore` over the backend's REST API.
pub struct RestStore {
    base_url: String,
    api_token: Option<String>,
    client: reqwest::Client,
}

impl RestStore {
    pub fn new(base_url: String, api_token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            client,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, StoreError> {
        let resp = req
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(map_status(status, &body))
    }

    async fn json_of<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, StoreError> {
        resp.json()
            .await
            .map_err(|e| StoreError::Network(format!("bad response body: {e}")))
    }
}

/// Uniform HTTP-status-to-error mapping. Anything not listed is a transport
/// or server failure and rolls up as Network.
pub(crate) fn map_status(status: StatusCode, body: &str) -> StoreError {
    let detail = if body.trim().is_empty() {
        status.to_string()
    } else {
        body.trim().chars().take(200).collect()
    };
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            StoreError::Validation(detail)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Authorization(detail),
        StatusCode::NOT_FOUND => StoreError::NotFound(detail),
        _ => StoreError::Network(detail),
    }
}

#[async_trait]
impl ResourceStore for RestStore {
    async fn fetch_items(&self, kind: ResourceKind) -> Result<Vec<BoardItem>, StoreError> {
        let path = format!("/{}", kind.path_segment());
        let resp = self.send(self.request(Method::GET, &path)).await?;
        Self::json_of(resp).await
    }

    async fn update_status(
        &self,
        kind: ResourceKind,
        id: &str,
        status: &str,
    ) -> Result<(), StoreError> {
        let path = format!("/{}/{id}", kind.path_segment());
        let req = self
            .request(Method::PATCH, &path)
            .json(&json!({ "status": status }));
        // The backend echoes the updated item; the optimistic state is
        // already correct so the payload is not merged back.
        self.send(req).await?;
        Ok(())
    }

    async fn fetch_comments(&self, test_case_id: i64) -> Result<Vec<Comment>, StoreError> {
        let path = format!("/test-cases/{test_case_id}/comments");
        let resp = self.send(self.request(Method::GET, &path)).await?;
        Self::json_of(resp).await
    }

    async fn create_comment(&self, draft: &NewComment) -> Result<Comment, StoreError> {
        let req = self.request(Method::POST, "/comments").json(draft);
        let resp = self.send(req).await?;
        Self::json_of(resp).await
    }

    async fn update_comment(&self, id: i64, content: &str) -> Result<Comment, StoreError> {
        let req = self
            .request(Method::PATCH, &format!("/comments/{id}"))
            .json(&json!({ "content": content }));
        let resp = self.send(req).await?;
        Self::json_of(resp).await
    }

    async fn delete_comment(&self, id: i64) -> Result<(), StoreError> {
        // 204 with an empty body is the success case.
        self.send(self.request(Method::DELETE, &format!("/comments/{id}")))
            .await?;
        Ok(())
    }
}
