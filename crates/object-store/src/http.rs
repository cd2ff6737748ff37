//! Client for a hosted blob REST API (Vercel Blob compatible).
//!
//! Uploads are `PUT {api}/{pathname}`, listings `GET {api}?prefix=..`,
//! deletes `POST {api}/delete`. Object reads go straight to the object url
//! with cache-bypass headers since the objects sit behind a CDN.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::header::{HeaderValue, AUTHORIZATION, CACHE_CONTROL, PRAGMA};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::backend::{suffixed_pathname, BlobBackend, BlobObject};
use crate::error::{BlobError, Result};

pub const DEFAULT_API_URL: &str = "https://blob.vercel-storage.com";

const API_VERSION: &str = "7";
const LIST_PAGE_SIZE: &str = "1000";

#[derive(Debug, Deserialize)]
struct PutResponse {
    url: String,
    pathname: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    blobs: Vec<BlobObject>,
    cursor: Option<String>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    urls: [&'a str; 1],
}

/// [`BlobBackend`] speaking the hosted blob REST API.
#[derive(Clone)]
pub struct HttpBlobBackend {
    api_url: Url,
    token: Option<String>,
    client: Client,
}

impl fmt::Debug for HttpBlobBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBlobBackend")
            .field("api_url", &self.api_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HttpBlobBackend {
    pub fn new(api_url: Url, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| BlobError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            api_url,
            token: token.filter(|t| !t.trim().is_empty()),
            client,
        })
    }

    fn token(&self) -> Result<&str> {
        self.token.as_deref().ok_or(BlobError::NotConfigured)
    }

    fn bearer(&self) -> Result<HeaderValue> {
        HeaderValue::from_str(&format!("Bearer {}", self.token()?))
            .map_err(|e| BlobError::InvalidConfig(format!("token is not a valid header: {}", e)))
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.api_url.as_str().trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path.trim_start_matches('/'))
        }
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BlobError::Rejected { status, body })
    }
}

#[async_trait]
impl BlobBackend for HttpBlobBackend {
    async fn put(&self, prefix: &str, data: Bytes, content_type: &str) -> Result<BlobObject> {
        let pathname = suffixed_pathname(prefix);
        let size = data.len();

        let response = self
            .client
            .put(self.endpoint(&pathname))
            .header(AUTHORIZATION, self.bearer()?)
            .header("x-api-version", API_VERSION)
            .header("x-content-type", content_type)
            .header("x-add-random-suffix", "0")
            .body(data)
            .send()
            .await?;
        let created: PutResponse = Self::check(response).await?.json().await?;

        tracing::debug!(url = %created.url, size = size, "blob uploaded");

        // The upload response carries no timestamp; the backend stamps the
        // object on acceptance, which is now from our point of view.
        Ok(BlobObject {
            url: created.url,
            pathname: created.pathname,
            uploaded_at: Utc::now(),
        })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>> {
        let mut objects = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.endpoint(""))
                .header(AUTHORIZATION, self.bearer()?)
                .header("x-api-version", API_VERSION)
                .query(&[("prefix", prefix), ("limit", LIST_PAGE_SIZE)]);
            if let Some(cursor) = &cursor {
                request = request.query(&[("cursor", cursor.as_str())]);
            }

            let page: ListResponse = Self::check(request.send().await?).await?.json().await?;
            objects.extend(
                page.blobs
                    .into_iter()
                    .filter(|blob| blob.pathname.starts_with(prefix)),
            );

            match (page.has_more, page.cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(objects)
    }

    async fn get(&self, url: &str) -> Result<Bytes> {
        self.token()?;

        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-cache, no-store, must-revalidate")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BlobError::NotFound(url.to_string()));
        }
        Ok(Self::check(response).await?.bytes().await?)
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("delete"))
            .header(AUTHORIZATION, self.bearer()?)
            .header("x-api-version", API_VERSION)
            .json(&DeleteRequest { urls: [url] })
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response).await?;
        Ok(())
    }
}
