//! Asset resolution for canvas objects.
//!
//! An object's SVG path is first requested as an image resource. If that fails,
//! the raw SVG text is fetched and wrapped as an inline `image/svg+xml` image.
//! Both paths produce the same [`ImageHandle`], so the caller never needs to
//! know which one succeeded.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::error::AssetError;

pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";

/// Which strategy produced an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Served as an image resource
    Direct,
    /// Built locally from the raw SVG text
    Inline,
}

/// Loaded image bytes ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    pub source: ImageSource,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Fetches mold assets from the static file server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Request `path` as an image resource.
    async fn fetch_image(&self, path: &str) -> Result<ImageHandle, AssetError>;

    /// Request `path` as text.
    async fn fetch_text(&self, path: &str) -> Result<String, AssetError>;
}

/// [`AssetFetcher`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAssetFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAssetFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn asset_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, AssetError> {
        let response = self
            .client
            .get(self.asset_url(path))
            .send()
            .await
            .map_err(|e| AssetError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AssetError::Status(response.status().as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch_image(&self, path: &str) -> Result<ImageHandle, AssetError> {
        let response = self.get(path).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(AssetError::NotAnImage(content_type));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AssetError::Request(e.to_string()))?;
        Ok(ImageHandle {
            source: ImageSource::Direct,
            content_type,
            bytes: bytes.to_vec(),
        })
    }

    async fn fetch_text(&self, path: &str) -> Result<String, AssetError> {
        self.get(path)
            .await?
            .text()
            .await
            .map_err(|e| AssetError::Request(e.to_string()))
    }
}

/// Load the asset at `path`, falling back to an inline SVG image.
///
/// Only the fallback's error is returned; the direct failure is logged.
pub async fn resolve_image(fetcher: &dyn AssetFetcher, path: &str) -> Result<ImageHandle, AssetError> {
    match fetcher.fetch_image(path).await {
        Ok(image) => return Ok(image),
        Err(e) => tracing::debug!("Direct load of '{}' failed ({}), trying inline", path, e),
    }

    let svg = fetcher.fetch_text(path).await?;
    Ok(ImageHandle {
        source: ImageSource::Inline,
        content_type: SVG_CONTENT_TYPE.to_string(),
        bytes: svg.into_bytes(),
    })
}
