//! Where background bytes come from.

use async_trait::async_trait;
use emoji_art_core::FetchError;
use reqwest::Client;
use url::Url;

use crate::decode::decode_data_url;
use crate::error::LoaderResult;

/// Retrieves the encoded bytes behind a background URL.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch the raw bytes at `url`.
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Fetches `http(s):` over HTTP, and reads `data:` and `file:` URLs locally.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    http: Client,
}

impl HttpImageSource {
    /// Create a source with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> LoaderResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("emoji-art/", env!("CARGO_PKG_VERSION")))
            // Disable proxy detection to avoid macOS system-configuration panic
            .no_proxy()
            .build()?;
        Ok(Self { http })
    }

    /// Wrap an existing client.
    #[must_use]
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    async fn fetch_http(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let network = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(network)?
            .error_for_status()
            .map_err(network)?;
        let bytes = response.bytes().await.map_err(network)?;
        tracing::debug!("Fetched {} bytes from {url}", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn read_file(url: &Url) -> Result<Vec<u8>, FetchError> {
        let path = url
            .to_file_path()
            .map_err(|()| FetchError::UnsupportedScheme(format!("non-local file URL {url}")))?;
        tokio::fs::read(&path).await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        match url.scheme() {
            "http" | "https" => self.fetch_http(url).await,
            "data" => decode_data_url(url.as_str()),
            "file" => Self::read_file(url).await,
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let source = HttpImageSource::new().expect("client");
        let url: Url = "ftp://example.com/a.png".parse().expect("url");
        assert_eq!(
            source.fetch(&url).await,
            Err(FetchError::UnsupportedScheme("ftp".into()))
        );
    }

    #[tokio::test]
    async fn test_data_and_file_urls() {
        let source = HttpImageSource::new().expect("client");
        let url: Url = "data:,hello".parse().expect("url");
        assert_eq!(source.fetch(&url).await.expect("data"), b"hello".to_vec());

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bg.bin");
        std::fs::write(&path, [1u8, 2, 3]).expect("write");
        let url = Url::from_file_path(&path).expect("file url");
        assert_eq!(source.fetch(&url).await.expect("file"), vec![1, 2, 3]);

        let missing = Url::from_file_path(dir.path().join("missing.png")).expect("file url");
        assert!(matches!(
            source.fetch(&missing).await,
            Err(FetchError::Network { .. })
        ));
    }
}
