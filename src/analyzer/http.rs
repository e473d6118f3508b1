//! HTTPバックエンド
//!
//! - `POST {BACKEND_URL}/analyze-label` (multipart, フィールド名 `file`)
//! - `GET {BACKEND_URL}/health`

use super::AnalysisBackend;
use crate::config::Config;
use crate::error::Result;
use laundry_advisor_common::{
    AnalysisError, AnalysisOutcome, AnalyzeResponse, HealthResponse, SelectedImage,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, warn};

pub const ANALYZE_PATH: &str = "analyze-label";
pub const HEALTH_PATH: &str = "health";

/// multipartのフィールド名
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: Url, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    /// 設定から生成（BACKEND_URLがなければエラー）
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.backend_url()?, config.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// ベースURLにパスを連結（ベースURL側のパスは維持）
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl AnalysisBackend for HttpBackend {
    async fn analyze(&self, image: &SelectedImage) -> std::result::Result<AnalysisOutcome, AnalysisError> {
        let url = self.endpoint(ANALYZE_PATH);
        debug!(%url, file = %image.file_name, bytes = image.len(), "sending label image");

        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)
            .map_err(transport_error)?;
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        debug!(status = status.as_u16(), body_len = body.len(), "analysis response received");

        if !status.is_success() {
            warn!(status = status.as_u16(), "analysis request failed");
            return Err(AnalysisError::from_status(
                status.as_u16(),
                status.canonical_reason(),
                &body,
            ));
        }

        AnalyzeResponse::from_body(&body)?.into_outcome()
    }

    async fn health(&self) -> std::result::Result<HealthResponse, AnalysisError> {
        let url = self.endpoint(HEALTH_PATH);
        debug!(%url, "health check");

        let response = self.client.get(&url).send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(AnalysisError::from_status(
                status.as_u16(),
                status.canonical_reason(),
                &body,
            ));
        }

        serde_json::from_str(&body)
            .map_err(|e| AnalysisError::Malformed(format!("Invalid health response: {}", e)))
    }
}

fn transport_error(err: reqwest::Error) -> AnalysisError {
    if err.is_timeout() {
        AnalysisError::Transport("request timed out".into())
    } else {
        AnalysisError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(url: &str) -> HttpBackend {
        HttpBackend::new(Url::parse(url).unwrap(), None).unwrap()
    }

    #[test]
    fn test_endpoint_root() {
        let backend = backend("http://localhost:8000");
        assert_eq!(backend.endpoint(ANALYZE_PATH), "http://localhost:8000/analyze-label");
        assert_eq!(backend.endpoint("/health"), "http://localhost:8000/health");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let backend = backend("https://api.example.com/v1/");
        assert_eq!(backend.endpoint(ANALYZE_PATH), "https://api.example.com/v1/analyze-label");
    }

    #[test]
    fn test_from_config_requires_url() {
        let config = Config::default();
        assert!(HttpBackend::from_config(&config).is_err());
    }
}
