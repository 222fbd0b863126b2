use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::{MalwareScanner, ScanAnalysis};
use crate::core::config::ScannerConfig;
use crate::core::error::{AppError, Result};

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    data: SubmitData,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    data: AnalysisData,
}

#[derive(Debug, Deserialize)]
struct AnalysisData {
    attributes: AnalysisAttributes,
}

#[derive(Debug, Deserialize)]
struct AnalysisAttributes {
    status: String,
    #[serde(default)]
    stats: AnalysisStats,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisStats {
    #[serde(default)]
    malicious: u64,
}

impl From<AnalysisResponse> for ScanAnalysis {
    fn from(response: AnalysisResponse) -> Self {
        let attributes = response.data.attributes;
        Self {
            status: attributes.status,
            malicious: attributes.stats.malicious,
        }
    }
}

/// VirusTotal v3 API client (`/files` and `/analyses/{id}`)
pub struct VirusTotalClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl VirusTotalClient {
    pub fn new(config: &ScannerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("VirusTotal {} failed: {} - {}", what, status, body);
            return Err(AppError::ExternalServiceError(format!(
                "Malware scanner returned {} for {}",
                status, what
            )));
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to parse VirusTotal {} response: {:?}", what, e);
            AppError::ExternalServiceError(format!("Invalid scanner response for {}", what))
        })
    }
}

#[async_trait]
impl MalwareScanner for VirusTotalClient {
    async fn submit(&self, file_name: &str, data: Vec<u8>) -> Result<String> {
        let form = Form::new().part("file", Part::bytes(data).file_name(file_name.to_string()));

        let response = self
            .client
            .post(format!("{}/files", self.base_url))
            .header("x-apikey", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("VirusTotal upload request failed: {:?}", e);
                AppError::ExternalServiceError(format!("Malware scanner unreachable: {}", e))
            })?;

        let submitted: SubmitResponse = Self::read_json(response, "upload").await?;
        tracing::info!("File submitted for scanning: scan_id={}", submitted.data.id);
        Ok(submitted.data.id)
    }

    async fn analysis(&self, scan_id: &str) -> Result<ScanAnalysis> {
        let response = self
            .client
            .get(format!(
                "{}/analyses/{}",
                self.base_url,
                urlencoding::encode(scan_id)
            ))
            .header("x-apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("VirusTotal analysis request failed: {:?}", e);
                AppError::ExternalServiceError(format!("Malware scanner unreachable: {}", e))
            })?;

        let analysis: AnalysisResponse = Self::read_json(response, "analysis").await?;
        Ok(analysis.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::scanner::ScanVerdict;

    #[test]
    fn test_parse_submit_response() {
        let body = r#"{"data": {"type": "analysis", "id": "NjY0MjRlOTFjMDIyYTkyNWM0NjU2NWQzYWNlMzFmZmI6MTQ3NTA0ODI3Nw=="}}"#;
        let parsed: SubmitResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.data.id.starts_with("NjY0"));
    }

    #[test]
    fn test_parse_completed_analysis() {
        let body = r#"{
            "data": {
                "attributes": {
                    "status": "completed",
                    "stats": {"harmless": 0, "malicious": 0, "suspicious": 0, "undetected": 60}
                },
                "id": "x",
                "type": "analysis"
            }
        }"#;
        let parsed: AnalysisResponse = serde_json::from_str(body).unwrap();
        assert_eq!(ScanAnalysis::from(parsed).verdict(), ScanVerdict::Safe);
    }

    #[test]
    fn test_parse_queued_analysis_without_stats() {
        let body = r#"{"data": {"attributes": {"status": "queued"}}}"#;
        let parsed: AnalysisResponse = serde_json::from_str(body).unwrap();
        assert_eq!(ScanAnalysis::from(parsed).verdict(), ScanVerdict::Pending);
    }
}
