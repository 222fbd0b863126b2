//! Malware scanning.
//!
//! The file pipeline only sees [`MalwareScanner`]; [`VirusTotalClient`] is the
//! production implementation.

mod virustotal_client;

pub use virustotal_client::VirusTotalClient;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

use crate::core::error::{AppError, Result};

/// Snapshot of a scan as reported by the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanAnalysis {
    pub status: String,
    pub malicious: u64,
}

/// What the pipeline does with a scan result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanVerdict {
    Pending,
    Safe,
    Unsafe,
}

impl ScanAnalysis {
    pub fn verdict(&self) -> ScanVerdict {
        if self.status != "completed" {
            ScanVerdict::Pending
        } else if self.malicious == 0 {
            ScanVerdict::Safe
        } else {
            ScanVerdict::Unsafe
        }
    }
}

#[async_trait]
pub trait MalwareScanner: Send + Sync {
    /// Submit bytes for analysis, returning the scan id
    async fn submit(&self, file_name: &str, data: Vec<u8>) -> Result<String>;

    /// Current state of a scan
    async fn analysis(&self, scan_id: &str) -> Result<ScanAnalysis>;
}

/// Poll budget for [`await_verdict`]
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

/// Poll until the scan completes or the budget runs out.
///
/// A completed clean scan is `Ok`; an unfinished scan or a detection is a 400.
pub async fn await_verdict(
    scanner: &dyn MalwareScanner,
    scan_id: &str,
    policy: PollPolicy,
) -> Result<()> {
    for attempt in 1..=policy.attempts.max(1) {
        let analysis = scanner.analysis(scan_id).await?;
        match analysis.verdict() {
            ScanVerdict::Safe => return Ok(()),
            ScanVerdict::Unsafe => {
                tracing::warn!(
                    "Scan {} flagged file as malicious ({} engines)",
                    scan_id,
                    analysis.malicious
                );
                return Err(AppError::BadRequest("File deemed unsafe".to_string()));
            }
            ScanVerdict::Pending => {
                tracing::debug!(
                    "Scan {} still {} (attempt {}/{})",
                    scan_id,
                    analysis.status,
                    attempt,
                    policy.attempts
                );
                if attempt < policy.attempts {
                    tokio::time::sleep(policy.interval).await;
                }
            }
        }
    }

    Err(AppError::BadRequest("Scan not completed".to_string()))
}

/// Scanner plus poll budget, as used by the upload flow
#[derive(Clone)]
pub struct ScanPipeline {
    scanner: Arc<dyn MalwareScanner>,
    policy: PollPolicy,
}

impl ScanPipeline {
    pub fn new(scanner: Arc<dyn MalwareScanner>, policy: PollPolicy) -> Self {
        Self { scanner, policy }
    }

    /// Submit and wait for a clean verdict. Returns the scan id.
    pub async fn scan(&self, file_name: &str, data: Vec<u8>) -> Result<String> {
        let scan_id = self.scanner.submit(file_name, data).await?;
        await_verdict(self.scanner.as_ref(), &scan_id, self.policy).await?;
        Ok(scan_id)
    }

    pub async fn submit(&self, file_name: &str, data: Vec<u8>) -> Result<String> {
        self.scanner.submit(file_name, data).await
    }

    pub async fn analysis(&self, scan_id: &str) -> Result<ScanAnalysis> {
        self.scanner.analysis(scan_id).await
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Scanner that replays a fixed sequence of analyses
    pub struct ScriptedScanner {
        script: Mutex<Vec<ScanAnalysis>>,
        pub polls: AtomicU32,
    }

    impl ScriptedScanner {
        pub fn new(mut script: Vec<ScanAnalysis>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                polls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl MalwareScanner for ScriptedScanner {
        async fn submit(&self, _file_name: &str, _data: Vec<u8>) -> Result<String> {
            Ok("scan-1".to_string())
        }

        async fn analysis(&self, _scan_id: &str) -> Result<ScanAnalysis> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            let next = if script.len() > 1 {
                script.pop()
            } else {
                script.last().cloned()
            };
            next.ok_or_else(|| AppError::ExternalServiceError("empty script".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::ScriptedScanner;
    use super::*;
    use std::sync::atomic::Ordering;

    fn analysis(status: &str, malicious: u64) -> ScanAnalysis {
        ScanAnalysis {
            status: status.to_string(),
            malicious,
        }
    }

    fn policy(attempts: u32) -> PollPolicy {
        PollPolicy {
            attempts,
            interval: Duration::from_millis(0),
        }
    }

    #[test]
    fn test_verdict_rules() {
        assert_eq!(analysis("queued", 0).verdict(), ScanVerdict::Pending);
        assert_eq!(analysis("in-progress", 3).verdict(), ScanVerdict::Pending);
        assert_eq!(analysis("completed", 0).verdict(), ScanVerdict::Safe);
        assert_eq!(analysis("completed", 2).verdict(), ScanVerdict::Unsafe);
    }

    #[tokio::test]
    async fn test_await_verdict_polls_until_complete() {
        let scanner = ScriptedScanner::new(vec![
            analysis("queued", 0),
            analysis("queued", 0),
            analysis("completed", 0),
        ]);

        await_verdict(&scanner, "scan-1", policy(5)).await.unwrap();
        assert_eq!(scanner.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_await_verdict_unsafe() {
        let scanner = ScriptedScanner::new(vec![analysis("completed", 1)]);
        let err = await_verdict(&scanner, "scan-1", policy(3)).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "File deemed unsafe"));
    }

    #[tokio::test]
    async fn test_await_verdict_budget_exhausted() {
        let scanner = ScriptedScanner::new(vec![analysis("queued", 0)]);
        let err = await_verdict(&scanner, "scan-1", policy(3)).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Scan not completed"));
        assert_eq!(scanner.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_pipeline_returns_scan_id() {
        let pipeline = ScanPipeline::new(
            Arc::new(ScriptedScanner::new(vec![analysis("completed", 0)])),
            policy(2),
        );
        let scan_id = pipeline.scan("a.txt", b"hello".to_vec()).await.unwrap();
        assert_eq!(scan_id, "scan-1");
    }

    #[test]
    fn test_verdict_serialization() {
        let json = serde_json::to_value(ScanVerdict::Unsafe).unwrap();
        assert_eq!(json, "unsafe");
    }
}
