//! Optional delegation to an external detection process.
//!
//! The original system shells out to a Python ensemble script when one is
//! available and silently falls back to randomized fixtures when it is not.
//! Here that optionality is a typed capability: callers get an explicit
//! `Result` and choose the fallback branch themselves instead of hiding it
//! behind a caught exception.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// One synthesized traffic observation handed to the detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficRecord {
    pub source_ip: String,
    pub dest_port: u16,
    pub protocol: String,
    pub bytes: u64,
    pub packets: u32,
    pub duration_ms: u64,
}

/// Per-record verdict returned by the detector (or its fallback).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficVerdict {
    pub is_attack: bool,
    pub attack_type: String,
    /// Percentage in [0, 100].
    pub confidence: i32,
}

/// Stdout shape of the detection script: `{"results": [...], "summary": ...}`,
/// or `{"error": "...", "results": []}` when it failed internally (it still
/// exits zero in that case).
#[derive(Debug, Deserialize)]
struct DetectorOutput {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    results: Vec<ScriptVerdict>,
}

/// One entry of the script's `results` array. Confidence is a float
/// probability; the script has no explicit attack flag, it marks non-attacks
/// with the `normal` category.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScriptVerdict {
    attack_type: String,
    confidence: f64,
}

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("no detector script configured")]
    NotConfigured,
    #[error("failed to spawn detector: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("detector timed out after {0:?}")]
    Timeout(Duration),
    #[error("detector exited with {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
    #[error("detector reported an error: {0}")]
    Script(String),
    #[error("malformed detector output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A scoring backend the scan simulator and traffic-analysis endpoint can
/// delegate to. Failure is an expected outcome, not an exception.
pub trait DetectionBackend {
    fn try_detect(
        &self,
        batch: &[TrafficRecord],
    ) -> impl std::future::Future<Output = Result<Vec<TrafficVerdict>, DetectorError>> + Send;
}

/// Runs the configured script with `{"traffic": [...]}` as JSON on stdin and
/// parses the `{"results": [...]}` it prints on stdout.
#[derive(Debug, Clone)]
pub struct ScriptDetector {
    script: PathBuf,
    timeout: Duration,
}

impl ScriptDetector {
    pub fn new(script: PathBuf, timeout: Duration) -> Self {
        Self { script, timeout }
    }
}

/// Wrap the batch in the script's input envelope. The script reads the source
/// address under `src`, the rest of each record passes through as loose
/// feature fields.
fn build_script_payload(batch: &[TrafficRecord]) -> Result<Vec<u8>, serde_json::Error> {
    let traffic: Vec<serde_json::Value> = batch
        .iter()
        .map(|record| {
            let mut value = serde_json::to_value(record)?;
            if let Some(fields) = value.as_object_mut() {
                if let Some(ip) = fields.remove("sourceIp") {
                    fields.insert("src".to_string(), ip);
                }
            }
            Ok(value)
        })
        .collect::<Result<_, serde_json::Error>>()?;
    serde_json::to_vec(&serde_json::json!({ "traffic": traffic }))
}

/// Map the script's verdicts onto ours: the attack flag is derived from the
/// category, and the float probability becomes a percentage.
fn parse_script_output(stdout: &[u8]) -> Result<Vec<TrafficVerdict>, DetectorError> {
    let parsed: DetectorOutput = serde_json::from_slice(stdout)?;
    if let Some(error) = parsed.error {
        return Err(DetectorError::Script(error));
    }
    Ok(parsed
        .results
        .into_iter()
        .map(|v| {
            let confidence = if v.confidence <= 1.0 {
                v.confidence * 100.0
            } else {
                v.confidence
            };
            TrafficVerdict {
                is_attack: !v.attack_type.eq_ignore_ascii_case("normal"),
                attack_type: v.attack_type,
                confidence: confidence.round().clamp(0.0, 100.0) as i32,
            }
        })
        .collect())
}

impl DetectionBackend for ScriptDetector {
    async fn try_detect(
        &self,
        batch: &[TrafficRecord],
    ) -> Result<Vec<TrafficVerdict>, DetectorError> {
        let payload = build_script_payload(batch)?;

        let mut child = Command::new("python3")
            .arg(&self.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&payload).await?;
            // Close stdin so the script sees EOF.
            drop(stdin);
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| DetectorError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(DetectorError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let verdicts = parse_script_output(&output.stdout)?;
        debug!(records = batch.len(), verdicts = verdicts.len(), "detector succeeded");
        Ok(verdicts)
    }
}

/// Stand-in when no script is configured; always fails so callers take their
/// fallback branch.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDetector;

impl DetectionBackend for NullDetector {
    async fn try_detect(
        &self,
        _batch: &[TrafficRecord],
    ) -> Result<Vec<TrafficVerdict>, DetectorError> {
        Err(DetectorError::NotConfigured)
    }
}

/// Runtime-selected backend held in application state.
#[derive(Debug, Clone)]
pub enum Detector {
    Script(ScriptDetector),
    Disabled,
}

impl Detector {
    pub fn from_config(script: Option<PathBuf>, timeout: Duration) -> Self {
        match script {
            Some(path) => Detector::Script(ScriptDetector::new(path, timeout)),
            None => Detector::Disabled,
        }
    }
}

impl DetectionBackend for Detector {
    async fn try_detect(
        &self,
        batch: &[TrafficRecord],
    ) -> Result<Vec<TrafficVerdict>, DetectorError> {
        match self {
            Detector::Script(s) => s.try_detect(batch).await,
            Detector::Disabled => NullDetector.try_detect(batch).await,
        }
    }
}
