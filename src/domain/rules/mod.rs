// Domain rules - Classification of process results

use crate::domain::errors::*;
use crate::domain::model::*;

/// Output fragments that mean the encoder failed even when it exits cleanly
pub const ENCODER_FAILURE_MARKERS: &[&str] = &["could not open", "failed to open"];

/// Highest exit code still attributed to the upload tool itself
const UPLOAD_TOOL_MAX_CODE: i32 = 99;

/// Decides whether an encoder run succeeded
pub struct EncoderClassifier;

impl EncoderClassifier {
    /// Map an encoder result to success or a structured error
    pub fn classify(result: &ProcessResult) -> Result<(), ClipError> {
        match &result.status {
            ProcessStatus::LaunchFailed(reason) => Err(ClipError::LaunchFailure {
                program: result.program.clone(),
                reason: reason.clone(),
            }),
            ProcessStatus::Aborted => Err(ClipError::Cancelled),
            ProcessStatus::Exited(0) => match Self::failure_marker(result) {
                Some(marker) => Err(ClipError::ProcessFailure {
                    program: result.program.clone(),
                    status: result.status.to_string(),
                    detail: format!("output reports '{}'", marker),
                }),
                None => Ok(()),
            },
            status => Err(ClipError::ProcessFailure {
                program: result.program.clone(),
                status: status.to_string(),
                detail: result
                    .last_output_line()
                    .unwrap_or("no output")
                    .to_string(),
            }),
        }
    }

    /// First failure marker found in the captured output
    pub fn failure_marker(result: &ProcessResult) -> Option<&'static str> {
        let stdout = result.stdout.to_lowercase();
        let stderr = result.stderr.to_lowercase();
        ENCODER_FAILURE_MARKERS
            .iter()
            .copied()
            .find(|marker| stdout.contains(marker) || stderr.contains(marker))
    }
}

/// Decides whether an upload run succeeded and extracts the URL
///
/// Exit codes up to 99 come from the upload tool; anything else means the
/// command itself could not be executed.
pub struct UploadClassifier;

impl UploadClassifier {
    pub fn classify(result: &ProcessResult) -> Result<String, ClipError> {
        match &result.status {
            ProcessStatus::Exited(0) => {
                let url = result.stdout.trim();
                if url.starts_with("http://") || url.starts_with("https://") {
                    Ok(url.to_string())
                } else if url.is_empty() {
                    Err(ClipError::Upload("host returned an empty response".to_string()))
                } else {
                    Err(ClipError::Upload(format!("host rejected the file: {}", url)))
                }
            }
            ProcessStatus::Exited(code) if (1..=UPLOAD_TOOL_MAX_CODE).contains(code) => {
                Err(ClipError::Upload(format!(
                    "{} reported error {}: {}",
                    result.program,
                    code,
                    result.last_output_line().unwrap_or("no output")
                )))
            }
            ProcessStatus::Aborted => Err(ClipError::Cancelled),
            status => Err(ClipError::Upload(format!(
                "could not execute {} ({})",
                result.program, status
            ))),
        }
    }
}
