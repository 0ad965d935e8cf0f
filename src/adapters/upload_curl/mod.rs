// Curl upload adapter - Multipart upload of finished clips to catbox/litterbox

use std::path::Path;
use std::process::Command;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::UploadClassifier;
use crate::ports::*;

const CATBOX_ENDPOINT: &str = "https://catbox.moe/user/api.php";
const LITTERBOX_ENDPOINT: &str = "https://litterbox.catbox.moe/resources/internals/api.php";

/// Uploads through a single blocking `curl` invocation
#[derive(Debug, Clone)]
pub struct CurlUploadAdapter {
    program: String,
    retention: String,
}

impl CurlUploadAdapter {
    pub fn new(retention: impl Into<String>) -> Self {
        Self {
            program: "curl".to_string(),
            retention: retention.into(),
        }
    }

    /// Use a different curl binary
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Command line for uploading `file` to `host`
    pub fn upload_spec(&self, file: &Path, host: UploadHost) -> ProcessSpec {
        let spec = ProcessSpec::new(&self.program)
            .args(["--silent", "--show-error", "--fail"])
            .args(["-F", "reqtype=fileupload"]);
        let spec = match host {
            UploadHost::Temporary => spec.arg("-F").arg(format!("time={}", self.retention)),
            UploadHost::Permanent => spec,
        };
        spec.arg("-F")
            .arg(format!("fileToUpload=@{}", file.display()))
            .arg(match host {
                UploadHost::Temporary => LITTERBOX_ENDPOINT,
                UploadHost::Permanent => CATBOX_ENDPOINT,
            })
    }

    /// Run `spec` to completion on the current thread
    fn run_blocking(spec: &ProcessSpec) -> ProcessResult {
        match Command::new(spec.program()).args(spec.arguments()).output() {
            Ok(output) => ProcessResult {
                program: spec.program().to_string(),
                status: match output.status.code() {
                    Some(code) => ProcessStatus::Exited(code),
                    None => ProcessStatus::Signaled,
                },
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Err(e) => ProcessResult::launch_failed(spec.program(), e.to_string()),
        }
    }
}

#[async_trait]
impl UploadPort for CurlUploadAdapter {
    async fn upload(&self, file: &Path, host: UploadHost) -> Result<String, ClipError> {
        if !file.is_file() {
            return Err(ClipError::Upload(format!(
                "file does not exist: {}",
                file.display()
            )));
        }

        let spec = self.upload_spec(file, host);
        info!(file = %file.display(), host = %host, "uploading clip");

        let result = tokio::task::spawn_blocking(move || Self::run_blocking(&spec))
            .await
            .map_err(|e| ClipError::Internal(format!("upload task failed: {}", e)))?;

        match UploadClassifier::classify(&result) {
            Ok(url) => {
                info!(url = %url, "upload finished");
                Ok(url)
            }
            Err(err) => {
                warn!(error = %err, "upload failed");
                Err(err)
            }
        }
    }
}
