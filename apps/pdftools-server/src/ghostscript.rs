//! Ghostscript orchestration
//!
//! Runs the external conversion engine as a subprocess with two fixed
//! invocation profiles: PDF re-encoding (compress) and PDF-to-JPEG
//! rasterization. Each invocation resolves to exactly one outcome; the
//! `Result` sum type makes a double response structurally impossible.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::scratch::RequestScratch;

/// Why an engine invocation failed.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Conversion engine '{0}' could not be started")]
    ToolUnavailable(String),

    #[error("Conversion engine exited with status {code:?}")]
    ExecutionFailed { code: Option<i32>, stderr: String },

    #[error("Conversion engine produced no output files")]
    NoOutputProduced,

    #[error("Conversion engine timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Engine I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl RasterError {
    /// Log with full diagnostics; the HTTP layer only sends a generic
    /// message to the caller.
    pub fn log(&self) {
        match self {
            RasterError::ExecutionFailed { code, stderr } => {
                error!(?code, "conversion engine failed: {}", stderr);
            }
            other => error!("conversion engine error: {}", other),
        }
    }
}

/// Handle on the external conversion engine.
///
/// The semaphore caps how many engine processes run at once across all
/// requests; the timeout bounds a hung engine. Cheap to clone.
#[derive(Clone)]
pub struct Rasterizer {
    command: String,
    limit: Arc<Semaphore>,
    timeout: Duration,
}

impl Rasterizer {
    pub fn new(command: String, max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            command,
            limit: Arc::new(Semaphore::new(max_concurrent)),
            timeout,
        }
    }

    /// Re-encode a PDF through the `pdfwrite` device at the low-fidelity
    /// `/screen` preset. Returns the compressed document bytes.
    pub async fn compress(
        &self,
        scratch: &mut RequestScratch,
        input: &[u8],
    ) -> Result<Vec<u8>, RasterError> {
        let input_path = scratch.allocate("input", "pdf");
        let output_path = scratch.allocate("output", "pdf");
        scratch.write(&input_path, input).await?;

        let args = vec![
            "-sDEVICE=pdfwrite".to_string(),
            "-dCompatibilityLevel=1.4".to_string(),
            "-dPDFSETTINGS=/screen".to_string(),
            "-dNOPAUSE".to_string(),
            "-dQUIET".to_string(),
            "-dBATCH".to_string(),
            format!("-sOutputFile={}", output_path.display()),
            input_path.display().to_string(),
        ];
        self.run(&args).await?;

        match scratch.read(&output_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(RasterError::NoOutputProduced),
            Err(e) => Err(e.into()),
        }
    }

    /// Rasterize every page to a 150 DPI JPEG. Returns the produced file
    /// paths in page order; the files live until the scratch scope is
    /// released.
    pub async fn rasterize(
        &self,
        scratch: &mut RequestScratch,
        input: &[u8],
    ) -> Result<Vec<PathBuf>, RasterError> {
        let input_path = scratch.allocate("input", "pdf");
        scratch.write(&input_path, input).await?;
        let pattern = scratch.output_pattern("jpg");

        let args = vec![
            "-sDEVICE=jpeg".to_string(),
            "-r150".to_string(),
            "-dNOPAUSE".to_string(),
            "-dBATCH".to_string(),
            format!("-sOutputFile={}", pattern.display()),
            input_path.display().to_string(),
        ];
        self.run(&args).await?;

        let outputs = scratch.numbered_outputs("jpg").await?;
        if outputs.is_empty() {
            return Err(RasterError::NoOutputProduced);
        }
        Ok(outputs)
    }

    async fn run(&self, args: &[String]) -> Result<(), RasterError> {
        let _permit = self
            .limit
            .acquire()
            .await
            .expect("engine semaphore is never closed");

        debug!(command = %self.command, ?args, "spawning conversion engine");

        let spawned = Command::new(&self.command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RasterError::ToolUnavailable(self.command.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        // wait_with_output drains stdout/stderr while waiting, so a chatty
        // engine can never deadlock on a full pipe. kill_on_drop reaps the
        // process if we bail out here on timeout.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(RasterError::TimedOut(self.timeout)),
        };

        if !output.status.success() {
            return Err(RasterError::ExecutionFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }
}
