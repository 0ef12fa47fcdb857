//! Typesetter collaborator: Markdown → LaTeX body via an external converter.
//!
//! [`PandocTypesetter`] pipes the Markdown into `pandoc -f markdown -t latex`
//! and returns stdout. The output is a body fragment; the strategy selector
//! supplies the preamble.

use crate::error::{Collaborator, CollaboratorError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Anything that converts Markdown into LaTeX.
#[async_trait]
pub trait Typesetter: Send + Sync {
    async fn convert(&self, markdown: &str) -> Result<String, CollaboratorError>;
}

/// `pandoc` as a subprocess.
#[derive(Debug, Clone)]
pub struct PandocTypesetter {
    program: PathBuf,
    timeout_secs: u64,
}

impl PandocTypesetter {
    pub fn new(program: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        Self {
            program: program.into(),
            timeout_secs,
        }
    }

    async fn run(&self, markdown: &str) -> Result<String, CollaboratorError> {
        let mut child = Command::new(&self.program)
            .args(["-f", "markdown", "-t", "latex", "--wrap=preserve"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CollaboratorError::Typesetter {
                detail: format!("cannot start '{}': {e}", self.program.display()),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(markdown.as_bytes())
                .await
                .map_err(|e| CollaboratorError::Typesetter {
                    detail: format!("writing stdin: {e}"),
                })?;
            // Dropping stdin closes the pipe so pandoc sees EOF.
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| CollaboratorError::Typesetter {
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CollaboratorError::Typesetter {
                detail: format!("exit {}: {}", output.status, stderr.trim()),
            });
        }

        let latex = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if latex.is_empty() && !markdown.trim().is_empty() {
            return Err(CollaboratorError::Typesetter {
                detail: "empty output".to_string(),
            });
        }
        debug!("Typesetter produced {} chars", latex.len());
        Ok(latex)
    }
}

#[async_trait]
impl Typesetter for PandocTypesetter {
    async fn convert(&self, markdown: &str) -> Result<String, CollaboratorError> {
        timeout(Duration::from_secs(self.timeout_secs), self.run(markdown))
            .await
            .map_err(|_| CollaboratorError::Timeout {
                collaborator: Collaborator::Typesetter,
                secs: self.timeout_secs,
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_a_typesetter_error() {
        let t = PandocTypesetter::new("/nonexistent/pandoc-binary", 5);
        let err = t.convert("# hi").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Typesetter { .. }));
        assert!(err.to_string().contains("cannot start"));
    }
}
