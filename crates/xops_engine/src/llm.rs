use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use xops_logging::{xops_debug, xops_warn};

pub const LLM_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("failed to run llm command: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("llm command timed out after {0:?}")]
    Timeout(Duration),
    #[error("llm command exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Runs `command` through `sh -c` with `prompt` on stdin and returns the
/// trimmed stdout.
pub async fn run_llm_command(command: &str, prompt: &str, timeout: Duration) -> Result<String, LlmError> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let stdin = child.stdin.take();
    let run = async move {
        if let Some(mut stdin) = stdin {
            // A command that exits without reading its input closes the pipe.
            match stdin.write_all(prompt.as_bytes()).await {
                Err(err) if err.kind() != std::io::ErrorKind::BrokenPipe => return Err(err),
                _ => {}
            }
        }
        child.wait_with_output().await
    };

    let output = tokio::time::timeout(timeout, run)
        .await
        .map_err(|_| LlmError::Timeout(timeout))??;

    if !output.status.success() {
        return Err(LlmError::Failed {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    xops_debug!("llm command produced {} chars", text.chars().count());
    Ok(text)
}

/// Generated text, or an empty string when the command fails so the caller
/// falls back to its template.
pub async fn generate_or_empty(command: &str, prompt: &str) -> String {
    match run_llm_command(command, prompt, LLM_TIMEOUT).await {
        Ok(text) => text,
        Err(err) => {
            xops_warn!("{}", err);
            String::new()
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prompt_goes_through_stdin() {
        let out = run_llm_command("tr a-z A-Z", "hello\n", LLM_TIMEOUT).await.unwrap();
        assert_eq!(out, "HELLO");
    }

    #[tokio::test]
    async fn failing_command_yields_empty_text() {
        assert!(matches!(
            run_llm_command("exit 3", "", LLM_TIMEOUT).await,
            Err(LlmError::Failed { .. })
        ));
        assert_eq!(generate_or_empty("exit 3", "x").await, "");
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let err = run_llm_command("sleep 5", "", Duration::from_millis(100)).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout(_)));
    }

    #[tokio::test]
    async fn prompt_larger_than_pipe_buffer_still_times_out() {
        let prompt = "x".repeat(1 << 20);
        let err = run_llm_command("sleep 5", &prompt, Duration::from_millis(300))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Timeout(_)));
    }

    #[tokio::test]
    async fn command_ignoring_stdin_still_succeeds() {
        let prompt = "x".repeat(1 << 20);
        let out = run_llm_command("echo done", &prompt, LLM_TIMEOUT).await.unwrap();
        assert_eq!(out, "done");
    }
}
