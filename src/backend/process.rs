//! Child-process execution for generation backends.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::BackendError;

/// A fully-shaped backend call.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Directory the backend may read for context
    pub working_dir: PathBuf,
    pub timeout: Duration,
}

/// Captured output of one backend call.
#[derive(Debug, Clone, Default)]
pub struct RawOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: Option<i32>,
}

/// Runs a single backend invocation.
///
/// The production implementation spawns a child process; tests substitute a
/// scripted double so retry and sanitization can be checked without any
/// backend installed.
#[async_trait]
pub trait BackendInvoker: Send + Sync {
    async fn invoke(&self, invocation: &Invocation) -> Result<RawOutput, BackendError>;
}

/// Spawns the backend executable and waits for it under a hard timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

#[async_trait]
impl BackendInvoker for ProcessInvoker {
    async fn invoke(&self, invocation: &Invocation) -> Result<RawOutput, BackendError> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // dropping the wait future on timeout must take the child with it
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BackendError::NotFound(invocation.program.display().to_string())
            } else {
                BackendError::Spawn(e.to_string())
            }
        })?;

        let output = match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await
        {
            Ok(result) => result.map_err(|e| BackendError::Spawn(e.to_string()))?,
            Err(_) => {
                return Err(BackendError::Timeout {
                    secs: invocation.timeout.as_secs_f64(),
                })
            }
        };

        Ok(RawOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
            exit_code: output.status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(program: PathBuf, args: &[&str], timeout: Duration) -> Invocation {
        Invocation {
            program,
            args: args.iter().map(|s| s.to_string()).collect(),
            working_dir: std::env::temp_dir(),
            timeout,
        }
    }

    #[tokio::test]
    async fn test_invoke_echo() {
        if let Ok(echo) = which::which("echo") {
            let out = ProcessInvoker
                .invoke(&invocation(echo, &["hello", "world"], Duration::from_secs(10)))
                .await
                .unwrap();
            assert!(out.success);
            assert_eq!(out.exit_code, Some(0));
            assert!(out.stdout.contains("hello world"));
        }
    }

    #[tokio::test]
    async fn test_invoke_timeout() {
        if let Ok(sleep) = which::which("sleep") {
            let started = std::time::Instant::now();
            let result = ProcessInvoker
                .invoke(&invocation(sleep, &["10"], Duration::from_millis(100)))
                .await;
            assert!(matches!(result, Err(BackendError::Timeout { .. })));
            assert!(started.elapsed() < Duration::from_secs(5));
        }
    }

    #[tokio::test]
    async fn test_invoke_missing_program() {
        let result = ProcessInvoker
            .invoke(&invocation(
                PathBuf::from("/nonexistent/repolens-backend-12345"),
                &[],
                Duration::from_secs(1),
            ))
            .await;
        assert!(matches!(result, Err(BackendError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invoke_captures_failure() {
        if let Ok(ls) = which::which("ls") {
            let out = ProcessInvoker
                .invoke(&invocation(
                    ls,
                    &["/nonexistent-directory-12345"],
                    Duration::from_secs(10),
                ))
                .await
                .unwrap();
            assert!(!out.success);
            assert!(out.stdout.is_empty());
            assert!(!out.stderr.is_empty());
        }
    }
}
