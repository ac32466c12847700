//! Shared subprocess plumbing: timeout-guarded command execution and the
//! process-wide compile-and-cache for the native helper binaries.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{CupError, Result};

use super::{COMPILE_TIMEOUT_SECS, SUBPROCESS_TIMEOUT_SECS};

/// Run a command with a deadline. Timeouts, a missing program, and non-zero
/// exits each map to their own error kind; `what` names the operation in
/// error text.
pub async fn run_command(mut cmd: Command, timeout_secs: u64, what: &str) -> Result<Output> {
    cmd.kill_on_drop(true);
    let result = timeout(Duration::from_secs(timeout_secs), cmd.output()).await;

    let output = match result {
        Err(_) => {
            return Err(CupError::PlatformTimeout(format!(
                "{} exceeded {}s",
                what, timeout_secs
            )))
        }
        Ok(Err(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(CupError::PlatformUnavailable(what.to_string()))
        }
        Ok(Err(err)) => {
            return Err(CupError::PlatformFailure(format!("{}: {}", what, err)))
        }
        Ok(Ok(output)) => output,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CupError::PlatformFailure(format!(
            "{} exited with {}: {}",
            what,
            output.status,
            stderr.trim()
        )));
    }
    Ok(output)
}

/// `run_command` returning trimmed stdout.
pub async fn run_for_stdout(cmd: Command, timeout_secs: u64, what: &str) -> Result<String> {
    let output = run_command(cmd, timeout_secs, what).await?;
    Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
}

/// Process-wide cache directory for compiled helpers; stable across runs so
/// a second process reuses the binary.
pub fn helper_cache_dir() -> PathBuf {
    std::env::temp_dir().join("cup-helpers")
}

/// Ensure a compiled helper exists at its stable cache path, compiling it on
/// first use. The compile writes to a temp path and renames into place, so a
/// crash never leaves a half-written binary behind and concurrent compilers
/// simply race to an identical result (last writer wins).
pub async fn ensure_compiled<F>(
    name: &str,
    source: &str,
    source_ext: &str,
    build_command: F,
) -> Result<PathBuf>
where
    F: Fn(&Path, &Path) -> Command,
{
    let dir = helper_cache_dir();
    let binary = dir.join(name);
    if binary.exists() {
        if probe(&binary).await.is_ok() {
            return Ok(binary);
        }
        // A binary that cannot even start is corrupt: recompile over it.
        tracing::warn!(helper = name, "cached helper failed its startup probe, recompiling");
        let _ = std::fs::remove_file(&binary);
    }

    std::fs::create_dir_all(&dir)
        .map_err(|e| CupError::PlatformFailure(format!("helper cache dir: {}", e)))?;

    let source_file = tempfile::Builder::new()
        .prefix(name)
        .suffix(source_ext)
        .tempfile_in(&dir)
        .map_err(|e| CupError::PlatformFailure(format!("helper source: {}", e)))?;
    std::fs::write(source_file.path(), source)
        .map_err(|e| CupError::PlatformFailure(format!("helper source: {}", e)))?;

    let staging = dir.join(format!("{}.{}", name, std::process::id()));
    let cmd = build_command(source_file.path(), &staging);
    run_command(cmd, COMPILE_TIMEOUT_SECS, &format!("compiling {}", name)).await?;

    std::fs::rename(&staging, &binary)
        .map_err(|e| CupError::PlatformFailure(format!("installing {}: {}", name, e)))?;
    tracing::debug!(helper = name, path = %binary.display(), "compiled helper");
    Ok(binary)
}

/// Startup probe: the helper must answer `version` within the short
/// subprocess deadline.
async fn probe(binary: &Path) -> Result<()> {
    let mut cmd = Command::new(binary);
    cmd.arg("version");
    run_command(cmd, SUBPROCESS_TIMEOUT_SECS, "helper probe").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let cmd = Command::new("cup-no-such-binary-xyz");
        match run_command(cmd, 5, "cup-no-such-binary-xyz").await {
            Err(CupError::PlatformUnavailable(what)) => {
                assert!(what.contains("cup-no-such-binary-xyz"));
            }
            other => panic!("expected PlatformUnavailable, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo boom >&2; exit 3"]);
        match run_command(cmd, 5, "sh probe").await {
            Err(CupError::PlatformFailure(msg)) => assert!(msg.contains("boom")),
            other => panic!("expected PlatformFailure, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_timeout_maps_to_platform_timeout() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "sleep 30"]);
        match run_command(cmd, 1, "sleepy call").await {
            Err(CupError::PlatformTimeout(msg)) => assert!(msg.contains("sleepy call")),
            other => panic!("expected PlatformTimeout, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_stdout_helper() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "printf 'hello\\n'"]);
        let out = run_for_stdout(cmd, 5, "echo").await.unwrap();
        assert_eq!(out, "hello");
    }
}
