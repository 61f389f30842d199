//! External command execution.
//!
//! Every interaction with the `git` and `bzr` command-line tools goes through
//! here: single commands via [`run`], and the export|import pairs via
//! [`run_pipeline`], which connects the exporter's stdout directly to the
//! importer's stdin through an OS pipe. The engine never buffers the
//! interchange stream itself.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::ProcessError;

/// Captured output of a completed command.
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run a single command to completion, capturing stdout and stderr.
pub async fn run(mut cmd: Command) -> Result<CommandOutput, ProcessError> {
    let rendered = render(&cmd);
    debug!(cmd = %rendered, "running command");

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let output = cmd.output().await.map_err(|e| spawn_error(&cmd, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code().unwrap_or(-1);
        warn!(cmd = %rendered, exit_code, %stderr, "command failed");
        return Err(ProcessError::CommandFailed {
            command: rendered,
            exit_code,
            stderr,
        });
    }

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Run `export | import` as one pipeline and wait for both sides.
///
/// The exporter's stdout feeds the importer's stdin; backpressure is the OS
/// pipe buffer's problem. Fails if either side exits non-zero, reporting the
/// failing side's command line and stderr — the exporter is checked first, so
/// a broken source is not masked by the importer dying on a truncated stream.
/// No timeout and no retry: a hung tool hangs the operation.
///
/// Returns the importer's captured output.
pub async fn run_pipeline(
    mut export: Command,
    mut import: Command,
) -> Result<CommandOutput, ProcessError> {
    let export_rendered = render(&export);
    let import_rendered = render(&import);
    debug!(export = %export_rendered, import = %import_rendered, "running pipeline");

    export
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut exporter = export.spawn().map_err(|e| spawn_error(&export, e))?;

    let export_stdout = exporter.stdout.take().ok_or_else(|| {
        ProcessError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "exporter stdout was not captured",
        ))
    })?;
    let import_stdin: Stdio = export_stdout.try_into()?;

    import
        .stdin(import_stdin)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let importer = import.spawn().map_err(|e| spawn_error(&import, e))?;

    let (export_out, import_out) = tokio::join!(
        exporter.wait_with_output(),
        importer.wait_with_output()
    );
    let export_out = export_out?;
    let import_out = import_out?;

    if !export_out.status.success() {
        let stderr = String::from_utf8_lossy(&export_out.stderr).to_string();
        let exit_code = export_out.status.code().unwrap_or(-1);
        warn!(cmd = %export_rendered, exit_code, %stderr, "exporter failed");
        return Err(ProcessError::CommandFailed {
            command: export_rendered,
            exit_code,
            stderr,
        });
    }
    if !import_out.status.success() {
        let stderr = String::from_utf8_lossy(&import_out.stderr).to_string();
        let exit_code = import_out.status.code().unwrap_or(-1);
        warn!(cmd = %import_rendered, exit_code, %stderr, "importer failed");
        return Err(ProcessError::CommandFailed {
            command: import_rendered,
            exit_code,
            stderr,
        });
    }

    debug!("pipeline completed");
    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&import_out.stdout).to_string(),
        stderr: String::from_utf8_lossy(&import_out.stderr).to_string(),
    })
}

fn spawn_error(cmd: &Command, e: std::io::Error) -> ProcessError {
    if e.kind() == std::io::ErrorKind::NotFound {
        ProcessError::BinaryNotFound(cmd.as_std().get_program().to_string_lossy().to_string())
    } else {
        ProcessError::Io(e)
    }
}

fn render(cmd: &Command) -> String {
    let std_cmd = cmd.as_std();
    std::iter::once(std_cmd.get_program())
        .chain(std_cmd.get_args())
        .map(|s| s.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", script]);
        cmd
    }

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let out = run(sh("printf hello")).await.unwrap();
        assert_eq!(out.stdout, "hello");
    }

    #[tokio::test]
    async fn test_run_reports_exit_code_and_stderr() {
        let err = run(sh("echo oops >&2; exit 7")).await.unwrap_err();
        match err {
            ProcessError::CommandFailed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, 7);
                assert_eq!(stderr.trim(), "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_missing_binary() {
        let cmd = Command::new("definitely-not-a-real-binary");
        let err = run(cmd).await.unwrap_err();
        assert!(matches!(err, ProcessError::BinaryNotFound(_)));
    }

    #[tokio::test]
    async fn test_pipeline_connects_stdout_to_stdin() {
        let out = run_pipeline(sh("printf 'a\\nb\\nc\\n'"), sh("wc -l"))
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "3");
    }

    #[tokio::test]
    async fn test_pipeline_reports_exporter_failure_first() {
        // The importer also fails here (cat into a failed wc is fine, so use
        // a failing importer) — the exporter's error must win.
        let err = run_pipeline(sh("echo bad source >&2; exit 2"), sh("exit 3"))
            .await
            .unwrap_err();
        match err {
            ProcessError::CommandFailed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, 2);
                assert!(stderr.contains("bad source"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_pipeline_reports_importer_failure() {
        let err = run_pipeline(sh("printf stream"), sh("echo no importer >&2; exit 4"))
            .await
            .unwrap_err();
        match err {
            ProcessError::CommandFailed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, 4);
                assert!(stderr.contains("no importer"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
