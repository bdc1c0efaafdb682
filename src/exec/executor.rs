/// Process execution with a hard wall clock bound
use crate::config::types::{Result, TransboxError};
use crate::core::types::{ExecutionProfile, ExecutionResult};
use crate::utils::output::OutputCollector;
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::sys::wait::{waitid, Id, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use std::io::Write;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Spawns one child per call in its own process group and kills the whole
/// group when the wall clock bound expires.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run `profile.command` to completion or until the wall clock bound.
    ///
    /// Exit status, runtime errors and timeouts come back as an [`ExecutionResult`].
    /// `Err` means the child could not be started at all; a missing binary
    /// surfaces as `TransboxError::Io` with `ErrorKind::NotFound`.
    pub fn execute(&self, profile: &ExecutionProfile) -> Result<ExecutionResult> {
        let program = profile
            .command
            .first()
            .ok_or_else(|| TransboxError::Config("Empty command provided".to_string()))?;

        let mut cmd = Command::new(program);
        cmd.args(&profile.command[1..])
            .current_dir(&profile.workdir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0);
        for (key, value) in &profile.environment {
            cmd.env(key, value);
        }

        let started = Instant::now();
        let mut child = cmd.spawn()?;
        let pgid = Pid::from_raw(child.id() as i32);
        log::debug!("Spawned {} (pid {})", program, pgid);

        let stdin_writer = child.stdin.take().map(|mut stdin| {
            let data = profile.stdin_data.clone().unwrap_or_default();
            thread::spawn(move || {
                if let Err(e) = stdin.write_all(data.as_bytes()) {
                    if e.kind() != std::io::ErrorKind::BrokenPipe {
                        log::debug!("Writing child stdin failed: {}", e);
                    }
                }
            })
        });

        let pending = OutputCollector::with_stream_limit(profile.output_limit_bytes)
            .start(child.stdout.take(), child.stderr.take());

        let wall_limit = Duration::from_millis(profile.wall_time_limit_ms);
        let mut exited = false;
        loop {
            // WNOWAIT leaves the leader a zombie, so the group id stays ours
            // until the sweep below has run.
            let flags = WaitPidFlag::WEXITED | WaitPidFlag::WNOWAIT | WaitPidFlag::WNOHANG;
            match waitid(Id::Pid(pgid), flags) {
                Ok(WaitStatus::StillAlive) => {
                    if started.elapsed() > wall_limit {
                        break;
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Ok(_) => {
                    exited = true;
                    break;
                }
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    kill_group(pgid);
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(TransboxError::Process(format!("wait({}): {}", program, e)));
                }
            }
        }

        // Kill anything the child left behind in its group, then reap the child.
        kill_group(pgid);
        if !exited {
            log::info!(
                "Killing {} after {} ms wall clock limit",
                program,
                profile.wall_time_limit_ms
            );
            let _ = child.wait();
            let _ = pending.finish();
            if let Some(writer) = stdin_writer {
                let _ = writer.join();
            }
            return Ok(ExecutionResult::timeout());
        }
        let status = child
            .wait()
            .map_err(|e| TransboxError::Process(format!("wait({}): {}", program, e)))?;

        let output = pending.finish();
        if let Some(writer) = stdin_writer {
            let _ = writer.join();
        }
        if output.truncated {
            log::warn!("Output of {} truncated at {} bytes per stream", program, profile.output_limit_bytes);
        }

        Ok(ExecutionResult::finished(
            output.stdout_lossy(),
            output.stderr_lossy(),
            status_code(status),
        ))
    }
}

/// Raw return code; a signal death reports as the negated signal number.
fn status_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => -signal,
        (None, None) => -1,
    }
}

fn kill_group(pgid: Pid) {
    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => log::warn!("killpg({}) failed: {}", pgid, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ExecutionStatus;

    fn shell(script: &str, wall_ms: u64) -> ExecutionProfile {
        ExecutionProfile::new(
            vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()],
            &std::env::temp_dir(),
            wall_ms,
        )
    }

    #[test]
    fn pipes_stdin_through() {
        let profile = shell("cat", 5_000).with_stdin("1 2 3\n");
        let result = ProcessExecutor::new().execute(&profile).unwrap();
        assert_eq!(result.stdout, "1 2 3\n");
        assert_eq!(result.status_code, 0);
        assert!(!result.timed_out);
    }

    #[test]
    fn reports_exit_code_and_stderr() {
        let result = ProcessExecutor::new()
            .execute(&shell("echo oops >&2; exit 3", 5_000))
            .unwrap();
        assert_eq!(result.status_code, 3);
        assert_eq!(result.stderr, "oops\n");
        assert_eq!(result.status(), ExecutionStatus::RuntimeError);
    }

    #[test]
    fn signal_death_is_negative() {
        let result = ProcessExecutor::new()
            .execute(&shell("kill -9 $$", 5_000))
            .unwrap();
        assert_eq!(result.status_code, -9);
    }

    #[test]
    fn timeout_discards_partial_output() {
        let started = Instant::now();
        let result = ProcessExecutor::new()
            .execute(&shell("echo partial; sleep 10", 300))
            .unwrap();
        assert!(result.timed_out);
        assert_eq!(result.stdout, "");
        assert_eq!(result.stderr, "Time limit exceeded");
        assert_eq!(result.status_code, -1);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn normal_exit_kills_group_members() {
        let started = Instant::now();
        let result = ProcessExecutor::new()
            .execute(&shell("sleep 30 & echo done", 10_000))
            .unwrap();
        assert!(!result.timed_out);
        assert_eq!(result.status_code, 0);
        assert_eq!(result.stdout, "done\n");
        // the background sleep holds stdout open until the group is killed
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn missing_binary_is_not_found() {
        let profile = ExecutionProfile::new(
            vec!["/nonexistent/transbox-binary".to_string()],
            &std::env::temp_dir(),
            1_000,
        );
        match ProcessExecutor::new().execute(&profile) {
            Err(TransboxError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn empty_command_is_rejected() {
        let profile = ExecutionProfile::new(Vec::new(), &std::env::temp_dir(), 1_000);
        assert!(matches!(
            ProcessExecutor::new().execute(&profile),
            Err(TransboxError::Config(_))
        ));
    }
}
