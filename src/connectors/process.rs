//! Running a test runner with a deadline.

use std::{
    io::Read,
    process::{Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use crate::connectors::{DiscoveryError, Invocation};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// What a finished runner produced.
pub struct Output {
    pub status: ExitStatus,
    /// Standard output followed by standard error.
    pub combined: String,
}

fn drain<R: Read + Send + 'static>(reader: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut reader) = reader {
            // A read error only truncates the diagnostic output.
            let _ = reader.read_to_end(&mut buffer);
        }
        buffer
    })
}

/// Runs `args` with the invocation's executable in its directory.
///
/// The child is killed once the timeout elapses.
pub fn run(invocation: &Invocation, args: &[&str]) -> Result<Output, DiscoveryError> {
    let program = invocation.executable.clone();
    tracing::debug!(%program, ?args, dir = %invocation.path.display(), "running test discovery");

    let mut child = Command::new(&program)
        .args(args)
        .current_dir(&invocation.path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| DiscoveryError::Spawn {
            program: program.clone(),
            source,
        })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + invocation.timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                tracing::warn!(%program, "test discovery timed out; killing runner");
                let _ = child.kill();
                let _ = child.wait();
                return Err(DiscoveryError::Timeout {
                    program,
                    timeout: invocation.timeout,
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => return Err(DiscoveryError::Io { program, source }),
        }
    };

    let mut combined = stdout.join().unwrap_or_default();
    combined.extend(stderr.join().unwrap_or_default());

    Ok(Output {
        status,
        combined: String::from_utf8_lossy(&combined).into_owned(),
    })
}
