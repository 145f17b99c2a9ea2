use std::io::{BufReader, Read};
use std::path::Path;
use std::process::{Child, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::core::classifier::{classify, ExitState};
use crate::core::config::CourseId;
use crate::core::error::SyncError;
use crate::core::event::{StreamKind, SyncEvent};
use crate::core::job::Invocation;
use crate::core::RunContext;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// How long output is still drained after the child is gone. Grandchildren
/// holding the pipes open must not stall the batch.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Runs the utility once against `config_path` and classifies the result.
///
/// Every output line is passed to `on_event` as it arrives. The child is
/// killed when the context's timeout expires or its cancel flag is raised.
pub fn run_invocation(
    ctx: &RunContext,
    course: &CourseId,
    config_path: &Path,
    on_event: &mut dyn FnMut(SyncEvent),
) -> Result<Invocation, SyncError> {
    on_event(SyncEvent::Command(ctx.utility.display(config_path)));

    let mut cmd = ctx.utility.build(config_path);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let started = Instant::now();
    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SyncError::UtilityNotFound {
                program: ctx.utility.program.clone(),
            }
        } else {
            SyncError::Spawn(e)
        }
    })?;
    debug!(pid = child.id(), course = %course, "utility started");

    let (line_tx, line_rx) = mpsc::channel::<(StreamKind, String)>();
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_line_reader(StreamKind::Stdout, stdout, line_tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_line_reader(StreamKind::Stderr, stderr, line_tx.clone()));
    }
    drop(line_tx);

    let deadline = started + ctx.timeout;
    let mut stdout_lines = Vec::new();
    let mut stderr_lines = Vec::new();
    let mut exit: Option<ExitState> = None;
    let mut reaped_at: Option<Instant> = None;
    let mut readers_done = false;

    loop {
        if !readers_done {
            match line_rx.recv_timeout(POLL_INTERVAL) {
                Ok((stream, line)) => {
                    match stream {
                        StreamKind::Stdout => stdout_lines.push(line.clone()),
                        StreamKind::Stderr => stderr_lines.push(line.clone()),
                    }
                    on_event(SyncEvent::Line { stream, text: line });
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => readers_done = true,
            }
        } else if exit.is_none() {
            thread::sleep(POLL_INTERVAL);
        }

        if exit.is_none() {
            if let Some(status) = child.try_wait().map_err(SyncError::Spawn)? {
                exit = Some(exit_state(status));
                reaped_at = Some(Instant::now());
            } else if Instant::now() >= deadline {
                warn!(course = %course, timeout = ?ctx.timeout, "utility timed out, killing it");
                terminate(&mut child)?;
                exit = Some(ExitState::TimedOut(ctx.timeout));
                reaped_at = Some(Instant::now());
            } else if ctx.is_cancelled() {
                debug!(course = %course, "cancellation requested, killing utility");
                terminate(&mut child)?;
                exit = Some(ExitState::Cancelled);
                reaped_at = Some(Instant::now());
            }
        }

        if let (Some(_), Some(at)) = (exit, reaped_at) {
            if readers_done || at.elapsed() >= DRAIN_GRACE {
                break;
            }
        }
    }

    if readers_done {
        for handle in readers {
            let _ = handle.join();
        }
    }

    let exit = exit.unwrap_or(ExitState::Signaled);
    let verdict = classify(&stdout_lines, &stderr_lines, exit);

    Ok(Invocation {
        course: course.clone(),
        config_path: config_path.to_path_buf(),
        stdout: stdout_lines,
        stderr: stderr_lines,
        exit,
        elapsed: started.elapsed(),
        verdict,
    })
}

fn exit_state(status: ExitStatus) -> ExitState {
    match status.code() {
        Some(code) => ExitState::Exited(code),
        None => ExitState::Signaled,
    }
}

fn terminate(child: &mut Child) -> Result<(), SyncError> {
    // The child may exit on its own between try_wait and kill.
    if let Err(err) = child.kill() {
        debug!(error = %err, "kill failed, child already exited");
    }
    child.wait().map_err(SyncError::Spawn)?;
    Ok(())
}

fn spawn_line_reader<R: Read + Send + 'static>(
    stream: StreamKind,
    reader: R,
    sender: Sender<(StreamKind, String)>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut line_buf: Vec<u8> = Vec::new();
        let mut byte = [0u8; 1];

        let flush = |line_buf: &mut Vec<u8>| -> bool {
            let line = String::from_utf8_lossy(line_buf).trim().to_string();
            line_buf.clear();
            line.is_empty() || sender.send((stream, line)).is_ok()
        };

        loop {
            match reader.read(&mut byte) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }

            match byte[0] {
                b'\r' | b'\n' => {
                    if line_buf.is_empty() {
                        continue;
                    }
                    if !flush(&mut line_buf) {
                        return;
                    }
                }
                other => line_buf.push(other),
            }
        }

        if !line_buf.is_empty() {
            flush(&mut line_buf);
        }
    })
}
