/// Bounded stdout/stderr collection.
/// Each stream is drained on its own thread so a chatty child never blocks
/// on a full pipe while the executor is polling for exit.
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::io::{BufReader, Read};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Output limits configuration
#[derive(Debug, Clone)]
pub struct OutputLimits {
    /// Per-stream limit (bytes)
    pub stream_limit: usize,
    /// How long to wait for readers after the child has exited
    pub drain_timeout: Duration,
}

impl Default for OutputLimits {
    fn default() -> Self {
        OutputLimits {
            stream_limit: 64 * 1024 * 1024,
            drain_timeout: Duration::from_secs(5),
        }
    }
}

/// Collected output of one child
#[derive(Debug, Clone, Default)]
pub struct CollectedOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Either stream hit its limit or did not finish draining in time
    pub truncated: bool,
}

impl CollectedOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

enum StreamEvent {
    Data(Vec<u8>),
    /// Bytes past the limit were read and dropped
    Overflow,
}

struct StreamReader {
    rx: Receiver<StreamEvent>,
    handle: JoinHandle<()>,
}

/// Reader threads attached to a running child
pub struct PendingOutput {
    stdout: Option<StreamReader>,
    stderr: Option<StreamReader>,
    limits: OutputLimits,
}

/// Output collector with bounded collection
pub struct OutputCollector {
    limits: OutputLimits,
}

impl OutputCollector {
    pub fn new(limits: OutputLimits) -> Self {
        OutputCollector { limits }
    }

    pub fn with_stream_limit(stream_limit: usize) -> Self {
        Self::new(OutputLimits {
            stream_limit,
            ..OutputLimits::default()
        })
    }

    /// Start draining both streams; call [`PendingOutput::finish`] once the child is reaped.
    pub fn start<O, E>(&self, stdout: Option<O>, stderr: Option<E>) -> PendingOutput
    where
        O: Read + Send + 'static,
        E: Read + Send + 'static,
    {
        let limit = self.limits.stream_limit;
        PendingOutput {
            stdout: stdout.map(|s| spawn_reader(s, limit)),
            stderr: stderr.map(|s| spawn_reader(s, limit)),
            limits: self.limits.clone(),
        }
    }
}

impl PendingOutput {
    /// Wait for both readers, bounded by the drain timeout.
    pub fn finish(self) -> CollectedOutput {
        let deadline = Instant::now() + self.limits.drain_timeout;
        let mut collected = CollectedOutput::default();

        if let Some(reader) = self.stdout {
            let (data, truncated) = receive(reader, deadline);
            collected.stdout = data;
            collected.truncated |= truncated;
        }
        if let Some(reader) = self.stderr {
            let (data, truncated) = receive(reader, deadline);
            collected.stderr = data;
            collected.truncated |= truncated;
        }

        collected
    }
}

/// Everything the reader delivered before the deadline. A reader that is
/// still blocked at the deadline keeps what it already sent.
fn receive(reader: StreamReader, deadline: Instant) -> (Vec<u8>, bool) {
    let mut buffer = Vec::new();
    let mut truncated = false;
    loop {
        match reader.rx.recv_deadline(deadline) {
            Ok(StreamEvent::Data(chunk)) => buffer.extend_from_slice(&chunk),
            Ok(StreamEvent::Overflow) => truncated = true,
            Err(RecvTimeoutError::Disconnected) => {
                let _ = reader.handle.join();
                return (buffer, truncated);
            }
            Err(RecvTimeoutError::Timeout) => {
                // A grandchild may still hold the pipe open; leave the thread detached.
                log::warn!(
                    "Output reader did not finish within drain timeout, keeping {} bytes",
                    buffer.len()
                );
                return (buffer, true);
            }
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(stream: R, limit: usize) -> StreamReader {
    let (tx, rx) = unbounded();
    let handle = thread::spawn(move || collect_stream(stream, limit, &tx));
    StreamReader { rx, handle }
}

/// Forward a single stream in chunks up to `limit` bytes. Bytes past the
/// limit are read and discarded so the writer never blocks.
fn collect_stream<R: Read>(stream: R, limit: usize, tx: &Sender<StreamEvent>) {
    let mut reader = BufReader::new(stream);
    let mut chunk = [0u8; 8192];
    let mut forwarded = 0usize;
    let mut overflowed = false;

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let room = limit.saturating_sub(forwarded);
                let keep = n.min(room);
                if keep > 0 {
                    forwarded += keep;
                    if tx.send(StreamEvent::Data(chunk[..keep].to_vec())).is_err() {
                        break;
                    }
                }
                if n > room && !overflowed {
                    overflowed = true;
                    let _ = tx.send(StreamEvent::Overflow);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::debug!("Output stream read failed: {}", e);
                break;
            }
        }
    }
}
