//! Pipe pair (plus stderr) connecting the supervisor to one child process.
//!
//! Streams are boxed trait objects so an in-memory `tokio::io::duplex` can
//! stand in for a real child in tests.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, BufReader};
use tokio::process::Child;

use crate::error::{io_err, DaemonError};

/// Longest output line accepted before `next_line` fails with `InvalidData`.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

pub type InputStream = Box<dyn AsyncWrite + Send + Unpin>;
pub type OutputStream = Box<dyn AsyncBufRead + Send + Unpin>;

/// The three standard streams of a daemon, plus the child handle when the
/// streams belong to a real process.
pub struct PipeChannel {
    pub input: InputStream,
    pub output: OutputStream,
    pub error: OutputStream,
    pub child: Option<Child>,
}

impl PipeChannel {
    pub fn new(
        input: impl AsyncWrite + Send + Unpin + 'static,
        output: impl AsyncBufRead + Send + Unpin + 'static,
        error: impl AsyncBufRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            input: Box::new(input),
            output: Box::new(output),
            error: Box::new(error),
            child: None,
        }
    }

    /// Take all three piped streams out of a freshly spawned child.
    pub fn from_child(mut child: Child) -> Result<Self, DaemonError> {
        let stdin = child.stdin.take().ok_or(DaemonError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(DaemonError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(DaemonError::MissingPipe("stderr"))?;
        let mut channel = Self::new(stdin, BufReader::new(stdout), BufReader::new(stderr));
        channel.child = Some(child);
        Ok(channel)
    }
}

/// Lazy, line-at-a-time view over a daemon's output.
///
/// [`FrameStream::next_line`] is the only suspension point. It is cancel
/// safe: bytes of a partially received line stay buffered and the next call
/// resumes where the dropped one stopped, so a timeout can wrap it.
pub struct FrameStream {
    stream: &'static str,
    output: OutputStream,
    pending: Vec<u8>,
    max_line: usize,
    discarding: bool,
}

impl FrameStream {
    /// `stream` names the pipe in I/O errors (`"stdout"`, `"stderr"`).
    pub fn new(stream: &'static str, output: OutputStream) -> Self {
        Self {
            stream,
            output,
            pending: Vec::new(),
            max_line: MAX_LINE_BYTES,
            discarding: false,
        }
    }

    /// Override [`MAX_LINE_BYTES`] (terminator not counted).
    pub fn with_max_line(mut self, max_line: usize) -> Self {
        self.max_line = max_line;
        self
    }

    /// Next line without its terminator, or `None` once the stream closed.
    ///
    /// Invalid UTF-8 is replaced lossily. A final line without a trailing
    /// newline is still returned before `None`. A line longer than the
    /// maximum is an `InvalidData` error; the rest of it, up to its newline,
    /// is skipped and the following call returns the next line.
    pub async fn next_line(&mut self) -> Result<Option<String>, DaemonError> {
        loop {
            // Only `fill_buf` suspends; copying and consuming happen in one go.
            let available = self
                .output
                .fill_buf()
                .await
                .map_err(|e| io_err(self.stream, e))?;
            if available.is_empty() {
                self.discarding = false;
                if self.pending.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.take_line()));
            }

            let (chunk, done) = match available.iter().position(|&b| b == b'\n') {
                Some(newline) => (&available[..=newline], true),
                None => (available, false),
            };
            let used = chunk.len();
            if self.discarding {
                self.output.consume(used);
                self.discarding = !done;
                continue;
            }
            self.pending.extend_from_slice(chunk);
            self.output.consume(used);

            let terminator = match (done, self.pending.ends_with(b"\r\n")) {
                (true, true) => 2,
                (true, false) => 1,
                (false, _) => 0,
            };
            let content = self.pending.len() - terminator;
            if content > self.max_line {
                self.pending.clear();
                self.discarding = !done;
                return Err(io_err(
                    self.stream,
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("line exceeds {} bytes", self.max_line),
                    ),
                ));
            }
            if done {
                return Ok(Some(self.take_line()));
            }
        }
    }

    fn take_line(&mut self) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
