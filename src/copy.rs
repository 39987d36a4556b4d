//! Types shared by the async and blocking stream copiers.
//!
//! A copy moves bytes from a source stream into a destination stream one
//! chunk at a time. Each chunk is shown to an optional callback as a
//! [`Progress`] snapshot before it is written, and the callback answers with
//! a [`Control`]. The copy ends exactly once, with an [`Outcome`].

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::error::{self, Error};

/// The buffer size used when none is configured: 8 KiB.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

pub(crate) type Transform = Arc<dyn Fn(&[u8]) -> Bytes + Send + Sync>;

/// A snapshot of one chunk of an in-flight copy.
///
/// A new `Progress` is handed to the callback for every chunk, in stream
/// order, before that chunk is written to the destination.
pub struct Progress<'a> {
    chunk: &'a [u8],
    index: u64,
    total: u64,
    cancel_requested: bool,
}

impl<'a> Progress<'a> {
    /// The bytes read from the source for this step.
    ///
    /// Only the valid bytes are included, so the final chunk is usually
    /// shorter than the buffer size.
    pub fn chunk(&self) -> &'a [u8] {
        self.chunk
    }

    /// Number of valid bytes in this chunk.
    pub fn len(&self) -> usize {
        self.chunk.len()
    }

    /// Returns true if this chunk holds no bytes.
    ///
    /// The copier never reports empty chunks, an empty read ends the copy.
    pub fn is_empty(&self) -> bool {
        self.chunk.is_empty()
    }

    /// Zero-based position of this chunk in the copy.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Bytes copied so far, including this chunk once it is written.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Whether the copier's cancellation token, or the token passed to this
    /// call, had been triggered when this snapshot was taken.
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested
    }
}

impl fmt::Debug for Progress<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Progress")
            .field("index", &self.index)
            .field("len", &self.chunk.len())
            .field("total", &self.total)
            .field("cancel_requested", &self.cancel_requested)
            .finish()
    }
}

/// What a progress callback wants the copy to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Control {
    /// Keep copying.
    #[default]
    Continue,
    /// Write the chunk that was just read, then stop.
    Cancel,
}

/// How a copy ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// The source reached end of stream and everything was written.
    Completed,
    /// Cancellation was requested and honored at a chunk boundary.
    Cancelled,
    /// A read, write or flush failed.
    Failed,
}

/// The terminal result of a single copy.
///
/// An `Outcome` carries exactly one terminal cause. [`error`](Outcome::error)
/// is `Some` if and only if the status is [`Status::Failed`]. The byte count
/// is always reported, including for cancelled and failed copies.
#[derive(Debug)]
pub struct Outcome {
    status: Status,
    bytes_copied: u64,
    chunks: u64,
    error: Option<Error>,
}

impl Outcome {
    /// How the copy ended.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Source bytes whose chunk was completely written to the destination.
    pub fn bytes_copied(&self) -> u64 {
        self.bytes_copied
    }

    /// Number of chunks shown to the progress callback.
    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    /// The fault that ended the copy, if it failed.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Take the fault that ended the copy, if it failed.
    pub fn into_error(self) -> Option<Error> {
        self.error
    }

    /// Returns true if the source was copied to its end.
    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// Returns true if the copy stopped because cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.status == Status::Cancelled
    }

    /// Returns true if the copy stopped because of an I/O fault.
    pub fn is_failed(&self) -> bool {
        self.status == Status::Failed
    }

    /// Turn a failed outcome into an `Err`.
    ///
    /// Completed and cancelled outcomes are returned unchanged.
    ///
    /// ```
    /// use fluenthttp::Control;
    ///
    /// # async fn run() -> Result<(), fluenthttp::Error> {
    /// let mut src: &[u8] = b"hello";
    /// let mut dst = Vec::new();
    /// let outcome = fluenthttp::copy(&mut src, &mut dst, 2, |_| Control::Continue)
    ///     .await?
    ///     .error_for_status()?;
    /// assert_eq!(outcome.bytes_copied(), 5);
    /// # Ok(())
    /// # }
    /// ```
    pub fn error_for_status(self) -> crate::Result<Self> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// A builder to configure a stream copier.
///
/// The same builder backs both [`StreamCopier`](crate::StreamCopier) and,
/// with the `blocking` feature, `blocking::StreamCopier`.
#[must_use]
pub struct CopierBuilder {
    config: Config,
}

pub(crate) struct Config {
    pub(crate) buffer_size: usize,
    pub(crate) cancel: CancellationToken,
    pub(crate) transform: Option<Transform>,
}

impl Default for CopierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CopierBuilder {
    /// Constructs a new `CopierBuilder` with the default buffer size and a
    /// fresh cancellation token.
    pub fn new() -> CopierBuilder {
        CopierBuilder {
            config: Config {
                buffer_size: DEFAULT_BUFFER_SIZE,
                cancel: CancellationToken::new(),
                transform: None,
            },
        }
    }

    /// Sets the size of the chunk buffer, in bytes.
    ///
    /// This is also the largest chunk a progress callback will see. A size
    /// of zero makes [`build`](CopierBuilder::build) fail.
    pub fn buffer_size(mut self, size: usize) -> CopierBuilder {
        self.config.buffer_size = size;
        self
    }

    /// Use an existing cancellation token.
    ///
    /// Triggering the token from any thread or task stops every copy made
    /// through the built copier at its next chunk boundary.
    pub fn cancel_token(mut self, token: CancellationToken) -> CopierBuilder {
        self.config.cancel = token;
        self
    }

    /// Rewrite every chunk before it is written to the destination.
    ///
    /// The function receives the valid bytes of a chunk and returns the
    /// bytes to write in its place. The returned value may be shorter or
    /// longer than the input. Progress callbacks still see the chunk as it
    /// was read, and byte counts refer to source bytes.
    pub fn transform<F>(mut self, f: F) -> CopierBuilder
    where
        F: Fn(&[u8]) -> Bytes + Send + Sync + 'static,
    {
        self.config.transform = Some(Arc::new(f));
        self
    }

    pub(crate) fn into_config(self) -> crate::Result<Config> {
        if self.config.buffer_size == 0 {
            return Err(error::builder("buffer size must be greater than zero"));
        }
        Ok(self.config)
    }

    /// Returns an async `StreamCopier` that uses this configuration.
    ///
    /// # Errors
    ///
    /// This method fails if the buffer size is zero.
    pub fn build(self) -> crate::Result<crate::StreamCopier> {
        self.into_config().map(crate::StreamCopier::from_config)
    }
}

impl fmt::Debug for CopierBuilder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.config.fmt_fields(&mut f.debug_struct("CopierBuilder"))
    }
}

impl Config {
    pub(crate) fn fmt_fields(&self, f: &mut fmt::DebugStruct<'_, '_>) -> fmt::Result {
        f.field("buffer_size", &self.buffer_size)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// Bookkeeping for one copy, shared by the async and blocking loops.
///
/// The loops own the I/O and the buffer; a `Session` decides when to stop
/// and builds the `Outcome`.
pub(crate) struct Session<'c> {
    config: &'c Config,
    until: Option<&'c CancellationToken>,
    bytes_copied: u64,
    chunks: u64,
    cancel_requested: bool,
}

impl<'c> Session<'c> {
    /// `until` is an extra token that only stops this one copy.
    pub(crate) fn start(config: &'c Config, until: Option<&'c CancellationToken>) -> Session<'c> {
        log::debug!("copy started, buffer size {}", config.buffer_size);
        Session {
            config,
            until,
            bytes_copied: 0,
            chunks: 0,
            cancel_requested: false,
        }
    }

    /// Allocates the one buffer used for every chunk of this copy.
    pub(crate) fn buffer(&self) -> Vec<u8> {
        vec![0; self.config.buffer_size]
    }

    /// Checked before every read.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel_requested || self.token_cancelled()
    }

    fn token_cancelled(&self) -> bool {
        self.config.cancel.is_cancelled() || self.until.map_or(false, |t| t.is_cancelled())
    }

    /// Shows a freshly read chunk to the callback.
    pub(crate) fn notify<F>(&mut self, chunk: &[u8], on_progress: &mut F)
    where
        F: FnMut(&Progress<'_>) -> Control,
    {
        let progress = Progress {
            chunk,
            index: self.chunks,
            total: self.bytes_copied + chunk.len() as u64,
            cancel_requested: self.token_cancelled(),
        };
        log::trace!("chunk {} read, {} bytes", progress.index, chunk.len());
        self.chunks += 1;

        if on_progress(&progress) == Control::Cancel {
            log::debug!("cancel requested by progress callback at chunk {}", progress.index);
            self.cancel_requested = true;
        }
    }

    /// The bytes to write for a chunk, if a transform replaces them.
    pub(crate) fn transform(&self, chunk: &[u8]) -> Option<Bytes> {
        self.config.transform.as_ref().map(|f| f(chunk))
    }

    /// Records a chunk as written. Returns true if the loop should stop.
    pub(crate) fn written(&mut self, n: usize) -> bool {
        self.bytes_copied += n as u64;
        self.is_cancelled()
    }

    pub(crate) fn finish(self, status: Status) -> Outcome {
        log::debug!(
            "copy {:?} after {} bytes in {} chunks",
            status,
            self.bytes_copied,
            self.chunks
        );
        Outcome {
            status,
            bytes_copied: self.bytes_copied,
            chunks: self.chunks,
            error: None,
        }
    }

    pub(crate) fn fail(self, err: Error) -> Outcome {
        log::debug!("copy failed after {} bytes: {}", self.bytes_copied, err);
        Outcome {
            status: Status::Failed,
            bytes_copied: self.bytes_copied,
            chunks: self.chunks,
            error: Some(err),
        }
    }
}

/// A callback that never cancels.
pub(crate) fn keep_going(_: &Progress<'_>) -> Control {
    Control::Continue
}
