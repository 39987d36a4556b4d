use std::fmt;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use futures_core::Stream;
use futures_util::TryStreamExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

use crate::copy::{
    keep_going, Config, CopierBuilder, Outcome, Progress, Session, Status, DEFAULT_BUFFER_SIZE,
};
use crate::error::{self, BoxError};
use crate::Control;

/// An asynchronous copier that moves a byte stream into a writer in
/// fixed-size chunks, reporting progress and honoring cancellation.
///
/// The `StreamCopier` only holds configuration, so it is cheap to clone and
/// may run many copies at once. Every copy allocates its own buffer once and
/// reuses it for all of its chunks.
///
/// Copies never return I/O faults as `Err`. Inspect the returned
/// [`Outcome`] instead.
#[derive(Clone)]
pub struct StreamCopier {
    inner: Arc<Config>,
}

impl StreamCopier {
    /// Constructs a new `StreamCopier` with the default buffer size.
    pub fn new() -> StreamCopier {
        StreamCopier::from_config(Config {
            buffer_size: DEFAULT_BUFFER_SIZE,
            cancel: CancellationToken::new(),
            transform: None,
        })
    }

    /// Creates a `CopierBuilder` to configure a `StreamCopier`.
    ///
    /// This is the same as `CopierBuilder::new()`.
    pub fn builder() -> CopierBuilder {
        CopierBuilder::new()
    }

    pub(crate) fn from_config(config: Config) -> StreamCopier {
        StreamCopier {
            inner: Arc::new(config),
        }
    }

    pub(crate) fn config(&self) -> &Config {
        &self.inner
    }

    /// The size of the chunk buffer, in bytes.
    pub fn buffer_size(&self) -> usize {
        self.inner.buffer_size
    }

    /// A handle to this copier's cancellation token.
    ///
    /// Cancelling it from any thread or task stops running copies at their
    /// next chunk boundary, and makes later copies stop before their first
    /// read.
    pub fn cancel_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Request cancellation of every copy made through this copier.
    ///
    /// Calling this more than once has no further effect.
    pub fn cancel(&self) {
        self.inner.cancel.cancel();
    }

    /// Copy `src` into `dst` until `src` reaches end of stream.
    ///
    /// Neither stream is closed. `dst` is flushed when the copy completes or
    /// is cancelled.
    pub async fn copy<R, W>(&self, src: &mut R, dst: &mut W) -> Outcome
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.copy_with_progress(src, dst, keep_going).await
    }

    /// Copy `src` into `dst`, calling `on_progress` once per chunk.
    ///
    /// The callback runs before the chunk is written. Returning
    /// [`Control::Cancel`] lets that chunk be written and then ends the copy
    /// with [`Status::Cancelled`].
    ///
    /// # Example
    ///
    /// ```
    /// use fluenthttp::{Control, StreamCopier};
    ///
    /// # async fn run() -> Result<(), fluenthttp::Error> {
    /// let copier = StreamCopier::builder().buffer_size(4).build()?;
    /// let mut src: &[u8] = b"hello world";
    /// let mut dst = Vec::new();
    ///
    /// let outcome = copier
    ///     .copy_with_progress(&mut src, &mut dst, |progress| {
    ///         println!("{} bytes so far", progress.total());
    ///         Control::Continue
    ///     })
    ///     .await;
    /// assert!(outcome.is_completed());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn copy_with_progress<R, W, F>(
        &self,
        src: &mut R,
        dst: &mut W,
        on_progress: F,
    ) -> Outcome
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
        F: FnMut(&Progress<'_>) -> Control,
    {
        self.run(None, src, dst, on_progress).await
    }

    /// Like [`copy_with_progress`](StreamCopier::copy_with_progress), but
    /// `until` also cancels this copy.
    ///
    /// Cancelling `until` stops only this call. The copier and its other
    /// copies keep running, and the copier stays usable afterwards.
    ///
    /// # Example
    ///
    /// ```
    /// use fluenthttp::{CancellationToken, Control, StreamCopier};
    ///
    /// # async fn run() -> Result<(), fluenthttp::Error> {
    /// let copier = StreamCopier::new();
    /// let stop = CancellationToken::new();
    /// stop.cancel();
    ///
    /// let mut src: &[u8] = b"never read";
    /// let mut dst = Vec::new();
    /// let outcome = copier
    ///     .copy_with_progress_until(&stop, &mut src, &mut dst, |_| Control::Continue)
    ///     .await;
    /// assert!(outcome.is_cancelled());
    ///
    /// let mut src: &[u8] = b"read";
    /// assert!(copier.copy(&mut src, &mut dst).await.is_completed());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn copy_with_progress_until<R, W, F>(
        &self,
        until: &CancellationToken,
        src: &mut R,
        dst: &mut W,
        on_progress: F,
    ) -> Outcome
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
        F: FnMut(&Progress<'_>) -> Control,
    {
        self.run(Some(until), src, dst, on_progress).await
    }

    async fn run<R, W, F>(
        &self,
        until: Option<&CancellationToken>,
        src: &mut R,
        dst: &mut W,
        mut on_progress: F,
    ) -> Outcome
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
        F: FnMut(&Progress<'_>) -> Control,
    {
        let mut session = Session::start(self.config(), until);
        let mut buf = session.buffer();

        loop {
            if session.is_cancelled() {
                return finish(session, dst, Status::Cancelled).await;
            }

            let n = match src.read(&mut buf).await {
                Ok(0) => return finish(session, dst, Status::Completed).await,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return session.fail(error::read(e)),
            };

            let chunk = &buf[..n];
            session.notify(chunk, &mut on_progress);

            let transformed = session.transform(chunk);
            let out = transformed.as_deref().unwrap_or(chunk);
            if let Err(e) = dst.write_all(out).await {
                return session.fail(error::write(e));
            }

            if session.written(n) {
                return finish(session, dst, Status::Cancelled).await;
            }
        }
    }

    /// Copy a stream of byte chunks, such as a response body, into `dst`.
    ///
    /// Chunks from the stream are regrouped so the callback sees them in
    /// pieces of at most `buffer_size` bytes. An error yielded by the stream
    /// ends the copy as a read fault.
    pub async fn copy_stream<S, E, W, F>(&self, stream: S, dst: &mut W, on_progress: F) -> Outcome
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Into<BoxError>,
        W: AsyncWrite + Unpin + ?Sized,
        F: FnMut(&Progress<'_>) -> Control,
    {
        let mut reader = StreamReader::new(
            stream.map_err(|e| io::Error::new(io::ErrorKind::Other, e)),
        );
        self.copy_with_progress(&mut reader, dst, on_progress).await
    }
}

async fn finish<W>(session: Session<'_>, dst: &mut W, status: Status) -> Outcome
where
    W: AsyncWrite + Unpin + ?Sized,
{
    match dst.flush().await {
        Ok(()) => session.finish(status),
        Err(e) => session.fail(error::write(e)),
    }
}

impl Default for StreamCopier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StreamCopier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.inner.fmt_fields(&mut f.debug_struct("StreamCopier"))
    }
}

/// Shortcut to copy `src` into `dst` with the given buffer size, calling
/// `on_progress` once per chunk.
///
/// # Errors
///
/// Returns a builder error, before touching either stream, if `buffer_size`
/// is zero. I/O faults are reported in the `Outcome`.
///
/// ```
/// use fluenthttp::Control;
///
/// # async fn run() -> Result<(), fluenthttp::Error> {
/// let mut src: &[u8] = &[7; 10_000];
/// let mut dst = Vec::new();
/// let outcome = fluenthttp::copy(&mut src, &mut dst, 4096, |_| Control::Continue).await?;
/// assert_eq!(outcome.bytes_copied(), 10_000);
/// assert_eq!(outcome.chunks(), 3);
/// # Ok(())
/// # }
/// ```
pub async fn copy<R, W, F>(
    src: &mut R,
    dst: &mut W,
    buffer_size: usize,
    on_progress: F,
) -> crate::Result<Outcome>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
    F: FnMut(&Progress<'_>) -> Control,
{
    let copier = StreamCopier::builder().buffer_size(buffer_size).build()?;
    Ok(copier.copy_with_progress(src, dst, on_progress).await)
}
