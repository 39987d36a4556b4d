use std::fmt;
use std::io::{self, Read, Write};

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::copy::{
    keep_going, CopierBuilder as AsyncCopierBuilder, Outcome, Progress, Session, Status,
};
use crate::error;
use crate::Control;

/// A blocking copier that moves a reader into a writer in fixed-size
/// chunks, reporting progress and honoring cancellation.
///
/// It has the same contract as the async [`StreamCopier`](crate::StreamCopier)
/// and wraps the same configuration, so the two may share one cancellation
/// token. The copy runs on the calling thread; cancellation may be triggered
/// from any other thread.
///
/// # Example
///
/// ```
/// use fluenthttp::blocking::StreamCopier;
///
/// let copier = StreamCopier::builder().buffer_size(4096).build()?;
/// let mut src: &[u8] = &[1; 10_000];
/// let mut dst = Vec::new();
///
/// let outcome = copier.copy(&mut src, &mut dst);
/// assert!(outcome.is_completed());
/// assert_eq!(outcome.bytes_copied(), 10_000);
/// # Ok::<(), fluenthttp::Error>(())
/// ```
#[derive(Clone)]
pub struct StreamCopier {
    inner: crate::StreamCopier,
}

/// A builder to configure a blocking `StreamCopier`.
#[must_use]
pub struct CopierBuilder {
    inner: AsyncCopierBuilder,
}

impl Default for CopierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CopierBuilder {
    /// Constructs a new `CopierBuilder`.
    pub fn new() -> CopierBuilder {
        CopierBuilder {
            inner: AsyncCopierBuilder::new(),
        }
    }

    /// Sets the size of the chunk buffer, in bytes.
    ///
    /// A size of zero makes [`build`](CopierBuilder::build) fail.
    pub fn buffer_size(self, size: usize) -> CopierBuilder {
        self.with_inner(|inner| inner.buffer_size(size))
    }

    /// Use an existing cancellation token.
    pub fn cancel_token(self, token: CancellationToken) -> CopierBuilder {
        self.with_inner(|inner| inner.cancel_token(token))
    }

    /// Rewrite every chunk before it is written to the destination.
    pub fn transform<F>(self, f: F) -> CopierBuilder
    where
        F: Fn(&[u8]) -> Bytes + Send + Sync + 'static,
    {
        self.with_inner(|inner| inner.transform(f))
    }

    /// Returns a `StreamCopier` that uses this configuration.
    ///
    /// # Errors
    ///
    /// This method fails if the buffer size is zero.
    pub fn build(self) -> crate::Result<StreamCopier> {
        self.inner.build().map(|inner| StreamCopier { inner })
    }

    fn with_inner<F>(mut self, func: F) -> CopierBuilder
    where
        F: FnOnce(AsyncCopierBuilder) -> AsyncCopierBuilder,
    {
        self.inner = func(self.inner);
        self
    }
}

impl fmt::Debug for CopierBuilder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl StreamCopier {
    /// Constructs a new `StreamCopier` with the default buffer size.
    pub fn new() -> StreamCopier {
        StreamCopier {
            inner: crate::StreamCopier::new(),
        }
    }

    /// Creates a `CopierBuilder` to configure a `StreamCopier`.
    pub fn builder() -> CopierBuilder {
        CopierBuilder::new()
    }

    /// The size of the chunk buffer, in bytes.
    pub fn buffer_size(&self) -> usize {
        self.inner.buffer_size()
    }

    /// A handle to this copier's cancellation token.
    pub fn cancel_token(&self) -> CancellationToken {
        self.inner.cancel_token()
    }

    /// Request cancellation of every copy made through this copier.
    ///
    /// Calling this more than once has no further effect.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Copy `src` into `dst` until `src` reaches end of stream.
    ///
    /// Neither stream is closed. `dst` is flushed when the copy completes or
    /// is cancelled.
    pub fn copy<R, W>(&self, src: &mut R, dst: &mut W) -> Outcome
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        self.copy_with_progress(src, dst, keep_going)
    }

    /// Copy `src` into `dst`, calling `on_progress` once per chunk, before
    /// the chunk is written.
    pub fn copy_with_progress<R, W, F>(
        &self,
        src: &mut R,
        dst: &mut W,
        on_progress: F,
    ) -> Outcome
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
        F: FnMut(&Progress<'_>) -> Control,
    {
        self.run(None, src, dst, on_progress)
    }

    /// Like [`copy_with_progress`](StreamCopier::copy_with_progress), but
    /// `until` also cancels this copy, leaving the copier usable.
    pub fn copy_with_progress_until<R, W, F>(
        &self,
        until: &CancellationToken,
        src: &mut R,
        dst: &mut W,
        on_progress: F,
    ) -> Outcome
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
        F: FnMut(&Progress<'_>) -> Control,
    {
        self.run(Some(until), src, dst, on_progress)
    }

    fn run<R, W, F>(
        &self,
        until: Option<&CancellationToken>,
        src: &mut R,
        dst: &mut W,
        mut on_progress: F,
    ) -> Outcome
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
        F: FnMut(&Progress<'_>) -> Control,
    {
        let mut session = Session::start(self.inner.config(), until);
        let mut buf = session.buffer();

        loop {
            if session.is_cancelled() {
                return finish(session, dst, Status::Cancelled);
            }

            let n = match src.read(&mut buf) {
                Ok(0) => return finish(session, dst, Status::Completed),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return session.fail(error::read(e)),
            };

            let chunk = &buf[..n];
            session.notify(chunk, &mut on_progress);

            let transformed = session.transform(chunk);
            let out = transformed.as_deref().unwrap_or(chunk);
            if let Err(e) = dst.write_all(out) {
                return session.fail(error::write(e));
            }

            if session.written(n) {
                return finish(session, dst, Status::Cancelled);
            }
        }
    }
}

fn finish<W>(session: Session<'_>, dst: &mut W, status: Status) -> Outcome
where
    W: Write + ?Sized,
{
    match dst.flush() {
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
        fmt::Debug::fmt(&self.inner, f)
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
/// let mut src: &[u8] = &[0; 10_000];
/// let mut dst = Vec::new();
/// let mut sizes = Vec::new();
///
/// let outcome = fluenthttp::blocking::copy(&mut src, &mut dst, 4096, |p| {
///     sizes.push(p.len());
///     Control::Continue
/// })?;
/// assert_eq!(sizes, [4096, 4096, 1808]);
/// assert!(outcome.is_completed());
/// # Ok::<(), fluenthttp::Error>(())
/// ```
pub fn copy<R, W, F>(
    src: &mut R,
    dst: &mut W,
    buffer_size: usize,
    on_progress: F,
) -> crate::Result<Outcome>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
    F: FnMut(&Progress<'_>) -> Control,
{
    let copier = StreamCopier::builder().buffer_size(buffer_size).build()?;
    Ok(copier.copy_with_progress(src, dst, on_progress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_are_not_started_for_zero_buffer() {
        let mut src = Cursor::new(vec![1u8; 16]);
        let mut dst = Vec::new();

        let err = copy(&mut src, &mut dst, 0, keep_going).unwrap_err();

        assert!(err.is_builder());
        assert_eq!(src.position(), 0);
    }

    #[test]
    fn shares_token_with_async_copier() {
        let token = CancellationToken::new();
        let copier = StreamCopier::builder().cancel_token(token.clone()).build().unwrap();
        assert!(!copier.cancel_token().is_cancelled());
        token.cancel();
        assert!(copier.cancel_token().is_cancelled());
    }

    #[test]
    fn interrupted_reads_are_retried() {
        struct Flaky {
            interrupted: bool,
            data: &'static [u8],
        }

        impl Read for Flaky {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
                }
                self.data.read(buf)
            }
        }

        let mut src = Flaky {
            interrupted: false,
            data: b"payload",
        };
        let mut dst = Vec::new();
        let outcome = StreamCopier::new().copy(&mut src, &mut dst);

        assert!(outcome.is_completed());
        assert_eq!(dst, b"payload");
    }
}
