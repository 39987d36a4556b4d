//! Readers and writers that misbehave on purpose, for the copy tests.

use std::io::{self, Read, Write};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Yields `data`, then fails every read after it.
pub struct FailingReader {
    data: Vec<u8>,
    pos: usize,
}

impl FailingReader {
    pub fn new(data: &[u8]) -> FailingReader {
        FailingReader {
            data: data.to_vec(),
            pos: 0,
        }
    }

    fn next_chunk(&mut self, max: usize) -> io::Result<&[u8]> {
        if self.pos == self.data.len() {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset"));
        }
        let end = std::cmp::min(self.pos + max, self.data.len());
        let start = self.pos;
        self.pos = end;
        Ok(&self.data[start..end])
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = self.next_chunk(buf.len())?;
        let n = chunk.len();
        buf[..n].copy_from_slice(chunk);
        Ok(n)
    }
}

impl AsyncRead for FailingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let max = buf.remaining();
        Poll::Ready(self.get_mut().next_chunk(max).map(|chunk| buf.put_slice(chunk)))
    }
}

/// Accepts writes until the `fail_on`-th call (1-based), which fails.
pub struct FailingWriter {
    pub written: Vec<u8>,
    pub writes: usize,
    pub flushes: usize,
    fail_on: usize,
}

impl FailingWriter {
    pub fn fail_on(nth: usize) -> FailingWriter {
        FailingWriter {
            written: Vec::new(),
            writes: 0,
            flushes: 0,
            fail_on: nth,
        }
    }

    pub fn never() -> FailingWriter {
        FailingWriter::fail_on(usize::MAX)
    }
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        if self.writes == self.fail_on {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "disk unplugged"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

impl AsyncWrite for FailingWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(self.get_mut().write(buf))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(self.get_mut().flush())
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Accepts every write but fails to flush.
pub struct UnflushableWriter {
    pub written: Vec<u8>,
}

impl Write for UnflushableWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "flush failed"))
    }
}

/// `len` bytes counting up from zero, wrapping at 256.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| i as u8).collect()
}
