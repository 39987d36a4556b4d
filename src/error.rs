use std::error::Error as StdError;
use std::fmt;
use std::io;

use url::Url;

/// A `Result` alias where the `Err` case is `fluenthttp::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// The Errors that may occur when describing a request or copying a body.
///
/// Configuration problems are returned as `Err` when they are detected.
/// Faults hit while copying are carried by [`Outcome`](crate::Outcome)
/// instead, with the original I/O error available through
/// [`source`](StdError::source).
pub struct Error {
    inner: Box<Inner>,
}

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
    url: Option<Url>,
}

impl Error {
    pub(crate) fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(Inner {
                kind,
                source: source.map(Into::into),
                url: None,
            }),
        }
    }

    /// Returns a possible URL related to this error.
    pub fn url(&self) -> Option<&Url> {
        self.inner.url.as_ref()
    }

    /// Returns a mutable reference to the URL related to this error.
    ///
    /// This is useful if you need to remove sensitive information from the URL
    /// (e.g. an `oauth_token` query value) before logging the error.
    pub fn url_mut(&mut self) -> Option<&mut Url> {
        self.inner.url.as_mut()
    }

    /// Add a url related to this error (overwriting any existing).
    pub fn with_url(mut self, url: Url) -> Self {
        self.inner.url = Some(url);
        self
    }

    /// Strip the related url from this error (if, for example, it contains
    /// sensitive information).
    pub fn without_url(mut self) -> Self {
        self.inner.url = None;
        self
    }

    /// Returns true if the error is from a type Builder, or from invalid
    /// configuration such as a zero buffer size.
    pub fn is_builder(&self) -> bool {
        matches!(self.inner.kind, Kind::Builder)
    }

    /// Returns true if the error came from reading the source stream.
    pub fn is_read(&self) -> bool {
        matches!(self.inner.kind, Kind::Read)
    }

    /// Returns true if the error came from writing or flushing the
    /// destination stream.
    pub fn is_write(&self) -> bool {
        matches!(self.inner.kind, Kind::Write)
    }

    /// Returns true if the error is an I/O fault on either stream.
    pub fn is_io(&self) -> bool {
        self.is_read() || self.is_write()
    }

    /// Returns the underlying `io::ErrorKind`, if this error wraps one.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        self.source()
            .and_then(|e| e.downcast_ref::<io::Error>())
            .map(io::Error::kind)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut builder = f.debug_struct("fluenthttp::Error");

        builder.field("kind", &self.inner.kind);

        if let Some(ref url) = self.inner.url {
            builder.field("url", &url.as_str());
        }
        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }

        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.inner.kind {
            Kind::Builder => f.write_str("builder error")?,
            Kind::Read => f.write_str("error reading from source stream")?,
            Kind::Write => f.write_str("error writing to destination stream")?,
        }

        if let Some(url) = &self.inner.url {
            write!(f, " for url ({})", url)?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| &**e as _)
    }
}

#[derive(Debug)]
pub(crate) enum Kind {
    Builder,
    Read,
    Write,
}

// constructors

pub(crate) fn builder<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Builder, Some(e))
}

pub(crate) fn read(e: io::Error) -> Error {
    Error::new(Kind::Read, Some(e))
}

pub(crate) fn write(e: io::Error) -> Error {
    Error::new(Kind::Write, Some(e))
}

pub(crate) fn url_bad_scheme(url: Url) -> Error {
    Error::new(Kind::Builder, Some(BadScheme)).with_url(url)
}

#[derive(Debug)]
pub(crate) struct BadScheme;

impl fmt::Display for BadScheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("URL scheme is not allowed")
    }
}

impl StdError for BadScheme {}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn test_source_chain() {
        let root = Error::new(Kind::Read, None::<Error>);
        assert!(root.source().is_none());

        let link = write(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        assert!(link.source().is_some());
        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn mem_size_of() {
        use std::mem::size_of;
        assert_eq!(size_of::<Error>(), size_of::<usize>());
    }

    #[test]
    fn io_kind_is_preserved() {
        let err = read(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert!(err.is_read());
        assert!(err.is_io());
        assert!(!err.is_write());
        assert_eq!(err.io_kind(), Some(io::ErrorKind::ConnectionReset));
    }

    #[test]
    fn builder_error_display() {
        let err = builder("buffer size must be greater than zero");
        assert!(err.is_builder());
        assert!(!err.is_io());
        assert_eq!(err.to_string(), "builder error");
        assert_eq!(err.io_kind(), None);
    }

    #[test]
    fn url_is_shown_and_strippable() {
        let url = Url::parse("http://example.com/?oauth_token=secret").unwrap();
        let err = url_bad_scheme(url);
        assert_eq!(
            err.to_string(),
            "builder error for url (http://example.com/?oauth_token=secret)"
        );
        let err = err.without_url();
        assert!(err.url().is_none());
        assert_eq!(err.to_string(), "builder error");
    }
}
