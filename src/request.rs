use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderMap, HeaderValue};
use http::Method;
use url::Url;

use crate::error;
use crate::auth::Authenticate;
use crate::into_url::IntoUrl;

/// A description of an outgoing HTTP request.
///
/// A `Request` keeps the base url and the resource path apart, together with
/// the method, timeout, headers, query string values and decompression
/// preferences. The full url is assembled by [`Request::url`].
///
/// A request may also carry an [`Authenticate`] strategy, applied by
/// [`Request::authenticate`] once the request is otherwise ready.
///
/// ```
/// use fluenthttp::{Method, Request};
///
/// let mut req = Request::new(Method::GET, "https://graph.example.com")?;
/// req.set_resource_path("me/friends");
/// req.query_strings_mut().push(fluenthttp::QueryString::new("limit", "10")?);
///
/// assert_eq!(req.url().as_str(), "https://graph.example.com/me/friends?limit=10");
/// # Ok::<(), fluenthttp::Error>(())
/// ```
#[derive(Clone)]
pub struct Request {
    method: Method,
    base_url: Url,
    resource_path: Option<String>,
    timeout: Option<Duration>,
    headers: HeaderMap,
    query_strings: Vec<QueryString>,
    decompression: Decompression,
    authenticator: Option<Arc<dyn Authenticate>>,
}

impl Request {
    /// Constructs a new request against `base_url`.
    ///
    /// # Errors
    ///
    /// Fails if `base_url` is empty, cannot be parsed, or has no host.
    pub fn new<U: IntoUrl>(method: Method, base_url: U) -> crate::Result<Request> {
        Ok(Request {
            method,
            base_url: base_url.into_url()?,
            resource_path: None,
            timeout: None,
            headers: HeaderMap::new(),
            query_strings: Vec::new(),
            decompression: Decompression::default(),
            authenticator: None,
        })
    }

    /// Constructs a new `GET` request against `base_url`.
    pub fn get<U: IntoUrl>(base_url: U) -> crate::Result<Request> {
        Request::new(Method::GET, base_url)
    }

    /// Get the method.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get a mutable reference to the method.
    #[inline]
    pub fn method_mut(&mut self) -> &mut Method {
        &mut self.method
    }

    /// Get the base url.
    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the resource path, if one is set.
    #[inline]
    pub fn resource_path(&self) -> Option<&str> {
        self.resource_path.as_deref()
    }

    /// Set the resource path appended to the base url.
    ///
    /// Surrounding whitespace is trimmed and a leading `/` is added when
    /// missing. A path that is empty after trimming clears the resource path.
    pub fn set_resource_path(&mut self, path: &str) {
        let path = path.trim();
        self.resource_path = if path.is_empty() {
            None
        } else if path.starts_with('/') {
            Some(path.to_owned())
        } else {
            Some(format!("/{}", path))
        };
    }

    /// Get the timeout.
    #[inline]
    pub fn timeout(&self) -> Option<&Duration> {
        self.timeout.as_ref()
    }

    /// Get a mutable reference to the timeout.
    #[inline]
    pub fn timeout_mut(&mut self) -> &mut Option<Duration> {
        &mut self.timeout
    }

    /// Get the headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a mutable reference to the headers.
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Get the query string values, in the order they will be sent.
    #[inline]
    pub fn query_strings(&self) -> &[QueryString] {
        &self.query_strings
    }

    /// Get a mutable reference to the query string values.
    #[inline]
    pub fn query_strings_mut(&mut self) -> &mut Vec<QueryString> {
        &mut self.query_strings
    }

    /// Get the decompression preferences.
    #[inline]
    pub fn decompression(&self) -> &Decompression {
        &self.decompression
    }

    /// Get a mutable reference to the decompression preferences.
    #[inline]
    pub fn decompression_mut(&mut self) -> &mut Decompression {
        &mut self.decompression
    }

    /// Get the authenticator, if one is attached.
    #[inline]
    pub fn authenticator(&self) -> Option<&dyn Authenticate> {
        self.authenticator.as_deref()
    }

    /// Get a mutable reference to the authenticator.
    #[inline]
    pub fn authenticator_mut(&mut self) -> &mut Option<Arc<dyn Authenticate>> {
        &mut self.authenticator
    }

    /// Attach the strategy used by [`authenticate`](Request::authenticate),
    /// replacing any previous one.
    pub fn set_authenticator<A: Authenticate + 'static>(&mut self, auth: A) {
        self.authenticator = Some(Arc::new(auth));
    }

    /// Apply the attached authenticator to this request.
    ///
    /// Does nothing when no authenticator is attached. Each call applies it
    /// again, so a query authenticator called twice adds its value twice.
    ///
    /// ```
    /// use fluenthttp::{OAuth2Query, Request};
    ///
    /// let mut req = Request::get("https://graph.example.com")?;
    /// req.set_authenticator(OAuth2Query::new("tok")?);
    /// req.set_resource_path("me");
    ///
    /// req.authenticate()?;
    /// assert_eq!(req.url().as_str(), "https://graph.example.com/me?oauth_token=tok");
    /// # Ok::<(), fluenthttp::Error>(())
    /// ```
    pub fn authenticate(&mut self) -> crate::Result<()> {
        match self.authenticator.clone() {
            Some(auth) => auth.authenticate(self),
            None => Ok(()),
        }
    }

    /// Modify the query string of the URL.
    ///
    /// Serializes `query` with `serde_urlencoded` and appends the resulting
    /// pairs. Existing values are kept, so the same name may appear more
    /// than once.
    ///
    /// # Errors
    ///
    /// This method fails if `query` cannot be serialized into a query string,
    /// or if any value has an empty name. The request is unchanged on error.
    #[cfg(feature = "query")]
    #[cfg_attr(docsrs, doc(cfg(feature = "query")))]
    pub fn query<T: serde::Serialize + ?Sized>(&mut self, query: &T) -> crate::Result<()> {
        let encoded = serde_urlencoded::to_string(query).map_err(error::builder)?;
        let pairs = url::form_urlencoded::parse(encoded.as_bytes())
            .map(|(name, value)| QueryString::new(name, value))
            .collect::<crate::Result<Vec<_>>>()?;
        self.query_strings.extend(pairs);
        Ok(())
    }

    /// Assemble the full url: the base url, then the resource path, then
    /// any query already on the base url followed by the query string
    /// values.
    pub fn url(&self) -> Url {
        let mut url = self.base_url.clone();

        if let Some(ref path) = self.resource_path {
            let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
            url.set_path(&joined);
        }

        if !self.query_strings.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for qs in &self.query_strings {
                pairs.append_pair(&qs.name, &qs.value);
            }
        }

        url
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("base_url", &self.base_url.as_str())
            .field("resource_path", &self.resource_path)
            .field("timeout", &self.timeout)
            .field("headers", &self.headers)
            .field("query_strings", &self.query_strings)
            .field("decompression", &self.decompression)
            .field("authenticator", &self.authenticator.is_some())
            .finish()
    }
}

/// A single `name=value` pair of a query string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryString {
    name: String,
    value: String,
}

impl QueryString {
    /// Creates a new query string value.
    ///
    /// The value may be empty; the name may not.
    ///
    /// # Errors
    ///
    /// Fails if `name` is empty or only whitespace.
    pub fn new<N, V>(name: N, value: V) -> crate::Result<QueryString>
    where
        N: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(error::builder("query string name must not be empty"));
        }
        Ok(QueryString::from_parts(name, value.into()))
    }

    pub(crate) fn from_parts(name: String, value: String) -> QueryString {
        QueryString { name, value }
    }

    /// The name of the query string value.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value, not yet percent-encoded.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Which response encodings a request is willing to accept.
///
/// Both `gzip` and `deflate` are enabled by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decompression {
    gzip: bool,
    deflate: bool,
}

impl Default for Decompression {
    fn default() -> Self {
        Decompression {
            gzip: true,
            deflate: true,
        }
    }
}

impl Decompression {
    /// Accept no compressed encodings.
    pub fn none() -> Decompression {
        Decompression {
            gzip: false,
            deflate: false,
        }
    }

    /// Enable or disable `gzip`.
    pub fn gzip(mut self, enable: bool) -> Decompression {
        self.gzip = enable;
        self
    }

    /// Enable or disable `deflate`.
    pub fn deflate(mut self, enable: bool) -> Decompression {
        self.deflate = enable;
        self
    }

    /// Returns true if `gzip` is accepted.
    pub fn is_gzip(&self) -> bool {
        self.gzip
    }

    /// Returns true if `deflate` is accepted.
    pub fn is_deflate(&self) -> bool {
        self.deflate
    }

    /// The `Accept-Encoding` value for these preferences, or `None` if
    /// nothing compressed is accepted.
    pub fn accept_encoding(&self) -> Option<HeaderValue> {
        match (self.gzip, self.deflate) {
            (true, true) => Some(HeaderValue::from_static("gzip, deflate")),
            (true, false) => Some(HeaderValue::from_static("gzip")),
            (false, true) => Some(HeaderValue::from_static("deflate")),
            (false, false) => None,
        }
    }
}
