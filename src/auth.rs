//! OAuth2 bearer-style authenticators.
//!
//! An [`Authenticate`] implementation adds credentials to a [`Request`],
//! either as a header or as a query string value. Nothing else about the
//! request is touched.

use std::fmt;

use http::header::{HeaderValue, AUTHORIZATION};

use crate::error;
use crate::request::{QueryString, Request};

/// The query string name used by [`OAuth2Query`].
pub const OAUTH_TOKEN_PARAM: &str = "oauth_token";

/// Adds credentials to a request.
pub trait Authenticate: Send + Sync {
    /// Inject credentials into `req`.
    fn authenticate(&self, req: &mut Request) -> crate::Result<()>;
}

impl<A: Authenticate + ?Sized> Authenticate for Box<A> {
    fn authenticate(&self, req: &mut Request) -> crate::Result<()> {
        (**self).authenticate(req)
    }
}

impl<A: Authenticate + ?Sized> Authenticate for std::sync::Arc<A> {
    fn authenticate(&self, req: &mut Request) -> crate::Result<()> {
        (**self).authenticate(req)
    }
}

/// Sends the OAuth2 token in the `Authorization` request header, as
/// `Authorization: OAuth <token>`.
#[derive(Clone)]
pub struct OAuth2Header {
    token: String,
    value: HeaderValue,
}

impl OAuth2Header {
    /// Creates an authenticator for `token`.
    ///
    /// # Errors
    ///
    /// Fails if the token is empty or cannot be sent in a header.
    pub fn new<T: Into<String>>(token: T) -> crate::Result<OAuth2Header> {
        let token = non_empty(token.into())?;
        let mut value =
            HeaderValue::from_str(&format!("OAuth {}", token)).map_err(error::builder)?;
        value.set_sensitive(true);
        Ok(OAuth2Header { token, value })
    }

    /// The OAuth2 token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Authenticate for OAuth2Header {
    fn authenticate(&self, req: &mut Request) -> crate::Result<()> {
        req.headers_mut().insert(AUTHORIZATION, self.value.clone());
        Ok(())
    }
}

impl fmt::Debug for OAuth2Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("OAuth2Header").field("token", &"[redacted]").finish()
    }
}

/// Sends the OAuth2 token as the `oauth_token` query string value.
#[derive(Clone)]
pub struct OAuth2Query {
    token: String,
}

impl OAuth2Query {
    /// Creates an authenticator for `token`.
    ///
    /// # Errors
    ///
    /// Fails if the token is empty.
    pub fn new<T: Into<String>>(token: T) -> crate::Result<OAuth2Query> {
        non_empty(token.into()).map(|token| OAuth2Query { token })
    }

    /// The OAuth2 token.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Authenticate for OAuth2Query {
    fn authenticate(&self, req: &mut Request) -> crate::Result<()> {
        req.query_strings_mut().push(QueryString::from_parts(
            OAUTH_TOKEN_PARAM.to_owned(),
            self.token.clone(),
        ));
        Ok(())
    }
}

impl fmt::Debug for OAuth2Query {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("OAuth2Query").field("token", &"[redacted]").finish()
    }
}

fn non_empty(token: String) -> crate::Result<String> {
    if token.is_empty() {
        Err(error::builder("oauth token must not be empty"))
    } else {
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request {
        Request::get("https://graph.example.com").unwrap()
    }

    #[test]
    fn header_authenticator_sets_authorization() {
        let mut req = request();
        let auth = OAuth2Header::new("abc123").unwrap();
        auth.authenticate(&mut req).unwrap();

        let value = &req.headers()[AUTHORIZATION];
        assert_eq!(value, "OAuth abc123");
        assert!(value.is_sensitive());
        assert!(req.query_strings().is_empty());
    }

    #[test]
    fn header_authenticator_replaces_existing() {
        let mut req = request();
        req.headers_mut()
            .insert(AUTHORIZATION, HeaderValue::from_static("Basic old"));
        OAuth2Header::new("new").unwrap().authenticate(&mut req).unwrap();

        assert_eq!(req.headers().get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(req.headers()[AUTHORIZATION], "OAuth new");
    }

    #[test]
    fn query_authenticator_appends_token() {
        let mut req = request();
        req.set_resource_path("me");
        OAuth2Query::new("t/k n").unwrap().authenticate(&mut req).unwrap();

        assert!(req.headers().is_empty());
        assert_eq!(
            req.url().as_str(),
            "https://graph.example.com/me?oauth_token=t%2Fk+n"
        );
    }

    #[test]
    fn empty_tokens_are_rejected() {
        assert!(OAuth2Header::new("").unwrap_err().is_builder());
        assert!(OAuth2Query::new(String::new()).unwrap_err().is_builder());
    }

    #[test]
    fn header_token_must_be_header_safe() {
        assert!(OAuth2Header::new("bad\ntoken").unwrap_err().is_builder());
    }

    #[test]
    fn debug_redacts_token() {
        let auth = OAuth2Header::new("secret").unwrap();
        assert!(!format!("{:?}", auth).contains("secret"));
        assert_eq!(auth.token(), "secret");

        let auth = OAuth2Query::new("secret").unwrap();
        assert!(!format!("{:?}", auth).contains("secret"));
    }

    #[test]
    fn boxed_authenticators_are_usable() {
        let auths: Vec<Box<dyn Authenticate>> = vec![
            Box::new(OAuth2Header::new("h").unwrap()),
            Box::new(OAuth2Query::new("q").unwrap()),
        ];
        let mut req = request();
        for auth in &auths {
            auth.authenticate(&mut req).unwrap();
        }
        assert_eq!(req.headers()[AUTHORIZATION], "OAuth h");
        assert_eq!(req.query_strings()[0].value(), "q");
    }
}
