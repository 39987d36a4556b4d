#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # fluenthttp
//!
//! The `fluenthttp` crate describes outgoing HTTP requests and copies
//! response bodies with progress reporting and cooperative cancellation.
//!
//! - A [`Request`] holds the base url, resource path, method, timeout,
//!   headers, query string values and decompression preferences.
//! - [`OAuth2Header`] and [`OAuth2Query`] add an OAuth2 token to a request.
//! - A [`StreamCopier`] moves bytes from a source into a destination in
//!   fixed-size chunks, calling back once per chunk and stopping cleanly
//!   when asked to.
//!
//! Sending requests is left to an HTTP client of your choice.
//!
//! ## Copying a body
//!
//! For a single copy, you can use the [`copy()`] shortcut.
//!
//! ```
//! use fluenthttp::Control;
//!
//! # async fn run() -> Result<(), fluenthttp::Error> {
//! let mut body: &[u8] = b"a response body";
//! let mut file = Vec::new();
//!
//! let outcome = fluenthttp::copy(&mut body, &mut file, 4096, |progress| {
//!     println!("{} bytes", progress.total());
//!     Control::Continue
//! })
//! .await?;
//! assert!(outcome.is_completed());
//! # Ok(())
//! # }
//! ```
//!
//! To cancel, or to reuse one configuration across many copies, build a
//! [`StreamCopier`].
//!
//! ```
//! use fluenthttp::{Control, StreamCopier};
//!
//! # async fn run() -> Result<(), fluenthttp::Error> {
//! let copier = StreamCopier::builder().buffer_size(16 * 1024).build()?;
//! let cancel = copier.cancel_token();
//!
//! let mut body: &[u8] = &[0; 100_000];
//! let mut file = Vec::new();
//! let outcome = copier
//!     .copy_with_progress(&mut body, &mut file, |progress| {
//!         if progress.total() >= 50_000 {
//!             Control::Cancel
//!         } else {
//!             Control::Continue
//!         }
//!     })
//!     .await;
//!
//! assert!(outcome.is_cancelled());
//! // `cancel` may also be triggered from any other task or thread.
//! # drop(cancel);
//! # Ok(())
//! # }
//! ```
//!
//! I/O faults never escape as `Err` from a copy; they end the copy with
//! [`Status::Failed`] and are available from [`Outcome::error`]. Only
//! configuration problems, such as a zero buffer size, are returned as `Err`.
//!
//! ## Optional Features
//!
//! - **blocking**: Provides the [blocking][] copier.
//! - **query**: Provides [`Request::query`] for serializable query values.
//!
//! [blocking]: ./blocking/index.html

pub use http::header;
pub use http::Method;
pub use tokio_util::sync::CancellationToken;
pub use url::Url;

pub use self::async_impl::{copy, StreamCopier};
pub use self::auth::{Authenticate, OAuth2Header, OAuth2Query, OAUTH_TOKEN_PARAM};
pub use self::copy::{CopierBuilder, Control, Outcome, Progress, Status, DEFAULT_BUFFER_SIZE};
pub use self::error::{Error, Result};
pub use self::into_url::IntoUrl;
pub use self::request::{Decompression, QueryString, Request};

mod async_impl;
mod auth;
#[cfg(feature = "blocking")]
#[cfg_attr(docsrs, doc(cfg(feature = "blocking")))]
pub mod blocking;
mod copy;
mod error;
mod into_url;
mod request;
