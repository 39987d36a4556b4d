//! A blocking stream copier.
//!
//! The async [`StreamCopier`](crate::StreamCopier) is the default. When the
//! source and destination are plain `std::io` types, this module provides
//! the same copy contract on the calling thread.
//!
//! # Optional
//!
//! This requires the optional `blocking` feature to be enabled.
//!
//! # Cancelling from another thread
//!
//! ```
//! use std::thread;
//! use fluenthttp::blocking::StreamCopier;
//!
//! let copier = StreamCopier::builder().buffer_size(1024).build()?;
//! let token = copier.cancel_token();
//!
//! let worker = thread::spawn(move || {
//!     let mut src = std::io::repeat(0);
//!     let mut dst = std::io::sink();
//!     copier.copy(&mut src, &mut dst)
//! });
//!
//! token.cancel();
//! let outcome = worker.join().expect("copy thread panicked");
//! assert!(outcome.is_cancelled());
//! # Ok::<(), fluenthttp::Error>(())
//! ```

pub use self::copier::{copy, CopierBuilder, StreamCopier};

mod copier;
