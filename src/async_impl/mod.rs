pub use self::copier::{copy, StreamCopier};

pub mod copier;
