//! Distribution archive handling.
//!
//! - [`download`]: archive download trait and HTTP implementation.
//! - [`extraction`]: prefix-filtered `.tar.gz` extraction with path
//!   traversal protection.

pub mod download;
pub mod extraction;
