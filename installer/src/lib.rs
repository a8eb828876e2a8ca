//! godownload installer library.
//!
//! This crate downloads a Go distribution archive, installs it under a chosen
//! root, provisions the `GOPATH` workspace, and wires the toolchain into the
//! shell profile and the `go` tool's own configuration. It is used by the
//! `godownload` CLI binary and can be driven programmatically for testing.
//!
//! # Modules
//!
//! - [`artefact`] - Archive download and extraction
//! - [`cli`] - Command-line argument definitions
//! - [`command`] - Subprocess execution seam
//! - [`config`] - Configuration file loading and settings resolution
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`environment`] - Capturing and applying the profile's environment
//! - [`error`] - Semantic error types for each pipeline stage
//! - [`output`] - Localised progress reporting and the dry-run plan
//! - [`pipeline`] - Stage orchestration
//! - [`platform`] - Go operating system and architecture names
//! - [`profile`] - Shell profile updates
//! - [`provision`] - `GOPATH` directory creation
//! - [`refresh`] - Profile refresh script
//! - [`relocate`] - Installation directory replacement
//! - [`request`] - The installation request and its derived paths
//! - [`tool_config`] - Persistent `go env -w` configuration

pub mod artefact;
pub mod cli;
pub mod command;
pub mod config;
pub mod dirs;
pub mod environment;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod profile;
pub mod provision;
pub mod refresh;
pub mod relocate;
pub mod request;
pub mod tool_config;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
