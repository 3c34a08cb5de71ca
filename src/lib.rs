//! # docshield
//!
//! **Runtime interception layer that keeps document-backend endpoints out of sight.**
//!
//! docshield wraps the primitives a document viewer page uses to talk to its
//! backend (request functions, address objects, location, history, logging
//! and rendered text) so that signing/validation endpoints, object-storage
//! hosts and credential-bearing query parameters do not show up in network
//! logs, console output, the address bar or the page itself.
//!
//! This is obfuscation, not security. Anyone who can read the deployed code
//! can reach the real endpoints; nothing here provides confidentiality or
//! integrity guarantees.
//!
//! ## Architecture
//!
//! - **[`patterns`]** — ordered regex registry and per-surface redaction pipelines
//! - **[`intercept`]** — request, navigation and viewer wrappers sharing one context
//! - **[`console`]** — output filter for the logging sink
//! - **[`monitor`]** — rendered-text scrubber and session expiry
//! - **[`install`]** — captures the originals once and returns the wrapped set
//! - **[`config`]** — TOML configuration with environment substitution
//! - **[`logging`]** — `tracing` subscriber setup
//! - **[`error`]** — unified error type using `thiserror`

pub mod config;
pub mod console;
pub mod error;
pub mod install;
pub mod intercept;
pub mod logging;
pub mod monitor;
pub mod patterns;

pub use error::{Result, ShieldError};
pub use install::{HostPrimitives, HostScope, Shield};
