//! Error taxonomy for pipeline construction and frame rendering.
//!
//! Errors fall into two tiers with very different handling:
//!
//! - **Startup errors** ([`RenderError::ResourceExhausted`],
//!   [`RenderError::Compilation`]) halt pipeline construction and propagate
//!   to the caller. A half-built pipeline is never returned.
//! - **Runtime errors** ([`RenderError::TransientDevice`]) abort only the
//!   current frame. The frame loop logs them and retries on the next
//!   scheduled frame; depth of field is a visual enhancement, not a
//!   correctness-critical subsystem.
//!
//! [`RenderError::InvalidParameter`] sits outside both tiers: it is always a
//! programmer error (unknown uniform name, wrong-typed value, out-of-range
//! configuration), rejected synchronously with state unchanged.

use thiserror::Error;

/// Unified error type for the rendering crate.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A GPU texture or buffer allocation failed. Fatal during pipeline
    /// startup; recoverable at runtime by retrying on the next resize.
    #[error("gpu allocation failed: {0}")]
    ResourceExhausted(String),

    /// A shader failed to build, with the underlying diagnostic text.
    /// Fatal to pipeline startup and never retried.
    #[error("shader compilation failed: {0}")]
    Compilation(String),

    /// A bad uniform name, wrong-typed value, or out-of-range configuration
    /// value. Rejected synchronously; no state is changed.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A single-frame draw failure (surface lost or outdated). The frame is
    /// dropped and the loop continues.
    #[error("transient device error: {0}")]
    TransientDevice(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RenderError>;
