//! ACP Core - Protocol vocabulary for the Agent Control Protocol
//!
//! This crate provides the wire-level types shared by the conformance engine
//! and the reference target:
//!
//! - JSON-RPC 2.0 envelope classification (calls, notifications, responses)
//! - Standard and protocol-specific error codes
//! - Method-name constants for the session lifecycle
//! - [`AcpError`] for targets that need to emit error objects

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod protocol;

pub use error::*;
pub use protocol::*;
