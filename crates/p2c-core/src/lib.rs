//! Core of the p2c compilation gateway.
//!
//! This crate provides:
//! - Gateway configuration loaded once at startup
//! - The line-oriented wire protocol spoken with the external compiler
//! - The process bridge that runs one compiler child per request

pub mod bridge;
pub mod config;
pub mod error;
pub mod protocol;

pub use bridge::ProcessBridge;
pub use config::GatewayConfig;
pub use error::{Error, Result};
pub use protocol::{CompilationOutcome, CompilationRequest, OutputMode, classify, encode};
