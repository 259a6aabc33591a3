//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod classify;
pub mod enforce;
pub mod forget;
pub mod init;
pub mod migrate;
pub mod validate;
