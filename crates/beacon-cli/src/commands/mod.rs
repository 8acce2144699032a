//! CLI command implementations.

pub mod codec;
pub mod init;
pub mod run;
