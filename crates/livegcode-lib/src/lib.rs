//! livegcode — rule-based interception of a printer's G-code stream, plus a
//! background lighting pattern generator sharing the same command channel.

pub mod channel;
pub mod config;
pub mod error;
pub mod intercept;
pub mod lighting;
pub mod rules;
pub mod sink;

pub use error::LiveGcodeError;
