pub mod config;
pub mod logging;

pub mod attempts;
pub mod control;
pub mod dashboard;
pub mod download;
pub mod error;
pub mod filter;
pub mod job;
pub mod nav;
pub mod registry;
pub mod source;

pub use error::{Error, ParseError, SourceError};
