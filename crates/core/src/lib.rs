//! Shared vocabulary for the cryptopulse scoring engine: indicator
//! categories, the structured details map, process configuration and the
//! crate-wide error type.

pub mod category;
pub mod config;
pub mod error;

pub use category::*;
pub use config::Config;
pub use error::*;
