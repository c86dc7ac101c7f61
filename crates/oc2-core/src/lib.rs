pub mod asset;
pub mod command;
pub mod config;
pub mod error;
pub mod features;
pub mod log;
pub mod media;
pub mod relay;
pub mod response;
pub mod types;
pub mod validate;

pub use error::{Oc2Error, Result};
pub use relay::Relay;
