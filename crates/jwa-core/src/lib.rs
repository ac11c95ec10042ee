pub mod config;
pub mod error;
pub mod types;

pub use error::{JwaError, JwaResult};
pub use types::{EncodedAead, Jwk};
