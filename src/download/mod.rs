//! Validated streaming downloads and canonical filename derivation.
//!
//! - [`DownloadEngine`] - streamed download with retry, backoff, and
//!   content-type/size validation
//! - [`DownloadError`] - structured failure taxonomy
//! - [`derive_filename`] - issue title to canonical filename

mod engine;
mod error;
mod filename;

pub use engine::{DownloadEngine, DownloadOutcome};
pub use error::DownloadError;
pub use filename::derive_filename;
