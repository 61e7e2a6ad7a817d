pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod hamming;
pub mod ingest;
pub mod matrix;
mod metrics;
pub mod preprocess;
pub mod query;
pub mod rank;
pub mod report;
pub mod session;
pub mod types;
pub mod utils;

pub use config::Opts;
pub use error::{Error, Result};
pub use session::{RankingSession, SessionState};
