//! Command-line launcher for semvec.
//!
//! ```text
//! semvec serve --port 8080
//! semvec ingest "Artificial intelligence is the study of intelligent agents"
//! semvec query "machine learning" --threshold 0.8 --limit 5
//! ```

pub mod cli;
pub mod commands;
pub mod wiring;

pub use cli::{Cli, Command, StoreKind};
pub use commands::run;
