use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use semvec_rag::{Aggregation, ChunkingStrategy};
use semvec_telemetry::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "semvec", version, about = "Semantic retrieval over stored text")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Where documents are stored
    #[arg(
        long,
        global = true,
        env = "SEMVEC_STORE",
        value_enum,
        default_value_t = StoreKind::Memory
    )]
    pub store: StoreKind,

    /// Embedding model (defaults to text-embedding-ada-002)
    #[arg(long, global = true, env = "OPENAI_EMBEDDING_MODEL")]
    pub model: Option<String>,

    /// Log output format: pretty or json
    #[arg(long, global = true, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Maximum chunk length in characters
    #[arg(long, global = true)]
    pub chunk_size: Option<usize>,

    /// Share of each chunk repeated at the start of the next
    #[arg(long, global = true)]
    pub overlap: Option<f32>,

    /// Chunking strategy: window or boundary
    #[arg(long, global = true)]
    pub chunking: Option<ChunkingStrategy>,

    /// How chunk vectors combine into one: mean or first
    #[arg(long, global = true)]
    pub aggregation: Option<Aggregation>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "SEMVEC_HOST", default_value = "127.0.0.1")]
        host: String,
        #[arg(long, env = "SEMVEC_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Print the embedding of a text without storing it
    Embed { text: String },
    /// Embed a text and store it
    Ingest {
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        text: Option<String>,
        /// Read the text from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Find stored texts similar to a query
    Query {
        text: String,
        /// Minimum cosine similarity (inclusive)
        #[arg(long)]
        threshold: Option<f32>,
        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    /// Process-local store; contents are lost on exit
    Memory,
    /// Supabase project (SUPABASE_URL, SUPABASE_API_KEY)
    Supabase,
    /// PostgreSQL with pgvector (DATABASE_URL)
    Pgvector,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "semvec", "query", "machine learning", "--threshold", "0.5", "--store", "supabase",
            "--chunking", "boundary",
        ])
        .unwrap();
        assert_eq!(cli.store, StoreKind::Supabase);
        assert_eq!(cli.chunking, Some(ChunkingStrategy::Boundary));
        match cli.command {
            Command::Query { text, threshold, limit } => {
                assert_eq!(text, "machine learning");
                assert_eq!(threshold, Some(0.5));
                assert_eq!(limit, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn ingest_takes_text_or_file_but_not_both() {
        assert!(Cli::try_parse_from(["semvec", "ingest"]).is_err());
        assert!(Cli::try_parse_from(["semvec", "ingest", "x", "--file", "a.txt"]).is_err());
        let cli = Cli::try_parse_from(["semvec", "ingest", "--file", "a.txt"]).unwrap();
        assert!(matches!(cli.command, Command::Ingest { text: None, file: Some(_) }));
    }

    #[test]
    fn log_format_and_aggregation_parse() {
        let cli = Cli::try_parse_from([
            "semvec", "--log-format", "json", "--aggregation", "first", "embed", "hi",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.aggregation, Some(Aggregation::First));
    }
}
