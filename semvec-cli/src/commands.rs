use std::process::ExitCode;

use anyhow::Context;
use semvec_rag::{ApiResponse, Document, EmbeddedText, MatchParams, QueryResult};
use semvec_server::{ServerConfig, run_server};
use serde::Serialize;

use crate::cli::{Cli, Command};
use crate::wiring::build_pipeline;

/// Print `response` as pretty JSON on stdout.
fn emit<T: Serialize>(response: ApiResponse<T>) -> anyhow::Result<ExitCode> {
    let json = serde_json::to_string_pretty(&response).context("failed to serialize response")?;
    println!("{json}");
    Ok(if response.success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Execute the parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let pipeline = build_pipeline(&cli).await?;

    match cli.command {
        Command::Serve { host, port } => {
            let config = ServerConfig { host, port, ..ServerConfig::default() };
            run_server(config, pipeline).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Embed { text } => {
            emit(ApiResponse::<EmbeddedText>::from(pipeline.embed_text(&text).await))
        }
        Command::Ingest { text, file } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, None) => String::new(),
            };
            emit(ApiResponse::<Document>::from(pipeline.ingest(&text).await))
        }
        Command::Query { text, threshold, limit } => {
            let defaults = pipeline.config().match_params();
            let params = MatchParams::new(
                threshold.unwrap_or(defaults.threshold),
                limit.unwrap_or(defaults.limit),
            );
            let results = pipeline.query_with(&text, params).await;
            emit(ApiResponse::<Vec<QueryResult>>::from(results))
        }
    }
}
