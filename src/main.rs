mod checker;
mod compiler;
mod config;
mod core;
mod error;
mod executer;
mod judger;
mod languages;
mod sandbox;

use std::process::ExitCode;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{error, info};

use crate::config::JudgeConfig;
use crate::core::request::MAX_REQUEST_BYTES;
use crate::core::{ErrorResponse, JudgeRequest, JudgeResponse};
use crate::error::{JudgeError, Result};
use crate::judger::process_judge_request;
use crate::sandbox::create_sandbox;

/// Read the whole request, refusing anything larger than `limit` bytes
async fn read_request<R: AsyncRead + Unpin>(reader: R, limit: usize) -> Result<String> {
    let mut buf = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut buf).await?;
    if buf.len() > limit {
        return Err(JudgeError::InputTooLarge { limit });
    }

    String::from_utf8(buf).map_err(|e| JudgeError::InvalidJson(format!("input is not UTF-8: {}", e)))
}

async fn run() -> Result<JudgeResponse> {
    let config = JudgeConfig::from_env()?;
    let text = read_request(tokio::io::stdin(), MAX_REQUEST_BYTES).await?;
    let request = JudgeRequest::parse(&text)?;

    let sandbox = create_sandbox(&config);
    process_judge_request(&request, sandbox.as_ref(), &config).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // stdout carries the response, logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("judge_engine=info")),
        )
        .init();

    dotenvy::dotenv().ok();

    info!("Starting judge engine...");

    let (body, code) = match run().await {
        Ok(response) => (serde_json::to_string(&response), ExitCode::SUCCESS),
        Err(e) => {
            error!("Judge request failed: code={}, {}", e.code(), e);
            let response = ErrorResponse {
                error: e.to_string(),
            };
            (serde_json::to_string(&response), ExitCode::FAILURE)
        }
    };

    match body {
        Ok(json) => {
            println!("{}", json);
            code
        }
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            println!(r#"{{"error":"IO_ERROR: failed to serialize response"}}"#);
            ExitCode::FAILURE
        }
    }
}
