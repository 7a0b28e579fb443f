use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Args;
use serde_json::{json, Value};

use crate::cli::{utils::{output_error, output_success}, OutputFormat};
use crate::config::config;

#[derive(Args, Debug)]
pub struct PingArgs {
    #[arg(long, help = "Server base URL (defaults to http://localhost:<configured port>)")]
    pub url: Option<String>,

    #[arg(long, default_value_t = 5, help = "Timeout in seconds")]
    pub timeout: u64,
}

pub async fn handle(args: PingArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let base = args
        .url
        .unwrap_or_else(|| format!("http://localhost:{}", config().api.port));
    let health_url = url::Url::parse(&base)
        .and_then(|u| u.join("/health"))
        .with_context(|| format!("invalid server URL '{}'", base))?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let started = Instant::now();
    let response = client
        .get(health_url.clone())
        .send()
        .await
        .with_context(|| format!("{} unreachable", health_url))?;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        output_success(
            &output_format,
            &format!("{} healthy ({} ms)", base, elapsed_ms),
            Some(json!({ "status": status.as_u16(), "elapsed_ms": elapsed_ms, "health": body })),
        )
    } else {
        let message = body["error"].as_str().unwrap_or("unhealthy").to_string();
        output_error(&output_format, &format!("{}: {}", base, message), Some(status.as_str()))?;
        anyhow::bail!("{} answered {}", health_url, status)
    }
}
