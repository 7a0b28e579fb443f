use anyhow::Context;
use clap::Args;
use serde_json::Value;

use crate::cli::{utils::{output_error, output_value}, OutputFormat};
use crate::config::config;
use crate::proxy::{FunctionProxy, ProxyError};

#[derive(Args, Debug)]
pub struct InvokeArgs {
    #[arg(help = "Edge function name, e.g. contaazul-sync")]
    pub function: String,

    #[arg(long, short, default_value = "{}", help = "JSON payload")]
    pub data: String,
}

pub async fn handle(args: InvokeArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let payload: Value = serde_json::from_str(&args.data).context("--data is not valid JSON")?;
    if !payload.is_object() {
        anyhow::bail!("--data must be a JSON object");
    }

    let proxy = FunctionProxy::new(reqwest::Client::new(), &config().supabase);
    match proxy.invoke(&args.function, &payload).await {
        Ok(relayed) => {
            tracing::debug!("{} answered {}", args.function, relayed.status);
            output_value(&output_format, &relayed.body)
        }
        Err(ProxyError::Status { status, message, .. }) => {
            output_error(&output_format, &message, Some(&status.to_string()))?;
            anyhow::bail!("{} failed with status {}", args.function, status)
        }
        Err(e) => Err(e.into()),
    }
}
