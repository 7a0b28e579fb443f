use clap::Args;
use serde_json::json;

use crate::cli::{utils::{format_table, output_value}, OutputFormat};
use crate::proxy::{routes::find, PROXY_ROUTES};
use crate::server::ROUTE_TABLE;

#[derive(Args, Debug)]
pub struct RoutesArgs {
    #[arg(long, help = "Show the edge-function route with this exact path")]
    pub path: Option<String>,
}

pub async fn handle(args: RoutesArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    if let Some(path) = args.path {
        let route = find(&path).ok_or_else(|| anyhow::anyhow!("no edge-function route at {}", path))?;
        let details = json!({
            "path": route.path,
            "function": route.function,
            "module": route.module.as_str(),
            "required": route.required,
            "description": route.description,
        });
        return output_value(&output_format, &details);
    }

    match output_format {
        OutputFormat::Json => {
            let routes: Vec<_> = ROUTE_TABLE
                .iter()
                .map(|(method, path, access)| json!({ "method": method, "path": path, "access": access }))
                .chain(PROXY_ROUTES.iter().map(|r| {
                    json!({
                        "method": "POST",
                        "path": r.path,
                        "access": format!("{} + bar", r.module.as_str()),
                        "function": r.function,
                        "required": r.required,
                    })
                }))
                .collect();
            output_value(&output_format, &json!({ "routes": routes }))?;
        }
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = ROUTE_TABLE
                .iter()
                .map(|(method, path, access)| vec![method.to_string(), path.to_string(), access.to_string(), String::new()])
                .chain(PROXY_ROUTES.iter().map(|r| {
                    vec![
                        "POST".to_string(),
                        r.path.to_string(),
                        format!("{} + bar", r.module.as_str()),
                        r.function.to_string(),
                    ]
                }))
                .collect();
            println!("{}", format_table(&["METHOD", "PATH", "ACCESS", "FUNCTION"], &rows));
        }
    }
    Ok(())
}
