use anyhow::Context;
use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, BarGrant, Claims, Role};
use crate::cli::{utils::output_success, OutputFormat};
use crate::config::config;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(help = "Email carried in the token")]
    pub email: String,

    #[arg(long, help = "User id (random when omitted)")]
    pub user_id: Option<Uuid>,

    #[arg(
        long,
        default_value = "gerente",
        help = "Role in every --bar: admin, financeiro, gerente or funcionario"
    )]
    pub role: String,

    #[arg(long = "bar", help = "Bar id the user may act on (repeatable)")]
    pub bares: Vec<i64>,

    #[arg(long = "modulo", help = "Module granted in every --bar (repeatable)")]
    pub modulos: Vec<String>,

    #[arg(long, help = "Platform operator, not tied to any bar")]
    pub superadmin: bool,

    #[arg(long, help = "Display name")]
    pub nome: Option<String>,

    #[arg(long, help = "Lifetime in hours (defaults to ZYKOR_JWT_EXPIRY_HOURS)")]
    pub hours: Option<u64>,
}

pub async fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let role = Role::parse(&args.role)
        .with_context(|| format!("unknown role '{}'", args.role))?;
    let security = &config().security;
    let hours = args.hours.unwrap_or(security.jwt_expiry_hours);
    if args.bares.is_empty() && !args.superadmin {
        anyhow::bail!("pass at least one --bar, or --superadmin");
    }
    let grants = args
        .bares
        .iter()
        .map(|&bar_id| BarGrant::new(bar_id, role, args.modulos.clone()))
        .collect();

    let claims = Claims::new(
        args.user_id.unwrap_or_else(Uuid::new_v4),
        args.email,
        args.nome,
        args.superadmin,
        grants,
        hours,
    );
    let token = generate_jwt(&claims, &security.jwt_secret).context("failed to sign token")?;

    match output_format {
        OutputFormat::Text => println!("{}", token),
        OutputFormat::Json => output_success(
            &output_format,
            &format!("Token issued for {}", claims.email),
            Some(json!({
                "token": token,
                "expires_in": claims.expires_in(),
                "claims": claims,
            })),
        )?,
    }
    Ok(())
}
