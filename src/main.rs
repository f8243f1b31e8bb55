use anyhow::{bail, Context, Result};
use cli::{Cli, Commands};
use config::{load_config, validate_config};
use exchange::api::{create_router, ApiState};
use exchange::{Exchange, User};
use observability::{init_logging, LogFormat};
use settlement::{NoopSettler, RpcSettler, Settler};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    match cli.command {
        Commands::Start { config, log_format } => {
            let format: LogFormat = log_format
                .parse()
                .map_err(|err: String| anyhow::anyhow!(err))?;
            init_logging("spotx", format)?;
            start(config).await
        }
        Commands::Validate { config } => validate(config),
    }
}

async fn start(path: PathBuf) -> Result<()> {
    let cfg = load_config(&path)?;
    let problems = validate_config(&cfg);
    if !problems.is_empty() {
        for problem in &problems {
            error!("{problem}");
        }
        bail!("cannot start exchange, configuration is invalid");
    }

    let settler: Arc<dyn Settler> = if cfg.settlement.enabled {
        info!(rpc_url = %cfg.settlement.rpc_url, "settlement enabled");
        Arc::new(RpcSettler::new(cfg.settlement.rpc_url.clone()))
    } else {
        warn!("settlement disabled, matches will not move value");
        Arc::new(NoopSettler)
    };

    let exchange = Arc::new(Exchange::new(
        cfg.markets.iter().map(|m| m.symbol.clone()),
        cfg.users.iter().map(|u| User {
            id: u.id,
            address: u.address.clone(),
        }),
        settler,
    ));
    let router = create_router(ApiState { exchange });

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid bind address {}:{}",
                cfg.server.host, cfg.server.port
            )
        })?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "exchange listening");

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received ctrl-c, shutting down");
            token.cancel();
        }
    });

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

fn validate(path: PathBuf) -> Result<()> {
    let cfg = load_config(&path)?;
    let problems = validate_config(&cfg);
    if !problems.is_empty() {
        for problem in &problems {
            println!("error: {problem}");
        }
        bail!("configuration validation failed");
    }

    println!("configuration is valid");
    println!("markets: {}", cfg.markets.len());
    println!("users: {}", cfg.users.len());
    println!(
        "settlement: {}",
        if cfg.settlement.enabled {
            cfg.settlement.rpc_url.as_str()
        } else {
            "disabled"
        }
    );
    Ok(())
}
