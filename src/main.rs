use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use musichub::{Aggregator, Config, PlatformSet};

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging (stderr, stdout queda para el JSON)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("musichub=debug".parse()?)
                .add_directive("reqwest=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando musichub v{}", env!("CARGO_PKG_VERSION"));

    // Cargar configuración
    let config = Config::load()?;

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--health-check") {
        return health_check(&config);
    }

    let mut platforms = PlatformSet::all();
    let mut terms = Vec::new();

    for arg in &args {
        match arg.strip_prefix("--platform=") {
            Some(list) => platforms = PlatformSet::parse_list(list).context("--platform")?,
            None => terms.push(arg.as_str()),
        }
    }

    let query = terms.join(" ");
    if query.trim().is_empty() {
        anyhow::bail!("Uso: musichub [--platform=youtube,spotify,jiosaavn] <búsqueda...>");
    }

    let aggregator = Aggregator::from_config(&config).context("No se pudo crear el cliente HTTP")?;

    // Ctrl+C cancela las búsquedas en curso
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⚠️ Señal de cancelación recibida");
            trigger.cancel();
        }
    });

    let report = aggregator.search_with_cancel(&query, platforms, &cancel).await?;

    for failure in &report.failures {
        warn!("⚠️ Resultados parciales: {}", failure);
    }

    if report.cached && report.is_partial() {
        warn!("⚠️ Resultados parciales en caché, fallaron [{}]", report.failed_platforms());
    }

    println!("{}", serde_json::to_string_pretty(&report.songs)?);
    Ok(())
}

fn health_check(config: &Config) -> Result<()> {
    println!("{}", config.summary());

    if config.active_platforms().is_empty() {
        anyhow::bail!("Ninguna plataforma activa");
    }

    println!("OK");
    Ok(())
}
