#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use clap::Parser;
use healthwatch::{LibsqlStore, Orchestrator};
use tracing::info;

mod config;
mod error;
mod routes;
mod seed;

use config::Config;
use logger::init_tracing;
use seed::Seed;

#[derive(Debug, Parser)]
#[command(version, about = "Service health monitoring and alerting")]
struct Cli {
    /// Config file, created with defaults when missing
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Serve the control API without starting any monitor
    #[arg(long)]
    no_autostart: bool,

    /// Import services, channels and templates from a TOML file first
    #[arg(long, value_name = "PATH")]
    seed: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_config(cli.config.as_ref()).context("loading configuration")?;

    if cli.print_config {
        print!("{config}");
        return Ok(());
    }
    info!("\n{config}");

    let store = Arc::new(
        LibsqlStore::open(&config.database.path)
            .await
            .with_context(|| format!("opening database {}", config.database.path.display()))?,
    );

    if let Some(path) = &cli.seed {
        Seed::from_file(path)?.apply(&store).await?;
    }

    let engine = web::Data::new(Orchestrator::new(&config.engine, store.clone()).context("building HTTP clients")?);

    if cli.no_autostart {
        info!("autostart disabled, waiting for explicit start requests");
    } else {
        let armed = engine.start_all().await?;
        info!(armed, "monitoring booted");
    }

    let addr: SocketAddr =
        format!("{}:{}", config.server.bind, config.server.port).parse().context("invalid bind address")?;
    let result = run_server(addr, engine.clone(), web::Data::from(store)).await;

    engine.shutdown();
    result
}

async fn run_server(addr: SocketAddr, engine: web::Data<Orchestrator>, store: web::Data<LibsqlStore>) -> anyhow::Result<()> {
    info!(%addr, "control API listening");

    HttpServer::new(move || {
        App::new().app_data(engine.clone()).app_data(store.clone()).configure(routes::routes)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
