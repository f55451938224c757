use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use courseforge::{
    api::{self, ApiDoc, AppState},
    config::Config,
    course::catalog,
    db,
    utils::init_log,
};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(Debug, Parser)]
struct Args {
    /// TOML config file; the flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    database: Option<PathBuf>,
    #[arg(short = 'H', long)]
    host: Option<String>,
    #[arg(short, long)]
    port: Option<u16>,
    #[arg(short, long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    }
    .apply_env();
    if let Some(database) = args.database {
        config.database = database;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(log_dir) = args.log_dir {
        config.log_dir = Some(log_dir);
    }
    let _guard = init_log(config.log_dir.clone());

    println!("Starting server at http://{}:{}", config.host, config.port);
    println!(
        "Swagger UI available at http://{}:{}/swagger-ui/",
        config.host, config.port
    );

    let database = db::connect(&config.database).await?;
    catalog::ensure_default_categories(&database).await?;

    let app = api::api_router(AppState { database })
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )));

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
