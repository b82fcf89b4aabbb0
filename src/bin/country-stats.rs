use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use country_stats::server::{self, AppState};
use country_stats::summary::{ImageFormat, SummaryData};
use country_stats::{Config, ListQuery};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "country-stats",
    version,
    about = "Fetch, store & serve country statistics with GDP estimates"
)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Run one refresh against the upstream APIs and print the counts.
    Refresh,
    /// Render the summary image to a file (.png or .svg).
    Image(ImageArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Listen address.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    bind: String,
}

#[derive(Args, Debug)]
struct ImageArgs {
    /// Output path; the extension picks the format.
    #[arg(long)]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Serve(args) => cmd_serve(&cli.config, args).await,
        Command::Refresh => cmd_refresh(&cli.config).await,
        Command::Image(args) => cmd_image(&cli.config, args).await,
    }
}

async fn cmd_serve(config: &Config, args: ServeArgs) -> Result<()> {
    let state = AppState::from_config(config).await?;
    let app = server::build_router(state);
    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("bind {}", args.bind))?;
    log::info!("country-stats listening on {}", args.bind);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn cmd_refresh(config: &Config) -> Result<()> {
    let state = AppState::from_config(config).await?;
    let summary = state.pipeline.refresh_all().await?;
    println!(
        "processed={} created={} updated={} skipped={} rates={}",
        summary.processed,
        summary.created,
        summary.updated,
        summary.skipped,
        if summary.rates_available { "yes" } else { "no" }
    );
    Ok(())
}

async fn cmd_image(config: &Config, args: ImageArgs) -> Result<()> {
    let state = AppState::from_config(config).await?;
    let countries = state.store.list(&ListQuery::default()).await?;
    let data = SummaryData::from_countries(&countries, state.store.last_refresh().await?);
    let format = ImageFormat::from_path(&args.out);
    let bytes = state.renderer.render(&data, format)?;
    std::fs::write(&args.out, bytes).with_context(|| format!("write {}", args.out.display()))?;
    eprintln!("Wrote summary image to {}", args.out.display());
    Ok(())
}
