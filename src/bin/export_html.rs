use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use clip_saver::api::{ApiClient, ClipService};
use clip_saver::config;
use clip_saver::export::html::render_report;

#[derive(Debug, Parser)]
#[command(
    about = "Write the printable clip report as a local HTML file, exactly as it is fed to the PDF rasterizer."
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output file; defaults to `{export.out_dir}/report.html`
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load_or_default(&args.config)?;
    cfg.ensure_dirs()?;

    let client = ApiClient::new(
        &cfg.api.base_url,
        Duration::from_secs(cfg.api.timeout_seconds),
    )?;
    let clips = client
        .fetch_export()
        .await
        .context("failed to fetch export batch")?;

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(&cfg.export.out_dir).join("report.html"));
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let html = render_report(&clips, &cfg.export.title);
    tokio::fs::write(&out, html)
        .await
        .with_context(|| format!("failed to write {}", out.display()))?;

    println!("Wrote {} clips to {}", clips.len(), absolute_path(&out).display());
    Ok(())
}

fn absolute_path(p: &std::path::Path) -> PathBuf {
    if p.is_absolute() {
        return p.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(p),
        Err(_) => p.to_path_buf(),
    }
}
