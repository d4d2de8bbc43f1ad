use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use clip_saver::api::{ApiClient, ClipService};
use clip_saver::config;
use clip_saver::export::raster::WkhtmlRasterizer;
use clip_saver::export::{ConsoleNotifier, DirSink, ExportFormat, ExportSettings, Exporter};
use clip_saver::model::{normalize_tags, Clip, ClipKind, ClipQuery, ClipUpdate, NewClip};

#[derive(Debug, Parser)]
#[command(author, version, about = "Notes, bookmarks & quick captures")]
struct Args {
    /// Path to YAML config file (defaults apply when it does not exist)
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// API base URL, overriding `api.base_url` from the config
    #[arg(long)]
    api: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List clips, optionally filtered
    List {
        /// Search title, content and tags
        #[arg(long)]
        q: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        kind: Option<ClipKind>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        per_page: Option<u32>,
    },
    /// Print one clip in full
    Show { id: i64 },
    /// Show tags with their clip counts
    Tags,
    /// Create a new clip
    Create {
        #[arg(long, default_value = "note")]
        kind: ClipKind,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        url: Option<String>,
        /// Comma separated
        #[arg(long)]
        tags: Option<String>,
    },
    /// Update fields of an existing clip
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        tags: Option<String>,
    },
    /// Delete a clip
    Delete { id: i64 },
    /// Export every clip to a file
    Export {
        /// json, csv, pdf or server-pdf
        #[arg(long, default_value = "json")]
        format: ExportFormat,
        /// Output directory, overriding `export.out_dir`
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let mut cfg = config::load_or_default(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    if let Some(api) = args.api {
        cfg.api.base_url = api;
        config::validate(&cfg)?;
    }

    let client = Arc::new(ApiClient::new(
        &cfg.api.base_url,
        Duration::from_secs(cfg.api.timeout_seconds),
    )?);
    info!(base_url=%client.base_url(), "using clip api");

    match args.command {
        Command::List {
            q,
            tag,
            kind,
            page,
            per_page,
        } => {
            let query = ClipQuery {
                q,
                tag,
                kind,
                page,
                per_page,
            };
            let page = client.list_clips(&query).await.context("failed to list clips")?;
            if page.items.is_empty() {
                println!("No clips yet. Add one with `clip-saver create`.");
            }
            for clip in &page.items {
                print_clip(clip);
            }
            if page.total > page.items.len() as u64 {
                println!(
                    "-- showing {} of {} (page {})",
                    page.items.len(),
                    page.total,
                    page.page
                );
            }
        }
        Command::Show { id } => {
            let clip = client
                .find_clip(id)
                .await
                .with_context(|| format!("failed to fetch clip #{}", id))?
                .ok_or_else(|| anyhow!("clip #{} not found", id))?;
            print_clip_details(&clip);
        }
        Command::Tags => {
            let tags = client.list_tags().await.context("failed to list tags")?;
            for t in tags {
                println!("{} ({})", t.tag, t.count);
            }
        }
        Command::Create {
            kind,
            title,
            content,
            url,
            tags,
        } => {
            let tags = tags.as_deref().map(normalize_tags);
            let new_clip = NewClip::new(
                kind,
                &title,
                content.as_deref(),
                url.as_deref(),
                tags.as_deref(),
            )
            .ok_or_else(|| anyhow!("title must be non-empty"))?;
            let clip = client.create_clip(&new_clip).await.context("failed to create clip")?;
            println!("Created clip #{}", clip.id);
            print_clip(&clip);
        }
        Command::Update {
            id,
            title,
            content,
            url,
            tags,
        } => {
            let update = ClipUpdate {
                title,
                content,
                url,
                tags: tags.as_deref().map(normalize_tags),
            };
            if update.is_empty() {
                return Err(anyhow!("nothing to update; pass at least one field"));
            }
            let clip = client
                .update_clip(id, &update)
                .await
                .with_context(|| format!("failed to update clip #{}", id))?;
            print_clip(&clip);
        }
        Command::Delete { id } => {
            client
                .delete_clip(id)
                .await
                .with_context(|| format!("failed to delete clip #{}", id))?;
            println!("Deleted clip #{}", id);
        }
        Command::Export { format, out_dir } => {
            let out_dir = out_dir.unwrap_or_else(|| PathBuf::from(&cfg.export.out_dir));
            let rasterizer = WkhtmlRasterizer::new(&cfg.rasterizer.program);
            if format == ExportFormat::Pdf {
                rasterizer
                    .ensure_available()
                    .await
                    .context("PDF export needs wkhtmltoimage; set rasterizer.program")?;
            }
            let exporter = Exporter::new(
                client,
                Arc::new(rasterizer),
                Arc::new(DirSink::new(out_dir)),
                Arc::new(ConsoleNotifier),
                ExportSettings::from_config(&cfg),
            );
            exporter.run(format).await;
        }
    }

    Ok(())
}

fn print_clip(clip: &Clip) {
    println!("#{} [{}] {}", clip.id, clip.kind_str(), clip.title);
    let preview = clip.preview();
    if !preview.is_empty() {
        println!("    {}", preview);
    }
    let tags = clip.tag_list();
    if !tags.is_empty() {
        let rendered: Vec<String> = tags.iter().map(|t| format!("#{}", t)).collect();
        println!("    {}", rendered.join(" "));
    }
}

fn print_clip_details(clip: &Clip) {
    println!("#{} [{}] {}", clip.id, clip.kind_str(), clip.title);
    if !clip.url_str().is_empty() {
        println!("url:      {}", clip.url_str());
    }
    if !clip.tags_str().is_empty() {
        println!("tags:     {}", clip.tag_list().join(", "));
    }
    println!("created:  {}", clip.created_at.as_deref().unwrap_or("-"));
    println!("updated:  {}", clip.updated_at.as_deref().unwrap_or("-"));
    if !clip.content_str().is_empty() {
        println!();
        println!("{}", clip.content_str());
    }
}
