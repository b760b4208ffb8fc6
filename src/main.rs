use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use tgsift::channel::{http_client, ChannelSource};
use tgsift::config::Config;
use tgsift::model::{NormalizedPost, RawPost};

/// Get the default config file path (~/.config/tgsift/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("tgsift")
        .join("config.toml"))
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One JSON array per channel
    Json,
    /// Human-readable blocks separated by blank lines
    Text,
}

#[derive(Parser, Debug)]
#[command(name = "tgsift", about = "Fetch Telegram channels via RSS-Bridge as plain text")]
struct Args {
    /// Channel usernames (defaults to `channels` from the config file)
    channels: Vec<String>,

    /// Config file path (default: ~/.config/tgsift/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Skip image extraction
    #[arg(long)]
    raw: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

fn print_posts(posts: &[NormalizedPost], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(posts)?),
        OutputFormat::Text => {
            for post in posts {
                println!("{} [{}]", post.source_link, published(post.published_at));
                for image in &post.images {
                    println!("  image: {}", image);
                }
                println!("{}\n", post.plain_text);
            }
        }
    }
    Ok(())
}

fn print_raw_posts(posts: &[RawPost], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(posts)?),
        OutputFormat::Text => {
            for post in posts {
                println!("{} [{}]", post.link, published(post.published_at));
                println!("{}\n", post.text);
            }
        }
    }
    Ok(())
}

fn published(date: Option<chrono::DateTime<chrono::FixedOffset>>) -> String {
    date.map(|d| d.to_rfc3339())
        .unwrap_or_else(|| "unknown date".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let channels = if args.channels.is_empty() {
        config.channels.clone()
    } else {
        args.channels
    };
    if channels.is_empty() {
        anyhow::bail!("No channels given on the command line or in {}", config_path.display());
    }

    let client = http_client(&config).context("Failed to build HTTP client")?;
    let source = ChannelSource::new(client, &config).context("Invalid bridge configuration")?;

    let mut failures = 0usize;
    for channel in &channels {
        let printed = if args.raw {
            match source.fetch_raw(channel).await {
                Ok(posts) => print_raw_posts(&posts, args.format),
                Err(e) => Err(e.into()),
            }
        } else {
            match source.fetch_channel(channel).await {
                Ok(posts) => print_posts(&posts, args.format),
                Err(e) => Err(e.into()),
            }
        };

        if let Err(e) = printed {
            failures += 1;
            tracing::error!(channel = %channel, error = %e, "Failed to fetch channel");
            eprintln!("Error: {}: {:#}", channel, e);
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} channel(s) failed", failures, channels.len());
    }
    Ok(())
}
