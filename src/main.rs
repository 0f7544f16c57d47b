use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use podfeed::{
    Config, EpisodePatch, NewEpisode, NoopReporter, PodcastInfoPatch, Published, Repository,
    SharedReporter, TracingReporter,
};

/// Manage a podcast and publish its RSS feed
#[derive(Parser, Debug)]
#[command(name = "podfeed")]
#[command(about = "Manage a podcast and publish its RSS feed")]
#[command(version)]
struct Args {
    /// JSON document holding the podcast state [env: PODFEED_DATA_FILE, default: data/podcast.json]
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Location of the generated RSS feed [env: PODFEED_FEED_FILE, default: public/feed.xml]
    #[arg(long)]
    feed_file: Option<PathBuf>,

    /// Quiet mode - suppress log output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

/// JSON arguments may be given inline or as `-` to read from stdin
#[derive(Subcommand, Debug)]
enum Command {
    /// Create the default document if needed and publish the feed
    Init,

    /// Show the podcast info
    Info,

    /// Update podcast info fields from a partial JSON object
    SetInfo { json: String },

    /// List episodes, newest first
    List,

    /// Create an episode from a JSON object
    Add { json: String },

    /// Show a single episode
    Get { guid: String },

    /// Update episode fields from a partial JSON object
    Update { guid: String, json: String },

    /// Delete an episode
    Delete { guid: String },

    /// Regenerate the feed, or print it with --stdout
    Render {
        #[arg(long)]
        stdout: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn parse_json<T: DeserializeOwned>(arg: &str) -> Result<T> {
    let text = if arg == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read JSON from stdin")?;
        buffer
    } else {
        arg.to_string()
    };

    serde_json::from_str(&text).context("Invalid JSON input")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_published<T: Serialize>(published: Published<T>) -> Result<()> {
    if !published.feed_updated {
        eprintln!(
            "{} change saved, but the feed could not be regenerated",
            "warning:".yellow().bold()
        );
    }
    print_json(&published.value)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let reporter: SharedReporter = if args.quiet {
        NoopReporter::shared()
    } else {
        init_tracing();
        TracingReporter::shared()
    };

    let mut config = Config::from_env();
    if let Some(data_file) = args.data_file {
        config.data_file = data_file;
    }
    if let Some(feed_file) = args.feed_file {
        config.feed_file = feed_file;
    }

    let repository = Repository::new(&config, reporter);

    repository
        .initialize()
        .context("Failed to initialize podcast document")?;

    match args.command {
        Command::Init => {
            if !repository.publish_feed() {
                anyhow::bail!("Failed to publish feed");
            }
            eprintln!(
                "{} {}",
                "Feed:".bold().green(),
                repository.feed().path().display().to_string().cyan()
            );
        }
        Command::Info => print_json(&repository.get_info())?,
        Command::SetInfo { json } => {
            let patch: PodcastInfoPatch = parse_json(&json)?;
            print_published(repository.update_info(patch)?)?;
        }
        Command::List => print_json(&repository.list_episodes())?,
        Command::Add { json } => {
            let input: NewEpisode = parse_json(&json)?;
            print_published(repository.create_episode(input)?)?;
        }
        Command::Get { guid } => print_json(&repository.get_episode(&guid)?)?,
        Command::Update { guid, json } => {
            let patch: EpisodePatch = parse_json(&json)?;
            print_published(repository.update_episode(&guid, patch)?)?;
        }
        Command::Delete { guid } => print_published(repository.delete_episode(&guid)?)?,
        Command::Render { stdout } => {
            if stdout {
                let document = repository.store().load();
                print!("{}", repository.feed().render(&document)?);
            } else if !repository.publish_feed() {
                anyhow::bail!("Failed to publish feed");
            }
        }
    }

    Ok(())
}
