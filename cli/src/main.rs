//! Reader CLI
//!
//! Command-line interface for saving, listing, updating and deleting
//! Readwise Reader documents.

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reader_core::duration::parse_duration;
use reader_core::{CallContext, Category, Client, Config, Location};

mod commands;
mod output;

use commands::UsageError;

#[derive(Parser, Debug)]
#[command(name = "reader")]
#[command(about = "Readwise Reader from the command line")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Log more to stderr (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save a URL as a new document
    #[command(alias = "save")]
    Create(CreateArgs),
    /// List documents with optional filtering
    #[command(alias = "ls")]
    List(ListArgs),
    /// Change fields of an existing document
    Update(UpdateArgs),
    /// Delete a document
    #[command(alias = "rm")]
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// URL to save
    pub url: String,
    /// Where to file the document (new, later, archive, feed)
    #[arg(long)]
    pub location: Option<Location>,
    /// Document category (article, email, rss, pdf, epub, tweet, video, highlight)
    #[arg(long)]
    pub category: Option<Category>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub summary: Option<String>,
    /// Note attached to the document, or `-` to read it from stdin
    #[arg(long)]
    pub notes: Option<String>,
    /// Document content as HTML, or `-` to read it from stdin
    #[arg(long)]
    pub html: Option<String>,
    /// Tag to add (repeatable)
    #[arg(short, long)]
    pub tag: Vec<String>,
    #[arg(long)]
    pub image_url: Option<String>,
    /// Publication date (RFC 3339, e.g. 2024-01-14T00:00:00Z)
    #[arg(long)]
    pub published_date: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by location (new, later, archive, feed)
    #[arg(long, default_value = "new")]
    pub location: Location,
    /// Filter by category (article, email, rss, pdf, epub, tweet, video, highlight)
    #[arg(long)]
    pub category: Option<Category>,
    /// Filter by tag name
    #[arg(short, long)]
    pub tag: Option<String>,
    /// Only documents updated within this long ago (e.g. 10s, 30m, 24h, 1h30m)
    #[arg(long, value_parser = parse_duration)]
    pub since: Option<Duration>,
    /// Fetch a single document by ID
    #[arg(long)]
    pub id: Option<String>,
    /// Resume from a page cursor returned by a previous call
    #[arg(long)]
    pub cursor: Option<String>,
    /// Include HTML content in the output
    #[arg(long)]
    pub html: bool,
    /// Follow page cursors until every matching document is fetched
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("fields")
        .required(true)
        .multiple(true)
        .args(["title", "author", "summary", "location", "category", "image_url", "published_date", "notes"]),
))]
pub struct UpdateArgs {
    /// Document ID
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub summary: Option<String>,
    /// Move the document (new, later, archive, feed)
    #[arg(long)]
    pub location: Option<Location>,
    #[arg(long)]
    pub category: Option<Category>,
    #[arg(long)]
    pub image_url: Option<String>,
    /// Publication date (RFC 3339)
    #[arg(long)]
    pub published_date: Option<DateTime<Utc>>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Document ID
    pub id: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if err.is::<UsageError>() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

/// Logs go to stderr so stdout carries only command output.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("reader_core={level},reader_cli={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    let client = Client::new(&config);
    let ctx = CallContext::background();

    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Create(args) => commands::create(&client, &ctx, args, &mut stdin, &mut stdout),
        Commands::List(args) => commands::list(&client, &ctx, args, &mut stdout),
        Commands::Update(args) => commands::update(&client, &ctx, args, &mut stdout),
        Commands::Delete(args) => commands::delete(&client, &ctx, args, &mut stdout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("reader").chain(args.iter().copied()))
    }

    #[test]
    fn create_parses_all_flags() {
        let cli = parse(&[
            "create",
            "https://example.com/a",
            "--location",
            "later",
            "--category",
            "article",
            "--title",
            "A",
            "-t",
            "rust",
            "--tag",
            "cli",
            "--published-date",
            "2024-01-14T00:00:00Z",
        ])
        .unwrap();
        let Commands::Create(args) = cli.command else {
            panic!("expected create");
        };
        assert_eq!(args.url, "https://example.com/a");
        assert_eq!(args.location, Some(Location::Later));
        assert_eq!(args.category, Some(Category::Article));
        assert_eq!(args.tag, ["rust", "cli"]);
        assert_eq!(
            args.published_date.map(|d| d.to_rfc3339()),
            Some("2024-01-14T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn create_requires_url() {
        let err = parse(&["create"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn invalid_location_is_rejected_while_parsing() {
        let err = parse(&["list", "--location", "inbox"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.to_string().contains("invalid location: inbox"));
    }

    #[test]
    fn invalid_category_is_rejected_while_parsing() {
        let err = parse(&["create", "https://a", "--category", "podcast"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn list_defaults_to_new() {
        let cli = parse(&["list"]).unwrap();
        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.location, Location::New);
        assert!(args.since.is_none());
        assert!(!args.html);
        assert!(!args.all);
    }

    #[test]
    fn list_parses_since() {
        let cli = parse(&["ls", "--since", "1h30m", "--all"]).unwrap();
        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.since, Some(Duration::from_secs(5400)));
        assert!(args.all);
    }

    #[test]
    fn list_rejects_bad_since() {
        let err = parse(&["list", "--since", "yesterday"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.to_string().contains("invalid duration format"));
    }

    #[test]
    fn update_requires_a_field() {
        let err = parse(&["update", "doc1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let cli = parse(&["update", "doc1", "--location", "archive"]).unwrap();
        let Commands::Update(args) = cli.command else {
            panic!("expected update");
        };
        assert_eq!(args.id, "doc1");
        assert_eq!(args.location, Some(Location::Archive));
    }

    #[test]
    fn delete_takes_an_id() {
        let cli = parse(&["rm", "doc1"]).unwrap();
        let Commands::Delete(args) = cli.command else {
            panic!("expected delete");
        };
        assert_eq!(args.id, "doc1");
    }

    #[test]
    fn verbose_is_global() {
        let cli = parse(&["list", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
