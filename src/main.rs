mod export;
mod feed;
mod paginator;
mod parser;
mod settings;

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use feed::FeedClient;
use paginator::Paginator;
use parser::fields;
use parser::filter::CategoryFilter;
use settings::Settings;

const DEFAULT_CUTOFF: &str = "2022-01-01";

#[derive(Parser)]
#[command(
    name = "workflow_export",
    about = "Export debit card workflow requests from a Time channel to CSV"
)]
struct Cli {
    /// Defaults to `export` with default options
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the channel back to a cutoff date and write matching requests to CSV
    Export {
        /// Oldest date to keep (YYYY-MM-DD)
        #[arg(long, default_value = DEFAULT_CUTOFF)]
        since: NaiveDate,
        /// Output file (default: TIME_OUTPUT or data/raw/debit_cards_dataset.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Stop after this many pages (default: no limit)
        #[arg(long)]
        max_pages: Option<NonZeroUsize>,
    },
    /// Extract fields from a single message saved to a file
    Parse {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let command = match cli.command {
        Some(command) => command,
        None => Commands::Export {
            since: DEFAULT_CUTOFF.parse()?,
            output: None,
            max_pages: None,
        },
    };

    let result = match command {
        Commands::Export {
            since,
            output,
            max_pages,
        } => run_export(since, output, max_pages).await,
        Commands::Parse { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let in_category = CategoryFilter::default().matches(&text);
            println!("{:<14} {}", "in_category", if in_category { "yes" } else { "no" });
            for rule in fields::rules() {
                println!("{:<14} {}", rule.field.as_str(), rule.apply(&text));
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run_export(
    since: NaiveDate,
    output: Option<PathBuf>,
    max_pages: Option<NonZeroUsize>,
) -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let output = output.unwrap_or_else(|| settings.output.clone());
    info!(settings = ?settings, "Starting export since {}", since);

    let client = FeedClient::new(&settings).context("Failed to build HTTP client")?;
    let posts = Paginator::new(&client)
        .max_pages(max_pages.map(NonZeroUsize::get))
        .collect_until(since)
        .await
        .context("Failed to read channel feed")?;

    let records = parser::process_posts(&posts);
    info!("{} of {} posts matched the workflow filter", records.len(), posts.len());
    export::write_csv(&records, &output)?;

    println!("Saved {} messages to {}", records.len(), output.display());
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_default_export() {
        let cli = Cli::try_parse_from(["workflow_export"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn export_flags() {
        let cli = Cli::try_parse_from([
            "workflow_export",
            "export",
            "--since",
            "2023-06-15",
            "-o",
            "out.csv",
            "--max-pages",
            "5",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Export { since, output, max_pages }) => {
                assert_eq!(since, NaiveDate::from_ymd_opt(2023, 6, 15).unwrap());
                assert_eq!(output, Some(PathBuf::from("out.csv")));
                assert_eq!(max_pages.map(NonZeroUsize::get), Some(5));
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn export_defaults_to_2022() {
        let cli = Cli::try_parse_from(["workflow_export", "export"]).unwrap();
        match cli.command {
            Some(Commands::Export { since, output, max_pages }) => {
                assert_eq!(since, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
                assert!(output.is_none());
                assert!(max_pages.is_none());
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn zero_page_limit_is_rejected() {
        assert!(Cli::try_parse_from(["workflow_export", "export", "--max-pages", "0"]).is_err());
    }

    #[test]
    fn durations() {
        use std::time::Duration;
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
