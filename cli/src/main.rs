//! notedown CLI - Notion database to markdown site converter

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use notedown::{Config, NotionClient, SiteGenerator};

#[derive(Parser)]
#[command(name = "notedown")]
#[command(version)]
#[command(about = "Convert a Notion database to markdown article bundles", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, value_name = "FILE", default_value = "notedown.toml")]
    config: PathBuf,

    /// Notion integration token
    #[arg(long, env = "NOTION_SECRET", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the conversion against the configured database
    #[command(alias = "gen")]
    Generate,

    /// Write a starter configuration file
    Init {
        /// Destination path
        #[arg(value_name = "FILE", default_value = "notedown.toml")]
        path: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Init { path }) => cmd_init(&path),
        Some(Commands::Version) => {
            println!("notedown {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Generate) | None => cmd_generate(&cli.config, cli.token.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_generate(config_path: &Path, token: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let token = token
        .map(str::to_string)
        .ok_or("no Notion token: pass --token or set NOTION_SECRET")?;
    let config = Config::from_path(config_path)?;
    let client = NotionClient::new(token);

    println!(
        "{} {} {}",
        "Converting database".green(),
        config.notion.database_id.bold(),
        format!("into {}", config.markdown.home_path).dimmed()
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message("Processing pages...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let summary = SiteGenerator::new(&client, &config).run()?;
    spinner.finish_and_clear();

    println!(
        "{} {} succeeded, {} failed, {} published",
        "Done:".green().bold(),
        summary.succeeded,
        summary.failed,
        summary.published
    );
    if summary.failed > 0 {
        println!(
            "{}",
            "Some pages failed to convert; see the log for details".yellow()
        );
    }
    Ok(())
}

fn cmd_init(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        return Err(format!("{} already exists", path.display()).into());
    }
    Config::write_default(path)?;
    println!("{} {}", "Wrote".green(), path.display());
    println!("Fill in your database id, then run {}", "notedown".bold());
    Ok(())
}
