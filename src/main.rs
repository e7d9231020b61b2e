use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cnc_dl::{Config, ObservationDownloader, ProjectId, Result};

/// Download City Nature Challenge observations from iNaturalist into CSV files
#[derive(Parser, Debug)]
#[command(name = "cnc-dl", version, about)]
struct Cli {
    /// Directory the CSV files are written to
    #[arg(long, env = "CNC_DL_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// JSON config file; missing fields use the built-in defaults
    #[arg(long, env = "CNC_DL_CONFIG")]
    config: Option<PathBuf>,

    /// Only download these project ids (repeatable)
    #[arg(long = "project", value_name = "ID")]
    projects: Vec<ProjectId>,

    /// Pause between requests in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Print the configured projects and exit
    #[arg(long, default_value_t = false)]
    list: bool,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), "{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("cnc_dl=debug")
    } else {
        EnvFilter::new("cnc_dl=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let base = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    let config = apply_overrides(base, &cli)?;

    if cli.list {
        for line in project_lines(&config) {
            println!("{}", line);
        }
        return Ok(());
    }

    let downloader = ObservationDownloader::new(config)?;
    let summaries = downloader.download_configured().await?;

    for summary in &summaries {
        println!(
            "{}\t{}\t{} rows\t{}",
            summary.project_id,
            summary.name,
            summary.rows,
            summary.path.display()
        );
    }
    Ok(())
}

/// Command line flags take precedence over the config file
fn apply_overrides(mut config: Config, cli: &Cli) -> Result<Config> {
    if let Some(dir) = &cli.output_dir {
        config.output.output_dir = dir.clone();
    }
    if let Some(ms) = cli.delay_ms {
        config.api.request_delay = Duration::from_millis(ms);
    }
    config.projects = config.select_projects(&cli.projects)?;
    Ok(config)
}

fn project_lines(config: &Config) -> Vec<String> {
    config
        .projects
        .iter()
        .map(|project| format!("{}\t{}", project.id, project.name))
        .collect()
}
