//! bizdir-sitemap CLI
//!
//! Generates the business directory's sitemap set from the companies table.
//!
//! # Commands
//!
//! - `generate` - Full export into segments, manifest and pointer (default)
//! - `preview` - Single capped sitemap of the newest companies
//! - `check` - Verify a generated set on disk

use anyhow::Result;
use bizdir_sitemap::cli::{check_cmd, generate_cmd, output, preview_cmd};
use bizdir_sitemap::config::{
    self, GeneratorConfig, DEFAULT_OUTPUT_DIR, DEFAULT_PAGE_SIZE, DEFAULT_POINTER_PATH,
};
use bizdir_sitemap::model::MAX_URLS_PER_SEGMENT;
use bizdir_sitemap::TableSpec;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Sitemap generator for the business directory.
#[derive(Parser)]
#[command(name = "bizdir-sitemap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    site: SiteArgs,

    /// Print machine-readable JSON to stdout
    #[arg(global = true, long)]
    json: bool,

    /// Suppress progress and summary output
    #[arg(global = true, short, long)]
    quiet: bool,

    /// Enable verbose output and debug logging
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Settings shared by every command.
#[derive(Args)]
struct SiteArgs {
    /// Public base URL of the site [default: SITE_URL, then http://localhost:3000]
    #[arg(global = true, long, env = config::BASE_URL_ENV)]
    base_url: Option<String>,

    /// SQLite database holding the companies table
    #[arg(
        global = true,
        long,
        env = config::DATABASE_ENV,
        default_value = config::DEFAULT_DATABASE
    )]
    database: PathBuf,

    /// Name of the companies table
    #[arg(global = true, long, default_value = "companies_data")]
    table: String,

    /// Directory receiving segment files and the manifest
    #[arg(global = true, long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Location of the top-level pointer file
    #[arg(global = true, long, default_value = DEFAULT_POINTER_PATH)]
    pointer: PathBuf,

    /// URLs per segment file (at most 50,000)
    #[arg(global = true, long, default_value_t = MAX_URLS_PER_SEGMENT)]
    segment_capacity: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every company into sitemap segments plus index (default)
    Generate {
        /// Rows fetched per database query
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
    },

    /// Render one sitemap of the most recently registered companies
    Preview {
        /// Maximum number of companies to include
        #[arg(short, long, default_value_t = MAX_URLS_PER_SEGMENT)]
        limit: usize,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Verify a generated sitemap set on disk
    Check,
}

impl SiteArgs {
    fn config(&self, page_size: usize) -> GeneratorConfig {
        let alias = std::env::var(config::BASE_URL_ENV_ALIAS).ok();
        GeneratorConfig {
            base_url: config::resolve_base_url(self.base_url.clone(), alias),
            output_dir: self.output_dir.clone(),
            pointer_path: self.pointer.clone(),
            page_size,
            segment_capacity: self.segment_capacity,
            ..GeneratorConfig::default()
        }
    }

    fn table(&self) -> TableSpec {
        TableSpec {
            table: self.table.clone(),
            ..TableSpec::default()
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Read by the output helpers.
    if cli.json {
        std::env::set_var("BIZDIR_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("BIZDIR_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("BIZDIR_VERBOSE", "1");
    }

    init_tracing(cli.verbose, cli.json);

    if let Err(e) = run(cli).await {
        if output::is_json() {
            output::print_json(&serde_json::json!({
                "error": format!("{e:#}"),
            }));
        } else {
            let s = output::Styled::new();
            eprintln!("  {} {}", s.fail_sym(), s.red(&format!("{e:#}")));
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Commands::Generate {
        page_size: DEFAULT_PAGE_SIZE,
    }) {
        Commands::Generate { page_size } => {
            let config = cli.site.config(page_size);
            generate_cmd::run(&config, &cli.site.database, cli.site.table()).await
        }
        Commands::Preview { limit, out } => {
            let config = cli.site.config(DEFAULT_PAGE_SIZE);
            config.validate()?;
            preview_cmd::run(
                &config,
                &cli.site.database,
                cli.site.table(),
                limit,
                out.as_deref(),
            )
            .await
        }
        Commands::Check => {
            let config = cli.site.config(DEFAULT_PAGE_SIZE);
            check_cmd::run(&config).await
        }
    }
}

/// Logs go to stderr so stdout stays clean for file lists and JSON.
///
/// Interactive runs log warnings only unless `--verbose` is given.
fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose {
        "bizdir_sitemap=debug"
    } else if json {
        "bizdir_sitemap=info"
    } else {
        "bizdir_sitemap=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}
