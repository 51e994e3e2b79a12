//! sigaa-crawler main entry point
//!
//! This is the command-line interface for the SIGAA portal crawler.

use anyhow::Context;
use clap::{Parser, Subcommand};
use sigaa_crawler::browser::HttpFetcher;
use sigaa_crawler::config::{load_config_with_hash, Config};
use sigaa_crawler::models::RecordKind;
use sigaa_crawler::output::{
    load_store_statistics, print_json, print_statistics, print_store_statistics, write_json, CrawlStatistics,
};
use sigaa_crawler::storage::Stores;
use sigaa_crawler::SigaaClient;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// sigaa-crawler: a session-based crawler for the SIGAA academic portal
///
/// Logs into a SIGAA instance, walks its list and detail pages and prints
/// typed records as JSON. Crawled records are kept in a local SQLite store
/// so later runs can reuse them.
#[derive(Parser, Debug)]
#[command(name = "sigaa-crawler")]
#[command(version)]
#[command(about = "A session-based crawler for the SIGAA academic portal", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "sigaa.toml", global = true)]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Abort the command after this many seconds (overrides the config)
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Portal(PortalCommand),

    /// Validate the configuration and show what would be used
    CheckConfig,

    /// Show record counts from the local store and exit
    Stats,
}

/// Commands that need a logged-in portal session
#[derive(Subcommand, Debug)]
enum PortalCommand {
    /// Print the logged-in student's account
    Account,

    /// Print the sections the student is enrolled in
    ActiveSections,

    /// Print pending activities from the portal home
    Activities,

    /// Crawl degree programs and their curricula
    Programs {
        /// Crawl again even if a completed crawl is stored
        #[arg(long)]
        refresh: bool,

        /// Also write the records to this JSON file
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
    },

    /// Crawl the public section search of every configured department
    Sections {
        /// Crawl again even if a completed crawl is stored
        #[arg(long)]
        refresh: bool,

        /// Also write the records to this JSON file
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
    },

    /// Look up one curricular component by its reference id
    Course {
        #[arg(value_name = "REF")]
        id_ref: String,
    },

    /// Search teachers by name
    SearchTeacher {
        name: String,

        /// Campus name or option value to restrict the search
        #[arg(long)]
        campus: Option<String>,

        /// Download each result's profile picture into this directory
        #[arg(long, value_name = "DIR")]
        download_photo_dir: Option<PathBuf>,

        /// Also fetch each result's e-mail from their public page
        #[arg(long)]
        email: bool,
    },

    /// Download a file through the authenticated session
    DownloadFile {
        url: String,

        /// Destination file or directory
        #[arg(value_name = "DEST")]
        destination: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    match &cli.command {
        Command::CheckConfig => handle_check_config(&config),
        Command::Stats => handle_stats(&config),
        Command::Portal(command) => {
            let timeout = Duration::from_secs(cli.timeout.unwrap_or(config.crawl.command_timeout_secs));
            handle_portal_command(config, command, timeout).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sigaa_crawler=info,warn"),
            1 => EnvFilter::new("sigaa_crawler=debug,info"),
            2 => EnvFilter::new("sigaa_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles `check-config`: shows the effective configuration
fn handle_check_config(config: &Config) -> anyhow::Result<()> {
    println!("=== sigaa-crawler configuration ===\n");

    println!("Portal:");
    println!("  Institution: {}", config.portal.institution);
    match &config.portal.base_url {
        Some(url) => println!("  Base URL: {}", url),
        None => println!("  Base URL: (institution default)"),
    }

    println!("\nCredentials:");
    println!(
        "  Username: {}",
        config.credentials.username.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  Password: {}",
        if config.credentials.password.is_some() { "(set)" } else { "(not set)" }
    );

    println!("\nStorage:");
    println!("  Data dir: {}", config.storage.data_dir);
    println!("  Course TTL: {}h", config.storage.course_ttl_hours);

    println!("\nTransport:");
    println!("  User agent: {}", config.transport.user_agent);
    println!(
        "  Timeouts: {}s request, {}s connect",
        config.transport.timeout_secs, config.transport.connect_timeout_secs
    );
    println!("  History limit: {}", config.transport.history_limit);

    println!("\nCrawl:");
    if config.crawl.departments.is_empty() {
        println!("  Departments: all");
    } else {
        println!("  Departments ({}):", config.crawl.departments.len());
        for department in &config.crawl.departments {
            println!("    - {}", department);
        }
    }
    println!("  Command timeout: {}s", config.crawl.command_timeout_secs);

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles `stats`: record counts from the durable store
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let stores = Stores::open(Path::new(&config.storage.data_dir), &config.portal.institution)
        .context("Failed to open the local store")?;

    let tables = load_store_statistics(&stores.records)?;
    print_store_statistics(&tables);
    Ok(())
}

/// Logs in, runs one portal command under the timeout, then always closes
async fn handle_portal_command(config: Config, command: &PortalCommand, timeout: Duration) -> anyhow::Result<()> {
    let mut client = SigaaClient::from_config(config).context("Failed to build the portal client")?;

    let result = match tokio::time::timeout(timeout, run_portal_command(&mut client, command)).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!("Command timed out after {}s", timeout.as_secs())),
    };

    if client.session().is_authenticated() {
        if let Err(e) = client.logoff().await {
            tracing::warn!("Logoff failed: {}", e);
        }
    }
    client.close().await;

    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    result
}

async fn run_portal_command(client: &mut SigaaClient<HttpFetcher>, command: &PortalCommand) -> anyhow::Result<()> {
    client.login().await?;

    match command {
        PortalCommand::Account => print_json(&client.get_account().await?)?,
        PortalCommand::ActiveSections => print_json(&client.get_active_sections().await?)?,
        PortalCommand::Activities => print_json(&client.get_activities().await?)?,
        PortalCommand::Programs { refresh, json } => {
            let outcome = client.get_programs(*refresh).await?;
            if let Some(path) = json {
                write_json(&outcome.report.records, path)?;
            }
            print_statistics(&CrawlStatistics::from_outcome(RecordKind::Program, &outcome));
        }
        PortalCommand::Sections { refresh, json } => {
            let outcome = client.get_sections(*refresh).await?;
            if let Some(path) = json {
                write_json(&outcome.report.records, path)?;
            }
            print_statistics(&CrawlStatistics::from_outcome(RecordKind::Section, &outcome));
        }
        PortalCommand::Course { id_ref } => print_json(&client.get_course(id_ref).await?)?,
        PortalCommand::SearchTeacher {
            name,
            campus,
            download_photo_dir,
            email,
        } => search_teacher(client, name, campus.as_deref(), download_photo_dir.as_deref(), *email).await?,
        PortalCommand::DownloadFile { url, destination } => {
            let path = client.downloads()?.download_attachment(url, destination).await?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

#[derive(serde::Serialize)]
struct TeacherLine {
    #[serde(flatten)]
    result: sigaa_crawler::models::TeacherResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    picture: Option<PathBuf>,
}

async fn search_teacher(
    client: &mut SigaaClient<HttpFetcher>,
    name: &str,
    campus: Option<&str>,
    photo_dir: Option<&Path>,
    with_email: bool,
) -> anyhow::Result<()> {
    let campus = match campus {
        Some(wanted) => {
            let campuses = client.campus_list().await?;
            let found = campuses
                .into_iter()
                .find(|c| c.value == wanted || c.name.eq_ignore_ascii_case(wanted))
                .with_context(|| format!("Unknown campus '{}'", wanted))?;
            Some(found)
        }
        None => None,
    };

    let results = client.search_teachers(name, campus.as_ref()).await?;

    let mut lines = Vec::with_capacity(results.len());
    for result in results {
        let email = if with_email {
            client.teacher_email(&result).await?
        } else {
            None
        };
        let picture = match photo_dir {
            Some(dir) if result.profile_picture_url.is_some() => {
                match client.downloads()?.download_profile_picture(&result, dir).await {
                    Ok(path) => Some(path),
                    Err(e) => {
                        tracing::warn!("No picture for {}: {}", result.name, e);
                        None
                    }
                }
            }
            _ => None,
        };
        lines.push(TeacherLine { result, email, picture });
    }

    print_json(&lines)?;
    Ok(())
}
