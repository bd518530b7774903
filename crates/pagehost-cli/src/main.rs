//! pagehost CLI - manage hosted projects from the terminal

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use pagehost_core::api::{ApiClient, Project, UploadForm, normalize_api_base};
use pagehost_core::config::Config;
use pagehost_core::format::{Locale, copy_to_clipboard, format_date, project_url};
use pagehost_core::store::ProjectStore;
use pagehost_core::Error;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "pagehost")]
#[command(author, version, about = "Manage projects on a pagehost server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// API base URL (overrides PAGEHOST_API_BASE and the config file)
    #[arg(long, global = true)]
    api_base: Option<String>,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects
    List {
        /// Only show projects matching this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Upload a project archive
    Upload {
        /// Archive to upload
        file: PathBuf,
        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Enable or disable a project
    Toggle { slug: String },

    /// Delete a project
    Delete {
        slug: String,
        #[arg(long)]
        force: bool,
    },

    /// Print the public URL of a project
    Url { slug: String },

    /// Copy the public URL of a project to the clipboard
    Copy { slug: String },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Open the TUI dashboard
    Watch,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

/// Settings shared by every command that talks to the server
struct Context {
    store: ProjectStore<ApiClient>,
    api_base: String,
    locale: Locale,
    format: OutputFormat,
    quiet: bool,
}

impl Context {
    fn new(cli: &Cli, config: &Config) -> anyhow::Result<Self> {
        let api_base = match &cli.api_base {
            Some(base) => normalize_api_base(base)?,
            None => config.resolved_api_base()?,
        };
        debug!(api_base = %api_base, "Using API base");

        let client = ApiClient::new(api_base.clone())?;
        Ok(Self {
            store: ProjectStore::new(Arc::new(client)),
            api_base,
            locale: config.display.locale,
            format: cli.format,
            quiet: cli.quiet,
        })
    }

    fn print_json(&self, value: &impl serde::Serialize) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Fetch the full list and pick one project by slug
    async fn find_project(&self, slug: &str) -> anyhow::Result<Project> {
        self.store.fetch_projects(None).await;
        let state = self.store.snapshot();
        if let Some(err) = state.error {
            return Err(anyhow::anyhow!(err));
        }
        state
            .find(slug)
            .cloned()
            .ok_or_else(|| Error::ProjectNotFound(slug.to_string()).into())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pagehost=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    // Config commands must work without a reachable or valid API base
    let get_ctx = || Config::load().and_then(|config| Context::new(&cli, &config));

    match &cli.command {
        Commands::List { search } => cmd_list(&get_ctx()?, search.as_deref()).await,
        Commands::Upload { file, name } => cmd_upload(&get_ctx()?, file, name.as_deref()).await,
        Commands::Toggle { slug } => cmd_toggle(&get_ctx()?, slug).await,
        Commands::Delete { slug, force } => cmd_delete(&get_ctx()?, slug, *force).await,
        Commands::Url { slug } => cmd_url(&get_ctx()?, slug).await,
        Commands::Copy { slug } => cmd_copy(&get_ctx()?, slug).await,
        Commands::Config { action } => cmd_config(action, cli.quiet),
        Commands::Watch => cmd_watch(cli.api_base.as_deref(), cli.quiet),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_list(ctx: &Context, search: Option<&str>) -> anyhow::Result<()> {
    match search {
        Some(query) => ctx.store.search_projects(query).await,
        None => ctx.store.fetch_projects(None).await,
    }

    let state = ctx.store.snapshot();
    if let Some(err) = state.error {
        return Err(anyhow::anyhow!("Failed to fetch project list: {}", err));
    }

    if ctx.format == OutputFormat::Json {
        return ctx.print_json(&state.projects);
    }

    if state.projects.is_empty() {
        if !ctx.quiet {
            if state.search_query.is_empty() {
                println!("No projects found.");
                println!("\nUpload one with: pagehost upload <file.zip>");
            } else {
                println!("No projects match '{}'.", state.search_query);
            }
        }
        return Ok(());
    }

    if !ctx.quiet {
        println!("Projects:");
    }
    for p in &state.projects {
        println!("{}", project_line(p, ctx.locale));
    }
    Ok(())
}

fn project_line(project: &Project, locale: Locale) -> String {
    let status = if project.is_active { "active" } else { "inactive" };
    format!(
        "  {:<10} {} - {} ({}) uploaded {}",
        format!("[{}]", status),
        project.slug,
        project.name,
        project.entry_point,
        format_date(&project.uploaded_at, locale)
    )
}

async fn cmd_upload(ctx: &Context, file: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let mut form = UploadForm::from_path(file).await?;
    if let Some(name) = name {
        form = form.with_name(name);
    }

    if !ctx.quiet && ctx.format == OutputFormat::Text {
        println!("Uploading '{}'...", file.display());
    }

    let uploaded = ctx.store.upload_project(form).await?;
    info!(slug = %uploaded.slug, "Upload finished");

    if ctx.format == OutputFormat::Json {
        return ctx.print_json(&uploaded);
    }

    if !ctx.quiet {
        println!("{}", uploaded.message);
        println!("  ID: {}", uploaded.id);
        println!("  Name: {}", uploaded.name);
        println!("  Slug: {}", uploaded.slug);
    }
    println!("  URL: {}", uploaded_url(&ctx.api_base, &uploaded.url));
    Ok(())
}

/// The server may answer with a path; make it absolute against the site root
fn uploaded_url(api_base: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    let root = api_base
        .strip_suffix("/api")
        .unwrap_or(api_base)
        .trim_end_matches('/');
    format!("{}/{}", root, url.trim_start_matches('/'))
}

async fn cmd_toggle(ctx: &Context, slug: &str) -> anyhow::Result<()> {
    let toggled = ctx.store.toggle_project(slug).await?;

    if ctx.format == OutputFormat::Json {
        return ctx.print_json(&toggled);
    }

    if !ctx.quiet {
        println!("{}", toggled.message);
    }
    println!(
        "Project '{}' is now {}.",
        slug,
        if toggled.is_active { "active" } else { "inactive" }
    );
    Ok(())
}

async fn cmd_delete(ctx: &Context, slug: &str, force: bool) -> anyhow::Result<()> {
    if !force {
        if !ctx.quiet {
            println!("Warning: This will permanently delete project '{}'.", slug);
            println!("Use --force to confirm deletion.");
        }
        return Ok(());
    }

    let deleted = ctx.store.delete_project(slug).await?;

    if ctx.format == OutputFormat::Json {
        return ctx.print_json(&deleted);
    }
    if !ctx.quiet {
        println!("{}", deleted.message);
    }
    Ok(())
}

async fn cmd_url(ctx: &Context, slug: &str) -> anyhow::Result<()> {
    let project = ctx.find_project(slug).await?;
    let url = project_url(&project, &ctx.api_base);

    if ctx.format == OutputFormat::Json {
        return ctx.print_json(&serde_json::json!({ "slug": project.slug, "url": url }));
    }
    println!("{}", url);
    Ok(())
}

async fn cmd_copy(ctx: &Context, slug: &str) -> anyhow::Result<()> {
    let project = ctx.find_project(slug).await?;
    let url = project_url(&project, &ctx.api_base);

    copy_to_clipboard(&url)?;
    if !ctx.quiet {
        println!("Copied {} to the clipboard.", url);
    }
    Ok(())
}

fn cmd_config(action: &ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(key, value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn cmd_watch(api_base: Option<&str>, quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        info!("Starting TUI dashboard...");
    }

    let mut command = std::process::Command::new("pagehost-tui");
    if let Some(base) = api_base {
        command.args(["--api-base", base]);
    }

    match command.status() {
        Ok(status) if status.success() => Ok(()),
        Ok(_) => {
            if !quiet {
                println!("TUI exited with an error.");
            }
            Ok(())
        }
        Err(_) => {
            if !quiet {
                println!("Could not start the TUI dashboard.");
                println!();
                println!("The TUI binary 'pagehost-tui' is not in your PATH.");
                println!("Either:");
                println!("  1. Add the target/debug or target/release directory to PATH");
                println!("  2. Run `cargo run --bin pagehost-tui` from the project root");
                println!("  3. Install with `cargo install --path crates/pagehost-tui`");
            }
            Ok(())
        }
    }
}
