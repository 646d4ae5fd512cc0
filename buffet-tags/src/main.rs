//! buffet-tags - Buffet tag generator command line
//!
//! Maintains the food catalog and fills the buffet tag template. The
//! `reconcile` subcommand runs the interactive flow: missing items are
//! collected, allergens reviewed, and the tag sheet generated.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use buffet_common::config::AppConfig;
use buffet_common::db::init_database;
use buffet_common::AllergenSet;
use buffet_tags::resolver::split_lines;
use buffet_tags::service::{add_item, import_entries};
use buffet_tags::upload::{bulk_entries_from_upload, extract_names_from_upload};
use buffet_tags::validation::{parse_calories, ValidationError};
use buffet_tags::{
    resolve, Reconciler, Resolution, SessionStore, SqliteCatalog, TagGenerator, UserKey,
};

/// Command-line arguments for buffet-tags
#[derive(Parser, Debug)]
#[command(name = "buffet-tags")]
#[command(about = "Buffet tag generator and food catalog")]
#[command(version)]
struct Args {
    /// Root folder holding the catalog database, template and output
    #[arg(long, global = true, env = "BUFFET_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the catalog database and output directory
    Init,

    /// Add one food to the catalog
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        calories: String,

        /// Comma separated allergens, or "none"
        #[arg(long, default_value = "")]
        allergens: String,
    },

    /// Bulk import foods from an .xlsx sheet with name/calorie/allergen headers
    Import {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// List the food names in column D of a tag sheet
    Extract {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Check names against the catalog
    Resolve {
        names: Vec<String>,

        /// Read names from a text file (one per line) or a tag sheet (.xlsx)
        #[arg(long)]
        file: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Generate a tag sheet when every name is in the catalog
    Generate {
        names: Vec<String>,

        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Interactive session over stdin: collect missing items, review, generate
    Reconcile {
        #[arg(long)]
        file: Option<PathBuf>,

        /// Session owner (defaults to a random id)
        #[arg(long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::resolve(args.root_folder.clone(), args.config.as_deref())
        .context("Failed to load configuration")?;

    init_tracing(&config)?;

    info!(
        "Starting buffet-tags v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Root folder: {}", config.root_folder.display());

    config
        .ensure_directories()
        .context("Failed to create root folder")?;
    let pool = init_database(&config.database_path)
        .await
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;
    let catalog = Arc::new(SqliteCatalog::new(pool));
    let generator = TagGenerator::new(&config.template_path, &config.output_dir);

    match args.command {
        Command::Init => {
            println!("Catalog: {}", config.database_path.display());
            println!("Template: {}", config.template_path.display());
            println!("Output: {}", config.output_dir.display());
            if !config.template_path.is_file() {
                println!("Note: template not found; place it at the path above before generating");
            }
        }

        Command::Add {
            name,
            calories,
            allergens,
        } => {
            let calories = parse_calories(&calories)?;
            let allergens = AllergenSet::parse_input(&allergens)
                .map_err(|invalid| ValidationError::InvalidAllergens { invalid })?;
            let item = add_item(catalog.as_ref(), &name, calories, allergens).await?;
            println!("Added {} ({} kcal) [{}]", item.name, item.calories, item.allergens);
        }

        Command::Import { file, json } => {
            let (file_name, bytes) = read_upload(&file).await?;
            let entries = bulk_entries_from_upload(&file_name, &bytes)?;
            let report = import_entries(catalog.as_ref(), &entries).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Added: {}", report.added.len());
                println!("Skipped (already present): {}", report.skipped.len());
                for rejected in &report.rejected {
                    println!(
                        "Rejected {}: unknown allergen(s) {}",
                        rejected.name,
                        rejected.invalid.join(", ")
                    );
                }
            }
        }

        Command::Extract { file, json } => {
            let (file_name, bytes) = read_upload(&file).await?;
            let names = extract_names_from_upload(&file_name, &bytes)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else {
                for name in names {
                    println!("{}", name);
                }
            }
        }

        Command::Resolve { names, file, json } => {
            let names = gather_names(names, file.as_deref()).await?;
            let resolution = resolve(catalog.as_ref(), &names).await?;

            match (resolution, json) {
                (Resolution::Missing(missing), true) => {
                    println!("{}", serde_json::json!({ "status": "missing", "missing": missing }))
                }
                (Resolution::Resolved(items), true) => {
                    println!("{}", serde_json::json!({ "status": "complete", "items": items }))
                }
                (Resolution::Missing(missing), false) => {
                    println!("Missing from catalog:");
                    for name in missing {
                        println!("  {}", name);
                    }
                }
                (Resolution::Resolved(items), false) => {
                    for item in items {
                        println!("{} ({} kcal) [{}]", item.name, item.calories, item.allergens);
                    }
                }
            }
        }

        Command::Generate { names, file } => {
            let names = gather_names(names, file.as_deref()).await?;
            let items = match resolve(catalog.as_ref(), &names).await? {
                Resolution::Resolved(items) => items,
                Resolution::Missing(missing) => {
                    bail!(
                        "Missing from catalog: {} (add them or run `reconcile`)",
                        missing.join(", ")
                    )
                }
            };

            let document = tokio::task::spawn_blocking(move || generator.generate(&items))
                .await
                .context("Generation task failed")??;
            println!("{}", document.path.display());
        }

        Command::Reconcile { file, user } => {
            let user = user.map(UserKey::new).unwrap_or_else(UserKey::anonymous);
            let reconciler = Reconciler::new(catalog, SessionStore::new(config.session_ttl), generator);
            run_reconcile(&reconciler, &user, file.as_deref()).await?;
        }
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.log_level))
        .context("Invalid log level")?;

    match &config.log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

async fn read_upload(path: &Path) -> Result<(String, Vec<u8>)> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok((file_name, bytes))
}

/// Names from the command line, or from a file when given
async fn gather_names(names: Vec<String>, file: Option<&Path>) -> Result<Vec<String>> {
    let Some(path) = file else {
        return Ok(names);
    };

    let (file_name, bytes) = read_upload(path).await?;
    if file_name.to_lowercase().ends_with(".xlsx") {
        Ok(extract_names_from_upload(&file_name, &bytes)?)
    } else {
        let text = String::from_utf8(bytes)
            .with_context(|| format!("{} is not UTF-8 text", path.display()))?;
        Ok(split_lines(&text))
    }
}

async fn run_reconcile(
    reconciler: &Reconciler<SqliteCatalog>,
    user: &UserKey,
    file: Option<&Path>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let names = match file {
        Some(path) => gather_names(Vec::new(), Some(path)).await?,
        None => {
            println!("Enter food names, one per line; finish with an empty line:");
            let mut names = Vec::new();
            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() {
                    break;
                }
                names.push(line);
            }
            names
        }
    };

    let mut reply = reconciler.begin(user, &names).await?;
    loop {
        println!("{}", reply);
        if reply.is_final() {
            return Ok(());
        }

        let Some(input) = lines.next_line().await? else {
            reconciler.cancel(user).await;
            return Ok(());
        };
        if input.trim().eq_ignore_ascii_case("/cancel") {
            reconciler.cancel(user).await;
            println!("Operation cancelled.");
            return Ok(());
        }

        reply = reconciler.step(user, &input).await?;
    }
}
