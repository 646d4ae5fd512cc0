//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration is deliberately small: where the root folder
//! lives, where the tag template and generated documents go, how long an
//! idle reconciliation session survives, and logging.
//!
//! Root folder resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`BUFFET_ROOT_FOLDER`)
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing default TOML file is not an error; built-in defaults apply.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "BUFFET_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "buffet.db";

/// Default template file name inside the root folder
pub const TEMPLATE_FILE: &str = "Mastersheet.xlsx";

/// Default output directory name inside the root folder
pub const OUTPUT_DIR: &str = "output";

/// Built-in defaults used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub session_ttl_secs: u64,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: "info".to_string(),
            log_file: None,
            session_ttl_secs: 30 * 60,
        }
    }
}

/// Bootstrap configuration loaded from TOML
///
/// Every field is optional; unset fields fall back to [`CompiledDefaults`]
/// or to paths derived from the root folder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Tag template (.xlsx); defaults to `<root>/Mastersheet.xlsx`
    #[serde(default)]
    pub template_path: Option<PathBuf>,

    /// Directory receiving generated documents; defaults to `<root>/output`
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Idle time after which a reconciliation session expires
    #[serde(default)]
    pub session_ttl_secs: Option<u64>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default)]
    pub level: Option<String>,

    /// Log file path (logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load an explicitly requested file, or the first default location found
    ///
    /// An explicit path that cannot be read is an error. Absent default
    /// files yield an empty config.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match default_config_file() {
            Some(path) => {
                debug!("Loading config file {}", path.display());
                Self::load(&path)
            }
            None => {
                debug!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Root folder resolution across CLI, environment, TOML and defaults
pub struct RootFolderResolver<'a> {
    cli_arg: Option<PathBuf>,
    config: Option<&'a TomlConfig>,
}

impl<'a> RootFolderResolver<'a> {
    pub fn new() -> Self {
        Self {
            cli_arg: None,
            config: None,
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_config(mut self, config: &'a TomlConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = self.config.and_then(|c| c.root_folder.clone()) {
            return path;
        }

        // Priority 4: OS-dependent compiled default
        CompiledDefaults::for_current_platform().root_folder
    }
}

impl Default for RootFolderResolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives the well-known paths under a root folder and creates them
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn template_path(&self) -> PathBuf {
        self.root_folder.join(TEMPLATE_FILE)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root_folder.join(OUTPUT_DIR)
    }
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub template_path: PathBuf,
    pub output_dir: PathBuf,
    pub session_ttl: Duration,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    /// Resolve the configuration from CLI arguments, environment and TOML
    pub fn resolve(cli_root: Option<PathBuf>, config_path: Option<&Path>) -> Result<Self> {
        let toml_config = TomlConfig::discover(config_path)?;
        Ok(Self::from_toml(cli_root, &toml_config))
    }

    pub fn from_toml(cli_root: Option<PathBuf>, toml_config: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::for_current_platform();
        let root_folder = RootFolderResolver::new()
            .with_cli_arg(cli_root)
            .with_config(toml_config)
            .resolve();
        let initializer = RootFolderInitializer::new(root_folder.clone());

        let session_ttl_secs = match toml_config.session_ttl_secs {
            Some(0) => {
                warn!(
                    "session_ttl_secs = 0 is not usable, falling back to {}",
                    defaults.session_ttl_secs
                );
                defaults.session_ttl_secs
            }
            Some(secs) => secs,
            None => defaults.session_ttl_secs,
        };

        Self {
            database_path: initializer.database_path(),
            template_path: toml_config
                .template_path
                .clone()
                .unwrap_or_else(|| initializer.template_path()),
            output_dir: toml_config
                .output_dir
                .clone()
                .unwrap_or_else(|| initializer.output_dir()),
            session_ttl: Duration::from_secs(session_ttl_secs),
            log_level: toml_config
                .logging
                .level
                .clone()
                .unwrap_or(defaults.log_level),
            log_file: toml_config.logging.file.clone().or(defaults.log_file),
            root_folder,
        }
    }

    /// Create the root folder and output directory if missing
    pub fn ensure_directories(&self) -> Result<()> {
        RootFolderInitializer::new(self.root_folder.clone()).ensure_directory_exists()?;
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }
}

/// First existing default config file for the platform
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("buffet-tags").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/buffet-tags/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/buffet-tags (or /var/lib/buffet-tags without a home)
        dirs::data_local_dir()
            .map(|d| d.join("buffet-tags"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/buffet-tags"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("buffet-tags"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/buffet-tags"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("buffet-tags"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\buffet-tags"))
    } else {
        PathBuf::from("./buffet_data")
    }
}
