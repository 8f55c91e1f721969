//! Configuration handling for the Access MCP Server.
//!
//! Configuration comes from two places, resolved once at startup:
//! - CLI arguments and environment variables (`clap`)
//! - a YAML file, `config.yaml` next to the executable by default
//!
//! The merged result is a [`Settings`] value that is handed to the MCP service
//! at construction time.

use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const LOG_FILE_NAME: &str = "access-mcp-server.log";
pub const DEFAULT_LOG_DIR: &str = "./log";

/// ODBC driver used for row queries and statements.
pub const DEFAULT_ODBC_DRIVER: &str = "Microsoft Access Driver (*.mdb)";

/// OLE DB providers tried, in order, when binding the ADOX catalog.
pub const DEFAULT_PROVIDERS: &[&str] = &[
    "Microsoft.Jet.OLEDB.4.0",
    "Microsoft.ACE.OLEDB.12.0",
    "Microsoft.ACE.OLEDB.16.0",
];

/// Contents of `config.yaml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileConfig {
    pub log_dir: Option<PathBuf>,
    pub debug: Option<bool>,
    pub odbc_driver: Option<String>,
    pub providers: Option<Vec<String>>,
    pub catalog_fallback: Option<bool>,
}

impl FileConfig {
    /// Parse YAML text. An empty document yields defaults.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Load a config file, falling back to defaults.
    ///
    /// A missing file is silent. An unreadable or malformed file produces a
    /// warning, returned alongside the defaults because logging is not set up yet.
    pub fn load(path: &Path) -> (Self, Option<String>) {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return (Self::default(), None),
            Err(e) => {
                return (
                    Self::default(),
                    Some(format!(
                        "Error reading {}: {}. Using defaults.",
                        path.display(),
                        e
                    )),
                );
            }
        };

        match Self::from_yaml(&text) {
            Ok(cfg) => (cfg, None),
            Err(e) => (
                Self::default(),
                Some(format!(
                    "Error parsing {}: {}. Using defaults.",
                    path.display(),
                    e
                )),
            ),
        }
    }
}

/// Command line configuration for the Access MCP Server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "access-mcp-server",
    about = "MCP server for Microsoft Access databases - enables AI assistants to query MDB/ACCDB files",
    version,
    author
)]
pub struct Config {
    /// Path to the YAML config file (default: config.yaml next to the executable)
    #[arg(short, long, value_name = "PATH", env = "ACCESS_MCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for the log file (overrides logDir from the config file)
    #[arg(long, value_name = "DIR", env = "ACCESS_MCP_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "ACCESS_MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "ACCESS_MCP_JSON_LOGS")]
    pub json_logs: bool,

    /// Log raw tool arguments and results (also enabled by `debug: true` in the config file)
    #[arg(long, env = "ACCESS_MCP_DEBUG")]
    pub debug: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            config: None,
            log_dir: None,
            log_level: "info".to_string(),
            json_logs: false,
            debug: false,
        }
    }

    /// Resolve the config file location and the directory relative paths are based on.
    fn config_location(&self) -> (Option<PathBuf>, PathBuf) {
        if let Some(path) = &self.config {
            let base = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            return (Some(path.clone()), base);
        }
        match executable_dir() {
            Some(dir) => (Some(dir.join(CONFIG_FILE_NAME)), dir),
            None => (None, PathBuf::from(".")),
        }
    }

    /// Load the config file and merge it with CLI values.
    ///
    /// Returns the settings plus any warnings to log once logging is initialized.
    pub fn resolve(&self) -> (Settings, Vec<String>) {
        let (path, base_dir) = self.config_location();
        let (file, warning) = match path {
            Some(path) => FileConfig::load(&path),
            None => (FileConfig::default(), None),
        };
        let settings = Settings::merge(self, file, &base_dir);
        (settings, warning.into_iter().collect())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Absolute (or base-relative) directory the log file is written to
    pub log_dir: PathBuf,
    /// Log raw tool arguments and results
    pub debug: bool,
    /// ODBC driver name for row queries and statements
    pub odbc_driver: String,
    /// OLE DB providers for catalog binding, in preference order
    pub providers: Vec<String>,
    /// Retry catalog operations through ODBC catalog functions when ADOX fails
    pub catalog_fallback: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            debug: false,
            odbc_driver: DEFAULT_ODBC_DRIVER.to_string(),
            providers: DEFAULT_PROVIDERS.iter().map(|p| p.to_string()).collect(),
            catalog_fallback: true,
        }
    }
}

impl Settings {
    /// Merge CLI values over file values over defaults.
    pub fn merge(cli: &Config, file: FileConfig, base_dir: &Path) -> Self {
        let defaults = Self::default();

        let log_dir = cli
            .log_dir
            .clone()
            .or(file.log_dir)
            .unwrap_or(defaults.log_dir);
        let log_dir = if log_dir.is_absolute() {
            log_dir
        } else {
            normalize(&base_dir.join(log_dir))
        };

        let providers = file
            .providers
            .filter(|p| !p.is_empty())
            .unwrap_or(defaults.providers);

        Self {
            log_dir,
            debug: cli.debug || file.debug.unwrap_or(defaults.debug),
            odbc_driver: file
                .odbc_driver
                .filter(|d| !d.trim().is_empty())
                .unwrap_or(defaults.odbc_driver),
            providers,
            catalog_fallback: file.catalog_fallback.unwrap_or(defaults.catalog_fallback),
        }
    }

    /// Full path of the log file.
    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }
}

fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Drop `.` components and fold `..` where possible, without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}
