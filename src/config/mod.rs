//! Configuration management.
//!
//! Settings come from (lowest to highest precedence) built-in defaults, a TOML
//! configuration file, `ARXIV2KINDLE_*` environment variables and finally the
//! command line.
//!
//! # Configuration File Format
//!
//! ```toml
//! [geometry]
//! width = 4.0
//! height = 6.0
//! margin = 0.2
//!
//! [tools]
//! latex = "pdflatex"
//! rotator = "pdftk"
//! compile_passes = 3
//!
//! [network]
//! api_url = "http://export.arxiv.org/api/query"
//! eprint_url = "https://arxiv.org/e-print"
//! timeout_seconds = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::{DEFAULT_HEIGHT, DEFAULT_MARGIN, DEFAULT_WIDTH};

/// Environment variable prefix (`ARXIV2KINDLE_TOOLS__LATEX=xelatex`)
pub const ENV_PREFIX: &str = "ARXIV2KINDLE";

/// File name looked up in the working directory
const LOCAL_CONFIG_FILE: &str = "arxiv2kindle.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default page geometry
    #[serde(default)]
    pub geometry: GeometryConfig,

    /// External tools
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Remote repository endpoints
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Default page geometry (inches)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryConfig {
    #[serde(default = "default_width")]
    pub width: f64,

    #[serde(default = "default_height")]
    pub height: f64,

    #[serde(default = "default_margin")]
    pub margin: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            margin: default_margin(),
        }
    }
}

fn default_width() -> f64 {
    DEFAULT_WIDTH
}

fn default_height() -> f64 {
    DEFAULT_HEIGHT
}

fn default_margin() -> f64 {
    DEFAULT_MARGIN
}

/// External tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Typesetting engine
    #[serde(default = "default_latex")]
    pub latex: String,

    /// PDF rotation tool (landscape only)
    #[serde(default = "default_rotator")]
    pub rotator: String,

    /// Number of engine passes
    #[serde(default = "default_compile_passes")]
    pub compile_passes: u32,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            latex: default_latex(),
            rotator: default_rotator(),
            compile_passes: default_compile_passes(),
        }
    }
}

fn default_latex() -> String {
    "pdflatex".to_string()
}

fn default_rotator() -> String {
    "pdftk".to_string()
}

fn default_compile_passes() -> u32 {
    3
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// arXiv query API endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Base URL for source archives
    #[serde(default = "default_eprint_url")]
    pub eprint_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            eprint_url: default_eprint_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "http://export.arxiv.org/api/query".to_string()
}

fn default_eprint_url() -> String {
    "https://arxiv.org/e-print".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// `ARXIV2KINDLE_<SECTION>__<KEY>` overrides
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(environment())
        .build()?;

    settings.try_deserialize()
}

/// Configuration from defaults and environment variables only
pub fn get_config() -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(environment())
        .build()?;

    settings.try_deserialize()
}

/// Find a configuration file in the default locations
///
/// Checks `./arxiv2kindle.toml`, then `<config dir>/arxiv2kindle/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("arxiv2kindle").join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.geometry.width, 4.0);
        assert_eq!(config.geometry.height, 6.0);
        assert_eq!(config.geometry.margin, 0.2);
        assert_eq!(config.tools.latex, "pdflatex");
        assert_eq!(config.tools.rotator, "pdftk");
        assert_eq!(config.tools.compile_passes, 3);
        assert_eq!(config.network.timeout_seconds, 30);
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(
            &path,
            r#"
[geometry]
width = 3.5
margin = 0.1

[tools]
latex = "xelatex"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.geometry.width, 3.5);
        assert_eq!(config.geometry.height, 6.0);
        assert_eq!(config.geometry.margin, 0.1);
        assert_eq!(config.tools.latex, "xelatex");
        assert_eq!(config.tools.rotator, "pdftk");
        assert_eq!(config.network.api_url, "http://export.arxiv.org/api/query");
    }

    #[test]
    fn test_environment_override() {
        std::env::set_var("ARXIV2KINDLE_NETWORK__TIMEOUT_SECONDS", "90");
        let config = get_config().unwrap();
        std::env::remove_var("ARXIV2KINDLE_NETWORK__TIMEOUT_SECONDS");

        assert_eq!(config.network.timeout_seconds, 90);
        assert_eq!(config.tools.compile_passes, 3);
    }

    #[test]
    fn test_load_config_nonexistent() {
        let result = load_config(Path::new("/nonexistent/arxiv2kindle.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");
        std::fs::write(&path, "invalid = toml = content").unwrap();

        assert!(load_config(&path).is_err());
    }
}
