//! Declaration file parser.
//!
//! This module handles loading declarations from YAML files and environment
//! variables, with proper precedence and error handling.

use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::ConvergeConfig;

/// Environment variable overriding the project name.
pub const ENV_PROJECT_NAME: &str = "CONVERGE_PROJECT_NAME";

/// Environment variable overriding the provider endpoint.
pub const ENV_ENDPOINT: &str = "CONVERGE_ENDPOINT";

/// Environment variable holding the provider API token.
pub const ENV_API_TOKEN: &str = "CONVERGE_API_TOKEN";

/// Parser for declaration files.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a declaration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ConvergeConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
            message: format!("Failed to read file: {e}"),
            location: Some(path.display().to_string()),
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses a declaration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<ConvergeConfig> {
        debug!("Parsing YAML configuration");

        let config: ConvergeConfig =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })?;

        debug!(
            "Parsed {} resources for project: {}",
            config.resource_count(),
            config.project.name
        );
        Ok(config)
    }

    /// Loads a declaration file with environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<ConvergeConfig> {
        let mut config = self.load_file(path)?;
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(config: &mut ConvergeConfig) {
        if let Ok(name) = std::env::var(ENV_PROJECT_NAME) {
            debug!("Overriding project.name from environment");
            config.project.name = name;
        }

        if let Ok(endpoint) = std::env::var(ENV_ENDPOINT) {
            debug!("Overriding provider.endpoint from environment");
            config.provider.endpoint = Some(endpoint);
        }
    }

    /// Resolves a path from the declaration against the base path.
    #[must_use]
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.base_path {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| ConfigError::ParseError {
                message: format!("Failed to load .env file: {e}"),
                location: Some(env_path.display().to_string()),
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Gets the provider API token from the environment (optional).
    #[must_use]
    pub fn get_api_token() -> Option<String> {
        std::env::var(ENV_API_TOKEN).ok()
    }
}

/// Default declaration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["converge.yaml", "converge.yml"];

/// Finds the declaration file in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no declaration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderBackend;
    use crate::error::ConvergeError;
    use crate::tasks::Lifecycle;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r"
project:
  name: demo
";
        let config = ConfigParser::new()
            .parse_yaml(yaml, None)
            .expect("parse failed");

        assert_eq!(config.project.name, "demo");
        assert!(config.vpcs.is_empty());
        assert!(config.internet_gateways.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r"
project:
  name: demo

provider:
  backend: http
  endpoint: http://localhost:8080
  timeout_secs: 5

terraform:
  output_dir: out
  format: json

vpcs:
  - name: main
    cidr_block: 10.0.0.0/16
    tags:
      env: dev
  - name: external
    shared: true
    id: vpc-123

internet_gateways:
  - name: gw
    vpc: main
  - name: ext-gw
    vpc: external
    shared: true
    lifecycle: ExistsAndValidates
";
        let config = ConfigParser::new()
            .parse_yaml(yaml, None)
            .expect("parse failed");

        assert_eq!(config.provider.backend, ProviderBackend::Http);
        assert_eq!(config.provider.timeout_secs, 5);
        assert_eq!(config.vpcs.len(), 2);
        assert_eq!(config.vpcs[1].id.as_deref(), Some("vpc-123"));
        assert_eq!(config.internet_gateways[1].lifecycle, Lifecycle::ExistsAndValidates);
        assert_eq!(config.terraform.output_dir, "out");
    }

    #[test]
    fn test_parse_error_carries_location() {
        let result = ConfigParser::new().parse_yaml("project: [", Some(Path::new("bad.yaml")));

        assert!(matches!(
            result,
            Err(ConvergeError::Config(ConfigError::ParseError { location: Some(ref l), .. })) if l == "bad.yaml"
        ));
    }

    #[test]
    fn test_find_config_file_walks_parents() {
        let dir = TempDir::new().expect("tempdir failed");
        std::fs::write(dir.path().join("converge.yaml"), "project:\n  name: demo\n")
            .expect("write failed");
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).expect("mkdir failed");

        let found = find_config_file(&nested).expect("config should be found");
        assert_eq!(found, dir.path().join("converge.yaml"));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().expect("tempdir failed");
        let result = ConfigParser::new().load_file(dir.path().join("converge.yaml"));

        assert!(matches!(
            result,
            Err(ConvergeError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_resolve_path() {
        let parser = ConfigParser::new().with_base_path("/project");

        assert_eq!(
            parser.resolve_path(".converge/cloud.json"),
            PathBuf::from("/project/.converge/cloud.json")
        );
        assert_eq!(parser.resolve_path("/abs/file"), PathBuf::from("/abs/file"));
    }
}
