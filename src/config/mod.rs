//! Declaration file handling.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing `converge.yaml`
//! - Environment overrides and `.env` loading
//! - Validation of declared resources

mod parser;
mod spec;
mod validator;

pub use parser::{
    ConfigParser, DEFAULT_CONFIG_FILES, ENV_API_TOKEN, ENV_ENDPOINT, ENV_PROJECT_NAME,
    find_config_file,
};
pub use spec::{
    ConvergeConfig, InternetGatewayConfig, ProjectConfig, ProviderBackend, ProviderConfig,
    TerraformConfig, VpcConfig,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
