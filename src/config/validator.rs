//! Declaration validation.
//!
//! This module checks a parsed declaration for values the engine cannot
//! act on, collecting every problem before reporting the first one.

use crate::error::{ConfigError, Result};
use std::collections::HashSet;
use std::net::Ipv4Addr;
use tracing::debug;

use super::spec::{ConvergeConfig, InternetGatewayConfig, ProviderBackend, VpcConfig};
use crate::provider::Tags;
use crate::tasks::{NAME_TAG, PROJECT_TAG};

/// Validator for declarations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a declaration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if any were found.
    pub fn validate(&self, config: &ConvergeConfig) -> Result<ValidationResult> {
        let result = self.check(config);

        if let Some(first_error) = result.errors.first() {
            return Err(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }
            .into());
        }

        debug!("Configuration validation passed");
        Ok(result)
    }

    /// Collects every error and warning without failing.
    #[must_use]
    pub fn check(&self, config: &ConvergeConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_project(config, &mut result);
        Self::validate_provider(config, &mut result);
        Self::validate_vpcs(&config.vpcs, &mut result);
        Self::validate_gateways(config, &mut result);

        if config.resource_count() == 0 {
            result
                .warnings
                .push(String::from("No resources declared in configuration"));
        }

        result
    }

    fn validate_project(config: &ConvergeConfig, result: &mut ValidationResult) {
        let name = &config.project.name;
        if name.is_empty() {
            result.error("project.name", "Project name cannot be empty");
        } else if !is_valid_name(name) {
            result.error(
                "project.name",
                format!(
                    "Project name '{name}' is invalid. Must be lowercase alphanumeric with hyphens."
                ),
            );
        }
    }

    fn validate_provider(config: &ConvergeConfig, result: &mut ValidationResult) {
        match config.provider.backend {
            ProviderBackend::Http => {
                if config.provider.endpoint.as_ref().is_none_or(String::is_empty) {
                    result.error(
                        "provider.endpoint",
                        "Endpoint is required when using the http backend",
                    );
                }
            }
            ProviderBackend::Memory => {
                if config.provider.fixture.is_empty() {
                    result.error("provider.fixture", "Fixture path cannot be empty");
                }
            }
        }

        if config.provider.timeout_secs == 0 {
            result.error("provider.timeout_secs", "Timeout must be at least 1 second");
        }
    }

    fn validate_vpcs(vpcs: &[VpcConfig], result: &mut ValidationResult) {
        let mut seen_names = HashSet::new();

        for (i, vpc) in vpcs.iter().enumerate() {
            let prefix = format!("vpcs[{i}]");

            if !seen_names.insert(vpc.name.as_str()) {
                result.error(
                    format!("{prefix}.name"),
                    format!("Duplicate VPC name: {}", vpc.name),
                );
            }
            Self::validate_name(&vpc.name, "VPC", &prefix, result);
            Self::validate_tags(&vpc.tags, vpc.shared, &prefix, result);

            if vpc.shared {
                if vpc.id.as_ref().is_none_or(String::is_empty) {
                    result.error(
                        format!("{prefix}.id"),
                        format!("Shared VPC '{}' must declare its id", vpc.name),
                    );
                }
                if vpc.cidr_block.is_some() {
                    result.warnings.push(format!(
                        "{prefix}.cidr_block is ignored for shared VPC '{}'",
                        vpc.name
                    ));
                }
                continue;
            }

            match &vpc.cidr_block {
                None => result.error(
                    format!("{prefix}.cidr_block"),
                    format!("VPC '{}' must declare a CIDR block", vpc.name),
                ),
                Some(cidr) if !is_valid_cidr(cidr) => result.error(
                    format!("{prefix}.cidr_block"),
                    format!("Invalid CIDR block '{cidr}'"),
                ),
                Some(_) => {}
            }
        }
    }

    fn validate_gateways(config: &ConvergeConfig, result: &mut ValidationResult) {
        let mut seen_names = HashSet::new();

        for (i, gateway) in config.internet_gateways.iter().enumerate() {
            let prefix = format!("internet_gateways[{i}]");

            if !seen_names.insert(gateway.name.as_str()) {
                result.error(
                    format!("{prefix}.name"),
                    format!("Duplicate internet gateway name: {}", gateway.name),
                );
            }
            Self::validate_name(&gateway.name, "Internet gateway", &prefix, result);
            Self::validate_tags(&gateway.tags, gateway.shared, &prefix, result);
            Self::validate_gateway_vpc(config, gateway, &prefix, result);
        }
    }

    fn validate_gateway_vpc(
        config: &ConvergeConfig,
        gateway: &InternetGatewayConfig,
        prefix: &str,
        result: &mut ValidationResult,
    ) {
        let Some(vpc) = config.vpc(&gateway.vpc) else {
            result.error(
                format!("{prefix}.vpc"),
                format!(
                    "Internet gateway '{}' references unknown VPC '{}'",
                    gateway.name, gateway.vpc
                ),
            );
            return;
        };

        if gateway.shared && !vpc.shared && vpc.id.is_none() {
            result.warnings.push(format!(
                "Shared internet gateway '{}' is attached to managed VPC '{}'; it can only be found once the VPC exists",
                gateway.name, vpc.name
            ));
        }
    }

    fn validate_name(name: &str, kind: &str, prefix: &str, result: &mut ValidationResult) {
        if !is_valid_name(name) {
            result.error(
                format!("{prefix}.name"),
                format!("{kind} name '{name}' is invalid. Must be lowercase alphanumeric with hyphens."),
            );
        }
    }

    fn validate_tags(
        tags: &Tags,
        shared: bool,
        prefix: &str,
        result: &mut ValidationResult,
    ) {
        if shared {
            return;
        }
        for key in [NAME_TAG, PROJECT_TAG] {
            if tags.contains_key(key) {
                result
                    .warnings
                    .push(format!("{prefix}.tags.{key} is managed and will be overwritten"));
            }
        }
    }
}

/// Validates that a name follows the naming convention.
/// Names must be lowercase alphanumeric with hyphens, starting with a letter.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }

    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return false;
    }

    !name.ends_with('-') && !name.contains("--")
}

/// Validates an IPv4 CIDR block such as `10.0.0.0/16`.
fn is_valid_cidr(cidr: &str) -> bool {
    let Some((address, prefix)) = cidr.split_once('/') else {
        return false;
    };

    address.parse::<Ipv4Addr>().is_ok() && prefix.parse::<u8>().is_ok_and(|p| p <= 32)
}

impl ValidationResult {
    fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigParser;
    use crate::error::ConvergeError;

    fn parse(yaml: &str) -> ConvergeConfig {
        ConfigParser::new()
            .parse_yaml(yaml, None)
            .expect("parse failed")
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("main"));
        assert!(is_valid_name("gw-1"));
        assert!(is_valid_name("a"));
    }

    #[test]
    fn test_invalid_name() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Main")); // uppercase
        assert!(!is_valid_name("1-vpc")); // starts with number
        assert!(!is_valid_name("my_vpc")); // underscore
        assert!(!is_valid_name("vpc-")); // ends with hyphen
        assert!(!is_valid_name("my--vpc")); // consecutive hyphens
    }

    #[test]
    fn test_cidr() {
        assert!(is_valid_cidr("10.0.0.0/16"));
        assert!(is_valid_cidr("0.0.0.0/0"));
        assert!(!is_valid_cidr("10.0.0.0"));
        assert!(!is_valid_cidr("10.0.0.0/33"));
        assert!(!is_valid_cidr("10.0.0/16"));
    }

    #[test]
    fn test_valid_declaration() {
        let config = parse(
            r"
project:
  name: demo
vpcs:
  - name: main
    cidr_block: 10.0.0.0/16
internet_gateways:
  - name: gw
    vpc: main
",
        );

        let result = ConfigValidator::new()
            .validate(&config)
            .expect("validation failed");
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_collects_every_error() {
        let config = parse(
            r"
project:
  name: demo
vpcs:
  - name: external
    shared: true
  - name: main
internet_gateways:
  - name: gw
    vpc: missing
",
        );

        let result = ConfigValidator::new().check(&config);
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();

        assert_eq!(
            fields,
            vec!["vpcs[0].id", "vpcs[1].cidr_block", "internet_gateways[0].vpc"]
        );
    }

    #[test]
    fn test_validate_reports_first_error() {
        let config = parse(
            r"
project:
  name: Demo
",
        );

        let result = ConfigValidator::new().validate(&config);
        assert!(matches!(
            result,
            Err(ConvergeError::Config(ConfigError::ValidationError { field: Some(ref f), .. })) if f == "project.name"
        ));
    }

    #[test]
    fn test_http_backend_requires_endpoint() {
        let config = parse(
            r"
project:
  name: demo
provider:
  backend: http
",
        );

        let result = ConfigValidator::new().check(&config);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.errors[0].field, "provider.endpoint");
    }

    #[test]
    fn test_managed_tag_override_warns() {
        let config = parse(
            r"
project:
  name: demo
vpcs:
  - name: main
    cidr_block: 10.0.0.0/16
    tags:
      Name: other
",
        );

        let result = ConfigValidator::new().check(&config);
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 1);
    }
}
