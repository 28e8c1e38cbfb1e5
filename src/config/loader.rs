//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming the audit table, as set by the deployment.
pub const AUDIT_TABLE_ENV: &str = "JWTTABLE";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// Environment overrides are applied before validation.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: GatewayConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides to a configuration.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(table) = lookup(AUDIT_TABLE_ENV).filter(|t| !t.is_empty()) {
        tracing::debug!(table = %table, "Audit table overridden from environment");
        config.audit.table = table;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_env_override() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, |k| {
            (k == AUDIT_TABLE_ENV).then(|| "prod-history".to_string())
        });
        assert_eq!(config.audit.table, "prod-history");

        // Empty values are ignored.
        apply_env_overrides(&mut config, |_| Some(String::new()));
        assert_eq!(config.audit.table, "prod-history");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[admission]\nburst_capacity = 101\nsustained_rate = 152.0\n"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.admission.burst_capacity, 101);
        assert_eq!(config.admission.sustained_rate, 152.0);
    }

    #[test]
    fn test_load_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[admission]\nburst_capacity = 0\n").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("admission.burst_capacity"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/gateway.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
