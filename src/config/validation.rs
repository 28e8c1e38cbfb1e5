//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field
//! requirements. Every problem is reported, not just the first.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{GatewayConfig, VerifierKind};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("audit.table must not be empty")]
    EmptyTable,

    #[error("authz.strategy = \"static_token\" requires at least one entry in authz.tokens")]
    NoTokens,

    #[error("authz.tokens[{0}] has an empty token")]
    EmptyToken(usize),

    #[error("admin.api_key must be changed when the admin API is enabled")]
    DefaultAdminKey,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);

    if config.admission.burst_capacity == 0 {
        errors.push(ValidationError::NotPositive("admission.burst_capacity"));
    }
    let rate = config.admission.sustained_rate;
    if rate <= 0.0 || rate.is_nan() || rate.is_infinite() {
        errors.push(ValidationError::NotPositive("admission.sustained_rate"));
    }

    if config.audit.table.trim().is_empty() {
        errors.push(ValidationError::EmptyTable);
    }
    if config.audit.write_timeout_ms == 0 {
        errors.push(ValidationError::NotPositive("audit.write_timeout_ms"));
    }

    if config.authz.strategy == VerifierKind::StaticToken {
        if config.authz.tokens.is_empty() {
            errors.push(ValidationError::NoTokens);
        }
        for (i, t) in config.authz.tokens.iter().enumerate() {
            if t.token.is_empty() {
                errors.push(ValidationError::EmptyToken(i));
            }
        }
    }

    if let Some(upstream) = &config.handler.upstream {
        check_authority(&mut errors, "handler.upstream", upstream);
    }
    if config.handler.timeout_secs == 0 {
        errors.push(ValidationError::NotPositive("handler.timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::NotPositive("timeouts.request_secs"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::NotPositive("security.max_body_size"));
    }

    if config.observability.metrics_enabled {
        check_addr(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if config.admin.enabled {
        check_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key == crate::config::schema::AdminConfig::default().api_key {
            errors.push(ValidationError::DefaultAdminKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

/// A `host:port` pair. Unlike [`check_addr`] the host may be a name.
fn check_authority(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = match value.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty() && !host.contains(['/', ' ']) && port.parse::<u16>().is_ok()
        }
        None => false,
    };
    if !valid {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = GatewayConfig::default();
        config.admission.burst_capacity = 0;
        config.admission.sustained_rate = 0.0;
        config.audit.table = " ".to_string();
        config.authz.strategy = VerifierKind::StaticToken;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::NotPositive("admission.burst_capacity")));
        assert!(errors.contains(&ValidationError::NotPositive("admission.sustained_rate")));
        assert!(errors.contains(&ValidationError::EmptyTable));
        assert!(errors.contains(&ValidationError::NoTokens));
    }

    #[test]
    fn test_rejects_bad_upstream_and_default_admin_key() {
        let mut config = GatewayConfig::default();
        config.handler.upstream = Some("not an address".to_string());
        config.admin.enabled = true;

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::InvalidAddress { field: "handler.upstream", .. }
        ));
        assert!(errors.contains(&ValidationError::DefaultAdminKey));
    }

    #[test]
    fn test_upstream_accepts_host_names() {
        for upstream in ["backend:3000", "10.0.0.5:8080", "[::1]:9000"] {
            let mut config = GatewayConfig::default();
            config.handler.upstream = Some(upstream.to_string());
            assert_eq!(validate_config(&config), Ok(()), "{upstream}");
        }

        for upstream in ["backend", ":3000", "backend:http", "http://backend:3000"] {
            let mut config = GatewayConfig::default();
            config.handler.upstream = Some(upstream.to_string());
            assert!(validate_config(&config).is_err(), "{upstream}");
        }
    }

    #[test]
    fn test_nan_rate_rejected() {
        let mut config = GatewayConfig::default();
        config.admission.sustained_rate = f64::NAN;
        assert!(validate_config(&config).is_err());

        config.admission.sustained_rate = f64::INFINITY;
        assert!(validate_config(&config).is_err());
    }
}
