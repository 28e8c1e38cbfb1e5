//! Credential verification strategies.
//!
//! Verification is isolated behind [`CredentialVerifier`] so swapping the
//! scheme never touches audit or admission code.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{AuthzConfig, VerifierKind};
use crate::error::GatewayError;
use crate::gateway::Decision;

/// Turns a raw credential into a decision.
pub trait CredentialVerifier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// `Err(MalformedCredential)` when the credential cannot be read at all,
    /// `Ok(Decision::deny())` when it is readable but not acceptable.
    fn verify(&self, credential: &str) -> Result<Decision, GatewayError>;
}

/// Allows every request, with or without a credential.
///
/// This provides no authentication. Deployments that need it configure a
/// stricter strategy.
pub struct AlwaysAllow;

impl CredentialVerifier for AlwaysAllow {
    fn name(&self) -> &'static str {
        "always_allow"
    }

    fn verify(&self, _credential: &str) -> Result<Decision, GatewayError> {
        Ok(Decision::allow())
    }
}

/// Accepts `Bearer <token>` credentials from a fixed token list.
///
/// The matched principal is forwarded to the handler as `principal`.
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    /// Build from `(token, principal)` pairs.
    pub fn new(tokens: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }
}

impl CredentialVerifier for StaticTokenVerifier {
    fn name(&self) -> &'static str {
        "static_token"
    }

    fn verify(&self, credential: &str) -> Result<Decision, GatewayError> {
        if credential.is_empty() {
            return Err(GatewayError::MalformedCredential(
                "missing authorization header".to_string(),
            ));
        }

        let token = match credential.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
            _ => {
                return Err(GatewayError::MalformedCredential(
                    "expected Bearer scheme".to_string(),
                ))
            }
        };
        if token.is_empty() {
            return Err(GatewayError::MalformedCredential("empty bearer token".to_string()));
        }

        Ok(match self.tokens.get(token) {
            Some(principal) => Decision::allow_with(HashMap::from([(
                "principal".to_string(),
                principal.clone(),
            )])),
            None => Decision::deny(),
        })
    }
}

/// Build the verifier selected by configuration.
pub fn from_config(config: &AuthzConfig) -> Arc<dyn CredentialVerifier> {
    match config.strategy {
        VerifierKind::AlwaysAllow => Arc::new(AlwaysAllow),
        VerifierKind::StaticToken => Arc::new(StaticTokenVerifier::new(
            config
                .tokens
                .iter()
                .map(|t| (t.token.clone(), t.principal.clone())),
        )),
    }
}
