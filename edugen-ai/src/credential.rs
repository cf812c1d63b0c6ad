//! Per-call model credentials
//!
//! The process default is resolved once at startup and never mutated. A call
//! may carry its own override; the override is scoped to that call and is
//! never stored anywhere else.

use crate::error::PipelineError;
use std::fmt;
use std::sync::Arc;

/// An API key. `Debug` and `Display` never print the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Arc<str>);

impl Credential {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    /// The raw key, for placing on an outbound request only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Chooses the credential for one call: override first, else the default
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    default: Option<Credential>,
}

impl CredentialResolver {
    pub fn new(default: Option<Credential>) -> Self {
        Self { default }
    }

    /// # Errors
    ///
    /// `PipelineError::Configuration` when neither an override nor a default
    /// exists. Callers check this before any network traffic.
    pub fn resolve(&self, call_override: Option<&Credential>) -> Result<Credential, PipelineError> {
        call_override
            .or(self.default.as_ref())
            .cloned()
            .ok_or_else(|| {
                PipelineError::Configuration(
                    "no model API key: pass apiKey with the request or set GEMINI_API_KEY"
                        .to_string(),
                )
            })
    }
}
