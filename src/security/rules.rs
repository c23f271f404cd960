//! Secured map-service rules.
//!
//! Associates URL patterns with credentials to inject when the outbound
//! request matches and the client supplied no Authorization of its own.
//! Rules are loaded once at startup and shared read-only across requests.

use crate::config::{ProxyError, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// How a rule pattern is tested against the request URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchType {
    /// Substring containment.
    Text,
    /// Regular expression; the URI must match the pattern in full.
    Regexp,
}

/// Credential scheme attached to a matched rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthType {
    /// Matched, but nothing is injected.
    None,
    /// HTTP Basic from the rule's stored username/password.
    Basic,
    /// Delegated to the SSO token provider for authenticated sessions.
    Bearer,
}

/// A service rule as written in the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
    pub url: String,
    pub url_type: MatchType,
    pub auth_type: AuthType,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug)]
enum Pattern {
    Text(String),
    Regexp(Regex),
}

/// A compiled, immutable service rule.
#[derive(Debug)]
pub struct ServiceRule {
    pattern: Pattern,
    pub auth_type: AuthType,
    pub username: String,
    pub password: String,
}

impl ServiceRule {
    fn compile(spec: RuleSpec) -> Result<Self> {
        if spec.auth_type == AuthType::Basic && spec.username.is_empty() {
            return Err(ProxyError::Config(format!(
                "BASIC rule for '{}' has an empty username",
                spec.url
            )));
        }

        let pattern = match spec.url_type {
            MatchType::Text => Pattern::Text(spec.url),
            MatchType::Regexp => {
                // Full-match semantics, like Java's String.matches.
                let anchored = format!("^(?:{})$", spec.url);
                let re = Regex::new(&anchored).map_err(|e| {
                    ProxyError::Config(format!("invalid REGEXP rule '{}': {e}", spec.url))
                })?;
                Pattern::Regexp(re)
            }
        };

        Ok(Self {
            pattern,
            auth_type: spec.auth_type,
            username: spec.username,
            password: spec.password,
        })
    }

    fn matches(&self, uri: &str) -> bool {
        match &self.pattern {
            Pattern::Text(text) => uri.contains(text.as_str()),
            Pattern::Regexp(re) => re.is_match(uri),
        }
    }
}

/// Ordered set of service rules. Ordering is an administrative choice:
/// the first matching rule wins.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<ServiceRule>,
}

impl RuleSet {
    /// Creates an empty rule set; no credential injection applies.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compiles rule specs in configured order.
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::Config` for invalid regexes or BASIC rules
    /// without a username.
    pub fn from_specs(specs: Vec<RuleSpec>) -> Result<Self> {
        let rules = specs
            .into_iter()
            .map(ServiceRule::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Loads rules from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or compiled.
    /// An unknown auth or url type in the file is a parse error here, never
    /// silently ignored at request time.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let specs: Vec<RuleSpec> = serde_json::from_str(&data).map_err(|e| {
            ProxyError::Config(format!("cannot parse rules file '{}': {e}", path.display()))
        })?;
        Self::from_specs(specs)
    }

    /// Returns the first rule (in configured order) matching the request URI.
    #[must_use]
    pub fn match_first(&self, uri: &str) -> Option<&ServiceRule> {
        self.rules.iter().find(|r| r.matches(uri))
    }

    /// Whether any rule requires an SSO token provider.
    #[must_use]
    pub fn any_bearer(&self) -> bool {
        self.rules.iter().any(|r| r.auth_type == AuthType::Bearer)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
