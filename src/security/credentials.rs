//! Credential injection for upstream requests.
//!
//! Produces the Authorization header value to attach to the outbound
//! request, or nothing when the client supplied its own credentials or no
//! rule applies.

use crate::config::{ProxyError, Result};
use crate::core::middleware::SessionSnapshot;
use crate::security::rules::{AuthType, ServiceRule};
use base64::{Engine as _, engine::general_purpose::STANDARD};

/// Source of SSO Authorization header values for authenticated sessions.
///
/// A proxy configured with Bearer rules must have a provider; that is
/// validated at construction. A provider returning nothing is not an error,
/// the request simply proceeds without injected credentials.
pub trait SsoTokenProvider: Send + Sync {
    fn auth_header_value(&self, session: &SessionSnapshot) -> Option<String>;
}

/// Provider backed by a single token fixed at startup.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl SsoTokenProvider for StaticTokenProvider {
    fn auth_header_value(&self, _session: &SessionSnapshot) -> Option<String> {
        if self.token.is_empty() {
            None
        } else {
            Some(format!("Bearer {}", self.token))
        }
    }
}

/// Computes the Authorization header value for the outbound request.
///
/// Client-supplied credentials always win; an unmatched request injects
/// nothing. Bearer rules degrade to anonymous for unauthenticated sessions.
///
/// # Errors
///
/// Returns `ProxyError::Config` when a Bearer rule applies to an
/// authenticated session but no SSO provider is configured.
pub fn inject(
    rule: Option<&ServiceRule>,
    existing_auth: Option<&str>,
    session: &SessionSnapshot,
    sso: Option<&dyn SsoTokenProvider>,
) -> Result<Option<String>> {
    if existing_auth.is_some_and(|v| !v.is_empty()) {
        return Ok(None);
    }

    let Some(rule) = rule else {
        return Ok(None);
    };

    match rule.auth_type {
        AuthType::None => Ok(None),
        AuthType::Basic => {
            let creds = format!("{}:{}", rule.username, rule.password);
            Ok(Some(format!("Basic {}", STANDARD.encode(creds))))
        }
        AuthType::Bearer => {
            if !session.authenticated {
                // Anonymous request, intentional graceful degradation.
                return Ok(None);
            }
            let provider = sso.ok_or_else(|| {
                ProxyError::Config(
                    "BEARER rule configured but no SSO token provider is available".to_string(),
                )
            })?;
            Ok(provider
                .auth_header_value(session)
                .filter(|v| !v.is_empty()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::rules::{MatchType, RuleSet, RuleSpec};

    struct NoTokenProvider;

    impl SsoTokenProvider for NoTokenProvider {
        fn auth_header_value(&self, _session: &SessionSnapshot) -> Option<String> {
            None
        }
    }

    fn rule_set(auth_type: AuthType) -> RuleSet {
        RuleSet::from_specs(vec![RuleSpec {
            url: "/wms".to_string(),
            url_type: MatchType::Text,
            auth_type,
            username: "u".to_string(),
            password: "p".to_string(),
        }])
        .unwrap()
    }

    #[test]
    fn test_basic_injection() {
        let rules = rule_set(AuthType::Basic);
        let rule = rules.match_first("/service/wms?REQUEST=GetMap");

        let value = inject(rule, None, &SessionSnapshot::anonymous(), None).unwrap();
        assert_eq!(value.as_deref(), Some("Basic dTpw"));
    }

    #[test]
    fn test_existing_auth_never_overridden() {
        let rules = rule_set(AuthType::Basic);
        let rule = rules.match_first("/service/wms");

        let value = inject(
            rule,
            Some("Bearer client-token"),
            &SessionSnapshot::anonymous(),
            None,
        )
        .unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_empty_existing_auth_does_not_block_injection() {
        let rules = rule_set(AuthType::Basic);
        let rule = rules.match_first("/service/wms");

        let value = inject(rule, Some(""), &SessionSnapshot::anonymous(), None).unwrap();
        assert_eq!(value.as_deref(), Some("Basic dTpw"));
    }

    #[test]
    fn test_no_rule_injects_nothing() {
        let value = inject(None, None, &SessionSnapshot::anonymous(), None).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_bearer_unauthenticated_proceeds_anonymous() {
        let rules = rule_set(AuthType::Bearer);
        let rule = rules.match_first("/service/wms");

        let value = inject(rule, None, &SessionSnapshot::anonymous(), None).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_bearer_authenticated_uses_provider() {
        let rules = rule_set(AuthType::Bearer);
        let rule = rules.match_first("/service/wms");
        let provider = StaticTokenProvider::new("sso-token");

        let value = inject(
            rule,
            None,
            &SessionSnapshot::new(true),
            Some(&provider),
        )
        .unwrap();
        assert_eq!(value.as_deref(), Some("Bearer sso-token"));
    }

    #[test]
    fn test_bearer_without_provider_is_config_error() {
        let rules = rule_set(AuthType::Bearer);
        let rule = rules.match_first("/service/wms");

        let err = inject(rule, None, &SessionSnapshot::new(true), None).unwrap_err();
        assert!(matches!(err, ProxyError::Config(_)));
    }

    #[test]
    fn test_bearer_provider_without_token_is_silent() {
        let rules = rule_set(AuthType::Bearer);
        let rule = rules.match_first("/service/wms");

        let value = inject(
            rule,
            None,
            &SessionSnapshot::new(true),
            Some(&NoTokenProvider),
        )
        .unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_none_auth_type_injects_nothing() {
        let rules = RuleSet::from_specs(vec![RuleSpec {
            url: "/open".to_string(),
            url_type: MatchType::Text,
            auth_type: AuthType::None,
            username: String::new(),
            password: String::new(),
        }])
        .unwrap();
        let rule = rules.match_first("/open/layer");

        let value = inject(rule, None, &SessionSnapshot::anonymous(), None).unwrap();
        assert!(value.is_none());
    }
}
