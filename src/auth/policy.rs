//! auth::policy
//!
//! Scope policy: local preflight and remote-error remediation.
//!
//! # Preflight
//!
//! Before a command with registry-governed services touches the network,
//! the account's granted scopes are checked against the command's
//! requirements. The check deliberately fails open in two cases:
//!
//! - the account has no recorded granted-scope string (accounts created
//!   before scope tracking existed cannot be evaluated), and
//! - a matched service declares no scopes (the requirement cannot be
//!   asserted confidently).
//!
//! A real mismatch fails with the missing scopes, the account name, and a
//! copy-pasteable re-login command.
//!
//! # Remote remediation
//!
//! When the platform rejects a call for insufficient scopes, the error
//! message embeds a bracketed list of scope tokens. Those are extracted,
//! reduced to a preferred set, and the same remediation shape is appended
//! to the original error rather than replacing it.

use super::errors::{relogin_command_with_scopes, AuthError};
use super::registry::{services_for_command, ServiceDescriptor, TokenKind};
use super::scopes::ScopeSet;

/// Scopes a command invocation requires.
#[derive(Debug, Clone)]
pub struct ScopeRequirement {
    /// Whether any governed service needs a user token at all.
    pub needs_user_token: bool,

    /// Required scopes in canonical form (sentinel first).
    pub scopes: ScopeSet,

    /// Matched user-token services that declare no scopes. A soft warning
    /// signal, never a hard failure.
    pub undeclared: Vec<String>,
}

/// Preflight outcome for a command that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preflight {
    /// Only tenant services govern this command; no user scopes apply.
    NotRequired,
    /// The account has no recorded granted scopes; cannot evaluate.
    SkippedUnknownGrant,
    /// A governed service declares no scopes; cannot assert confidently.
    SkippedUndeclared(Vec<String>),
    /// Granted scopes cover the requirement.
    Passed,
}

/// Compute the scopes required for a command invocation.
///
/// Defaults to full access unless the caller asks for read-only; the
/// sentinel scope is always prepended via canonical form.
pub fn scopes_for_command(
    registry: &[ServiceDescriptor],
    path: &str,
    readonly: bool,
) -> ScopeRequirement {
    let services = services_for_command(registry, path);
    let user_services: Vec<_> = services
        .into_iter()
        .filter(|s| s.token_kind == TokenKind::User)
        .collect();

    if user_services.is_empty() {
        return ScopeRequirement {
            needs_user_token: false,
            scopes: ScopeSet::sentinel_only(),
            undeclared: Vec::new(),
        };
    }

    let mut undeclared = Vec::new();
    let mut required = Vec::new();
    for service in user_services {
        if !service.declares_scopes() {
            undeclared.push(service.name.to_string());
            continue;
        }
        let chosen = if readonly && !service.readonly_scopes.is_empty() {
            service.readonly_scopes
        } else {
            service.full_scopes
        };
        required.extend(chosen.iter().map(|s| s.to_string()));
    }

    ScopeRequirement {
        needs_user_token: true,
        scopes: ScopeSet::from_scopes(required),
        undeclared,
    }
}

/// Check an account's granted scopes against a command's requirements.
///
/// `granted` is the raw granted-scope string recorded on the account.
pub fn preflight_command(
    registry: &[ServiceDescriptor],
    path: &str,
    readonly: bool,
    account: &str,
    granted: &str,
) -> Result<Preflight, AuthError> {
    let requirement = scopes_for_command(registry, path, readonly);
    if !requirement.needs_user_token {
        return Ok(Preflight::NotRequired);
    }
    if granted.trim().is_empty() {
        return Ok(Preflight::SkippedUnknownGrant);
    }
    if !requirement.undeclared.is_empty() {
        return Ok(Preflight::SkippedUndeclared(requirement.undeclared));
    }

    let granted_set = ScopeSet::parse(granted);
    let missing = granted_set.missing_from(&requirement.scopes);
    if missing.is_empty() {
        Ok(Preflight::Passed)
    } else {
        Err(AuthError::MissingScopes {
            account: account.to_string(),
            missing,
            required: requirement.scopes.to_scope_string(),
        })
    }
}

/// Extract scope-like tokens from bracketed lists in a provider message.
///
/// A token qualifies when it contains a colon; everything else inside the
/// brackets (ids, prose) is ignored.
fn extract_scope_tokens(message: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = message;
    while let Some(open) = rest.find('[') {
        let Some(close_rel) = rest[open + 1..].find(']') else {
            break;
        };
        let inner = &rest[open + 1..open + 1 + close_rel];
        for raw in inner.split(|c| c == ',' || c == ' ') {
            let token = raw.trim();
            if token.contains(':') && !tokens.iter().any(|t| t == token) {
                tokens.push(token.to_string());
            }
        }
        rest = &rest[open + 1 + close_rel + 1..];
    }
    tokens
}

/// Reduce extracted tokens to the preferred request set.
///
/// When both a scope and its read-only counterpart appear, the read-only
/// variant wins unless the caller's own requirement names the full form.
fn reduce_preferred(tokens: Vec<String>, caller_required: Option<&ScopeSet>) -> Vec<String> {
    let caller_requires_full = |scope: &str| {
        caller_required
            .map(|set| set.as_slice().iter().any(|s| s == scope))
            .unwrap_or(false)
    };

    tokens
        .iter()
        .filter(|token| {
            let readonly_variant = format!("{}:readonly", token);
            let has_readonly = tokens.iter().any(|t| *t == readonly_variant);
            !has_readonly || caller_requires_full(token)
        })
        .cloned()
        .collect()
}

/// Append scope remediation to a provider error message, when it embeds a
/// recognizable scope list. Returns `None` when the message carries none.
pub fn augment_scope_error(
    message: &str,
    account: &str,
    caller_required: Option<&ScopeSet>,
) -> Option<String> {
    let tokens = extract_scope_tokens(message);
    if tokens.is_empty() {
        return None;
    }

    let preferred = reduce_preferred(tokens, caller_required);
    let required = ScopeSet::from_scopes(preferred.iter().cloned());
    Some(format!(
        "{}\naccount '{}' is missing scopes: {}. Run `{}` to re-authorize.",
        message,
        account,
        preferred.join(" "),
        relogin_command_with_scopes(&required.to_scope_string())
    ))
}
