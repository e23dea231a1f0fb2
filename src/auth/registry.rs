//! auth::registry
//!
//! Static mapping of platform services to OAuth scopes and governed
//! commands.
//!
//! # Design
//!
//! Each command declares nothing itself; the registry maps command paths to
//! the services they touch, and each service declares the scopes its full
//! and read-only access levels require. A command path may be governed by
//! several services, and a service may govern several command paths.
//!
//! Tenant-only services authenticate with app credentials rather than a
//! user token; commands mapping exclusively to tenant services are exempt
//! from user-scope preflight.

/// Which credential a service authenticates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Requires a user access token (and therefore user scopes).
    User,
    /// App-only; never requires a user token.
    Tenant,
}

/// Registry entry for one platform service.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// Service name, e.g. "mail".
    pub name: &'static str,

    /// Credential kind this service authenticates with.
    pub token_kind: TokenKind,

    /// Scopes required for full access.
    pub full_scopes: &'static [&'static str],

    /// Scopes required for read-only access.
    pub readonly_scopes: &'static [&'static str],

    /// Command paths governed by this service.
    ///
    /// A path here matches an invocation when it equals the invocation path
    /// or is a whole-word prefix of it ("mail" governs "mail send").
    pub commands: &'static [&'static str],
}

impl ServiceDescriptor {
    /// Whether this service declares any scopes at all.
    ///
    /// Undeclared user-token services make preflight inconclusive; the
    /// policy engine skips the check for them rather than guessing.
    pub fn declares_scopes(&self) -> bool {
        !self.full_scopes.is_empty() || !self.readonly_scopes.is_empty()
    }

    /// Whether this service governs the given command path.
    pub fn governs(&self, path: &str) -> bool {
        self.commands.iter().any(|c| command_matches(c, path))
    }
}

/// Whole-word prefix match: "mail" governs "mail send" but not "mailbox".
fn command_matches(governed: &str, path: &str) -> bool {
    match path.strip_prefix(governed) {
        Some("") => true,
        Some(rest) => rest.starts_with(' '),
        None => false,
    }
}

/// The built-in service registry.
pub const SERVICES: &[ServiceDescriptor] = &[
    ServiceDescriptor {
        name: "mail",
        token_kind: TokenKind::User,
        full_scopes: &["mail:mail"],
        readonly_scopes: &["mail:mail:readonly"],
        commands: &["mail"],
    },
    ServiceDescriptor {
        name: "drive",
        token_kind: TokenKind::User,
        full_scopes: &["drive:drive"],
        readonly_scopes: &["drive:drive:readonly"],
        commands: &["drive"],
    },
    ServiceDescriptor {
        name: "im",
        token_kind: TokenKind::User,
        full_scopes: &["im:message"],
        readonly_scopes: &["im:message:readonly"],
        commands: &["im"],
    },
    ServiceDescriptor {
        name: "contact",
        token_kind: TokenKind::User,
        full_scopes: &["contact:contact.base"],
        readonly_scopes: &["contact:contact.base:readonly"],
        commands: &["contact"],
    },
    ServiceDescriptor {
        name: "calendar",
        token_kind: TokenKind::User,
        full_scopes: &["calendar:calendar"],
        readonly_scopes: &["calendar:calendar:readonly"],
        commands: &["calendar"],
    },
    ServiceDescriptor {
        name: "app",
        token_kind: TokenKind::Tenant,
        full_scopes: &[],
        readonly_scopes: &[],
        commands: &["app"],
    },
];

/// Services governing a command path.
pub fn services_for_command<'a>(
    registry: &'a [ServiceDescriptor],
    path: &str,
) -> Vec<&'a ServiceDescriptor> {
    registry.iter().filter(|s| s.governs(path)).collect()
}

/// Service names whose scopes intersect a granted set.
///
/// Used to record the services consented to at grant time in the
/// refresh-token metadata.
pub fn consented_services(registry: &[ServiceDescriptor], granted: &crate::auth::scopes::ScopeSet) -> Vec<String> {
    registry
        .iter()
        .filter(|s| {
            s.full_scopes
                .iter()
                .chain(s.readonly_scopes.iter())
                .any(|scope| granted.as_slice().iter().any(|g| g == scope))
        })
        .map(|s| s.name.to_string())
        .collect()
}
