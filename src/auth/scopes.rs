//! auth::scopes
//!
//! Canonical scope-set handling.
//!
//! # Canonical form
//!
//! A scope set always begins with the `offline_access` sentinel followed by
//! the remaining scopes sorted lexicographically, with duplicates removed.
//! Canonicalization is idempotent. Scope identifiers are case-sensitive;
//! no case folding is applied.
//!
//! # Satisfaction
//!
//! A required scope `X:readonly` is satisfied by a granted `X` (full access
//! implies read-only), but a granted `X:readonly` never satisfies a
//! required `X`.

use std::fmt;

/// The always-present sentinel scope enabling refresh-token issuance.
pub const SENTINEL_SCOPE: &str = "offline_access";

/// Suffix marking the read-only variant of a scope.
const READONLY_SUFFIX: &str = ":readonly";

/// An ordered, de-duplicated scope set in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSet {
    scopes: Vec<String>,
}

impl ScopeSet {
    /// Parse a scope string, splitting on comma, space, tab, and newline.
    pub fn parse(input: &str) -> Self {
        Self::from_scopes(
            input
                .split(|c| c == ',' || c == ' ' || c == '\t' || c == '\n' || c == '\r')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        )
    }

    /// Build a canonical scope set from individual scopes.
    pub fn from_scopes(scopes: impl IntoIterator<Item = String>) -> Self {
        let mut rest: Vec<String> = scopes
            .into_iter()
            .filter(|s| s != SENTINEL_SCOPE)
            .collect();
        rest.sort();
        rest.dedup();

        let mut canonical = Vec::with_capacity(rest.len() + 1);
        canonical.push(SENTINEL_SCOPE.to_string());
        canonical.extend(rest);
        Self { scopes: canonical }
    }

    /// The bare sentinel-only set.
    pub fn sentinel_only() -> Self {
        Self::from_scopes(std::iter::empty())
    }

    /// The scopes in canonical order.
    pub fn as_slice(&self) -> &[String] {
        &self.scopes
    }

    /// Union with another set, re-canonicalized.
    pub fn union(&self, other: &ScopeSet) -> ScopeSet {
        Self::from_scopes(
            self.scopes
                .iter()
                .chain(other.scopes.iter())
                .cloned(),
        )
    }

    /// Whether a single required scope is satisfied by this (granted) set.
    ///
    /// Full access implies read-only access over the same resource.
    pub fn satisfies(&self, required: &str) -> bool {
        if self.scopes.iter().any(|s| s == required) {
            return true;
        }
        match required.strip_suffix(READONLY_SUFFIX) {
            Some(full) => self.scopes.iter().any(|s| s == full),
            None => false,
        }
    }

    /// Required scopes not covered by this (granted) set, in required order.
    pub fn missing_from(&self, required: &ScopeSet) -> Vec<String> {
        required
            .scopes
            .iter()
            .filter(|r| !self.satisfies(r))
            .cloned()
            .collect()
    }

    /// Space-joined canonical scope string.
    pub fn to_scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_scope_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_splits_on_all_delimiters() {
        let set = ScopeSet::parse("mail:mail,drive:drive\tim:message\ncontact:contact.base");
        assert_eq!(
            set.as_slice(),
            &[
                "offline_access",
                "contact:contact.base",
                "drive:drive",
                "im:message",
                "mail:mail",
            ]
        );
    }

    #[test]
    fn sentinel_always_first_and_unique() {
        let set = ScopeSet::parse("mail:mail offline_access offline_access aaa:bbb");
        assert_eq!(set.as_slice()[0], SENTINEL_SCOPE);
        assert_eq!(
            set.as_slice()
                .iter()
                .filter(|s| *s == SENTINEL_SCOPE)
                .count(),
            1
        );
    }

    #[test]
    fn empty_input_yields_sentinel_only() {
        assert_eq!(ScopeSet::parse("").as_slice(), &[SENTINEL_SCOPE]);
        assert_eq!(ScopeSet::sentinel_only().as_slice(), &[SENTINEL_SCOPE]);
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let once = ScopeSet::parse("b:b a:a offline_access a:a");
        let twice = ScopeSet::parse(&once.to_scope_string());
        assert_eq!(once, twice);
    }

    #[test]
    fn case_is_preserved() {
        let set = ScopeSet::parse("Mail:Mail mail:mail");
        assert!(set.as_slice().contains(&"Mail:Mail".to_string()));
        assert!(set.as_slice().contains(&"mail:mail".to_string()));
    }

    #[test]
    fn full_satisfies_readonly() {
        let granted = ScopeSet::parse("drive:drive");
        assert!(granted.satisfies("drive:drive:readonly"));
        assert!(granted.satisfies("drive:drive"));
    }

    #[test]
    fn readonly_does_not_satisfy_full() {
        let granted = ScopeSet::parse("drive:drive:readonly");
        assert!(granted.satisfies("drive:drive:readonly"));
        assert!(!granted.satisfies("drive:drive"));
    }

    #[test]
    fn missing_from_reports_uncovered() {
        let granted = ScopeSet::parse("offline_access contact:contact.base:readonly");
        let required = ScopeSet::parse("offline_access mail:readonly");
        assert_eq!(granted.missing_from(&required), vec!["mail:readonly"]);
    }

    #[test]
    fn union_recanonicalizes() {
        let a = ScopeSet::parse("mail:mail");
        let b = ScopeSet::parse("drive:drive mail:mail");
        let u = a.union(&b);
        assert_eq!(
            u.as_slice(),
            &["offline_access", "drive:drive", "mail:mail"]
        );
    }

    proptest! {
        #[test]
        fn canon_of_canon_is_canon(scopes in proptest::collection::vec("[a-z]{1,4}:[a-z]{1,4}", 0..8)) {
            let input = scopes.join(" ");
            let once = ScopeSet::parse(&input);
            let twice = ScopeSet::parse(&once.to_scope_string());
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(&once.as_slice()[0], SENTINEL_SCOPE);
        }
    }
}
