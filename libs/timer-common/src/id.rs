use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// # Examples
/// ```
/// let id = timer_common::id::prefixed_ulid("vis");
/// assert!(id.starts_with("vis_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new().to_string())
}

/// Marker trait for types that represent a prefixed ID.
pub trait PrefixedId {
    const PREFIX: &'static str;

    fn generate() -> String {
        prefixed_ulid(Self::PREFIX)
    }
}

/// Well-known ID prefixes.
pub mod prefix {
    pub const VISITOR: &str = "vis";
}

/// Anonymous visitor token scoping per-visitor countdown state.
pub struct VisitorToken;

impl PrefixedId for VisitorToken {
    const PREFIX: &'static str = prefix::VISITOR;
}

impl VisitorToken {
    /// Whether `value` looks like a token minted by [`VisitorToken::generate`].
    ///
    /// Cookie values are client-controlled and end up inside store keys, so
    /// anything else is replaced with a fresh token.
    pub fn is_well_formed(value: &str) -> bool {
        match value.strip_prefix("vis_") {
            Some(rest) => rest.len() == 26 && Ulid::from_string(rest).is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_ulid_format() {
        let id = prefixed_ulid("vis");
        assert!(id.starts_with("vis_"));
        // ULID is 26 chars, plus prefix + underscore
        assert_eq!(id.len(), 4 + 26);
    }

    #[test]
    fn test_uniqueness() {
        let a = VisitorToken::generate();
        let b = VisitorToken::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_well_formed_tokens() {
        assert!(VisitorToken::is_well_formed(&VisitorToken::generate()));
        assert!(!VisitorToken::is_well_formed("vis_short"));
        assert!(!VisitorToken::is_well_formed("usr_01HZY5R6Q3J7V8W9X0A1B2C3D4"));
        assert!(!VisitorToken::is_well_formed("vis_01HZY5R6Q3J7V8W9X0A1B2C3D4:x"));
    }
}
