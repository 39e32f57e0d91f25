//! Constant-time admin credential check.

use subtle::ConstantTimeEq;

/// Validates a caller-supplied admin token against the configured secret.
///
/// Every deny path returns the same plain `false`; callers learn nothing
/// about whether the secret is unset, the token missing, or the bytes
/// wrong. The byte comparison is fixed-time regardless of where the first
/// mismatch sits. Only the length check short-circuits, since length is
/// not treated as sensitive.
#[derive(Debug, Clone)]
pub struct AdminGate {
    secret: Option<String>,
}

impl AdminGate {
    /// Create a gate for the configured secret.
    ///
    /// `None` or an empty string yields a gate that denies every token.
    #[must_use]
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    /// Whether a secret is configured at all.
    #[must_use]
    pub fn has_secret(&self) -> bool {
        self.secret.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Check a presented token against the configured secret.
    #[must_use]
    pub fn verify(&self, presented: Option<&str>) -> bool {
        let Some(secret) = self.secret.as_deref() else {
            return false;
        };
        if secret.is_empty() {
            return false;
        }
        let Some(presented) = presented else {
            return false;
        };
        if presented.len() != secret.len() {
            return false;
        }
        secret.as_bytes().ct_eq(presented.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(secret: &str) -> AdminGate {
        AdminGate::new(Some(secret.to_string()))
    }

    #[test]
    fn test_verify_accepts_exact_match() {
        assert!(gate("s3cret-token").verify(Some("s3cret-token")));
    }

    #[test]
    fn test_verify_rejects_missing_secret() {
        let gate = AdminGate::new(None);
        assert!(!gate.verify(Some("anything")));
        assert!(!gate.verify(None));
    }

    #[test]
    fn test_verify_rejects_empty_secret() {
        assert!(!gate("").verify(Some("")));
        assert!(!gate("").verify(Some("x")));
    }

    #[test]
    fn test_verify_rejects_missing_token() {
        assert!(!gate("s3cret").verify(None));
    }

    #[test]
    fn test_verify_rejects_wrong_length() {
        assert!(!gate("s3cret").verify(Some("s3cre")));
        assert!(!gate("s3cret").verify(Some("s3cret!")));
        assert!(!gate("s3cret").verify(Some("")));
    }

    #[test]
    fn test_verify_rejects_case_mismatch() {
        assert!(!gate("s3cret").verify(Some("S3cret")));
    }

    #[test]
    fn test_verify_rejects_one_character_difference() {
        assert!(!gate("s3cret").verify(Some("s3creT")));
        assert!(!gate("s3cret").verify(Some("t3cret")));
    }

    #[test]
    fn test_has_secret() {
        assert!(gate("x").has_secret());
        assert!(!gate("").has_secret());
        assert!(!AdminGate::new(None).has_secret());
    }
}
