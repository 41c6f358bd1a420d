use std::collections::BTreeMap;

pub trait CredentialVerifier {
    fn verify(&self, identity: &str, secret: &str) -> bool;
}

/// Credentials taken from the `[users]` table of the config file.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    users: BTreeMap<String, String>,
}

impl StaticCredentials {
    pub fn new(users: BTreeMap<String, String>) -> Self {
        Self { users }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, identity: &str, secret: &str) -> bool {
        self.users
            .get(identity)
            .is_some_and(|expected| expected == secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StaticCredentials {
        StaticCredentials::new(BTreeMap::from([(
            "Urooj Hameed".to_string(),
            "12345".to_string(),
        )]))
    }

    #[test]
    fn accepts_matching_pair() {
        assert!(store().verify("Urooj Hameed", "12345"));
    }

    #[test]
    fn rejects_wrong_secret_or_unknown_identity() {
        assert!(!store().verify("Urooj Hameed", "54321"));
        assert!(!store().verify("urooj hameed", "12345"));
        assert!(!store().verify("Someone Else", "12345"));
    }

    #[test]
    fn empty_store_rejects_everyone() {
        let empty = StaticCredentials::default();
        assert!(empty.is_empty());
        assert!(!empty.verify("", ""));
    }
}
