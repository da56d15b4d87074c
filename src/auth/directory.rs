//! The credential directory — static reference set of valid identities.

use serde::{Deserialize, Serialize};

/// One valid identity record.
///
/// Both fields are matched as exact, case-sensitive strings; the date of
/// birth is stored in `MM/DD/YYYY` form as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub member_id: String,
    pub date_of_birth: String,
}

impl Credential {
    pub fn new(member_id: impl Into<String>, date_of_birth: impl Into<String>) -> Self {
        Self {
            member_id: member_id.into(),
            date_of_birth: date_of_birth.into(),
        }
    }
}

/// Immutable set of valid credentials, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct CredentialDirectory {
    records: Vec<Credential>,
}

impl CredentialDirectory {
    pub fn new(records: Vec<Credential>) -> Self {
        Self { records }
    }

    /// Exact match on both fields.
    pub fn verify(&self, member_id: &str, date_of_birth: &str) -> bool {
        self.records
            .iter()
            .any(|c| c.member_id == member_id && c.date_of_birth == date_of_birth)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> CredentialDirectory {
        CredentialDirectory::new(vec![
            Credential::new("123456", "01/01/1980"),
            Credential::new("ABCDEF", "07/04/1990"),
        ])
    }

    #[test]
    fn verifies_exact_pair() {
        assert!(directory().verify("123456", "01/01/1980"));
        assert!(directory().verify("ABCDEF", "07/04/1990"));
    }

    #[test]
    fn rejects_mismatched_pair() {
        // Right member, wrong DOB, and vice versa
        assert!(!directory().verify("123456", "07/04/1990"));
        assert!(!directory().verify("ABCDEF", "01/01/1980"));
        assert!(!directory().verify("000000", "01/01/1900"));
    }

    #[test]
    fn match_is_case_sensitive() {
        assert!(!directory().verify("abcdef", "07/04/1990"));
    }

    #[test]
    fn empty_directory_rejects_everything() {
        let dir = CredentialDirectory::default();
        assert!(dir.is_empty());
        assert!(!dir.verify("", ""));
    }
}
