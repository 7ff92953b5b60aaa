//! Credential map - institution name to access token

use serde::Serialize;

/// One resolved bank connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstitutionCredential {
    pub institution: String,
    #[serde(skip_serializing)]
    pub access_token: String,
}

/// Mapping from institution display name to access token
///
/// Names are unique. Iteration follows first-insertion order; inserting an
/// existing name replaces its token in place.
#[derive(Debug, Clone, Default)]
pub struct CredentialMap {
    entries: Vec<InstitutionCredential>,
}

impl CredentialMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mapping, returning the token it replaced (if any)
    pub fn insert(
        &mut self,
        institution: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Option<String> {
        let institution = institution.into();
        let access_token = access_token.into();

        match self.entries.iter_mut().find(|e| e.institution == institution) {
            Some(existing) => Some(std::mem::replace(&mut existing.access_token, access_token)),
            None => {
                self.entries.push(InstitutionCredential {
                    institution,
                    access_token,
                });
                None
            }
        }
    }

    /// Look up the access token for an institution
    pub fn get(&self, institution: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.institution == institution)
            .map(|e| e.access_token.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstitutionCredential> {
        self.entries.iter()
    }

    /// Institution names in iteration order
    pub fn institutions(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.institution.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a CredentialMap {
    type Item = &'a InstitutionCredential;
    type IntoIter = std::slice::Iter<'a, InstitutionCredential>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
