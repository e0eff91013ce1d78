use serde::{Deserialize, Serialize};

/// An author name resolved to its catalog identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAuthor {
    pub name: String,
    /// Bare catalog key, e.g. `OL23919A`
    pub catalog_key: String,
    /// Number of works the catalog attributes to this author
    pub work_count: u32,
}

impl ResolvedAuthor {
    pub fn new(name: impl Into<String>, catalog_key: impl Into<String>, work_count: u32) -> Self {
        Self {
            name: name.into(),
            catalog_key: catalog_key.into(),
            work_count,
        }
    }
}
