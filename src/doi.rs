//! DOI registration port

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

/// A registered digital object identifier, e.g. `10.48366/R123`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Doi(String);

impl Doi {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What gets registered for a published version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoiMetadata {
    /// Suffix of the DOI, the id of the published version
    pub suffix: String,
    pub title: String,
    pub description: String,
    /// Landing page of the published version
    pub url: String,
    pub creators: Vec<String>,
    pub resource_type: String,
    pub related_identifiers: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct DoiError(pub String);

/// Registers DOIs with an external agency
///
/// Registration is not transactional with the graph: a registration that
/// succeeds stays registered even when the following local write fails.
pub trait DoiService: Send + Sync {
    fn register(&self, metadata: &DoiMetadata) -> Result<Doi, DoiError>;
}

/// DOI service that mints DOIs under a fixed prefix and remembers them
///
/// Used where no registration agency is configured, e.g. local setups and tests.
#[derive(Debug)]
pub struct LocalDoiService {
    prefix: String,
    registered: Mutex<Vec<DoiMetadata>>,
}

impl LocalDoiService {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            registered: Mutex::new(Vec::new()),
        }
    }

    /// Metadata of every registration so far, oldest first
    pub fn registrations(&self) -> Vec<DoiMetadata> {
        self.registered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl DoiService for LocalDoiService {
    fn register(&self, metadata: &DoiMetadata) -> Result<Doi, DoiError> {
        if metadata.suffix.is_empty() {
            return Err(DoiError("missing DOI suffix".to_string()));
        }
        let doi = Doi::new(format!("{}/{}", self.prefix, metadata.suffix));
        self.registered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(metadata.clone());
        tracing::info!(%doi, url = %metadata.url, "registered DOI");
        Ok(doi)
    }
}
