//! Roster input shared by every tournament format.

use serde::{Deserialize, Serialize};

/// Stable participant id. Assigned from roster order (1-based) when a
/// tournament starts and never reused within an aggregate.
pub type EntrantId = u32;

/// A participant as submitted by the caller: a name and an optional rating.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Registrant {
    pub name: String,
    pub rating: Option<u32>,
}

impl Registrant {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rating: None,
        }
    }

    #[must_use]
    pub fn rated(name: impl Into<String>, rating: u32) -> Self {
        Self {
            name: name.into(),
            rating: Some(rating),
        }
    }
}
