//! Greeting requests and generated greetings.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::relation::{classify, Classification, EffectiveRelation, Relation};

/// A validated request for one greeting. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetingRequest {
    name: String,
    relation: Relation,
    classification: Classification,
}

impl GreetingRequest {
    /// Build a request, classifying the recipient.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyName`] if `name` is blank.
    pub fn new(name: impl Into<String>, relation: Relation) -> CoreResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(CoreError::EmptyName);
        }
        let classification = classify(&name, relation);
        Ok(Self {
            name,
            relation,
            classification,
        })
    }

    /// Recipient name, trimmed.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relation as declared by the user.
    #[must_use]
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Relation used for composition.
    #[must_use]
    pub fn effective_relation(&self) -> EffectiveRelation {
        self.classification.effective
    }

    /// Whether the recipient gets the romantic treatment.
    #[must_use]
    pub fn is_special(&self) -> bool {
        self.classification.is_special
    }
}

/// Where a greeting's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GreetingSource {
    /// The generative service answered.
    External,
    /// The offline template was used.
    Fallback,
}

impl GreetingSource {
    /// Lower-case tag, used as a metrics label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Fallback => "fallback",
        }
    }
}

/// The greeting produced for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedGreeting {
    /// Recipient name.
    pub name: String,
    /// Relation used for composition.
    pub effective_relation: EffectiveRelation,
    /// Greeting text, never empty.
    pub message: String,
    /// Where the text came from.
    pub source: GreetingSource,
}

impl GeneratedGreeting {
    pub(crate) fn new(request: &GreetingRequest, message: String, source: GreetingSource) -> Self {
        Self {
            name: request.name().to_string(),
            effective_relation: request.effective_relation(),
            message,
            source,
        }
    }
}
