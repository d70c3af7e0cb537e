//! Relationship categories and the reserved-name classifier.
//!
//! A recipient whose name contains one of the reserved tokens is always
//! addressed romantically, whatever relation was declared for them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Reserved name tokens, matched as lower-case substrings.
pub const RESERVED_TOKENS: [&str; 3] = ["deonna", "angge", "anguy"];

/// Label used for the romantic effective relation.
pub const ROMANTIC_LABEL: &str = "Special Someone (Girlfriend)";

/// Relationship declared by the person requesting a greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Partner or significant other.
    SpecialSomeone,
    /// Mom or dad.
    Parents,
    /// Other relatives.
    Family,
    /// Closest friend.
    BestFriend,
    /// Friend group.
    Barkada,
    /// School mate.
    Classmate,
    /// Crush.
    Crush,
    /// Someone known in passing.
    Acquaintance,
    /// Someone not known at all.
    Stranger,
    /// No relation selected.
    Unspecified,
}

impl Relation {
    /// Every selectable relation, in the order they are offered.
    pub const SELECTABLE: [Relation; 9] = [
        Relation::SpecialSomeone,
        Relation::Parents,
        Relation::Family,
        Relation::BestFriend,
        Relation::Barkada,
        Relation::Classmate,
        Relation::Crush,
        Relation::Acquaintance,
        Relation::Stranger,
    ];

    /// Human readable label, as offered to the user.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::SpecialSomeone => "Special Someone",
            Self::Parents => "Parents",
            Self::Family => "Family",
            Self::BestFriend => "Best Friend",
            Self::Barkada => "Barkada",
            Self::Classmate => "Classmate",
            Self::Crush => "Crush",
            Self::Acquaintance => "Acquaintance",
            Self::Stranger => "Stranger",
            Self::Unspecified => "",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Relation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.is_empty() {
            return Ok(Self::Unspecified);
        }
        Self::SELECTABLE
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::UnknownRelation(wanted.to_string()))
    }
}

/// The relation actually used to pick a tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectiveRelation {
    /// Romantic partner, either declared or forced by a reserved name.
    Romantic,
    /// Any other declared relation. Never `SpecialSomeone`.
    Declared(Relation),
}

impl EffectiveRelation {
    /// Label used in prompts, templates and persisted records.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Romantic => ROMANTIC_LABEL,
            Self::Declared(relation) => relation.label(),
        }
    }

    /// Whether this is the romantic category.
    #[must_use]
    pub fn is_romantic(self) -> bool {
        matches!(self, Self::Romantic)
    }
}

impl fmt::Display for EffectiveRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Relation used for composition.
    pub effective: EffectiveRelation,
    /// Whether the recipient gets the romantic treatment.
    pub is_special: bool,
}

/// Whether `name` contains a reserved token, ignoring case.
#[must_use]
pub fn matches_reserved(name: &str) -> bool {
    let lower = name.to_lowercase();
    RESERVED_TOKENS.iter().any(|token| lower.contains(token))
}

/// Derive the effective relation for a recipient.
#[must_use]
pub fn classify(name: &str, declared: Relation) -> Classification {
    let is_special = matches_reserved(name) || declared == Relation::SpecialSomeone;
    let effective = if is_special {
        EffectiveRelation::Romantic
    } else {
        EffectiveRelation::Declared(declared)
    };
    Classification {
        effective,
        is_special,
    }
}

/// Relation to pre-select while the name is still being typed.
#[must_use]
pub fn suggested_relation(name: &str) -> Option<Relation> {
    matches_reserved(name).then_some(Relation::SpecialSomeone)
}
