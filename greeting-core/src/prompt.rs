//! Tone-directed prompt composition for the generative service.

use std::fmt;

use crate::relation::{EffectiveRelation, Relation};

/// Constraint appended to every prompt.
pub const PERSONAL_CONSTRAINT: &str = "Do NOT mention coding, programming, or technology. \
Focus purely on the holiday spirit, love, and connection.";

/// Tone family selected for a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Deeply romantic and sweet.
    Romantic,
    /// Heartwarming gratitude for parents.
    Heartfelt,
    /// Casual humor between close friends.
    Playful,
    /// Sweet and mildly flirty.
    Sweet,
    /// Warm and festive.
    Festive,
}

impl Tone {
    /// Pick a tone. The first matching rule wins.
    #[must_use]
    pub fn for_relation(effective: EffectiveRelation) -> Self {
        match effective {
            EffectiveRelation::Romantic => Self::Romantic,
            EffectiveRelation::Declared(Relation::Parents) => Self::Heartfelt,
            EffectiveRelation::Declared(Relation::Barkada | Relation::BestFriend) => Self::Playful,
            EffectiveRelation::Declared(Relation::Crush) => Self::Sweet,
            EffectiveRelation::Declared(_) => Self::Festive,
        }
    }

    /// Short lower-case name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Romantic => "romantic",
            Self::Heartfelt => "heartfelt",
            Self::Playful => "playful",
            Self::Sweet => "sweet",
            Self::Festive => "festive",
        }
    }

    fn directive(self) -> &'static str {
        match self {
            Self::Romantic => {
                "This is for his Girlfriend/Special Someone. The message MUST be deeply romantic, \
sweet, and special. Express how she is the best gift he received. Make her feel loved and cherished."
            }
            Self::Heartfelt => {
                "This is for his mom or dad. The message MUST be deeply heartwarming, sincere, and \
sentimental. Express immense gratitude for their love, sacrifices, and support. Make it feel very \
special and loving."
            }
            Self::Playful => {
                "Tone should be fun, casual, and maybe a little funny if appropriate for close \
friends. Make it sound like a real close friend greeting."
            }
            Self::Sweet => {
                "Tone should be sweet, cute, and slightly flirty but respectful. Make it memorable."
            }
            Self::Festive => {
                "Tone should be warm, festive, and appropriate for the relationship (e.g., polite \
for acquaintances, friendly for family)."
            }
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Build the instruction sent to the generative service.
#[must_use]
pub fn compose(author: &str, name: &str, effective: EffectiveRelation) -> String {
    let tone = Tone::for_relation(effective);
    format!(
        "Write a short, personalized Christmas greeting (max 3 sentences) from {author} to {name}, \
who is his {effective}. {directive} {PERSONAL_CONSTRAINT}",
        directive = tone.directive(),
    )
}
