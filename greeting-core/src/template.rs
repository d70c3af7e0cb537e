//! Deterministic offline greeting templates.

use crate::relation::EffectiveRelation;

/// Render the offline greeting for a recipient.
///
/// Pure and total: no I/O, and the result always contains `name` and is
/// never empty.
#[must_use]
pub fn render(name: &str, effective: EffectiveRelation, is_special: bool) -> String {
    if is_special {
        format!(
            "Merry Christmas, my love {name}! You are the best gift I could ever ask for. \
I love you so much! ❤️"
        )
    } else {
        format!(
            "Merry Christmas, {name}! I'm so grateful to have you as my {effective}. \
May your holidays be filled with joy, laughter, and wonderful memories! 🎄"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::{classify, Relation};

    #[test]
    fn test_romantic_template() {
        let c = classify("Deonna", Relation::Unspecified);
        let text = render("Deonna", c.effective, c.is_special);
        assert_eq!(
            text,
            "Merry Christmas, my love Deonna! You are the best gift I could ever ask for. \
I love you so much! ❤️"
        );
    }

    #[test]
    fn test_generic_template() {
        let c = classify("Juan", Relation::Parents);
        let text = render("Juan", c.effective, c.is_special);
        assert!(text.starts_with("Merry Christmas, Juan!"));
        assert!(text.contains("as my Parents."));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn render_is_total_and_deterministic(
                name in "\\PC{1,24}",
                idx in 0usize..Relation::SELECTABLE.len(),
            ) {
                let c = classify(&name, Relation::SELECTABLE[idx]);
                let first = render(&name, c.effective, c.is_special);
                let second = render(&name, c.effective, c.is_special);
                prop_assert!(!first.is_empty());
                prop_assert!(first.contains(name.as_str()));
                prop_assert_eq!(first, second);
            }
        }
    }
}
