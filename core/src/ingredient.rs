//! Free-text ingredient lines into structured [`Ingredient`] values.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Ingredient;
use crate::units::{normalize_unit, unit_vocabulary};

const NUMBER: &str = r"\d+(?:\.\d+)?(?:/\d+(?:\.\d+)?)?";

static INGREDIENT_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let units = unit_vocabulary()
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(
        r"(?i)^(?:({NUMBER}(?:\s*-\s*{NUMBER})?)\s*)?(?:({units})\s+)?([^(]+?)(?:\s*\((.*?)\))?$"
    );
    Regex::new(&pattern).ok()
});

/// Turns one ingredient line into its parts.
///
/// Implementations never fail; a line they cannot make sense of becomes an
/// ingredient whose name is the whole (trimmed) line.
pub trait IngredientParser {
    fn parse(&self, line: &str) -> Ingredient;

    /// Parse every non-blank line, in order.
    fn parse_lines<S: AsRef<str>>(&self, lines: &[S]) -> Vec<Ingredient>
    where
        Self: Sized,
    {
        lines
            .iter()
            .map(AsRef::as_ref)
            .filter(|l| !l.trim().is_empty())
            .map(|l| self.parse(l))
            .collect()
    }
}

/// Regex-backed parser: `[amount] [unit] name [(details)]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexIngredientParser;

impl IngredientParser for RegexIngredientParser {
    fn parse(&self, line: &str) -> Ingredient {
        let trimmed = line.trim();
        let Some(caps) = INGREDIENT_RE
            .as_ref()
            .and_then(|re| re.captures(trimmed))
        else {
            return Ingredient::named(trimmed);
        };

        let group = |i: usize| caps.get(i).map_or("", |m| m.as_str().trim());
        let name = group(3);
        if name.is_empty() {
            return Ingredient::named(trimmed);
        }

        Ingredient {
            amount: group(1).to_string(),
            unit: normalize_unit(&group(2).to_lowercase()).to_string(),
            name: name.to_string(),
            details: group(4).to_string(),
        }
    }
}

/// Shorthand for [`RegexIngredientParser::parse`].
#[must_use]
pub fn parse_ingredient(line: &str) -> Ingredient {
    RegexIngredientParser.parse(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ing(amount: &str, unit: &str, name: &str, details: &str) -> Ingredient {
        Ingredient {
            amount: amount.to_string(),
            unit: unit.to_string(),
            name: name.to_string(),
            details: details.to_string(),
        }
    }

    #[test]
    fn test_parse_full_line() {
        assert_eq!(
            parse_ingredient("2 cups flour (sifted)"),
            ing("2", "cups", "flour", "sifted")
        );
    }

    #[test]
    fn test_parse_fraction_and_range() {
        assert_eq!(
            parse_ingredient("1/2 cup quinoa (cooked)"),
            ing("1/2", "cup", "quinoa", "cooked")
        );
        assert_eq!(
            parse_ingredient("2 - 3 tablespoons olive oil"),
            ing("2 - 3", "tbsp", "olive oil", "")
        );
        assert_eq!(
            parse_ingredient("1.5 kg potatoes"),
            ing("1.5", "kg", "potatoes", "")
        );
    }

    #[test]
    fn test_parse_without_unit_or_amount() {
        assert_eq!(parse_ingredient("3 eggs"), ing("3", "", "eggs", ""));
        assert_eq!(
            parse_ingredient("salt (to taste)"),
            ing("", "", "salt", "to taste")
        );
    }

    #[test]
    fn test_unit_match_is_case_insensitive_but_name_keeps_case() {
        assert_eq!(
            parse_ingredient("2 Tablespoons Dijon Mustard"),
            ing("2", "tbsp", "Dijon Mustard", "")
        );
    }

    #[test]
    fn test_unit_needs_trailing_whitespace() {
        // "l" is a unit, "large" is not.
        assert_eq!(parse_ingredient("1 large egg"), ing("1", "", "large egg", ""));
        assert_eq!(
            parse_ingredient("2 fl oz cream"),
            ing("2", "fl oz", "cream", "")
        );
    }

    #[test]
    fn test_parse_degrades_to_name() {
        let parsed = parse_ingredient("a pinch of salt to taste");
        assert!(!parsed.name.is_empty());
        assert_eq!(parsed.name, "a pinch of salt to taste");

        let odd = parse_ingredient("  flour (sifted) twice ");
        assert_eq!(odd, Ingredient::named("flour (sifted) twice"));
    }

    #[test]
    fn test_parse_lines_skips_blanks() {
        let parsed = RegexIngredientParser.parse_lines(&["2 cups kale", "  ", "", "1 lemon"]);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], ing("2", "cups", "kale", ""));
        assert_eq!(parsed[1], ing("1", "", "lemon", ""));
    }
}
