use std::collections::HashMap;
use std::sync::LazyLock;

/// Raw unit spellings and their canonical short form.
///
/// Keep this conservative: every entry doubles as a parser keyword, so a
/// short alias here can swallow the first word of an ingredient name.
const UNIT_ALIASES: &[(&str, &str)] = &[
    ("tablespoon", "tbsp"),
    ("tablespoons", "tbsp"),
    ("tbsp", "tbsp"),
    ("tbsps", "tbsp"),
    ("tbs", "tbsp"),
    ("tbl", "tbsp"),
    ("teaspoon", "tsp"),
    ("teaspoons", "tsp"),
    ("tsp", "tsp"),
    ("tsps", "tsp"),
    ("cup", "cup"),
    ("cups", "cups"),
    ("pound", "lb"),
    ("pounds", "lb"),
    ("lb", "lb"),
    ("lbs", "lb"),
    ("ounce", "oz"),
    ("ounces", "oz"),
    ("oz", "oz"),
    ("fluid ounce", "fl oz"),
    ("fluid ounces", "fl oz"),
    ("fl oz", "fl oz"),
    ("gram", "g"),
    ("grams", "g"),
    ("gr", "g"),
    ("g", "g"),
    ("kilogram", "kg"),
    ("kilograms", "kg"),
    ("kg", "kg"),
    ("kgs", "kg"),
    ("milligram", "mg"),
    ("milligrams", "mg"),
    ("mg", "mg"),
    ("milliliter", "ml"),
    ("milliliters", "ml"),
    ("millilitre", "ml"),
    ("millilitres", "ml"),
    ("ml", "ml"),
    ("liter", "l"),
    ("liters", "l"),
    ("litre", "l"),
    ("litres", "l"),
    ("l", "l"),
    ("pint", "pt"),
    ("pints", "pt"),
    ("pt", "pt"),
    ("quart", "qt"),
    ("quarts", "qt"),
    ("qt", "qt"),
    ("gallon", "gal"),
    ("gallons", "gal"),
    ("gal", "gal"),
    ("centimeter", "cm"),
    ("centimeters", "cm"),
    ("cm", "cm"),
    ("pinch", "pinch"),
    ("pinches", "pinch"),
    ("dash", "dash"),
    ("dashes", "dash"),
    ("clove", "clove"),
    ("cloves", "clove"),
    ("can", "can"),
    ("cans", "can"),
    ("slice", "slice"),
    ("slices", "slice"),
    ("stick", "stick"),
    ("sticks", "stick"),
    ("package", "pkg"),
    ("packages", "pkg"),
    ("pkg", "pkg"),
    ("piece", "pc"),
    ("pieces", "pc"),
    ("pc", "pc"),
    ("pcs", "pc"),
    ("bunch", "bunch"),
    ("bunches", "bunch"),
    ("sprig", "sprig"),
    ("sprigs", "sprig"),
    ("handful", "handful"),
    ("handfuls", "handful"),
];

static UNIT_MAP: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| UNIT_ALIASES.iter().copied().collect());

/// Canonical form of a lower-cased unit token, or the token itself when the
/// table does not know it.
#[must_use]
pub fn normalize_unit(raw: &str) -> &str {
    UNIT_MAP.get(raw).copied().unwrap_or(raw)
}

/// Every spelling the parser should treat as a unit, longest first so that
/// `tablespoons` wins over `tbs`.
#[must_use]
pub fn unit_vocabulary() -> Vec<&'static str> {
    let mut words: Vec<&'static str> = UNIT_ALIASES
        .iter()
        .flat_map(|(alias, canonical)| [*alias, *canonical])
        .collect();
    words.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    words.dedup();
    words
}
