//! Markdown and JSON renditions of a [`RecipeRaw`].
//!
//! The markdown layout is also the import format, so [`MarkdownCodec::decode`]
//! reads back exactly what [`MarkdownCodec::encode`] writes. Decoding is
//! section based and lenient: only the recipe name is required.

use std::fmt::Write;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::config::CodecConfig;
use crate::duration::{format_duration, parse_duration};
use crate::error::{Result, YummyError};
use crate::models::{Ingredient, RecipeRaw};
use crate::units::unit_vocabulary;

const TITLE_PREFIX: &str = "# 🍳 ";
const ABOUT_MARKER: &str = "💭 *About this recipe:*";
const PREP_HEADING: &str = "## 👩‍🍳 Kitchen Prep";
const INGREDIENTS_HEADING: &str = "## 🥘 Ingredients";
const INSTRUCTIONS_HEADING: &str = "## 👩‍🍳 Cooking Instructions";
const CATEGORIES_HEADING: &str = "## 🏷️ Recipe Type";
const SOURCE_HEADING: &str = "## 📖 Recipe Source";
const FOOTER_RULE: &str = "-----------------------------------";

const AUTHOR_LABEL: &str = "👨‍🍳 Recipe By";
const SERVINGS_LABEL: &str = "🍽️ Servings";
const TOTAL_TIME_LABEL: &str = "⏱️ Total Time";
const PREP_TIME_LABEL: &str = "🔪 Prep Time";
const COOK_TIME_LABEL: &str = "🔥 Cook Time";

static INGREDIENT_LINE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^• (?:\*\*(.+?)\*\* )?\*(.+)\*(?: \((.*)\))?$").ok()
});
static STEP_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?:\*\*)?\d+\.(?:\*\*)?\s*(.*)$").ok());
static CATEGORY_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"`([^`]+)`").ok());
static SOURCE_URL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?m)^🔗 \[View Original Recipe\]\((.+)\)\s*$").ok()
});
static UNIT_WORDS: LazyLock<Vec<&'static str>> = LazyLock::new(unit_vocabulary);

/// Flat JSON shape used by `import` and `export --format json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeJson {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub author: String,
    #[serde(default, deserialize_with = "nullable")]
    pub cook_time: String,
    #[serde(default, deserialize_with = "nullable")]
    pub prep_time: String,
    #[serde(default, deserialize_with = "nullable")]
    pub total_time: String,
    #[serde(default, deserialize_with = "nullable")]
    pub quantity: String,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub ingredients: Vec<Ingredient>,
    #[serde(default, deserialize_with = "nullable")]
    pub instructions: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub categories: Vec<String>,
}

fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<&RecipeRaw> for RecipeJson {
    fn from(r: &RecipeRaw) -> Self {
        Self {
            name: r.name.clone(),
            description: r.description.clone(),
            author: r.author.clone(),
            cook_time: format_duration(r.cook_time),
            prep_time: format_duration(r.prep_time),
            total_time: format_duration(r.total_time),
            quantity: r.quantity.clone(),
            url: r.url.clone(),
            ingredients: r.ingredients.clone(),
            instructions: r.instructions.clone(),
            categories: r.categories.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarkdownCodec {
    title_width: usize,
}

impl Default for MarkdownCodec {
    fn default() -> Self {
        Self::new(&CodecConfig::default())
    }
}

impl MarkdownCodec {
    #[must_use]
    pub fn new(config: &CodecConfig) -> Self {
        Self {
            title_width: config.title_column_width,
        }
    }

    #[must_use]
    pub fn encode(&self, recipe: &RecipeRaw) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "{TITLE_PREFIX}{}\n", recipe.name);

        if !recipe.description.trim().is_empty() {
            let _ = writeln!(s, "{ABOUT_MARKER}");
            for line in recipe.description.lines() {
                let _ = writeln!(s, "> {line}");
            }
            s.push('\n');
        }

        self.write_prep_table(&mut s, recipe);

        let _ = writeln!(
            s,
            "{INGREDIENTS_HEADING}\n\n*Gather all ingredients before starting:*\n"
        );
        for ing in &recipe.ingredients {
            let _ = writeln!(s, "{}\n", ingredient_line(ing));
        }

        let _ = writeln!(
            s,
            "{INSTRUCTIONS_HEADING}\n\n*Follow these steps in order:*\n"
        );
        for (i, step) in recipe.instructions.iter().enumerate() {
            let _ = writeln!(s, "{}. {step}\n", i + 1);
        }

        if !recipe.categories.is_empty() {
            let _ = writeln!(s, "{CATEGORIES_HEADING}\n\n*This recipe falls under:*\n");
            let tags: Vec<String> = recipe.categories.iter().map(|c| format!("`{c}`")).collect();
            let _ = writeln!(s, "{}\n", tags.join(" "));
        }

        if !recipe.url.is_empty() {
            let _ = writeln!(
                s,
                "{SOURCE_HEADING}\n\n*Want to learn more? Check out the original recipe:*\n"
            );
            let _ = writeln!(s, "🔗 [View Original Recipe]({})\n", recipe.url);
        }

        let _ = writeln!(s, "{FOOTER_RULE}");
        s.push_str("*Happy Cooking! 👩‍🍳✨*\n");
        s
    }

    fn write_prep_table(&self, s: &mut String, recipe: &RecipeRaw) {
        let rows: Vec<(&str, String)> = [
            (AUTHOR_LABEL, escape_cell(&recipe.author)),
            (SERVINGS_LABEL, escape_cell(&recipe.quantity)),
            (TOTAL_TIME_LABEL, non_zero(recipe.total_time)),
            (PREP_TIME_LABEL, non_zero(recipe.prep_time)),
            (COOK_TIME_LABEL, non_zero(recipe.cook_time)),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect();

        let longest = rows
            .iter()
            .map(|(_, v)| v.chars().count())
            .max()
            .unwrap_or(0);

        let _ = writeln!(s, "{PREP_HEADING}\n");
        let _ = writeln!(s, "| Metadata | Details |");
        let _ = writeln!(
            s,
            "| {} | {} |",
            "-".repeat(self.title_width),
            "-".repeat(longest.max(3))
        );
        for (title, value) in &rows {
            let title_pad = self.title_width.saturating_sub(title.chars().count());
            let value_pad = longest.saturating_sub(value.chars().count());
            let _ = writeln!(
                s,
                "| {title}{} | {value}{} |",
                " ".repeat(title_pad),
                " ".repeat(value_pad)
            );
        }
        s.push('\n');
    }

    /// Decode a markdown recipe.
    ///
    /// The name comes from `name_override`, then the `# 🍳` heading, then the
    /// stem of `source`. With none of those the result is a validation error.
    pub fn decode(
        &self,
        text: &str,
        name_override: Option<&str>,
        source: Option<&Path>,
    ) -> Result<RecipeRaw> {
        let text = text.replace("\r\n", "\n");
        let heading = text
            .lines()
            .find_map(|l| l.strip_prefix(TITLE_PREFIX))
            .map(str::trim);

        let mut recipe = RecipeRaw::new(&resolve_name(name_override, heading, source)?);
        recipe.description = decode_description(&text);

        let prep = section(&text, PREP_HEADING).unwrap_or(&text);
        recipe.author = table_value(prep, AUTHOR_LABEL).unwrap_or_default();
        recipe.quantity = table_value(prep, SERVINGS_LABEL).unwrap_or_default();
        recipe.total_time = table_value(prep, TOTAL_TIME_LABEL)
            .map(|v| parse_duration(&v))
            .unwrap_or_default();
        recipe.prep_time = table_value(prep, PREP_TIME_LABEL)
            .map(|v| parse_duration(&v))
            .unwrap_or_default();
        recipe.cook_time = table_value(prep, COOK_TIME_LABEL)
            .map(|v| parse_duration(&v))
            .unwrap_or_default();

        match section(&text, INGREDIENTS_HEADING) {
            Some(body) => {
                recipe.ingredients = body
                    .lines()
                    .map(str::trim)
                    .filter(|l| l.starts_with("• "))
                    .map(decode_ingredient_line)
                    .collect();
            }
            None => warn!(recipe = %recipe.name, "markdown has no ingredients section"),
        }

        match section(&text, INSTRUCTIONS_HEADING) {
            Some(body) => {
                recipe.instructions = body
                    .lines()
                    .filter_map(|l| capture(STEP_RE.as_ref(), l.trim()))
                    .collect();
            }
            None => warn!(recipe = %recipe.name, "markdown has no instructions section"),
        }

        if let (Some(body), Some(re)) = (section(&text, CATEGORIES_HEADING), CATEGORY_RE.as_ref()) {
            recipe.categories = re
                .captures_iter(body)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        }

        recipe.url = capture(SOURCE_URL_RE.as_ref(), &text).unwrap_or_default();

        debug!(
            recipe = %recipe.name,
            ingredients = recipe.ingredients.len(),
            instructions = recipe.instructions.len(),
            "decoded markdown recipe"
        );
        Ok(recipe)
    }

    /// Decode the flat JSON shape. Durations go through the same lenient
    /// parser as the markdown path.
    pub fn decode_json(
        &self,
        text: &str,
        name_override: Option<&str>,
        source: Option<&Path>,
    ) -> Result<RecipeRaw> {
        let json: RecipeJson =
            serde_json::from_str(text).map_err(|e| YummyError::Parse(format!("recipe JSON: {e}")))?;

        let heading = Some(json.name.trim()).filter(|n| !n.is_empty());
        let name = resolve_name(name_override, heading, source)?;
        let recipe = RecipeRaw {
            name,
            description: json.description,
            author: json.author,
            cook_time: parse_duration(&json.cook_time),
            prep_time: parse_duration(&json.prep_time),
            total_time: parse_duration(&json.total_time),
            quantity: json.quantity,
            url: json.url,
            ingredients: json.ingredients,
            instructions: json.instructions,
            categories: json.categories,
            ..RecipeRaw::default()
        };
        debug!(recipe = %recipe.name, "decoded JSON recipe");
        Ok(recipe)
    }

    pub fn encode_json(&self, recipe: &RecipeRaw) -> Result<String> {
        serde_json::to_string_pretty(&RecipeJson::from(recipe))
            .map_err(|e| YummyError::Encode(format!("recipe JSON: {e}")))
    }

    /// Read `path` and decode it according to its extension (`.md` or
    /// `.json`).
    pub fn decode_file(&self, path: &Path, name_override: Option<&str>) -> Result<RecipeRaw> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !matches!(ext.as_str(), "md" | "markdown" | "json") {
            return Err(YummyError::Parse(format!(
                "{}: unsupported file type (expected .md or .json)",
                path.display()
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|source| YummyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if ext == "json" {
            self.decode_json(&text, name_override, Some(path))
        } else {
            self.decode(&text, name_override, Some(path))
        }
    }
}

fn non_zero(d: chrono::TimeDelta) -> String {
    if d.is_zero() {
        String::new()
    } else {
        format_duration(d)
    }
}

fn ingredient_line(ing: &Ingredient) -> String {
    let mut line = String::from("• ");
    match (ing.amount.is_empty(), ing.unit.is_empty()) {
        (false, false) => {
            let _ = write!(line, "**{} {}** ", ing.amount, ing.unit);
        }
        (false, true) => {
            let _ = write!(line, "**{}** ", ing.amount);
        }
        (true, false) => {
            let _ = write!(line, "**{}** ", ing.unit);
        }
        (true, true) => {}
    }
    let _ = write!(line, "*{}*", ing.name);
    if !ing.details.is_empty() {
        let _ = write!(line, " ({})", ing.details);
    }
    line
}

fn decode_ingredient_line(line: &str) -> Ingredient {
    let Some(caps) = INGREDIENT_LINE_RE.as_ref().and_then(|re| re.captures(line)) else {
        warn!(line, "unrecognised ingredient line");
        return Ingredient::named(line.trim_start_matches("• ").trim());
    };
    let (amount, unit) = caps
        .get(1)
        .map(|m| split_measure(m.as_str()))
        .unwrap_or_default();
    Ingredient {
        amount,
        unit,
        name: caps.get(2).map_or("", |m| m.as_str()).trim().to_string(),
        details: caps.get(3).map_or("", |m| m.as_str()).trim().to_string(),
    }
}

fn starts_numeric(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_numeric)
}

fn ends_numeric(s: &str) -> bool {
    s.chars().next_back().is_some_and(char::is_numeric)
}

/// Split the bold `amount unit` run of an ingredient line.
///
/// A known unit (including multi-word ones like `fl oz`) at the end of the
/// run is always the unit. A run without digits is a free-text amount.
/// Otherwise the last token is the unit when it is not a number and what
/// precedes it ends in a digit.
fn split_measure(run: &str) -> (String, String) {
    let run = run.trim();
    for unit in UNIT_WORDS.iter() {
        let Some(rest) = run.strip_suffix(unit) else {
            continue;
        };
        if rest.is_empty() {
            return (String::new(), (*unit).to_string());
        }
        if let Some(amount) = rest.strip_suffix(' ').map(str::trim_end) {
            if !amount.is_empty() {
                return (amount.to_string(), (*unit).to_string());
            }
        }
    }

    if !run.chars().any(char::is_numeric) {
        return (run.to_string(), String::new());
    }
    match run.rsplit_once(' ') {
        Some((amount, unit)) if !starts_numeric(unit) && ends_numeric(amount.trim_end()) => {
            (amount.trim_end().to_string(), unit.to_string())
        }
        _ => (run.to_string(), String::new()),
    }
}

/// Body of the `## ` section that starts with `heading`, up to the next
/// section or the footer rule.
fn section<'a>(text: &'a str, heading: &str) -> Option<&'a str> {
    let start = text.find(heading)? + heading.len();
    let body = &text[start..];
    let end = [body.find("\n## "), body.find(&format!("\n{FOOTER_RULE}"))]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(body.len());
    Some(&body[..end])
}

/// Value cell of the table row whose label cell starts with `label`.
fn table_value(table: &str, label: &str) -> Option<String> {
    table.lines().find_map(|line| {
        let cells = table_cells(line);
        if !cells.get(1)?.starts_with(label) {
            return None;
        }
        cells.get(2).filter(|v| !v.is_empty()).cloned()
    })
}

/// Trimmed cells of one table row, leading and trailing border included.
/// `\|` and `\\` stand for a literal pipe and backslash.
fn table_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = line.trim().chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some(&('|' | '\\'))) => {
                cell.extend(chars.next());
            }
            '|' => cells.push(std::mem::take(&mut cell).trim().to_string()),
            _ => cell.push(c),
        }
    }
    cells.push(cell.trim().to_string());
    cells
}

fn escape_cell(value: &str) -> String {
    value.replace('\\', "\\\\").replace('|', "\\|")
}

fn decode_description(text: &str) -> String {
    let Some(start) = text.find(ABOUT_MARKER) else {
        return String::new();
    };
    text[start + ABOUT_MARKER.len()..]
        .lines()
        .skip(1)
        .map_while(|l| l.strip_prefix('>'))
        .map(|l| l.strip_prefix(' ').unwrap_or(l))
        .collect::<Vec<_>>()
        .join("\n")
}

fn capture(re: Option<&Regex>, text: &str) -> Option<String> {
    let caps = re?.captures(text)?;
    Some(caps.get(1)?.as_str().trim().to_string())
}

fn resolve_name(
    name_override: Option<&str>,
    heading: Option<&str>,
    source: Option<&Path>,
) -> Result<String> {
    let stem = source
        .and_then(Path::file_stem)
        .and_then(|s| s.to_str());
    [name_override.map(str::trim), heading, stem]
        .into_iter()
        .flatten()
        .find(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or_else(|| YummyError::Validation("recipe name is missing".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn ing(amount: &str, unit: &str, name: &str, details: &str) -> Ingredient {
        Ingredient {
            amount: amount.to_string(),
            unit: unit.to_string(),
            name: name.to_string(),
            details: details.to_string(),
        }
    }

    fn sample() -> RecipeRaw {
        RecipeRaw {
            name: "Shakshuka".to_string(),
            description: "Eggs poached in spiced tomato sauce.\nGreat for brunch.".to_string(),
            author: "Ottolenghi".to_string(),
            cook_time: TimeDelta::minutes(25),
            prep_time: TimeDelta::minutes(10),
            total_time: TimeDelta::minutes(35),
            quantity: "4 servings".to_string(),
            url: "https://example.com/shakshuka".to_string(),
            ingredients: vec![
                ing("2", "tbsp", "olive oil", ""),
                ing("1", "", "onion", "diced"),
                ing("2 - 3", "clove", "garlic", "minced"),
                ing("400", "g", "chopped tomatoes", ""),
                ing("1", "fl oz", "cream", ""),
                ing("", "pinch", "chilli flakes", ""),
                ing("a few", "cups", "stock", ""),
                ing("some", "", "pepper", ""),
                ing("", "", "salt", "to taste"),
            ],
            instructions: vec![
                "Soften the onion in the oil.".to_string(),
                "Add garlic and tomatoes, simmer 10 minutes.".to_string(),
                "Crack in the eggs and cover until set.".to_string(),
            ],
            categories: vec!["Breakfast".to_string(), "Vegetarian".to_string()],
            ..RecipeRaw::default()
        }
    }

    #[test]
    fn test_markdown_round_trip() {
        let codec = MarkdownCodec::default();
        let original = sample();
        let decoded = codec.decode(&codec.encode(&original), None, None).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_round_trip_minimal_recipe() {
        let codec = MarkdownCodec::default();
        let original = RecipeRaw::new("Toast");
        let decoded = codec.decode(&codec.encode(&original), None, None).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_encode_layout() {
        let md = MarkdownCodec::default().encode(&sample());
        assert!(md.starts_with("# 🍳 Shakshuka\n\n💭 *About this recipe:*\n> Eggs"));
        assert!(md.contains("| Metadata | Details |\n| --------------- |"));
        assert!(md.contains("| ⏱️ Total Time"));
        assert!(md.contains("• **2 tbsp** *olive oil*\n"));
        assert!(md.contains("• *salt* (to taste)\n"));
        assert!(md.contains("1. Soften the onion in the oil.\n"));
        assert!(md.contains("`Breakfast` `Vegetarian`"));
        assert!(md.contains("🔗 [View Original Recipe](https://example.com/shakshuka)"));
        assert!(md.ends_with("-----------------------------------\n*Happy Cooking! 👩‍🍳✨*\n"));
    }

    #[test]
    fn test_encode_skips_empty_table_rows_and_sections() {
        let md = MarkdownCodec::default().encode(&RecipeRaw::new("Toast"));
        assert!(!md.contains("Recipe By"));
        assert!(!md.contains("Cook Time"));
        assert!(!md.contains(CATEGORIES_HEADING));
        assert!(!md.contains(SOURCE_HEADING));
        assert!(!md.contains(ABOUT_MARKER));
    }

    #[test]
    fn test_narrow_title_column_does_not_panic() {
        let codec = MarkdownCodec::new(&CodecConfig {
            title_column_width: 2,
        });
        let md = codec.encode(&sample());
        let decoded = codec.decode(&md, None, None).unwrap();
        assert_eq!(decoded.author, "Ottolenghi");
    }

    #[test]
    fn test_decode_name_precedence() {
        let codec = MarkdownCodec::default();
        let md = "# 🍳 From Heading\n";
        let path = Path::new("/tmp/from-file.md");

        let r = codec.decode(md, Some("Override"), Some(path)).unwrap();
        assert_eq!(r.name, "Override");
        let r = codec.decode(md, None, Some(path)).unwrap();
        assert_eq!(r.name, "From Heading");
        let r = codec.decode("no heading here", None, Some(path)).unwrap();
        assert_eq!(r.name, "from-file");

        let err = codec.decode("no heading here", None, None).unwrap_err();
        assert!(matches!(err, YummyError::Validation(_)));
    }

    #[test]
    fn test_decode_tolerates_missing_sections() {
        let md = "# 🍳 Bare\n\n## 🥘 Ingredients\n\n• **1 cup** *rice*\n";
        let r = MarkdownCodec::default().decode(md, None, None).unwrap();
        assert_eq!(r.ingredients, vec![ing("1", "cup", "rice", "")]);
        assert!(r.instructions.is_empty());
        assert!(r.categories.is_empty());
        assert!(r.url.is_empty());
        assert_eq!(r.total_time, TimeDelta::zero());
    }

    #[test]
    fn test_decode_accepts_bold_step_numbers_and_human_times() {
        let md = "# 🍳 Stew\n\n## 👩‍🍳 Kitchen Prep\n\n| Metadata | Details |\n| --- | --- |\n\
                  | ⏱️ Total Time | 2 hours 15 minutes |\n| 🔥 Cook Time | 45m |\n\n\
                  ## 👩‍🍳 Cooking Instructions\n\n**1.** Brown the beef\n\n**2.** Simmer\n";
        let r = MarkdownCodec::default().decode(md, None, None).unwrap();
        assert_eq!(r.total_time, TimeDelta::minutes(135));
        assert_eq!(r.cook_time, TimeDelta::minutes(45));
        assert_eq!(r.instructions, vec!["Brown the beef", "Simmer"]);
    }

    #[test]
    fn test_split_measure() {
        let split = split_measure;
        assert_eq!(split("2 cups"), ("2".to_string(), "cups".to_string()));
        assert_eq!(split("2"), ("2".to_string(), String::new()));
        assert_eq!(split("cup"), (String::new(), "cup".to_string()));
        assert_eq!(split("1 fl oz"), ("1".to_string(), "fl oz".to_string()));
        assert_eq!(split("3 knobs"), ("3".to_string(), "knobs".to_string()));
        assert_eq!(split("a few"), ("a few".to_string(), String::new()));
        assert_eq!(split("a few cups"), ("a few".to_string(), "cups".to_string()));
        assert_eq!(split("some"), ("some".to_string(), String::new()));
        assert_eq!(split("2 - 3 tbsp"), ("2 - 3".to_string(), "tbsp".to_string()));
    }

    #[test]
    fn test_prep_table_escapes_pipes() {
        let codec = MarkdownCodec::default();
        let mut original = RecipeRaw::new("Pie");
        original.author = "Smith | Jones".to_string();
        original.quantity = r"1 \ 2 pies".to_string();
        original.cook_time = TimeDelta::minutes(50);

        let md = codec.encode(&original);
        assert!(md.contains(r"Smith \| Jones"));
        let decoded = codec.decode(&md, None, None).unwrap();
        assert_eq!(decoded.author, "Smith | Jones");
        assert_eq!(decoded.quantity, r"1 \ 2 pies");
        assert_eq!(decoded.cook_time, TimeDelta::minutes(50));
    }

    #[test]
    fn test_empty_step_keeps_its_position() {
        let codec = MarkdownCodec::default();
        let mut original = RecipeRaw::new("Pasta");
        original.instructions = vec!["Boil".to_string(), String::new(), "Serve".to_string()];
        let decoded = codec.decode(&codec.encode(&original), None, None).unwrap();
        assert_eq!(decoded.instructions, vec!["Boil", "", "Serve"]);
    }

    #[test]
    fn test_json_round_trip() {
        let codec = MarkdownCodec::default();
        let original = sample();
        let json = codec.encode_json(&original).unwrap();
        assert!(json.contains(r#""total_time": "35m0s""#));
        let decoded = codec.decode_json(&json, None, None).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_json_is_lenient() {
        let json = r#"{
            "name": "Pancakes",
            "cook_time": "15 minutes",
            "total_time": null,
            "ingredients": [{"amount": "200", "unit": "g", "name": "flour"}],
            "instructions": null
        }"#;
        let r = MarkdownCodec::default().decode_json(json, None, None).unwrap();
        assert_eq!(r.name, "Pancakes");
        assert_eq!(r.cook_time, TimeDelta::minutes(15));
        assert_eq!(r.total_time, TimeDelta::zero());
        assert_eq!(r.ingredients, vec![ing("200", "g", "flour", "")]);
        assert!(r.instructions.is_empty());
    }

    #[test]
    fn test_decode_json_errors() {
        let codec = MarkdownCodec::default();
        assert!(matches!(
            codec.decode_json("{broken", None, None),
            Err(YummyError::Parse(_))
        ));
        assert!(matches!(
            codec.decode_json(r#"{"author": "x"}"#, None, None),
            Err(YummyError::Validation(_))
        ));
    }

    #[test]
    fn test_decode_file_rejects_unknown_extension() {
        let err = MarkdownCodec::default()
            .decode_file(Path::new("recipe.txt"), None)
            .unwrap_err();
        assert!(matches!(err, YummyError::Parse(_)));
    }

    #[test]
    fn test_decode_file_missing_is_io_error() {
        let err = MarkdownCodec::default()
            .decode_file(Path::new("/definitely/not/here.md"), None)
            .unwrap_err();
        assert!(matches!(err, YummyError::Io { .. }));
    }
}
