use std::collections::HashMap;
use std::fmt::Write;

use serde::Serialize;

use crate::error::{Result, YummyError};
use crate::models::RecipeRaw;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroceryItem {
    pub name: String,
    pub amount: String,
    pub unit: String,
    pub details: String,
    /// Names of the recipes that need this item, first-seen order.
    pub recipes: Vec<String>,
}

/// Shopping list built from a set of already loaded recipes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroceryList {
    pub items: Vec<GroceryItem>,
    pub recipes: Vec<String>,
    pub total_items: usize,
}

impl GroceryList {
    /// One item per ingredient line, or with `group` one item per distinct
    /// (case- and whitespace-insensitive) ingredient name. When grouping, the
    /// first non-empty amount and its unit win. Items are sorted by name,
    /// ignoring case; ties keep their input order.
    #[must_use]
    pub fn from_recipes(recipes: &[RecipeRaw], group: bool) -> Self {
        let mut items: Vec<GroceryItem> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for recipe in recipes {
            for ing in &recipe.ingredients {
                let key = ing.name.trim().to_lowercase();
                if group {
                    if let Some(&i) = index.get(&key) {
                        let existing = &mut items[i];
                        if !existing.recipes.contains(&recipe.name) {
                            existing.recipes.push(recipe.name.clone());
                        }
                        if existing.amount.is_empty() && !ing.amount.is_empty() {
                            existing.amount.clone_from(&ing.amount);
                            existing.unit.clone_from(&ing.unit);
                        }
                        continue;
                    }
                    index.insert(key, items.len());
                }
                items.push(GroceryItem {
                    name: ing.name.clone(),
                    amount: ing.amount.clone(),
                    unit: ing.unit.clone(),
                    details: ing.details.clone(),
                    recipes: vec![recipe.name.clone()],
                });
            }
        }

        items.sort_by_cached_key(|item| item.name.to_lowercase());
        GroceryList {
            total_items: items.len(),
            items,
            recipes: recipes.iter().map(|r| r.name.clone()).collect(),
        }
    }

    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut s = String::from("# 🛒 Grocery List\n\n");
        let _ = writeln!(
            s,
            "**Generated for {} recipes:** {}\n",
            self.recipes.len(),
            self.recipes.join(", ")
        );
        let _ = writeln!(s, "**Total items:** {}\n", self.total_items);
        s.push_str("## 📝 Shopping List\n\n");

        for (i, item) in self.items.iter().enumerate() {
            let _ = write!(s, "{}. **{}**", i + 1, item.name);
            if !item.amount.is_empty() {
                let _ = write!(s, " - {}", item.amount);
                if !item.unit.is_empty() {
                    let _ = write!(s, " {}", item.unit);
                }
            }
            if !item.details.is_empty() {
                let _ = write!(s, " ({})", item.details);
            }
            match item.recipes.as_slice() {
                [] => {}
                [only] => {
                    let _ = write!(s, " - *From: {only}*");
                }
                many => {
                    let _ = write!(s, " - *Used in: {}*", many.join(", "));
                }
            }
            s.push('\n');
        }
        s
    }

    pub fn to_csv(&self) -> Result<String> {
        let encode_err = |e: csv::Error| YummyError::Encode(format!("grocery CSV: {e}"));
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(["Name", "Amount", "Unit", "Details", "Recipes"])
            .map_err(encode_err)?;
        for item in &self.items {
            wtr.write_record([
                item.name.as_str(),
                item.amount.as_str(),
                item.unit.as_str(),
                item.details.as_str(),
                item.recipes.join("; ").as_str(),
            ])
            .map_err(encode_err)?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| YummyError::Encode(format!("grocery CSV: {e}")))?;
        String::from_utf8(bytes).map_err(|e| YummyError::Encode(format!("grocery CSV: {e}")))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| YummyError::Encode(format!("grocery JSON: {e}")))
    }
}
