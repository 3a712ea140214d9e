use anyhow::Result;
use std::path::Path;

use yummy_core::db::Database;
use yummy_core::grocery::GroceryList;

use super::helpers::{exit_not_found, write_output};
use crate::GroceryFormat;

pub(crate) fn cmd_grocery(
    db: &Database,
    ids: &[i64],
    format: GroceryFormat,
    output: Option<&Path>,
    group: bool,
) -> Result<()> {
    let mut recipes = Vec::with_capacity(ids.len());
    for &id in ids {
        match db.get_recipe(id) {
            Ok(recipe) => recipes.push(recipe),
            Err(e) if e.is_not_found() => {
                exit_not_found(&e.to_string(), matches!(format, GroceryFormat::Json));
            }
            Err(e) => return Err(e.into()),
        }
    }

    let list = GroceryList::from_recipes(&recipes, group);
    let rendered = match format {
        GroceryFormat::Markdown => list.to_markdown(),
        GroceryFormat::Csv => list.to_csv()?,
        GroceryFormat::Json => list.to_json()? + "\n",
    };
    write_output(output, &rendered)
}
