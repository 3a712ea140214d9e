use anyhow::{Result, bail};
use serde::Serialize;
use std::process;

use yummy_core::db::Database;
use yummy_core::duration::{format_duration, parse_duration, to_nanos};
use yummy_core::ingredient::{IngredientParser, RegexIngredientParser};
use yummy_core::models::RecipeRaw;
use yummy_core::{Result as CoreResult, YummyError};

use super::helpers::{exit_not_found, print_recipe_table, stars};
use crate::RecipeFields;

/// Copy every field the user passed onto `recipe`. Ingredients, steps and
/// categories are only replaced when at least one was given.
fn apply_fields(recipe: &mut RecipeRaw, fields: &RecipeFields) {
    let text = |target: &mut String, value: Option<&str>| {
        if let Some(v) = value {
            *target = v.trim().to_string();
        }
    };
    text(&mut recipe.description, fields.description.as_deref());
    text(&mut recipe.author, fields.author.as_deref());
    text(&mut recipe.quantity, fields.quantity.as_deref());
    text(&mut recipe.url, fields.url.as_deref());

    if let Some(t) = &fields.cook_time {
        recipe.cook_time = parse_duration(t);
    }
    if let Some(t) = &fields.prep_time {
        recipe.prep_time = parse_duration(t);
    }
    if let Some(t) = &fields.total_time {
        recipe.total_time = parse_duration(t);
    }

    if !fields.ingredients.is_empty() {
        recipe.ingredients = RegexIngredientParser.parse_lines(&fields.ingredients);
    }
    if !fields.steps.is_empty() {
        recipe.instructions = fields
            .steps
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if !fields.categories.is_empty() {
        recipe.categories = fields
            .categories
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
    }
}

/// Unwrap a core result, turning a missing entity into the exit-code-2 path.
fn found<T>(result: CoreResult<T>, json: bool) -> Result<T> {
    match result {
        Err(e @ YummyError::NotFound { .. }) => exit_not_found(&e.to_string(), json),
        other => Ok(other?),
    }
}

pub(crate) fn cmd_list(db: &Database, favourites: bool, json: bool) -> Result<()> {
    let recipes = if favourites {
        db.favourite_recipes()?
    } else {
        db.list_recipes()?
    };
    if recipes.is_empty() {
        if json {
            println!("[]");
        } else if favourites {
            eprintln!("No favourite recipes yet");
        } else {
            eprintln!("No recipes found. Add one with: yummy add \"<name>\"");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
        return Ok(());
    }
    print_recipe_table(&recipes);
    Ok(())
}

#[derive(Serialize)]
struct RecipeDetail {
    #[serde(flatten)]
    recipe: RecipeRaw,
    cuisines: Vec<String>,
}

fn print_recipe(recipe: &RecipeRaw, cuisines: &[String]) {
    let name = &recipe.name;
    let id = recipe.id.unwrap_or_default();
    let heart = if recipe.favourite { " ♥" } else { "" };
    println!("=== {name} (id: {id}){heart} ===");
    println!("  Rating: {}", stars(recipe.rating));
    if !recipe.description.is_empty() {
        println!("  {}", recipe.description);
    }
    if !recipe.author.is_empty() {
        println!("  Author: {}", recipe.author);
    }
    if !recipe.quantity.is_empty() {
        println!("  Servings: {}", recipe.quantity);
    }
    let times = [
        ("Prep", recipe.prep_time),
        ("Cook", recipe.cook_time),
        ("Total", recipe.total_time),
    ];
    let times: Vec<String> = times
        .iter()
        .filter(|(_, t)| to_nanos(*t) != 0)
        .map(|(label, t)| format!("{label}: {}", format_duration(*t)))
        .collect();
    if !times.is_empty() {
        println!("  {}", times.join("  |  "));
    }
    if !recipe.categories.is_empty() {
        println!("  Categories: {}", recipe.categories.join(", "));
    }
    if !cuisines.is_empty() {
        println!("  Cuisines: {}", cuisines.join(", "));
    }
    if !recipe.url.is_empty() {
        println!("  Source: {}", recipe.url);
    }

    println!("\n  INGREDIENTS:");
    for ing in &recipe.ingredients {
        let measure = [ing.amount.as_str(), ing.unit.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        let details = if ing.details.is_empty() {
            String::new()
        } else {
            format!(" ({})", ing.details)
        };
        if measure.is_empty() {
            println!("    • {}{details}", ing.name);
        } else {
            println!("    • {measure} {}{details}", ing.name);
        }
    }

    println!("\n  INSTRUCTIONS:");
    for (i, step) in recipe.instructions.iter().enumerate() {
        println!("    {}. {step}", i + 1);
    }
}

pub(crate) fn cmd_show(db: &Database, id: i64, json: bool) -> Result<()> {
    let recipe = found(db.get_recipe(id), json)?;
    let cuisines = db.cuisines(id)?;
    if json {
        let detail = RecipeDetail { recipe, cuisines };
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        print_recipe(&recipe, &cuisines);
    }
    Ok(())
}

pub(crate) fn cmd_add(db: &Database, name: &str, fields: &RecipeFields, json: bool) -> Result<()> {
    let mut recipe = RecipeRaw::new(name.trim());
    apply_fields(&mut recipe, fields);
    let id = db.save_recipe(&recipe)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&db.get_recipe(id)?)?);
    } else {
        let count = recipe.ingredients.len();
        println!("Created recipe: {} (id: {id}, {count} ingredients)", recipe.name);
    }
    Ok(())
}

pub(crate) fn cmd_edit(
    db: &Database,
    id: i64,
    name: Option<&str>,
    fields: &RecipeFields,
    json: bool,
) -> Result<()> {
    let mut recipe = found(db.get_recipe(id), json)?;
    if let Some(name) = name {
        recipe.name = name.trim().to_string();
    }
    apply_fields(&mut recipe, fields);
    db.update_recipe(&recipe)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&db.get_recipe(id)?)?);
    } else {
        println!("Updated recipe: {} (id: {id})", recipe.name);
    }
    Ok(())
}

pub(crate) fn cmd_delete(db: &Database, id: i64, json: bool) -> Result<()> {
    found(db.delete_recipe(id), json)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted recipe {id}");
    }
    Ok(())
}

pub(crate) fn cmd_favourite(db: &Database, id: i64, json: bool) -> Result<()> {
    let favourite = found(db.toggle_favourite(id), json)?;
    if json {
        println!("{}", serde_json::json!({ "id": id, "favourite": favourite }));
    } else if favourite {
        println!("Recipe {id} is now a favourite");
    } else {
        println!("Recipe {id} is no longer a favourite");
    }
    Ok(())
}

pub(crate) fn cmd_rate(db: &Database, id: i64, rating: u8, json: bool) -> Result<()> {
    found(db.set_rating(id, rating), json)?;
    if json {
        println!("{}", serde_json::json!({ "id": id, "rating": rating }));
    } else {
        println!("Rated recipe {id}: {}", stars(rating));
    }
    Ok(())
}

pub(crate) fn cmd_random(db: &Database, json: bool) -> Result<()> {
    let Some(recipe) = db.random_recipe()? else {
        exit_not_found("No recipes found", json);
    };
    let id = recipe.id.unwrap_or_default();
    let cuisines = db.cuisines(id)?;
    if json {
        let detail = RecipeDetail { recipe, cuisines };
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        print_recipe(&recipe, &cuisines);
    }
    Ok(())
}

#[derive(Serialize)]
struct CookbookStats {
    recipes: i64,
    favourites: usize,
    authors: Vec<String>,
    categories: Vec<String>,
}

pub(crate) fn cmd_stats(db: &Database, json: bool) -> Result<()> {
    let stats = CookbookStats {
        recipes: db.recipe_count()?,
        favourites: db.favourite_recipes()?.len(),
        authors: db.all_authors()?,
        categories: db.all_categories()?,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!("Recipes:    {}", stats.recipes);
    println!("Favourites: {}", stats.favourites);
    println!(
        "Authors:    {}",
        if stats.authors.is_empty() {
            "-".to_string()
        } else {
            stats.authors.join(", ")
        }
    );
    println!(
        "Categories: {}",
        if stats.categories.is_empty() {
            "-".to_string()
        } else {
            stats.categories.join(", ")
        }
    );
    Ok(())
}

pub(crate) fn cmd_cuisine(db: &Database, id: i64, name: &str, json: bool) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Cuisine name must not be empty");
    }
    found(db.add_cuisine(id, name), json)?;
    let cuisines = db.cuisines(id)?;
    if json {
        println!("{}", serde_json::json!({ "id": id, "cuisines": cuisines }));
    } else {
        println!("Recipe {id} cuisines: {}", cuisines.join(", "));
    }
    Ok(())
}
