use anyhow::{Context, Result};
use std::path::Path;
use std::process;

use yummy_core::codec::MarkdownCodec;
use yummy_core::db::Database;
use yummy_core::models::RecipeRaw;

use super::helpers::{exit_not_found, json_error, write_output};
use crate::ExportFormat;

fn render(codec: &MarkdownCodec, recipe: &RecipeRaw, format: ExportFormat) -> Result<String> {
    Ok(match format {
        ExportFormat::Md => codec.encode(recipe),
        ExportFormat::Json => {
            let mut json = codec.encode_json(recipe)?;
            json.push('\n');
            json
        }
    })
}

pub(crate) fn cmd_export(
    db: &Database,
    codec: &MarkdownCodec,
    id: i64,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let recipe = match db.get_recipe(id) {
        Err(e) if e.is_not_found() => exit_not_found(&e.to_string(), false),
        other => other?,
    };
    write_output(output, &render(codec, &recipe, format)?)
}

#[derive(Debug, PartialEq, Eq)]
enum ImportOutcome {
    Imported(i64),
    /// A recipe with the same source URL is already stored.
    Duplicate(i64),
}

fn import_recipe(
    db: &Database,
    codec: &MarkdownCodec,
    file: &Path,
    name: Option<&str>,
) -> Result<(ImportOutcome, RecipeRaw)> {
    let recipe = codec
        .decode_file(file, name)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    if let Some(existing) = db.recipe_id_by_url(&recipe.url)? {
        tracing::warn!(url = %recipe.url, existing, "recipe already imported");
        return Ok((ImportOutcome::Duplicate(existing), recipe));
    }

    let id = db.save_recipe(&recipe)?;
    tracing::info!(id, name = %recipe.name, "imported recipe");
    Ok((ImportOutcome::Imported(id), recipe))
}

pub(crate) fn cmd_import(
    db: &Database,
    codec: &MarkdownCodec,
    file: &Path,
    name: Option<&str>,
    json: bool,
) -> Result<()> {
    match import_recipe(db, codec, file, name)? {
        (ImportOutcome::Imported(id), _) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&db.get_recipe(id)?)?);
            } else {
                let recipe = db.get_recipe(id)?;
                let ingredients = recipe.ingredients.len();
                let steps = recipe.instructions.len();
                println!(
                    "Imported recipe: {} (id: {id}, {ingredients} ingredients, {steps} steps)",
                    recipe.name
                );
            }
        }
        (ImportOutcome::Duplicate(existing), recipe) => {
            let message = format!(
                "Recipe from {} is already in the cookbook (id: {existing})",
                recipe.url
            );
            if json {
                println!("{}", json_error(&message));
            } else {
                eprintln!("{message}");
            }
            process::exit(2);
        }
    }
    Ok(())
}
