use std::collections::HashMap;
use std::path::Path;

use chrono::Local;
use rusqlite::{Connection, params};
use tracing::{debug, error};

use crate::config::DatabaseConfig;
use crate::duration::{from_nanos, to_nanos};
use crate::error::{Result, StorageContext, YummyError};
use crate::models::{
    Base, Ingredient, Recipe, RecipeMetadata, RecipeRaw, RecipeSummary, validate_rating,
    validate_recipe,
};

/// Child tables removed by [`Database::delete_recipe`], in deletion order.
const CHILD_TABLES: [&str; 5] = [
    "recipe_metadata",
    "ingredients",
    "instructions",
    "categories",
    "cuisines",
];

const SUMMARY_SELECT: &str = "SELECT r.id, r.name,
        COALESCE(m.description, ''), COALESCE(m.author, ''),
        COALESCE(m.cook_time, 0), COALESCE(m.prep_time, 0), COALESCE(m.total_time, 0),
        COALESCE(m.quantity, ''), COALESCE(m.url, ''),
        COALESCE(m.favourite, 0), COALESCE(m.rating, 0)
     FROM recipes r
     LEFT JOIN recipe_metadata m ON m.recipe_id = r.id AND m.deleted_at IS NULL
     WHERE r.deleted_at IS NULL";

/// The recipe store. One logical recipe spans the `recipes`,
/// `recipe_metadata`, `ingredients`, `instructions`, `categories` and
/// `cuisines` tables; every multi-table write runs in a single transaction.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_storage(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        debug!(path = %path.display(), "opened recipe database");
        Ok(db)
    }

    /// Open `config.recipe_db_name` inside `data_dir`.
    pub fn open_in(data_dir: &Path, config: &DatabaseConfig) -> Result<Self> {
        Self::open(&data_dir.join(&config.recipe_db_name))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().storage("Failed to open in-memory database")?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .storage("Failed to enable foreign keys")?;

        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .storage("Failed to read schema version")?;

        if version < 1 {
            self.conn
                .execute_batch(
                    "CREATE TABLE IF NOT EXISTS recipes (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        name TEXT NOT NULL,
                        created_at TEXT NOT NULL,
                        updated_at TEXT NOT NULL,
                        deleted_at TEXT
                    );

                    CREATE TABLE IF NOT EXISTS recipe_metadata (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        recipe_id INTEGER NOT NULL UNIQUE REFERENCES recipes(id),
                        description TEXT NOT NULL DEFAULT '',
                        author TEXT NOT NULL DEFAULT '',
                        cook_time INTEGER NOT NULL DEFAULT 0,
                        prep_time INTEGER NOT NULL DEFAULT 0,
                        total_time INTEGER NOT NULL DEFAULT 0,
                        quantity TEXT NOT NULL DEFAULT '',
                        url TEXT NOT NULL DEFAULT '',
                        favourite INTEGER NOT NULL DEFAULT 0,
                        rating INTEGER NOT NULL DEFAULT 0 CHECK (rating BETWEEN 0 AND 5),
                        created_at TEXT NOT NULL,
                        updated_at TEXT NOT NULL,
                        deleted_at TEXT
                    );

                    CREATE TABLE IF NOT EXISTS ingredients (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        recipe_id INTEGER NOT NULL REFERENCES recipes(id),
                        name TEXT NOT NULL,
                        detail TEXT NOT NULL DEFAULT '',
                        amount TEXT NOT NULL DEFAULT '',
                        unit TEXT NOT NULL DEFAULT '',
                        created_at TEXT NOT NULL,
                        updated_at TEXT NOT NULL,
                        deleted_at TEXT
                    );

                    CREATE TABLE IF NOT EXISTS instructions (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        recipe_id INTEGER NOT NULL REFERENCES recipes(id),
                        step INTEGER NOT NULL,
                        description TEXT NOT NULL,
                        created_at TEXT NOT NULL,
                        updated_at TEXT NOT NULL,
                        deleted_at TEXT
                    );

                    CREATE TABLE IF NOT EXISTS categories (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        recipe_id INTEGER NOT NULL REFERENCES recipes(id),
                        name TEXT NOT NULL,
                        created_at TEXT NOT NULL,
                        updated_at TEXT NOT NULL,
                        deleted_at TEXT
                    );

                    CREATE TABLE IF NOT EXISTS cuisines (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        recipe_id INTEGER NOT NULL REFERENCES recipes(id),
                        name TEXT NOT NULL,
                        created_at TEXT NOT NULL,
                        updated_at TEXT NOT NULL,
                        deleted_at TEXT
                    );

                    CREATE INDEX IF NOT EXISTS idx_recipes_name ON recipes(name);
                    CREATE INDEX IF NOT EXISTS idx_ingredients_recipe ON ingredients(recipe_id);
                    CREATE INDEX IF NOT EXISTS idx_instructions_recipe ON instructions(recipe_id);
                    CREATE INDEX IF NOT EXISTS idx_categories_recipe ON categories(recipe_id);
                    CREATE INDEX IF NOT EXISTS idx_cuisines_recipe ON cuisines(recipe_id);

                    PRAGMA user_version = 1;",
                )
                .storage("Failed to migrate recipe database")?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    // Expects columns: id, name, created_at, updated_at, deleted_at
    fn recipe_from_row(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        Ok(Recipe {
            base: Base {
                id: row.get(0)?,
                created_at: row.get(2)?,
                updated_at: row.get(3)?,
                deleted_at: row.get(4)?,
            },
            name: row.get(1)?,
        })
    }

    // Expects columns:
    // 0: id, 1: recipe_id, 2: description, 3: author, 4: cook_time,
    // 5: prep_time, 6: total_time, 7: quantity, 8: url, 9: favourite,
    // 10: rating, 11: created_at, 12: updated_at, 13: deleted_at
    fn metadata_from_row(row: &rusqlite::Row) -> rusqlite::Result<RecipeMetadata> {
        Ok(RecipeMetadata {
            base: Base {
                id: row.get(0)?,
                created_at: row.get(11)?,
                updated_at: row.get(12)?,
                deleted_at: row.get(13)?,
            },
            recipe_id: row.get(1)?,
            description: row.get(2)?,
            author: row.get(3)?,
            cook_time: from_nanos(row.get(4)?),
            prep_time: from_nanos(row.get(5)?),
            total_time: from_nanos(row.get(6)?),
            quantity: row.get(7)?,
            url: row.get(8)?,
            favourite: row.get(9)?,
            rating: row.get(10)?,
        })
    }

    fn summary_from_row(row: &rusqlite::Row) -> rusqlite::Result<RecipeSummary> {
        Ok(RecipeSummary {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            author: row.get(3)?,
            cook_time: from_nanos(row.get(4)?),
            prep_time: from_nanos(row.get(5)?),
            total_time: from_nanos(row.get(6)?),
            quantity: row.get(7)?,
            url: row.get(8)?,
            favourite: row.get(9)?,
            rating: row.get(10)?,
            categories: Vec::new(),
        })
    }

    // --- Write helpers, shared by the transactional operations ---

    fn insert_recipe_row(conn: &Connection, name: &str, now: &str) -> Result<i64> {
        conn.execute(
            "INSERT INTO recipes (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![name, now],
        )
        .with_storage(|| format!("Failed to insert recipe '{name}'"))?;
        Ok(conn.last_insert_rowid())
    }

    fn insert_metadata(conn: &Connection, recipe_id: i64, r: &RecipeRaw, now: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO recipe_metadata (recipe_id, description, author, cook_time, prep_time,
                total_time, quantity, url, favourite, rating, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                recipe_id,
                r.description,
                r.author,
                to_nanos(r.cook_time),
                to_nanos(r.prep_time),
                to_nanos(r.total_time),
                r.quantity,
                r.url,
                r.favourite,
                r.rating,
                now,
            ],
        )
        .with_storage(|| format!("Failed to insert metadata for recipe {recipe_id}"))?;
        Ok(())
    }

    fn insert_children(conn: &Connection, recipe_id: i64, r: &RecipeRaw, now: &str) -> Result<()> {
        for ing in &r.ingredients {
            conn.execute(
                "INSERT INTO ingredients (recipe_id, name, detail, amount, unit, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![recipe_id, ing.name, ing.details, ing.amount, ing.unit, now],
            )
            .with_storage(|| format!("Failed to insert ingredient '{}'", ing.name))?;
        }
        for (i, step) in r.instructions.iter().enumerate() {
            conn.execute(
                "INSERT INTO instructions (recipe_id, step, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![recipe_id, i + 1, step, now],
            )
            .with_storage(|| format!("Failed to insert instruction {}", i + 1))?;
        }
        for name in &r.categories {
            conn.execute(
                "INSERT INTO categories (recipe_id, name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
                params![recipe_id, name, now],
            )
            .with_storage(|| format!("Failed to insert category '{name}'"))?;
        }
        Ok(())
    }

    fn recipe_exists(conn: &Connection, id: i64) -> Result<bool> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM recipes WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .storage("Failed to look up recipe")?;
        Ok(count > 0)
    }

    // --- Recipes ---

    /// Insert a bare recipe together with its empty metadata row.
    pub fn create_recipe(&self, name: &str) -> Result<i64> {
        self.save_recipe(&RecipeRaw::new(name))
    }

    /// Insert a complete recipe: the recipe row, metadata, ingredients,
    /// instructions (numbered from 1) and categories, all or nothing.
    pub fn save_recipe(&self, recipe: &RecipeRaw) -> Result<i64> {
        validate_recipe(recipe)?;
        let now = Local::now().to_rfc3339();
        let tx = self
            .conn
            .unchecked_transaction()
            .storage("Failed to begin transaction")?;

        let write = || -> Result<i64> {
            let id = Self::insert_recipe_row(&tx, &recipe.name, &now)?;
            Self::insert_metadata(&tx, id, recipe, &now)?;
            Self::insert_children(&tx, id, recipe, &now)?;
            Ok(id)
        };
        let id = write().inspect_err(|e| {
            error!(recipe = %recipe.name, error = %e, "saving recipe failed, rolling back");
        })?;

        tx.commit().storage("Failed to commit recipe")?;
        debug!(
            id,
            name = %recipe.name,
            ingredients = recipe.ingredients.len(),
            instructions = recipe.instructions.len(),
            "saved recipe"
        );
        Ok(id)
    }

    /// Replace a stored recipe with `recipe`. Ingredients, instructions and
    /// categories are deleted and reinserted; nothing is merged.
    pub fn update_recipe(&self, recipe: &RecipeRaw) -> Result<()> {
        let id = recipe
            .id
            .ok_or_else(|| YummyError::Validation("recipe id is required for update".to_string()))?;
        validate_recipe(recipe)?;
        let now = Local::now().to_rfc3339();
        let tx = self
            .conn
            .unchecked_transaction()
            .storage("Failed to begin transaction")?;

        let write = || -> Result<()> {
            let renamed = tx
                .execute(
                    "UPDATE recipes SET name = ?1, updated_at = ?2
                     WHERE id = ?3 AND deleted_at IS NULL",
                    params![recipe.name, now, id],
                )
                .storage("Failed to update recipe")?;
            if renamed == 0 {
                return Err(YummyError::NotFound {
                    entity: "recipe",
                    id,
                });
            }

            let updated = tx
                .execute(
                    "UPDATE recipe_metadata SET description = ?1, author = ?2, cook_time = ?3,
                        prep_time = ?4, total_time = ?5, quantity = ?6, url = ?7,
                        favourite = ?8, rating = ?9, updated_at = ?10
                     WHERE recipe_id = ?11",
                    params![
                        recipe.description,
                        recipe.author,
                        to_nanos(recipe.cook_time),
                        to_nanos(recipe.prep_time),
                        to_nanos(recipe.total_time),
                        recipe.quantity,
                        recipe.url,
                        recipe.favourite,
                        recipe.rating,
                        now,
                        id,
                    ],
                )
                .storage("Failed to update recipe metadata")?;
            if updated == 0 {
                Self::insert_metadata(&tx, id, recipe, &now)?;
            }

            for table in ["ingredients", "instructions", "categories"] {
                tx.execute(
                    &format!("DELETE FROM {table} WHERE recipe_id = ?1"),
                    params![id],
                )
                .with_storage(|| format!("Failed to clear {table} for recipe {id}"))?;
            }
            Self::insert_children(&tx, id, recipe, &now)
        };
        write().inspect_err(|e| {
            error!(id, error = %e, "updating recipe failed, rolling back");
        })?;

        tx.commit().storage("Failed to commit recipe update")?;
        debug!(id, name = %recipe.name, "updated recipe");
        Ok(())
    }

    /// Hard-delete a recipe and every child row, children first.
    pub fn delete_recipe(&self, id: i64) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .storage("Failed to begin transaction")?;
        if !Self::recipe_exists(&tx, id)? {
            return Err(YummyError::NotFound {
                entity: "recipe",
                id,
            });
        }

        let delete = || -> Result<()> {
            for table in CHILD_TABLES {
                tx.execute(
                    &format!("DELETE FROM {table} WHERE recipe_id = ?1"),
                    params![id],
                )
                .with_storage(|| format!("Failed to delete {table} for recipe {id}"))?;
            }
            tx.execute("DELETE FROM recipes WHERE id = ?1", params![id])
                .storage("Failed to delete recipe")?;
            Ok(())
        };
        delete().inspect_err(|e| {
            error!(id, error = %e, "deleting recipe failed, rolling back");
        })?;

        tx.commit().storage("Failed to commit recipe deletion")?;
        debug!(id, "deleted recipe");
        Ok(())
    }

    pub fn get_recipe_row(&self, id: i64) -> Result<Recipe> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, created_at, updated_at, deleted_at
                 FROM recipes WHERE id = ?1 AND deleted_at IS NULL",
            )
            .storage("Failed to prepare recipe query")?;
        let mut rows = stmt.query(params![id]).storage("Failed to load recipe")?;
        match rows.next().storage("Failed to load recipe")? {
            Some(row) => Self::recipe_from_row(row).storage("Failed to read recipe row"),
            None => Err(YummyError::NotFound {
                entity: "recipe",
                id,
            }),
        }
    }

    pub fn get_metadata(&self, recipe_id: i64) -> Result<RecipeMetadata> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, recipe_id, description, author, cook_time, prep_time, total_time,
                        quantity, url, favourite, rating, created_at, updated_at, deleted_at
                 FROM recipe_metadata WHERE recipe_id = ?1 AND deleted_at IS NULL",
            )
            .storage("Failed to prepare metadata query")?;
        let mut rows = stmt
            .query(params![recipe_id])
            .storage("Failed to load recipe metadata")?;
        match rows.next().storage("Failed to load recipe metadata")? {
            Some(row) => Self::metadata_from_row(row).storage("Failed to read metadata row"),
            None => Err(YummyError::NotFound {
                entity: "recipe metadata",
                id: recipe_id,
            }),
        }
    }

    pub fn get_ingredients(&self, recipe_id: i64) -> Result<Vec<Ingredient>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT amount, unit, name, detail FROM ingredients
                 WHERE recipe_id = ?1 AND deleted_at IS NULL ORDER BY id",
            )
            .storage("Failed to prepare ingredient query")?;
        let ingredients = stmt
            .query_map(params![recipe_id], |row| {
                Ok(Ingredient {
                    amount: row.get(0)?,
                    unit: row.get(1)?,
                    name: row.get(2)?,
                    details: row.get(3)?,
                })
            })
            .and_then(Iterator::collect)
            .storage("Failed to load ingredients")?;
        Ok(ingredients)
    }

    pub fn get_instructions(&self, recipe_id: i64) -> Result<Vec<String>> {
        self.names_for(
            "SELECT description FROM instructions
             WHERE recipe_id = ?1 AND deleted_at IS NULL ORDER BY step, id",
            recipe_id,
        )
    }

    pub fn get_categories(&self, recipe_id: i64) -> Result<Vec<String>> {
        self.names_for(
            "SELECT name FROM categories
             WHERE recipe_id = ?1 AND deleted_at IS NULL ORDER BY id",
            recipe_id,
        )
    }

    fn names_for(&self, sql: &str, recipe_id: i64) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .storage("Failed to prepare query")?;
        stmt.query_map(params![recipe_id], |row| row.get(0))
            .and_then(Iterator::collect)
            .with_storage(|| format!("Failed to load rows for recipe {recipe_id}"))
    }

    /// Load the full aggregate. A recipe without metadata is reported as
    /// not found rather than filled with defaults.
    pub fn get_recipe(&self, id: i64) -> Result<RecipeRaw> {
        let recipe = self.get_recipe_row(id)?;
        let meta = self.get_metadata(id)?;
        Ok(RecipeRaw {
            id: Some(recipe.base.id),
            name: recipe.name,
            description: meta.description,
            author: meta.author,
            cook_time: meta.cook_time,
            prep_time: meta.prep_time,
            total_time: meta.total_time,
            quantity: meta.quantity,
            url: meta.url,
            favourite: meta.favourite,
            rating: meta.rating,
            ingredients: self.get_ingredients(id)?,
            instructions: self.get_instructions(id)?,
            categories: self.get_categories(id)?,
            created_at: Some(recipe.base.created_at),
            updated_at: Some(recipe.base.updated_at),
        })
    }

    /// Every live recipe with its metadata and categories, ordered by name.
    pub fn list_recipes(&self) -> Result<Vec<RecipeSummary>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SUMMARY_SELECT} ORDER BY r.name COLLATE NOCASE, r.id"))
            .storage("Failed to prepare recipe list")?;
        let mut recipes: Vec<RecipeSummary> = stmt
            .query_map([], Self::summary_from_row)
            .and_then(Iterator::collect)
            .storage("Failed to list recipes")?;

        let mut by_recipe = self.categories_by_recipe()?;
        for recipe in &mut recipes {
            recipe.categories = by_recipe.remove(&recipe.id).unwrap_or_default();
        }
        debug!(count = recipes.len(), "listed recipes");
        Ok(recipes)
    }

    fn categories_by_recipe(&self) -> Result<HashMap<i64, Vec<String>>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT recipe_id, name FROM categories
                 WHERE deleted_at IS NULL
                   AND recipe_id IN (SELECT id FROM recipes WHERE deleted_at IS NULL)
                 ORDER BY id",
            )
            .storage("Failed to prepare category query")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))
            .and_then(Iterator::collect::<rusqlite::Result<Vec<_>>>)
            .storage("Failed to load categories")?;

        let mut map: HashMap<i64, Vec<String>> = HashMap::new();
        for (recipe_id, name) in rows {
            map.entry(recipe_id).or_default().push(name);
        }
        Ok(map)
    }

    pub fn favourite_recipes(&self) -> Result<Vec<RecipeSummary>> {
        Ok(self
            .list_recipes()?
            .into_iter()
            .filter(|r| r.favourite)
            .collect())
    }

    /// Flip the favourite flag and return the new value.
    ///
    /// This is a read followed by a write, so two concurrent toggles of the
    /// same recipe can both read the old value.
    pub fn toggle_favourite(&self, id: i64) -> Result<bool> {
        let current = self.get_metadata(id)?.favourite;
        let now = Local::now().to_rfc3339();
        self.conn
            .execute(
                "UPDATE recipe_metadata SET favourite = ?1, updated_at = ?2 WHERE recipe_id = ?3",
                params![!current, now, id],
            )
            .storage("Failed to update favourite")?;
        debug!(id, favourite = !current, "toggled favourite");
        Ok(!current)
    }

    pub fn set_rating(&self, id: i64, rating: u8) -> Result<()> {
        validate_rating(rating)?;
        let now = Local::now().to_rfc3339();
        let rows = self
            .conn
            .execute(
                "UPDATE recipe_metadata SET rating = ?1, updated_at = ?2
                 WHERE recipe_id = ?3 AND deleted_at IS NULL",
                params![rating, now, id],
            )
            .storage("Failed to update rating")?;
        if rows == 0 {
            return Err(YummyError::NotFound {
                entity: "recipe",
                id,
            });
        }
        Ok(())
    }

    pub fn random_recipe(&self) -> Result<Option<RecipeRaw>> {
        let id = self.optional_id(
            "SELECT id FROM recipes WHERE deleted_at IS NULL ORDER BY RANDOM() LIMIT 1",
            [],
        )?;
        id.map(|id| self.get_recipe(id)).transpose()
    }

    /// First recipe whose name matches, ignoring case.
    pub fn recipe_by_name(&self, name: &str) -> Result<Option<RecipeRaw>> {
        let id = self.optional_id(
            "SELECT id FROM recipes
             WHERE deleted_at IS NULL AND name = ?1 COLLATE NOCASE
             ORDER BY id LIMIT 1",
            params![name],
        )?;
        id.map(|id| self.get_recipe(id)).transpose()
    }

    /// Id of the recipe imported from `url`, if any.
    pub fn recipe_id_by_url(&self, url: &str) -> Result<Option<i64>> {
        if url.trim().is_empty() {
            return Ok(None);
        }
        self.optional_id(
            "SELECT recipe_id FROM recipe_metadata
             WHERE url = ?1 AND deleted_at IS NULL ORDER BY recipe_id LIMIT 1",
            params![url],
        )
    }

    fn optional_id<P: rusqlite::Params>(&self, sql: &str, args: P) -> Result<Option<i64>> {
        let mut stmt = self.conn.prepare(sql).storage("Failed to prepare query")?;
        let mut rows = stmt.query(args).storage("Failed to look up recipe id")?;
        match rows.next().storage("Failed to look up recipe id")? {
            Some(row) => Ok(Some(row.get(0).storage("Failed to read recipe id")?)),
            None => Ok(None),
        }
    }

    pub fn recipe_count(&self) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM recipes WHERE deleted_at IS NULL",
                [],
                |row| row.get(0),
            )
            .storage("Failed to count recipes")
    }

    pub fn has_recipes(&self) -> Result<bool> {
        Ok(self.recipe_count()? > 0)
    }

    pub fn all_authors(&self) -> Result<Vec<String>> {
        self.distinct_names(
            "SELECT DISTINCT author FROM recipe_metadata
             WHERE author <> '' AND deleted_at IS NULL ORDER BY author",
        )
    }

    pub fn all_categories(&self) -> Result<Vec<String>> {
        self.distinct_names(
            "SELECT DISTINCT name FROM categories
             WHERE name <> '' AND deleted_at IS NULL ORDER BY name",
        )
    }

    fn distinct_names(&self, sql: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(sql).storage("Failed to prepare query")?;
        stmt.query_map([], |row| row.get(0))
            .and_then(Iterator::collect)
            .storage("Failed to load distinct values")
    }

    // --- Cuisines ---

    pub fn add_cuisine(&self, recipe_id: i64, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(YummyError::Validation("cuisine name is required".to_string()));
        }
        if !Self::recipe_exists(&self.conn, recipe_id)? {
            return Err(YummyError::NotFound {
                entity: "recipe",
                id: recipe_id,
            });
        }
        let now = Local::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO cuisines (recipe_id, name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
                params![recipe_id, name, now],
            )
            .storage("Failed to add cuisine")?;
        Ok(())
    }

    pub fn cuisines(&self, recipe_id: i64) -> Result<Vec<String>> {
        self.names_for(
            "SELECT name FROM cuisines
             WHERE recipe_id = ?1 AND deleted_at IS NULL ORDER BY id",
            recipe_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::ingredient::{IngredientParser, RegexIngredientParser};

    fn ing(amount: &str, unit: &str, name: &str, details: &str) -> Ingredient {
        Ingredient {
            amount: amount.to_string(),
            unit: unit.to_string(),
            name: name.to_string(),
            details: details.to_string(),
        }
    }

    fn sample_recipe(name: &str) -> RecipeRaw {
        RecipeRaw {
            name: name.to_string(),
            description: "A weeknight favourite".to_string(),
            author: "Nigella".to_string(),
            cook_time: TimeDelta::minutes(30),
            prep_time: TimeDelta::minutes(15),
            total_time: TimeDelta::minutes(45),
            quantity: "4".to_string(),
            url: format!("https://example.com/{}", name.to_lowercase().replace(' ', "-")),
            ingredients: vec![
                ing("400", "g", "spaghetti", ""),
                ing("2", "clove", "garlic", "crushed"),
            ],
            instructions: vec!["Boil the pasta.".to_string(), "Make the sauce.".to_string()],
            categories: vec!["Dinner".to_string(), "Pasta".to_string()],
            ..RecipeRaw::default()
        }
    }

    fn count_rows(db: &Database, table: &str, recipe_id: i64) -> i64 {
        db.conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE recipe_id = ?1"),
                params![recipe_id],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn test_create_recipe_has_metadata() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_recipe("Porridge").unwrap();

        let recipe = db.get_recipe(id).unwrap();
        assert_eq!(recipe.id, Some(id));
        assert_eq!(recipe.name, "Porridge");
        assert!(recipe.ingredients.is_empty());
        assert_eq!(recipe.total_time, TimeDelta::zero());
        assert_eq!(count_rows(&db, "recipe_metadata", id), 1);
    }

    #[test]
    fn test_create_recipe_rejects_empty_name() {
        let db = Database::open_in_memory().unwrap();
        let err = db.create_recipe("   ").unwrap_err();
        assert!(matches!(err, YummyError::Validation(_)));
        assert_eq!(db.recipe_count().unwrap(), 0);
    }

    #[test]
    fn test_save_and_get_full_recipe() {
        let db = Database::open_in_memory().unwrap();
        let mut original = sample_recipe("Garlic Spaghetti");
        let id = db.save_recipe(&original).unwrap();

        let loaded = db.get_recipe(id).unwrap();
        assert!(loaded.created_at.is_some());
        original.id = Some(id);
        original.created_at.clone_from(&loaded.created_at);
        original.updated_at.clone_from(&loaded.updated_at);
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_instruction_steps_are_contiguous() {
        let db = Database::open_in_memory().unwrap();
        let id = db.save_recipe(&sample_recipe("Steps")).unwrap();
        let steps: Vec<i64> = db
            .conn
            .prepare("SELECT step FROM instructions WHERE recipe_id = ?1 ORDER BY step")
            .unwrap()
            .query_map(params![id], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(steps, vec![1, 2]);
    }

    #[test]
    fn test_kale_salad_scenario() {
        let db = Database::open_in_memory().unwrap();
        let mut recipe = RecipeRaw::new("Kale Salad");
        recipe.ingredients =
            RegexIngredientParser.parse_lines(&["2 cups kale", "1/2 cup quinoa (cooked)"]);
        let id = db.save_recipe(&recipe).unwrap();

        let loaded = db.get_recipe(id).unwrap();
        assert_eq!(
            loaded.ingredients,
            vec![
                ing("2", "cups", "kale", ""),
                ing("1/2", "cup", "quinoa", "cooked"),
            ]
        );
    }

    #[test]
    fn test_update_replaces_children() {
        let db = Database::open_in_memory().unwrap();
        let id = db.save_recipe(&sample_recipe("Pasta")).unwrap();

        let mut edited = db.get_recipe(id).unwrap();
        edited.name = "Better Pasta".to_string();
        edited.author = "Me".to_string();
        edited.ingredients = vec![ing("500", "g", "penne", "")];
        edited.instructions = vec!["Cook it.".to_string()];
        edited.categories = vec!["Quick".to_string()];
        db.update_recipe(&edited).unwrap();

        let loaded = db.get_recipe(id).unwrap();
        assert_eq!(loaded.name, "Better Pasta");
        assert_eq!(loaded.author, "Me");
        assert_eq!(loaded.ingredients, edited.ingredients);
        assert_eq!(loaded.instructions, edited.instructions);
        assert_eq!(loaded.categories, edited.categories);
        assert_eq!(count_rows(&db, "ingredients", id), 1);
    }

    #[test]
    fn test_update_requires_id_and_existing_recipe() {
        let db = Database::open_in_memory().unwrap();
        let err = db.update_recipe(&RecipeRaw::new("Ghost")).unwrap_err();
        assert!(matches!(err, YummyError::Validation(_)));

        let mut ghost = RecipeRaw::new("Ghost");
        ghost.id = Some(999);
        assert!(db.update_recipe(&ghost).unwrap_err().is_not_found());
    }

    #[test]
    fn test_failed_update_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let id = db.save_recipe(&sample_recipe("Stable")).unwrap();
        let before = db.get_recipe(id).unwrap();

        db.conn
            .execute_batch(
                "CREATE TRIGGER fail_on_explode BEFORE INSERT ON ingredients
                 WHEN NEW.name = 'explode'
                 BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
            )
            .unwrap();

        let mut edited = before.clone();
        edited.name = "Changed".to_string();
        edited.ingredients = vec![ing("1", "", "fine", ""), ing("1", "", "explode", "")];
        let err = db.update_recipe(&edited).unwrap_err();
        assert!(matches!(err, YummyError::Storage { .. }));

        let after = db.get_recipe(id).unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn test_failed_save_leaves_no_orphans() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute_batch(
                "CREATE TRIGGER fail_on_explode BEFORE INSERT ON ingredients
                 WHEN NEW.name = 'explode'
                 BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
            )
            .unwrap();

        let mut recipe = sample_recipe("Doomed");
        recipe.ingredients.push(ing("", "", "explode", ""));
        assert!(db.save_recipe(&recipe).is_err());
        assert_eq!(db.recipe_count().unwrap(), 0);
        let metadata: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM recipe_metadata", [], |row| row.get(0))
            .unwrap();
        assert_eq!(metadata, 0);
    }

    #[test]
    fn test_delete_cascades_to_children() {
        let db = Database::open_in_memory().unwrap();
        let id = db.save_recipe(&sample_recipe("Gone Soon")).unwrap();
        db.add_cuisine(id, "Italian").unwrap();
        let keep = db.save_recipe(&sample_recipe("Keeper")).unwrap();

        db.delete_recipe(id).unwrap();

        for table in CHILD_TABLES {
            assert_eq!(count_rows(&db, table, id), 0, "{table}");
        }
        assert!(db.get_recipe(id).unwrap_err().is_not_found());
        assert!(db.get_recipe(keep).is_ok());
    }

    #[test]
    fn test_delete_unknown_recipe_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.delete_recipe(42).unwrap_err().is_not_found());
    }

    #[test]
    fn test_missing_metadata_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_recipe("Half").unwrap();
        db.conn
            .execute("DELETE FROM recipe_metadata WHERE recipe_id = ?1", params![id])
            .unwrap();
        let err = db.get_recipe(id).unwrap_err();
        assert!(matches!(
            err,
            YummyError::NotFound {
                entity: "recipe metadata",
                ..
            }
        ));
    }

    #[test]
    fn test_list_matches_get_recipe() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.list_recipes().unwrap().is_empty());

        let b = db.save_recipe(&sample_recipe("banana bread")).unwrap();
        let a = db.save_recipe(&sample_recipe("Apple Pie")).unwrap();
        let mut plain = RecipeRaw::new("Carrot Soup");
        plain.categories = vec!["Soup".to_string()];
        let c = db.save_recipe(&plain).unwrap();
        let gone = db.save_recipe(&sample_recipe("Deleted")).unwrap();
        db.delete_recipe(gone).unwrap();

        let list = db.list_recipes().unwrap();
        let ids: Vec<i64> = list.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a, b, c]);
        for summary in &list {
            let full = db.get_recipe(summary.id).unwrap();
            assert_eq!(summary.categories, full.categories);
            assert_eq!(summary.author, full.author);
            assert_eq!(summary.total_time, full.total_time);
        }
    }

    #[test]
    fn test_toggle_favourite_twice() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_recipe("Cookies").unwrap();

        assert!(db.toggle_favourite(id).unwrap());
        assert!(db.get_recipe(id).unwrap().favourite);
        assert!(!db.toggle_favourite(id).unwrap());
        assert!(!db.get_recipe(id).unwrap().favourite);
        assert!(db.toggle_favourite(404).unwrap_err().is_not_found());
    }

    #[test]
    fn test_favourite_recipes() {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_recipe("A").unwrap();
        db.create_recipe("B").unwrap();
        db.toggle_favourite(a).unwrap();

        let favs = db.favourite_recipes().unwrap();
        assert_eq!(favs.len(), 1);
        assert_eq!(favs[0].id, a);
    }

    #[test]
    fn test_set_rating() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_recipe("Rated").unwrap();
        db.set_rating(id, 4).unwrap();
        assert_eq!(db.get_recipe(id).unwrap().rating, 4);

        assert!(matches!(
            db.set_rating(id, 6).unwrap_err(),
            YummyError::Validation(_)
        ));
        assert!(db.set_rating(999, 3).unwrap_err().is_not_found());
    }

    #[test]
    fn test_counts_and_random() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.has_recipes().unwrap());
        assert!(db.random_recipe().unwrap().is_none());

        let id = db.save_recipe(&sample_recipe("Only One")).unwrap();
        assert!(db.has_recipes().unwrap());
        assert_eq!(db.recipe_count().unwrap(), 1);
        assert_eq!(db.random_recipe().unwrap().unwrap().id, Some(id));
    }

    #[test]
    fn test_lookup_by_name_and_url() {
        let db = Database::open_in_memory().unwrap();
        let id = db.save_recipe(&sample_recipe("Fish Pie")).unwrap();

        let found = db.recipe_by_name("fish pie").unwrap().unwrap();
        assert_eq!(found.id, Some(id));
        assert!(db.recipe_by_name("Fish").unwrap().is_none());

        assert_eq!(
            db.recipe_id_by_url("https://example.com/fish-pie").unwrap(),
            Some(id)
        );
        assert_eq!(db.recipe_id_by_url("").unwrap(), None);
        assert_eq!(db.recipe_id_by_url("https://nope").unwrap(), None);
    }

    #[test]
    fn test_distinct_authors_and_categories() {
        let db = Database::open_in_memory().unwrap();
        db.save_recipe(&sample_recipe("One")).unwrap();
        db.save_recipe(&sample_recipe("Two")).unwrap();
        let mut anon = RecipeRaw::new("Anon");
        anon.categories = vec![String::new(), "Baking".to_string()];
        db.save_recipe(&anon).unwrap();

        assert_eq!(db.all_authors().unwrap(), vec!["Nigella"]);
        assert_eq!(
            db.all_categories().unwrap(),
            vec!["Baking", "Dinner", "Pasta"]
        );
    }

    #[test]
    fn test_cuisines() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_recipe("Pad Thai").unwrap();
        db.add_cuisine(id, "Thai").unwrap();
        db.add_cuisine(id, " Street Food ").unwrap();
        assert_eq!(db.cuisines(id).unwrap(), vec!["Thai", "Street Food"]);
        assert!(db.add_cuisine(77, "Thai").unwrap_err().is_not_found());
        assert!(db.add_cuisine(id, "  ").is_err());
    }

    #[test]
    fn test_reopen_keeps_schema_version() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let config = DatabaseConfig {
            recipe_db_name: "reopen.db".to_string(),
            ..DatabaseConfig::default()
        };
        let id = {
            let db = Database::open_in(dir, &config).unwrap();
            db.create_recipe("Persistent").unwrap()
        };
        let db = Database::open_in(dir, &config).unwrap();
        assert_eq!(db.get_recipe(id).unwrap().name, "Persistent");
        assert!(dir.join("reopen.db").is_file());
    }
}
