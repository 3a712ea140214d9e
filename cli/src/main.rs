mod commands;
mod config;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_add, cmd_cuisine, cmd_delete, cmd_edit, cmd_export, cmd_favourite, cmd_grocery,
    cmd_import, cmd_list, cmd_random, cmd_rate, cmd_session_delete, cmd_session_list,
    cmd_session_show, cmd_show, cmd_stats,
};
use crate::config::Config;
use yummy_core::codec::MarkdownCodec;
use yummy_core::db::Database;
use yummy_core::session::SessionLog;

#[derive(Parser)]
#[command(
    name = "yummy",
    version,
    about = "A local-first recipe manager",
    long_about = "Keep your recipes in a local SQLite cookbook, move them in and out as \
                  markdown or JSON, and build grocery lists from them."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Optional recipe fields shared by `add` and `edit`.
#[derive(Args, Debug, Default)]
pub(crate) struct RecipeFields {
    /// Short description
    #[arg(long)]
    pub description: Option<String>,
    /// Author or source name
    #[arg(long)]
    pub author: Option<String>,
    /// Cook time (e.g. "45m", "1h30m", "1 hour 20 minutes")
    #[arg(long)]
    pub cook_time: Option<String>,
    /// Prep time
    #[arg(long)]
    pub prep_time: Option<String>,
    /// Total time
    #[arg(long)]
    pub total_time: Option<String>,
    /// Servings, free text (e.g. "4 servings")
    #[arg(long)]
    pub quantity: Option<String>,
    /// Source URL
    #[arg(long)]
    pub url: Option<String>,
    /// Ingredient line, e.g. "2 cups flour (sifted)". Repeatable.
    #[arg(short = 'i', long = "ingredient", value_name = "LINE")]
    pub ingredients: Vec<String>,
    /// Instruction step, in order. Repeatable.
    #[arg(short = 's', long = "step", value_name = "TEXT")]
    pub steps: Vec<String>,
    /// Category tag. Repeatable.
    #[arg(short = 'c', long = "category", value_name = "NAME")]
    pub categories: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum ExportFormat {
    Md,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum GroceryFormat {
    Markdown,
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Cookbook(CookbookCommands),
    /// Inspect the chat session log
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
enum CookbookCommands {
    /// List recipes
    List {
        /// Only show favourites
        #[arg(long)]
        favourites: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a recipe with its ingredients and instructions
    Show {
        /// Recipe ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a new recipe
    Add {
        /// Recipe name
        name: String,
        #[command(flatten)]
        fields: RecipeFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a recipe. Given ingredients, steps or categories replace the old ones.
    Edit {
        /// Recipe ID
        id: i64,
        /// New name
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: RecipeFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a recipe and everything attached to it
    Delete {
        /// Recipe ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle the favourite flag of a recipe
    Favourite {
        /// Recipe ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rate a recipe from 0 to 5
    Rate {
        /// Recipe ID
        id: i64,
        /// Rating (0-5)
        rating: u8,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pick a random recipe
    Random {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show cookbook statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Attach a cuisine to a recipe
    Cuisine {
        /// Recipe ID
        id: i64,
        /// Cuisine name (e.g. "Italian")
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export a recipe as markdown or JSON
    Export {
        /// Recipe ID
        id: i64,
        /// Output format
        #[arg(short, long, value_enum, default_value = "md")]
        format: ExportFormat,
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Import a recipe from a markdown (.md) or JSON (.json) file
    Import {
        /// Path to the recipe file
        file: PathBuf,
        /// Recipe name override (defaults to the title, then the file name)
        #[arg(long)]
        name: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build a grocery list from one or more recipes
    Grocery {
        /// Recipe IDs
        #[arg(required = true)]
        ids: Vec<i64>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: GroceryFormat,
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Keep one line per ingredient instead of merging by name
        #[arg(long)]
        no_group: bool,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// List sessions, most recently active first
    List {
        /// Include sessions without messages
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the messages of a session
    Show {
        /// Session ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a session and its messages
    Delete {
        /// Session ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    init_logging(&config.settings.log_level);
    tracing::debug!(data_dir = %config.data_dir.display(), "loaded configuration");

    match cli.command {
        Commands::Session { command } => run_session(&config, command),
        Commands::Cookbook(command) => run_cookbook(&config, command),
    }
}

fn run_session(config: &Config, command: SessionCommands) -> Result<()> {
    let log = SessionLog::open_in(&config.data_dir, &config.settings.database)?;
    match command {
        SessionCommands::List { all, json } => cmd_session_list(&log, all, json),
        SessionCommands::Show { id, json } => cmd_session_show(&log, id, json),
        SessionCommands::Delete { id, json } => cmd_session_delete(&log, id, json),
    }
}

fn run_cookbook(config: &Config, command: CookbookCommands) -> Result<()> {
    let db = Database::open_in(&config.data_dir, &config.settings.database)?;
    let codec = MarkdownCodec::new(&config.settings.codec);

    match command {
        CookbookCommands::List { favourites, json } => cmd_list(&db, favourites, json),
        CookbookCommands::Show { id, json } => cmd_show(&db, id, json),
        CookbookCommands::Add { name, fields, json } => cmd_add(&db, &name, &fields, json),
        CookbookCommands::Edit {
            id,
            name,
            fields,
            json,
        } => cmd_edit(&db, id, name.as_deref(), &fields, json),
        CookbookCommands::Delete { id, json } => cmd_delete(&db, id, json),
        CookbookCommands::Favourite { id, json } => cmd_favourite(&db, id, json),
        CookbookCommands::Rate { id, rating, json } => cmd_rate(&db, id, rating, json),
        CookbookCommands::Random { json } => cmd_random(&db, json),
        CookbookCommands::Stats { json } => cmd_stats(&db, json),
        CookbookCommands::Cuisine { id, name, json } => cmd_cuisine(&db, id, &name, json),
        CookbookCommands::Export { id, format, output } => {
            cmd_export(&db, &codec, id, format, output.as_deref())
        }
        CookbookCommands::Import { file, name, json } => {
            cmd_import(&db, &codec, &file, name.as_deref(), json)
        }
        CookbookCommands::Grocery {
            ids,
            format,
            output,
            no_group,
        } => cmd_grocery(&db, &ids, format, output.as_deref(), !no_group),
    }
}
