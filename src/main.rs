mod drawing;
mod renderer;
mod storage;
mod ui;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

use crate::drawing::palette::{Brush, Color};
use crate::renderer::display::normalize_terminal_size;
use crate::storage::JsonFileStore;
use crate::ui::menu::Shell;
use crate::utils::config::Config;

#[derive(Parser)]
#[command(author, version, about = "Paint colored glyphs on a terminal grid and keep named drawings", long_about = None)]
struct Cli {
    /// Drawing store file (overrides PIXGRID_STORE and the config file)
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Starting paint color (red, green, blue, gray)
    #[arg(long, global = true, value_parser = parse_color)]
    color: Option<Color>,

    /// Starting brush
    #[arg(long, global = true, value_enum)]
    brush: Option<Brush>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu (default)
    Menu,
    /// Start a blank drawing sized to the terminal
    New,
    /// Load a saved drawing and keep painting
    Edit { name: String },
    /// Print a saved drawing to stdout
    Show { name: String },
    /// List saved drawings
    List {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Delete every cell saved under a name
    Delete { name: String },
    /// Query the terminal size as crossterm sees it
    TerminalSize,
}

fn parse_color(s: &str) -> Result<Color, String> {
    Color::parse_loose(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.store.clone())?;
    if let Some(color) = cli.color {
        config.default_color = color;
    }
    if let Some(brush) = cli.brush {
        config.default_brush = brush;
    }
    let _log_guard = utils::logger::init(&config.log_dir)?;

    let store = JsonFileStore::new(&config.store_path);
    info!(store = %store.path().display(), "pixgrid v{}", env!("CARGO_PKG_VERSION"));

    let mut shell = Shell::new(store, config);

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => shell.run_menu()?,
        Commands::New => shell.new_drawing()?,
        Commands::Edit { name } => shell.edit_or_load(&name)?,
        Commands::Show { name } => shell.show(&name)?,
        Commands::List { json } => shell.list(json)?,
        Commands::Delete { name } => shell.delete(&name)?,
        Commands::TerminalSize => {
            let (raw_cols, raw_rows) =
                crossterm::terminal::size().context("Failed to query terminal size")?;
            let env_u16 = |key: &str| std::env::var(key).ok().and_then(|v| v.parse::<u16>().ok());
            let (cols, rows) =
                normalize_terminal_size(raw_cols, raw_rows, env_u16("CHAR_WIDTH"), env_u16("CHAR_HEIGHT"));
            println!("{}", json!({
                "columns": cols,
                "rows": rows,
                "raw_columns": raw_cols,
                "raw_rows": raw_rows,
            }));
        }
    }

    Ok(())
}
