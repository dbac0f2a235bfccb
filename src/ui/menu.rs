use anyhow::{bail, Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use tracing::{info, warn};

use crate::drawing::canvas::Canvas;
use crate::drawing::catalog::{validate_name, DrawingCatalog, SaveMode};
use crate::drawing::codec::{bounding_size, flatten, reconstruct};
use crate::renderer::display::{print_canvas, terminal_size_chars};
use crate::renderer::DisplayManager;
use crate::storage::DrawingStore;
use crate::ui::interactive::{run_session, EditorSession};
use crate::utils::config::Config;

const MENU_ITEMS: [&str; 5] = [
    "New drawing",
    "Edit drawing",
    "Show drawing",
    "Delete drawing",
    "Exit",
];

/// Canvas area for a viewport: the bottom row is kept for the status line.
pub fn editable_area(cols: u16, rows: u16) -> (u16, u16) {
    (cols, rows.saturating_sub(1))
}

/// Rebuilds a saved drawing for editing inside `area`.
///
/// Drawings saved with a size open at that size when it fits and are refused
/// when it does not. Drawings without a stored size use the whole area.
/// `Ok(None)` when nothing is saved under `name`.
pub fn open_canvas<S: DrawingStore>(
    catalog: &DrawingCatalog<S>,
    name: &str,
    area: (u16, u16),
) -> Result<Option<Canvas>> {
    let Some(drawing) = catalog.load_drawing(name)? else {
        return Ok(None);
    };

    let (width, height) = match drawing.size {
        Some((w, h)) if w > area.0 || h > area.1 => {
            bail!(
                "'{}' is {w}x{h} but the terminal only fits {}x{}; enlarge the window",
                drawing.name,
                area.0,
                area.1
            );
        }
        Some(size) => size,
        None => area,
    };

    let canvas = reconstruct(&drawing.records, width, height).with_context(|| {
        match bounding_size(&drawing.records) {
            Some((w, h)) => format!("'{name}' needs at least {w}x{h} cells"),
            None => format!("'{name}' could not be rebuilt"),
        }
    })?;
    Ok(Some(canvas))
}

/// What `delete` reports, keyed on whether the name was saved before.
/// A saved blank canvas has a size but no cells, so `removed` can be zero.
pub fn delete_message(name: &str, existed: bool, removed: usize) -> String {
    if existed {
        format!("🗑️  Deleted '{name}' ({removed} cells).")
    } else {
        format!("ℹ️  Nothing saved under '{name}'.")
    }
}

/// Flattens `canvas` and writes it under `name` together with its size.
pub fn persist<S: DrawingStore>(
    catalog: &mut DrawingCatalog<S>,
    name: &str,
    canvas: &Canvas,
    mode: SaveMode,
) -> Result<usize> {
    let records = flatten(canvas);
    Ok(catalog.save_drawing(name, canvas.size(), &records, mode)?)
}

pub struct Shell<S> {
    catalog: DrawingCatalog<S>,
    config: Config,
    theme: ColorfulTheme,
}

impl<S: DrawingStore> Shell<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self {
            catalog: DrawingCatalog::new(store),
            config,
            theme: ColorfulTheme::default(),
        }
    }

    pub fn run_menu(&mut self) -> Result<()> {
        loop {
            let selection = Select::with_theme(&self.theme)
                .with_prompt("🎨 pixgrid")
                .default(0)
                .items(&MENU_ITEMS)
                .interact_opt()?;

            let result = match selection {
                Some(0) => self.new_drawing(),
                Some(1) => self.pick("✏️  Drawing to edit").and_then(|name| match name {
                    Some(name) => self.edit_or_load(&name),
                    None => Ok(()),
                }),
                Some(2) => self.pick("🖼️  Drawing to show").and_then(|name| match name {
                    Some(name) => self.show(&name),
                    None => Ok(()),
                }),
                Some(3) => self.delete_interactive(),
                _ => return Ok(()),
            };

            // Every failure returns control to the menu.
            if let Err(e) = result {
                warn!(error = %format!("{e:#}"), "menu action failed");
                println!("❌ {e:#}");
            }
        }
    }

    pub fn new_drawing(&mut self) -> Result<()> {
        let (cols, rows) = terminal_size_chars()?;
        let (width, height) = editable_area(cols, rows);
        let canvas = Canvas::create_blank(width, height)?;
        info!(width, height, "new drawing");
        self.edit_canvas(canvas, None)
    }

    pub fn edit_or_load(&mut self, name: &str) -> Result<()> {
        let (cols, rows) = terminal_size_chars()?;
        let Some(canvas) = open_canvas(&self.catalog, name, editable_area(cols, rows))? else {
            println!("ℹ️  No drawing named '{name}'.");
            return Ok(());
        };
        info!(name, painted = canvas.painted_count(), "drawing loaded");
        self.edit_canvas(canvas, Some(name))
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        let existed = self.catalog.exists(name)?;
        let removed = self.catalog.delete(name)?;
        println!("{}", delete_message(name, existed, removed));
        Ok(())
    }

    pub fn list(&self, json: bool) -> Result<()> {
        let summaries = self.catalog.summaries()?;
        if json {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
            return Ok(());
        }
        if summaries.is_empty() {
            println!("ℹ️  No saved drawings.");
            return Ok(());
        }
        for s in summaries {
            let size = match (s.width, s.height) {
                (Some(w), Some(h)) => format!("{w}x{h}"),
                _ => "viewport".to_string(),
            };
            let updated = s
                .updated_at
                .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            println!("{:<30} {:>6} cells  {:>9}  {}", s.name, s.cells, size, updated);
        }
        Ok(())
    }

    pub fn show(&self, name: &str) -> Result<()> {
        let (cols, rows) = terminal_size_chars().unwrap_or((80, 24));
        let Some(canvas) = open_canvas(&self.catalog, name, editable_area(cols, rows))? else {
            println!("ℹ️  No drawing named '{name}'.");
            return Ok(());
        };
        print_canvas(&mut std::io::stdout(), &canvas)
    }

    fn pick(&self, prompt: &str) -> Result<Option<String>> {
        let names = self.catalog.list_names()?;
        if names.is_empty() {
            println!("ℹ️  No saved drawings.");
            return Ok(None);
        }
        let selection = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(0)
            .items(&names)
            .interact_opt()?;
        Ok(selection.map(|i| names[i].clone()))
    }

    fn delete_interactive(&mut self) -> Result<()> {
        let Some(name) = self.pick("🗑️  Drawing to delete")? else {
            return Ok(());
        };
        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt(format!("Delete '{name}'?"))
            .default(false)
            .interact()?;
        if confirmed {
            self.delete(&name)?;
        }
        Ok(())
    }

    fn edit_canvas(&mut self, canvas: Canvas, loaded_as: Option<&str>) -> Result<()> {
        let session = EditorSession::new(canvas, self.config.default_color, self.config.default_brush);
        // The display must be dropped before prompting: it owns raw mode.
        let end = {
            let mut display = DisplayManager::new()?;
            run_session(&mut display, session)
        }?;

        if !end.save_requested {
            println!("ℹ️  Discarded.");
            return Ok(());
        }
        self.prompt_save(&end.canvas, loaded_as)
    }

    fn prompt_save(&mut self, canvas: &Canvas, default_name: Option<&str>) -> Result<()> {
        let save = Confirm::with_theme(&self.theme)
            .with_prompt("Save the drawing?")
            .default(true)
            .interact()?;
        if !save {
            return Ok(());
        }

        let mut input = Input::<String>::with_theme(&self.theme).with_prompt("Drawing name");
        if let Some(name) = default_name {
            input = input.with_initial_text(name);
        }
        let name = input
            .validate_with(|s: &String| validate_name(s).map_err(|e| e.to_string()))
            .interact_text()?;

        let mode = if self.catalog.exists(&name)? {
            let overwrite = Confirm::with_theme(&self.theme)
                .with_prompt(format!("'{name}' already exists. Overwrite it? (no keeps both)"))
                .default(true)
                .interact()?;
            if overwrite {
                SaveMode::Overwrite
            } else {
                SaveMode::Append
            }
        } else {
            SaveMode::Append
        };

        let written = persist(&mut self.catalog, &name, canvas, mode)?;
        println!("✅ Saved '{name}' ({written} cells).");
        Ok(())
    }
}
