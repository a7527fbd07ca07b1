use std::path::PathBuf;

use clap::Parser;

use cornifer::dialogs::{NativePlatform, Platform};
use cornifer::editor::{infer_region_id, Editor};
use cornifer::export::{export_layers, export_png, ExportOptions};
use cornifer::session::EditorSession;
use cornifer::state::{load_state, StateLoadError};

#[derive(Parser, Debug)]
#[command(name = "cornifer", version)]
#[command(about = "Map editor for Rain World regions")]
struct Args {
    /// Region folder containing world_<id>.txt and the room files
    #[arg(short, long)]
    region: Option<PathBuf>,

    /// Slugcat whose conditional links apply (e.g. White, Yellow, Red)
    #[arg(short, long)]
    slugcat: Option<String>,

    /// Session state file
    #[arg(long, default_value = "cornifer-state.json")]
    state: PathBuf,

    /// Render the map to this PNG and exit without opening a window
    #[arg(long)]
    export: Option<PathBuf>,

    /// With --export, also write one image per layer
    #[arg(long)]
    layers: bool,

    /// Pixels per tile for export
    #[arg(long, default_value = "4.0")]
    scale: f32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let platform = NativePlatform;

    let mut session = EditorSession::new();
    if let Some(dir) = &args.region {
        let id = infer_region_id(dir)
            .ok_or_else(|| format!("no world_<id>.txt found in {}", dir.display()))?;
        session.load_region_dir(dir, &id, args.slugcat.as_deref())?;
        println!(
            "Loaded region {} ({} rooms, {} load issues)",
            id,
            session.region.as_ref().map_or(0, |r| r.rooms.len()),
            session.errors.len()
        );
    } else {
        match load_state(&args.state) {
            Ok(state) => {
                session.load_state(state);
                println!("Resumed session from {}", args.state.display());
            }
            Err(StateLoadError::Missing) => {
                println!("No saved session at {}, starting empty", args.state.display());
            }
            Err(e) => {
                // Never silently discard a session file the user may still
                // want; starting fresh is their call.
                let message = format!("{e}\n\nStart with an empty session?");
                if !platform.confirm("Cornifer", &message) {
                    return Err(e.into());
                }
                eprintln!("Ignoring unreadable state file: {e}");
            }
        }
    }

    if let Some(path) = &args.export {
        let opts = ExportOptions {
            scale: args.scale,
            ..ExportOptions::default()
        };
        export_png(&session, path, &opts)?;
        if args.layers {
            export_layers(&mut session, path, &opts)?;
        }
        return Ok(());
    }

    let mut editor = Editor::new(session, args.state, Box::new(platform));
    editor.run()
}
