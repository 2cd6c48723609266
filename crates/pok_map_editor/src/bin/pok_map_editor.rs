//! Headless map editor
//!
//! Opens maps, applies a JSON-lines command script and optionally saves the
//! result back.
//!
//! Run with: pok_map_editor town.json route1.json --script edits.jsonl --save

use clap::Parser;
use pok_map_editor::pok_map_core::MAX_MAP_DIMENSION;
use pok_map_editor::{parse_script, EditorPreferences, EditorSession, MapOffset};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about = "Edit linked tile maps from the command line", long_about = None)]
struct Args {
    /// Map files to open, laid out left to right
    #[arg(value_name = "MAP")]
    maps: Vec<PathBuf>,

    /// JSON-lines file with one editor command per line
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Create an empty map of the given size, e.g. 8x8
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    new: Option<(i32, i32)>,

    /// Write changed maps back to the files they were opened from
    #[arg(long, default_value_t = false)]
    save: bool,
}

fn parse_size(value: &str) -> Result<(i32, i32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let w = w.trim().parse::<i32>().map_err(|e| e.to_string())?;
    let h = h.trim().parse::<i32>().map_err(|e| e.to_string())?;
    if !(1..=MAX_MAP_DIMENSION).contains(&w) || !(1..=MAX_MAP_DIMENSION).contains(&h) {
        return Err(format!("map size must be between 1x1 and {0}x{0}", MAX_MAP_DIMENSION));
    }
    Ok((w, h))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let mut session = EditorSession::new(EditorPreferences::load());
    let tile_size = session.preferences.tile_size;

    let mut next_x = 0;
    for path in &args.maps {
        match session.open_map(path, MapOffset::new(next_x, 0)) {
            Ok(index) => {
                if let Some(map) = session.world.get_map(index) {
                    next_x += map.width * tile_size;
                }
            }
            Err(e) => log::error!("{}", e),
        }
    }

    if let Some((width, height)) = args.new {
        if let Some(index) = session.new_map(width, height, MapOffset::new(next_x, 0)) {
            log::info!("New map {} is not saved; it has no file path", index);
        }
    }

    if let Some(script_path) = &args.script {
        let commands = match std::fs::read_to_string(script_path) {
            Ok(source) => match parse_script(&source) {
                Ok(commands) => commands,
                Err(e) => {
                    log::error!("{:?}: {}", script_path, e);
                    return ExitCode::FAILURE;
                }
            },
            Err(e) => {
                log::error!("Could not read {:?}: {}", script_path, e);
                return ExitCode::FAILURE;
            }
        };
        let applied = session.run_script(&commands);
        log::info!("Applied {} of {} commands", applied, commands.len());
    }

    for index in 0..session.world.map_count() {
        if let Some(map) = session.world.get_map(index) {
            log::info!(
                "Map {}: {}x{}, {} layer(s), {} entries, {} exits, {} NPCs, {} objects",
                index,
                map.width,
                map.height,
                map.layer_count(),
                map.entries.len(),
                map.exits.len(),
                map.npcs.len(),
                map.placed_objects.len()
            );
        }
    }
    log::info!(
        "History: {} undo, {} redo step(s)",
        session.history.undo_len(),
        session.history.redo_len()
    );

    let mut status = ExitCode::SUCCESS;
    if args.save {
        match session.save_all() {
            Ok(count) => log::info!("Saved {} map(s)", count),
            Err(e) => {
                log::error!("{}", e);
                status = ExitCode::FAILURE;
            }
        }
    } else if session.has_unsaved_changes() {
        log::warn!("Unsaved changes in maps {:?}; pass --save to keep them", session.world.unsaved_maps());
    }

    if let Err(e) = session.preferences.save() {
        log::warn!("Could not save preferences: {}", e);
    }
    status
}
