//! Editor commands as data, and JSON-lines command scripts
//!
//! One command per line, e.g.
//! `{"command": "paint", "map": 0, "x": 1, "y": 2, "tile": 5}`.
//! Blank lines and lines starting with `#` are skipped.

use crate::EditorError;
use pok_map_core::{Direction, ResizeOrigin};
use serde::{Deserialize, Serialize};

/// A single input to the editor session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
    NewMap {
        width: i32,
        height: i32,
        #[serde(default)]
        offset_x: i32,
        #[serde(default)]
        offset_y: i32,
    },
    DefineObject {
        name: String,
        width: i32,
        height: i32,
        first_tile: i32,
        #[serde(default)]
        texture_index: i32,
    },
    Paint {
        map: usize,
        #[serde(default)]
        z: usize,
        x: i32,
        y: i32,
        tile: i32,
        #[serde(default)]
        texture_index: i32,
    },
    Erase {
        map: usize,
        #[serde(default)]
        z: usize,
        x: i32,
        y: i32,
    },
    Fill {
        map: usize,
        #[serde(default)]
        z: usize,
        x: i32,
        y: i32,
        tile: i32,
        #[serde(default)]
        texture_index: i32,
    },
    ToggleCollision {
        map: usize,
        #[serde(default)]
        z: usize,
        x: i32,
        y: i32,
    },
    /// A whole pencil (or eraser) drag through `points`
    Stroke {
        map: usize,
        #[serde(default)]
        z: usize,
        #[serde(default)]
        tile: i32,
        #[serde(default)]
        texture_index: i32,
        #[serde(default)]
        erase: bool,
        points: Vec<(i32, i32)>,
    },
    /// A whole autotile drag through `points`
    Autotile {
        map: usize,
        #[serde(default)]
        z: usize,
        base_tile: i32,
        #[serde(default)]
        texture_index: i32,
        points: Vec<(i32, i32)>,
    },
    AddLayer {
        map: usize,
    },
    PlaceObject {
        map: usize,
        object: usize,
        x: i32,
        y: i32,
        #[serde(default)]
        z: usize,
    },
    RemoveObject {
        map: usize,
        x: i32,
        y: i32,
    },
    PlaceNpc {
        map: usize,
        name: String,
        x: i32,
        y: i32,
        #[serde(default)]
        z: usize,
        #[serde(default)]
        direction: Direction,
    },
    RemoveNpc {
        map: usize,
        x: i32,
        y: i32,
    },
    Link {
        from_map: usize,
        from_x: i32,
        from_y: i32,
        to_map: usize,
        to_x: i32,
        to_y: i32,
    },
    /// Remove the link whose exit sits at `(x, y)`
    Unlink {
        map: usize,
        x: i32,
        y: i32,
    },
    Resize {
        map: usize,
        dx: i32,
        dy: i32,
        #[serde(default)]
        origin: ResizeOrigin,
    },
    Undo,
    Redo,
}

/// Parse a JSON-lines command script
pub fn parse_script(source: &str) -> Result<Vec<EditorCommand>, EditorError> {
    let mut commands = Vec::new();
    for (i, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let command = serde_json::from_str(line).map_err(|source| EditorError::Script {
            line: i + 1,
            source,
        })?;
        commands.push(command);
    }
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let script = r#"
# build a small town
{"command": "new_map", "width": 8, "height": 8}
{"command": "paint", "map": 0, "x": 5, "y": 0, "tile": 3}
{"command": "resize", "map": 0, "dx": 2, "dy": 0, "origin": "BottomRight"}
{"command": "undo"}
"#;
        let commands = parse_script(script).unwrap();
        assert_eq!(commands.len(), 4);
        assert_eq!(
            commands[1],
            EditorCommand::Paint {
                map: 0,
                z: 0,
                x: 5,
                y: 0,
                tile: 3,
                texture_index: 0,
            }
        );
        assert_eq!(
            commands[2],
            EditorCommand::Resize {
                map: 0,
                dx: 2,
                dy: 0,
                origin: ResizeOrigin::BottomRight,
            }
        );
        assert_eq!(commands[3], EditorCommand::Undo);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let script = "{\"command\": \"redo\"}\n\n{\"command\": \"paint\"}\n";
        match parse_script(script) {
            Err(EditorError::Script { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_stroke_points() {
        let commands =
            parse_script(r#"{"command": "stroke", "map": 0, "erase": true, "points": [[0, 0], [3, 2]]}"#)
                .unwrap();
        let EditorCommand::Stroke { erase, points, .. } = &commands[0] else {
            panic!("expected a stroke");
        };
        assert!(*erase);
        assert_eq!(points, &vec![(0, 0), (3, 2)]);
    }
}
