//! Undo/redo: reversible deltas, their history, and editor commands as data

mod delta;
mod history;
mod script;

pub use delta::{
    AddLayerDelta, AutotileDelta, BucketDelta, CellBatch, CollisionDelta, Delta, EraserDelta,
    LinkDelta, NpcDelta, ObjectDelta, PencilDelta, RemoveLinkDelta, RemoveNpcDelta,
    RemoveObjectDelta, ResizeDelta,
};
pub use history::{CommandHistory, DEFAULT_MAX_DEPTH};
pub use script::{parse_script, EditorCommand};
