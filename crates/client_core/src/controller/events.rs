//! Events consumed by the lifecycle controller, in arrival order.

use shared::{domain::SelectionId, error::ErrorInfo, protocol::ClassificationResult};

use crate::selection::{DragEvent, FileHandle};

#[derive(Debug)]
pub enum ControllerEvent {
    /// File picker closed; `None` when dismissed without a file.
    PickFile(Option<FileHandle>),
    DropFiles(Vec<FileHandle>),
    Drag(DragEvent),
    Analyze,
    Clear,
    /// Posted by the request task when the remote call settles.
    Completed {
        selection_id: SelectionId,
        outcome: Result<ClassificationResult, ErrorInfo>,
    },
}

impl ControllerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ControllerEvent::PickFile(_) => "pick_file",
            ControllerEvent::DropFiles(_) => "drop_files",
            ControllerEvent::Drag(_) => "drag",
            ControllerEvent::Analyze => "analyze",
            ControllerEvent::Clear => "clear",
            ControllerEvent::Completed { .. } => "completed",
        }
    }
}
