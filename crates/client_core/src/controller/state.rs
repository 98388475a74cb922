//! Lifecycle state and its render snapshot.

use shared::{error::ErrorInfo, protocol::ClassificationResult};

use crate::{
    presenter::{bar_width, format_confidence, style_for, StyleProfile},
    selection::Selection,
};

/// Each variant carries only what is valid in it, so a result and an error
/// can never coexist.
#[derive(Debug)]
pub enum LifecycleState {
    Empty,
    Selected {
        selection: Selection,
    },
    Loading {
        selection: Selection,
    },
    Resulted {
        selection: Selection,
        result: ClassificationResult,
    },
    Errored {
        selection: Selection,
        error: ErrorInfo,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Selected,
    Loading,
    Resulted,
    Errored,
}

impl LifecycleState {
    pub fn phase(&self) -> Phase {
        match self {
            LifecycleState::Empty => Phase::Empty,
            LifecycleState::Selected { .. } => Phase::Selected,
            LifecycleState::Loading { .. } => Phase::Loading,
            LifecycleState::Resulted { .. } => Phase::Resulted,
            LifecycleState::Errored { .. } => Phase::Errored,
        }
    }

    pub fn selection(&self) -> Option<&Selection> {
        match self {
            LifecycleState::Empty => None,
            LifecycleState::Selected { selection }
            | LifecycleState::Loading { selection }
            | LifecycleState::Resulted { selection, .. }
            | LifecycleState::Errored { selection, .. } => Some(selection),
        }
    }

    pub fn result(&self) -> Option<&ClassificationResult> {
        match self {
            LifecycleState::Resulted { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            LifecycleState::Errored { error, .. } => Some(error),
            _ => None,
        }
    }

    pub(crate) fn into_selection(self) -> Option<Selection> {
        match self {
            LifecycleState::Empty => None,
            LifecycleState::Selected { selection }
            | LifecycleState::Loading { selection }
            | LifecycleState::Resulted { selection, .. }
            | LifecycleState::Errored { selection, .. } => Some(selection),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeAction {
    /// Upload zone or result card is showing instead.
    Hidden,
    Enabled,
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultCard {
    pub label: String,
    pub confidence: String,
    pub bar_width: String,
    pub style: StyleProfile,
}

impl ResultCard {
    pub fn from_result(result: &ClassificationResult) -> Self {
        Self {
            label: result.label.to_string(),
            confidence: format_confidence(result.confidence),
            bar_width: bar_width(result.confidence),
            style: style_for(&result.label),
        }
    }
}

/// Everything a front end needs to draw the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub phase: Phase,
    pub preview: Option<String>,
    pub drag_active: bool,
    pub analyze: AnalyzeAction,
    pub error: Option<String>,
    pub result: Option<ResultCard>,
}

impl ViewModel {
    pub(crate) fn build(state: &LifecycleState, drag_active: bool) -> Self {
        let analyze = match state.phase() {
            Phase::Empty | Phase::Resulted => AnalyzeAction::Hidden,
            Phase::Selected | Phase::Errored => AnalyzeAction::Enabled,
            Phase::Loading => AnalyzeAction::Busy,
        };
        Self {
            phase: state.phase(),
            preview: state.selection().map(|s| s.preview().as_str().to_string()),
            drag_active,
            analyze,
            error: state.error().map(|e| e.message().to_string()),
            result: state.result().map(ResultCard::from_result),
        }
    }
}
