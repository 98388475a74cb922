//! Client-side workflow for classifying leaf photographs: pick or drop an
//! image, preview it, submit it to the classification service and present the
//! returned label.

pub mod config;
pub mod controller;
pub mod error;
pub mod orchestrator;
pub mod presenter;
pub mod selection;

pub use config::{load_settings, ClientSettings};
pub use controller::{
    events::ControllerEvent,
    state::{AnalyzeAction, LifecycleState, Phase, ResultCard, ViewModel},
    LifecycleController,
};
pub use error::{ClientError, ConfigError};
pub use orchestrator::{
    ClassificationService, HttpClassificationService, RequestOrchestrator, RequestState,
};
pub use presenter::{style_for, Icon, StyleProfile};
pub use selection::{DragEvent, FileHandle, ObjectUrlStore, PreviewStore, Selection};
