//! Controller layer: the event queue and the lifecycle state machine that owns
//! the active selection.

pub mod events;
pub mod state;

use std::{mem, sync::Arc};

use tokio::{
    runtime::Handle,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};
use tracing::{debug, info, warn};

use crate::{
    config::ClientSettings,
    error::ClientError,
    orchestrator::{
        ClassificationService, HttpClassificationService, RequestOrchestrator, RequestState,
    },
    selection::{
        AcceptFilter, DragEvent, FileHandle, ObjectUrlStore, PreviewStore, Selection,
        SelectionManager,
    },
};

use events::ControllerEvent;
use state::{LifecycleState, Phase, ViewModel};

/// Owns the single active selection and drives it through
/// `empty -> selected -> loading -> resulted | errored`.
///
/// All transitions happen in [`LifecycleController::dispatch`], one event at a
/// time. Request tasks post their completions to the same queue, and a
/// completion is applied only if it was issued for the selection that is still
/// active. The active preview is released on replacement, on clear, and when
/// the controller is dropped.
pub struct LifecycleController {
    selections: SelectionManager,
    orchestrator: RequestOrchestrator,
    state: LifecycleState,
    events_tx: UnboundedSender<ControllerEvent>,
    events_rx: UnboundedReceiver<ControllerEvent>,
}

impl LifecycleController {
    pub fn new(
        service: Arc<dyn ClassificationService>,
        previews: Arc<dyn PreviewStore>,
        settings: &ClientSettings,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            selections: SelectionManager::new(previews, AcceptFilter::parse(&settings.accept)),
            orchestrator: RequestOrchestrator::new(service, settings.publish_delay),
            state: LifecycleState::Empty,
            events_tx,
            events_rx,
        }
    }

    /// Controller backed by the HTTP service and an in-process preview store.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ClientError> {
        let service = HttpClassificationService::new(settings)?;
        Ok(Self::new(
            Arc::new(service),
            Arc::new(ObjectUrlStore::new()),
            settings,
        ))
    }

    /// Runs request tasks on `runtime`, for front ends that drive the
    /// controller from a thread outside tokio.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.orchestrator.set_runtime(runtime);
        self
    }

    /// Queue handle for front ends that post events from elsewhere.
    pub fn sender(&self) -> UnboundedSender<ControllerEvent> {
        self.events_tx.clone()
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn request_state(&self) -> RequestState {
        self.orchestrator.state()
    }

    pub fn drag_active(&self) -> bool {
        self.selections.drag_active()
    }

    pub fn can_analyze(&self) -> bool {
        matches!(self.phase(), Phase::Selected | Phase::Errored)
    }

    pub fn service(&self) -> &Arc<dyn ClassificationService> {
        self.orchestrator.service()
    }

    pub fn view(&self) -> ViewModel {
        ViewModel::build(&self.state, self.selections.drag_active())
    }

    pub fn select_from_input(&mut self, file: Option<FileHandle>) {
        self.dispatch(ControllerEvent::PickFile(file));
    }

    pub fn select_from_drop(&mut self, files: Vec<FileHandle>) {
        self.dispatch(ControllerEvent::DropFiles(files));
    }

    pub fn drag(&mut self, event: DragEvent) {
        self.dispatch(ControllerEvent::Drag(event));
    }

    pub fn analyze(&mut self) {
        self.dispatch(ControllerEvent::Analyze);
    }

    pub fn clear(&mut self) {
        self.dispatch(ControllerEvent::Clear);
    }

    /// Waits for the next queued event and applies it.
    pub async fn process_next(&mut self) -> Option<Phase> {
        let event = self.events_rx.recv().await?;
        self.dispatch(event);
        Some(self.phase())
    }

    /// Applies everything already queued without waiting. Returns the number
    /// of events handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    /// Processes events until the controller leaves `loading`.
    pub async fn wait_until_settled(&mut self) -> Phase {
        while self.phase() == Phase::Loading {
            if self.process_next().await.is_none() {
                break;
            }
        }
        self.phase()
    }

    pub fn dispatch(&mut self, event: ControllerEvent) {
        debug!(event = event.name(), phase = ?self.phase(), "controller event");
        match event {
            ControllerEvent::PickFile(file) => {
                if let Some(selection) = self.selections.select_from_input(file) {
                    self.adopt(selection);
                }
            }
            ControllerEvent::DropFiles(files) => {
                if let Some(selection) = self.selections.select_from_drop(files) {
                    self.adopt(selection);
                }
            }
            ControllerEvent::Drag(drag) => self.selections.drag(drag),
            ControllerEvent::Analyze => self.start_analysis(),
            ControllerEvent::Clear => self.reset(),
            ControllerEvent::Completed {
                selection_id,
                outcome,
            } => {
                let current = self.state.selection().map(Selection::id);
                if current != Some(selection_id)
                    || !self.orchestrator.complete(selection_id, outcome.is_ok())
                {
                    info!(
                        %selection_id,
                        current = ?current,
                        "discarding stale classification outcome"
                    );
                    return;
                }

                let selection = match mem::replace(&mut self.state, LifecycleState::Empty) {
                    LifecycleState::Loading { selection } => selection,
                    other => {
                        self.state = other;
                        return;
                    }
                };
                self.state = match outcome {
                    Ok(result) => {
                        info!(
                            %selection_id,
                            label = %result.label,
                            confidence = result.confidence,
                            "classification result applied"
                        );
                        LifecycleState::Resulted { selection, result }
                    }
                    Err(error) => {
                        info!(%selection_id, "classification error applied");
                        LifecycleState::Errored { selection, error }
                    }
                };
            }
        }
    }

    /// Replaces whatever is active. The previous preview is released here, and
    /// any request issued for it becomes stale.
    fn adopt(&mut self, selection: Selection) {
        self.release_active();
        self.orchestrator.reset();
        info!(selection_id = %selection.id(), "selection adopted");
        self.state = LifecycleState::Selected { selection };
    }

    fn start_analysis(&mut self) {
        if !self.can_analyze() {
            debug!(phase = ?self.phase(), "analyze ignored");
            return;
        }

        let selection = match mem::replace(&mut self.state, LifecycleState::Empty) {
            LifecycleState::Selected { selection } => selection,
            LifecycleState::Errored { selection, .. } => {
                self.orchestrator.reset();
                selection
            }
            other => {
                self.state = other;
                return;
            }
        };

        self.state = match self.orchestrator.submit(&selection, &self.events_tx) {
            Ok(true) => LifecycleState::Loading { selection },
            Ok(false) => LifecycleState::Selected { selection },
            Err(err) => {
                warn!(
                    selection_id = %selection.id(),
                    error = %err,
                    "classification request not issued"
                );
                LifecycleState::Errored {
                    selection,
                    error: err.to_error_info(),
                }
            }
        };
    }

    fn reset(&mut self) {
        if self.phase() == Phase::Empty {
            return;
        }
        self.release_active();
        self.orchestrator.reset();
        info!("selection cleared");
    }

    fn release_active(&mut self) {
        let previous = mem::replace(&mut self.state, LifecycleState::Empty).into_selection();
        if let Some(previous) = previous {
            self.selections.release(previous);
        }
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        self.release_active();
    }
}

#[cfg(test)]
#[path = "../tests/controller_tests.rs"]
mod tests;
