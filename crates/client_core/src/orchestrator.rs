//! Remote classification calls and request lifecycle tracking.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{domain::SelectionId, protocol::ClassificationResult};
use tokio::{runtime::Handle, sync::mpsc::UnboundedSender};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::ClientSettings,
    controller::events::ControllerEvent,
    error::ClientError,
    selection::{FileHandle, Selection},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Loading,
    Succeeded,
    Failed,
}

#[async_trait]
pub trait ClassificationService: Send + Sync {
    async fn classify(&self, file: FileHandle) -> Result<ClassificationResult, ClientError>;
    async fn ping(&self) -> Result<(), ClientError>;
}

pub struct HttpClassificationService {
    http: Client,
    endpoint: Url,
    health_url: Url,
    field_name: String,
}

impl HttpClassificationService {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            endpoint: settings.endpoint.clone(),
            health_url: settings.health_url.clone(),
            field_name: settings.field_name.clone(),
        })
    }
}

#[async_trait]
impl ClassificationService for HttpClassificationService {
    async fn classify(&self, file: FileHandle) -> Result<ClassificationResult, ClientError> {
        let part = Part::bytes(file.bytes().to_vec()).file_name(file.name().to_string());
        let part = match file.mime_type() {
            Some(mime) => part.mime_str(mime)?,
            None => part,
        };
        let form = Form::new().part(self.field_name.clone(), part);

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn ping(&self) -> Result<(), ClientError> {
        let response = self.http.get(self.health_url.clone()).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::Status {
                status: status.as_u16(),
            })
        }
    }
}

/// Tracks the request issued for the active selection. Completions come back
/// through the controller's event queue tagged with the selection they were
/// issued for; [`RequestOrchestrator::complete`] accepts only the one still
/// in flight.
///
/// Requests run on the runtime captured at construction, or on the one
/// attached with [`RequestOrchestrator::set_runtime`], so `submit` can be
/// called from a thread that is not inside tokio.
pub struct RequestOrchestrator {
    service: Arc<dyn ClassificationService>,
    publish_delay: Duration,
    runtime: Option<Handle>,
    state: RequestState,
    in_flight: Option<SelectionId>,
}

impl RequestOrchestrator {
    pub fn new(service: Arc<dyn ClassificationService>, publish_delay: Duration) -> Self {
        Self {
            service,
            publish_delay,
            runtime: Handle::try_current().ok(),
            state: RequestState::Idle,
            in_flight: None,
        }
    }

    pub fn set_runtime(&mut self, runtime: Handle) {
        self.runtime = Some(runtime);
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn in_flight(&self) -> Option<SelectionId> {
        self.in_flight
    }

    pub fn service(&self) -> &Arc<dyn ClassificationService> {
        &self.service
    }

    /// Moves to `Loading` immediately and spawns the call. Returns `Ok(false)`
    /// without doing anything unless the state is `Idle`, and
    /// [`ClientError::NoRuntime`] with the state untouched when there is no
    /// runtime to spawn on.
    pub fn submit(
        &mut self,
        selection: &Selection,
        events: &UnboundedSender<ControllerEvent>,
    ) -> Result<bool, ClientError> {
        if self.state != RequestState::Idle {
            debug!(
                selection_id = %selection.id(),
                state = ?self.state,
                "submit rejected; request state is not idle"
            );
            return Ok(false);
        }
        let runtime = match &self.runtime {
            Some(runtime) => runtime.clone(),
            None => Handle::try_current().map_err(|_| ClientError::NoRuntime)?,
        };

        let selection_id = selection.id();
        self.state = RequestState::Loading;
        self.in_flight = Some(selection_id);

        let service = self.service.clone();
        let file = selection.file().clone();
        let publish_delay = self.publish_delay;
        let events = events.clone();
        info!(
            %selection_id,
            file = file.name(),
            bytes = file.len(),
            "classification request issued"
        );

        runtime.spawn(async move {
            let outcome = match service.classify(file).await {
                Ok(result) => {
                    if let Err(err) = result.validate() {
                        warn!(
                            %selection_id,
                            error = %err,
                            "service returned out-of-range confidence"
                        );
                    }
                    tokio::time::sleep(publish_delay).await;
                    Ok(result)
                }
                Err(err) => {
                    warn!(%selection_id, error = %err, "classification request failed");
                    Err(err.to_error_info())
                }
            };
            if events
                .send(ControllerEvent::Completed {
                    selection_id,
                    outcome,
                })
                .is_err()
            {
                debug!(%selection_id, "controller gone; dropping classification outcome");
            }
        });
        Ok(true)
    }

    /// Records a completion. Returns `false` for a stale one, i.e. anything
    /// other than the request currently in flight.
    pub fn complete(&mut self, selection_id: SelectionId, succeeded: bool) -> bool {
        if self.state != RequestState::Loading || self.in_flight != Some(selection_id) {
            return false;
        }
        self.in_flight = None;
        self.state = if succeeded {
            RequestState::Succeeded
        } else {
            RequestState::Failed
        };
        true
    }

    /// Back to `Idle`. Whatever is still in flight becomes stale; the
    /// transport call itself is left to finish.
    pub fn reset(&mut self) {
        if let Some(selection_id) = self.in_flight.take() {
            debug!(%selection_id, "abandoning in-flight request");
        }
        self.state = RequestState::Idle;
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
