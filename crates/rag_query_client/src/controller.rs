//! Request lifecycle for a single question: Idle → Submitting → Succeeded/Failed.
//!
//! The controller owns all interaction state. Every transition publishes an
//! immutable [`ViewSnapshot`] on a `watch` channel; rendering surfaces subscribe
//! and redraw from the latest snapshot.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::QueryBackend;
use crate::messages::QueryResponse;

/// The only failure text a user ever sees.
pub const QUERY_FAILED_MESSAGE: &str = "Error fetching data from the server.";

/// Trigger label while idle.
pub const SUBMIT_LABEL: &str = "Submit";

/// Trigger label while a query is in flight.
pub const LOADING_LABEL: &str = "Loading...";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InteractionState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// What a rendering surface needs to draw the current state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub state: InteractionState,
    /// Present only when `state` is `Succeeded`.
    pub response: Option<String>,
    pub sources: Vec<String>,
    /// Present only when `state` is `Failed`.
    pub error: Option<String>,
}

impl ViewSnapshot {
    pub fn is_submitting(&self) -> bool {
        self.state == InteractionState::Submitting
    }

    pub fn trigger_enabled(&self) -> bool {
        !self.is_submitting()
    }

    pub fn trigger_label(&self) -> &'static str {
        if self.is_submitting() {
            LOADING_LABEL
        } else {
            SUBMIT_LABEL
        }
    }
}

/// Why `submit()` did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("query text is empty")]
    EmptyQuery,
    #[error("a query is already in flight")]
    InFlight,
}

#[derive(Debug, Default)]
struct Interaction {
    query_text: String,
    state: InteractionState,
    answer: Option<QueryResponse>,
    error: Option<&'static str>,
}

impl Interaction {
    fn view(&self) -> ViewSnapshot {
        ViewSnapshot {
            state: self.state,
            response: self.answer.as_ref().map(|a| a.response.clone()),
            sources: self
                .answer
                .as_ref()
                .map(|a| a.sources.clone())
                .unwrap_or_default(),
            error: self.error.map(str::to_string),
        }
    }
}

struct Shared {
    backend: Arc<dyn QueryBackend>,
    interaction: Mutex<Interaction>,
    views: watch::Sender<ViewSnapshot>,
}

/// Drives one-request-at-a-time interaction with a [`QueryBackend`].
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct QueryInteractionController {
    shared: Arc<Shared>,
}

impl QueryInteractionController {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        let (views, _) = watch::channel(ViewSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                backend,
                interaction: Mutex::new(Interaction::default()),
                views,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Interaction> {
        self.shared
            .interaction
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update_query_text(&self, text: impl Into<String>) {
        self.lock().query_text = text.into();
    }

    pub fn query_text(&self) -> String {
        self.lock().query_text.clone()
    }

    pub fn state(&self) -> InteractionState {
        self.lock().state
    }

    pub fn current_view(&self) -> ViewSnapshot {
        self.lock().view()
    }

    /// Receiver that always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.shared.views.subscribe()
    }

    /// Enter `Submitting` and hand back the pending call.
    ///
    /// The transition and the cleared response/error are published before this
    /// returns, so they are visible before anything is sent.
    pub fn begin_submit(&self) -> Result<Submission, SubmitRejected> {
        let mut interaction = self.lock();
        if interaction.query_text.is_empty() {
            return Err(SubmitRejected::EmptyQuery);
        }
        if interaction.state == InteractionState::Submitting {
            return Err(SubmitRejected::InFlight);
        }

        interaction.state = InteractionState::Submitting;
        interaction.answer = None;
        interaction.error = None;
        self.shared.views.send_replace(interaction.view());

        debug!("query submitted");
        Ok(Submission {
            controller: self.clone(),
            query_text: interaction.query_text.clone(),
            settled: false,
        })
    }

    /// Submit the current query text and wait for the terminal state.
    pub async fn submit(&self) -> Result<InteractionState, SubmitRejected> {
        Ok(self.begin_submit()?.finish().await)
    }

    /// Submit on the tokio runtime; the `Submitting` transition has already
    /// happened when this returns.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime (see [`tokio::spawn`]). The
    /// panic happens after the transition, so the dropped submission leaves the
    /// controller in `Failed`.
    pub fn spawn_submit(&self) -> Result<JoinHandle<InteractionState>, SubmitRejected> {
        let submission = self.begin_submit()?;
        Ok(tokio::spawn(submission.finish()))
    }

    fn complete(&self, outcome: Result<QueryResponse, String>) -> InteractionState {
        let mut interaction = self.lock();
        if interaction.state != InteractionState::Submitting {
            debug!("discarding completion outside Submitting");
            return interaction.state;
        }

        match outcome {
            Ok(answer) => {
                info!(chars = answer.response.len(), "query succeeded");
                interaction.answer = Some(answer);
                interaction.error = None;
                interaction.state = InteractionState::Succeeded;
            }
            Err(cause) => {
                warn!(%cause, "query failed");
                interaction.answer = None;
                interaction.error = Some(QUERY_FAILED_MESSAGE);
                interaction.state = InteractionState::Failed;
            }
        }
        self.shared.views.send_replace(interaction.view());
        interaction.state
    }
}

/// An accepted submission whose outbound call has not completed yet.
///
/// Dropping it unfinished (cancellation, or a panic in the backend) settles the
/// controller in `Failed`.
pub struct Submission {
    controller: QueryInteractionController,
    query_text: String,
    settled: bool,
}

impl Submission {
    /// The query text captured when the submission was accepted.
    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    /// Issue the outbound call and apply the terminal transition.
    pub async fn finish(mut self) -> InteractionState {
        let backend = Arc::clone(&self.controller.shared.backend);
        let outcome = backend
            .ask(&self.query_text)
            .await
            .map_err(|e| e.to_string());
        self.settled = true;
        self.controller.complete(outcome)
    }
}

impl Drop for Submission {
    fn drop(&mut self) {
        if !self.settled {
            self.controller
                .complete(Err("query abandoned before completion".into()));
        }
    }
}
