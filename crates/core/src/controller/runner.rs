//! Executing controller effects against a [`RegistryApi`].
//!
//! [`spawn_effect`] runs each call as its own tokio task and reports back over a channel, which
//! is what the interactive console uses. [`Session`] runs effects one after another until the
//! controller is idle; the one-shot CLI and the tests drive the controller through it.

use super::{Completion, Effect, Event, Output, RenderCommand, UiEvent, ViewController};
use crate::api::RegistryApi;
use crate::config::ClientConfig;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Performs one effect and wraps its outcome for the controller.
pub async fn perform<A: RegistryApi>(api: &A, effect: Effect) -> Completion {
    tracing::debug!(effect = effect.name(), "performing effect");
    match effect {
        Effect::FetchList { seq, query } => Completion::ListLoaded {
            seq,
            result: api.list_patients(&query).await,
        },
        Effect::FetchStats { seq } => Completion::StatsLoaded {
            seq,
            result: api.stats().await,
        },
        Effect::FetchPatient(id) => Completion::PatientLoaded {
            id,
            result: api.get_patient(id).await,
        },
        Effect::CreatePatient(payload) => Completion::Created(api.create_patient(&payload).await),
        Effect::UpdatePatient { id, payload } => Completion::Updated {
            id,
            result: api.update_patient(id, &payload).await,
        },
        Effect::DeletePatient(id) => Completion::Deleted {
            id,
            result: api.delete_patient(id).await,
        },
    }
}

/// Runs `effect` on its own task and sends the completion to `completions`.
pub fn spawn_effect<A>(
    api: Arc<A>,
    effect: Effect,
    completions: mpsc::UnboundedSender<Completion>,
) -> JoinHandle<()>
where
    A: RegistryApi + 'static,
{
    tokio::spawn(async move {
        let completion = perform(api.as_ref(), effect).await;
        if completions.send(completion).is_err() {
            tracing::debug!("completion dropped; event loop has shut down");
        }
    })
}

/// A controller paired with an API, draining every effect before returning.
pub struct Session<A> {
    api: A,
    controller: ViewController,
}

impl<A: RegistryApi> Session<A> {
    pub fn new(api: A, config: &ClientConfig) -> Self {
        Self {
            api,
            controller: ViewController::new(config),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn controller(&self) -> &ViewController {
        &self.controller
    }

    /// Dispatches `event` and runs the resulting effects, and any they trigger, to completion.
    ///
    /// # Returns
    /// Every render command produced along the way, in order.
    pub async fn dispatch(&mut self, event: UiEvent) -> Vec<RenderCommand> {
        let output = self.controller.dispatch(Event::Ui(event));
        self.drain(output).await
    }

    /// Fires the debounced name search if it is due at `now`.
    pub async fn poll_search(&mut self, now: Instant) -> Vec<RenderCommand> {
        let output = self.controller.poll_search(now);
        self.drain(output).await
    }

    async fn drain(&mut self, output: Output) -> Vec<RenderCommand> {
        let Output { effects, mut renders } = output;
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            let completion = perform(&self.api, effect).await;
            let next = self.controller.dispatch(Event::Done(completion));
            renders.extend(next.renders);
            queue.extend(next.effects);
        }
        renders
    }
}
