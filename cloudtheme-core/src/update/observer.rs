use std::{fmt, sync::Arc};

use cloudtheme_contracts::settings::SettingsStore;
use cloudtheme_model::{SharedThemeSettings, ThemeIdentity};
use futures::{StreamExt, stream::BoxStream};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::{
    merge::spawn_persist,
    pipeline::{PipelineDeps, PipelineEmission, ResolutionPipeline},
    registry::TaskRegistry,
    task::{ResolutionTask, TaskGeneration, TaskSeed},
};

/// The serial context: owns the registry and every task's current reference.
///
/// Settings snapshots and pipeline emissions are handled one at a time on
/// this loop, so none of that state needs a lock.
pub(crate) struct ReconcileLoop {
    registry: TaskRegistry,
    deps: Arc<PipelineDeps>,
    store: Arc<dyn SettingsStore>,
    emissions_tx: mpsc::Sender<PipelineEmission>,
    shutdown: CancellationToken,
    next_generation: TaskGeneration,
    active: watch::Sender<Vec<ThemeIdentity>>,
}

impl fmt::Debug for ReconcileLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconcileLoop")
            .field("tasks", &self.registry.len())
            .field("next_generation", &self.next_generation)
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl ReconcileLoop {
    pub(crate) fn new(
        deps: Arc<PipelineDeps>,
        store: Arc<dyn SettingsStore>,
        emissions_tx: mpsc::Sender<PipelineEmission>,
        shutdown: CancellationToken,
        active: watch::Sender<Vec<ThemeIdentity>>,
    ) -> Self {
        Self {
            registry: TaskRegistry::new(),
            deps,
            store,
            emissions_tx,
            shutdown,
            next_generation: 0,
            active,
        }
    }

    /// Runs until the shutdown token fires, then cancels every task.
    pub(crate) async fn run(
        mut self,
        mut settings: BoxStream<'static, SharedThemeSettings>,
        mut emissions: mpsc::Receiver<PipelineEmission>,
    ) {
        info!(target: "theme::observer", "theme update loop started");
        let shutdown = self.shutdown.clone();
        let mut settings_open = true;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(emission) = emissions.recv() => {
                    self.on_emission(emission);
                }
                next = settings.next(), if settings_open => match next {
                    Some(snapshot) => self.on_settings(snapshot),
                    None => {
                        info!(target: "theme::observer", "settings stream ended");
                        settings_open = false;
                    }
                },
            }
        }

        drop(settings);
        self.registry.clear();
        self.publish_active();
        info!(target: "theme::observer", "theme update loop stopped");
    }

    fn on_settings(&mut self, snapshot: SharedThemeSettings) {
        trace!(target: "theme::observer", theme = %snapshot.theme.identity(), "settings snapshot");

        let deps = &self.deps;
        let emissions = &self.emissions_tx;
        let shutdown = &self.shutdown;
        let next_generation = &mut self.next_generation;

        let outcome = self.registry.reconcile(snapshot, |seed| {
            *next_generation += 1;
            start_task(seed, *next_generation, deps, emissions, shutdown)
        });

        if !outcome.is_unchanged() {
            debug!(target: "theme::observer", started = outcome.started.len(), stopped = outcome.stopped.len(), "registry reconciled");
            self.publish_active();
        }
    }

    fn on_emission(&mut self, emission: PipelineEmission) {
        let PipelineEmission {
            identity,
            generation,
            resolved,
        } = emission;

        let Some(task) = self.registry.get_mut(&identity) else {
            debug!(target: "theme::observer", identity = %identity, "dropping emission for removed task");
            return;
        };
        if task.generation() != generation || task.is_cancelled() {
            debug!(target: "theme::observer", identity = %identity, generation, current = task.generation(), "dropping stale emission");
            return;
        }
        if !task.accept(&resolved.updated_reference) {
            trace!(target: "theme::observer", identity = %identity, "resolution unchanged");
            return;
        }

        spawn_persist(
            self.store.clone(),
            identity,
            resolved,
            task.child_token(),
        );
    }

    fn publish_active(&self) {
        self.active.send_replace(self.registry.identities());
    }
}

fn start_task(
    seed: &TaskSeed,
    generation: TaskGeneration,
    deps: &Arc<PipelineDeps>,
    emissions: &mpsc::Sender<PipelineEmission>,
    shutdown: &CancellationToken,
) -> ResolutionTask {
    let cancel = shutdown.child_token();
    let pipeline = ResolutionPipeline::new(
        seed.identity,
        generation,
        &seed.cloud,
        deps.clone(),
        cancel.clone(),
    );
    let emissions = emissions.clone();
    let handle = tokio::spawn(async move {
        pipeline.run(emissions).await;
    });
    ResolutionTask::new(seed, generation, cancel).with_handle(handle)
}
