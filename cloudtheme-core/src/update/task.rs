use cloudtheme_model::{CloudTheme, ThemeIdentity, ThemeReference};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Monotonic tag distinguishing successive tasks for the same identity.
pub type TaskGeneration = u64;

/// Everything needed to start resolving one active identity.
#[derive(Debug, Clone)]
pub struct TaskSeed {
    pub identity: ThemeIdentity,
    pub reference: ThemeReference,
    pub cloud: CloudTheme,
    pub is_auto_night: bool,
}

/// Registry entry owning one in-flight resolution pipeline.
///
/// Dropping the entry cancels the pipeline and any write it scheduled.
#[derive(Debug)]
pub struct ResolutionTask {
    identity: ThemeIdentity,
    generation: TaskGeneration,
    is_auto_night: bool,
    current_reference: ThemeReference,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ResolutionTask {
    pub fn new(
        seed: &TaskSeed,
        generation: TaskGeneration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            identity: seed.identity,
            generation,
            is_auto_night: seed.is_auto_night,
            current_reference: seed.reference.clone(),
            cancel,
            handle: None,
        }
    }

    pub fn with_handle(mut self, handle: JoinHandle<()>) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn identity(&self) -> ThemeIdentity {
        self.identity
    }

    pub fn generation(&self) -> TaskGeneration {
        self.generation
    }

    pub fn is_auto_night(&self) -> bool {
        self.is_auto_night
    }

    pub fn current_reference(&self) -> &ThemeReference {
        &self.current_reference
    }

    /// Whether the spawned pipeline has already returned.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token for work spawned on behalf of this task.
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Records `updated` as the latest resolution. Returns `false` when it
    /// matches what this task already holds, so no write is needed.
    pub fn accept(&mut self, updated: &ThemeReference) -> bool {
        if &self.current_reference == updated {
            return false;
        }
        self.current_reference = updated.clone();
        true
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ResolutionTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
