use std::collections::{BTreeMap, BTreeSet, HashMap};

use cloudtheme_model::{SharedThemeSettings, ThemeIdentity};
use tracing::{debug, info};

use super::task::{ResolutionTask, TaskSeed};

/// What a reconciliation pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub started: Vec<ThemeIdentity>,
    pub stopped: Vec<ThemeIdentity>,
}

impl ReconcileOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.started.is_empty() && self.stopped.is_empty()
    }
}

/// Themes in `settings` that need a resolution task, keyed by identity.
///
/// Only the selected theme is tracked and only when it is a cloud theme.
pub fn active_themes(
    settings: &SharedThemeSettings,
) -> BTreeMap<ThemeIdentity, TaskSeed> {
    let mut themes = BTreeMap::new();
    if let Some(cloud) = settings.theme.as_cloud() {
        let identity = settings.theme.identity();
        themes.insert(
            identity,
            TaskSeed {
                identity,
                reference: settings.theme.clone(),
                cloud: cloud.clone(),
                is_auto_night: false,
            },
        );
    }
    themes
}

/// Resolution tasks keyed by theme identity, plus the snapshot the last
/// reconciliation saw.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<ThemeIdentity, ResolutionTask>,
    previous: Option<SharedThemeSettings>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings the registry in line with `settings`.
    ///
    /// Lifecycle is driven by identity alone: a task whose identity stays
    /// active keeps running even if the rest of its reference changed.
    /// `start` is called once for every identity that needs a new task.
    pub fn reconcile<F>(
        &mut self,
        settings: SharedThemeSettings,
        mut start: F,
    ) -> ReconcileOutcome
    where
        F: FnMut(&TaskSeed) -> ResolutionTask,
    {
        let previous_ids: BTreeSet<ThemeIdentity> = self
            .previous
            .as_ref()
            .map(|previous| active_themes(previous).into_keys().collect())
            .unwrap_or_default();
        let themes = active_themes(&settings);
        let valid_ids: BTreeSet<ThemeIdentity> = themes.keys().copied().collect();
        self.previous = Some(settings);

        let mut outcome = ReconcileOutcome::default();
        if previous_ids == valid_ids {
            return outcome;
        }

        for (identity, seed) in &themes {
            if self.tasks.contains_key(identity) {
                continue;
            }
            info!(target: "theme::registry", identity = %identity, is_auto_night = seed.is_auto_night, "starting theme resolution");
            self.tasks.insert(*identity, start(seed));
            outcome.started.push(*identity);
        }

        for identity in previous_ids.difference(&valid_ids) {
            if self.remove(identity) {
                outcome.stopped.push(*identity);
            }
        }

        outcome
    }

    /// Cancels and drops the task for `identity`.
    pub fn remove(&mut self, identity: &ThemeIdentity) -> bool {
        match self.tasks.remove(identity) {
            Some(task) => {
                task.cancel();
                info!(target: "theme::registry", identity = %identity, generation = task.generation(), finished = task.is_finished(), "stopped theme resolution");
                true
            }
            None => false,
        }
    }

    pub fn get_mut(
        &mut self,
        identity: &ThemeIdentity,
    ) -> Option<&mut ResolutionTask> {
        self.tasks.get_mut(identity)
    }

    pub fn identities(&self) -> Vec<ThemeIdentity> {
        let mut identities: Vec<_> = self.tasks.keys().copied().collect();
        identities.sort();
        identities
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Cancels every task. Used on teardown.
    pub fn clear(&mut self) {
        for (identity, task) in self.tasks.drain() {
            task.cancel();
            debug!(target: "theme::registry", identity = %identity, "cancelled on teardown");
        }
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudtheme_model::{
        BuiltinTheme, CloudTheme, RemoteTheme, ThemeReference, Wallpaper,
    };
    use tokio_util::sync::CancellationToken;

    fn cloud_settings(id: i64) -> SharedThemeSettings {
        SharedThemeSettings {
            theme: ThemeReference::Cloud(CloudTheme::new(RemoteTheme {
                id,
                access_hash: id * 10,
                slug: format!("theme-{id}"),
                title: format!("Theme {id}"),
                file: None,
                is_creator: false,
                is_default: false,
                install_count: 0,
            })),
            ..SharedThemeSettings::default()
        }
    }

    /// Records started seeds and hands out tasks whose tokens the test keeps.
    #[derive(Default)]
    struct Starter {
        started: Vec<ThemeIdentity>,
        tokens: Vec<(ThemeIdentity, CancellationToken)>,
    }

    impl Starter {
        fn start(&mut self, seed: &TaskSeed) -> ResolutionTask {
            let token = CancellationToken::new();
            self.started.push(seed.identity);
            self.tokens.push((seed.identity, token.clone()));
            ResolutionTask::new(seed, self.started.len() as u64, token)
        }

        fn token(&self, identity: ThemeIdentity) -> &CancellationToken {
            &self
                .tokens
                .iter()
                .find(|(id, _)| *id == identity)
                .expect("task was started")
                .1
        }
    }

    #[test]
    fn builtin_selection_starts_nothing() {
        let mut registry = TaskRegistry::new();
        let mut starter = Starter::default();

        let outcome = registry
            .reconcile(SharedThemeSettings::default(), |seed| starter.start(seed));

        assert!(outcome.is_unchanged());
        assert!(registry.is_empty());
        assert!(starter.started.is_empty());
    }

    #[test]
    fn repeated_identity_keeps_the_running_task() {
        let mut registry = TaskRegistry::new();
        let mut starter = Starter::default();

        registry.reconcile(cloud_settings(42), |seed| starter.start(seed));
        let mut unrelated_change = cloud_settings(42);
        unrelated_change.large_emoji = false;
        let outcome =
            registry.reconcile(unrelated_change, |seed| starter.start(seed));

        assert!(outcome.is_unchanged());
        assert_eq!(starter.started, vec![ThemeIdentity::cloud(42)]);
        assert!(!starter.token(ThemeIdentity::cloud(42)).is_cancelled());
    }

    #[test]
    fn changed_reference_with_same_identity_is_not_restarted() {
        let mut registry = TaskRegistry::new();
        let mut starter = Starter::default();

        registry.reconcile(cloud_settings(42), |seed| starter.start(seed));
        let mut resolved = cloud_settings(42);
        if let ThemeReference::Cloud(cloud) = &mut resolved.theme {
            cloud.resolved_wallpaper = Some(Wallpaper::Color { color: 3 });
        }
        registry.reconcile(resolved, |seed| starter.start(seed));

        assert_eq!(starter.started.len(), 1);
        assert_eq!(registry.identities(), vec![ThemeIdentity::cloud(42)]);
    }

    #[test]
    fn switching_identity_cancels_the_old_task() {
        let mut registry = TaskRegistry::new();
        let mut starter = Starter::default();

        registry.reconcile(cloud_settings(42), |seed| starter.start(seed));
        let outcome =
            registry.reconcile(cloud_settings(7), |seed| starter.start(seed));

        assert_eq!(outcome.started, vec![ThemeIdentity::cloud(7)]);
        assert_eq!(outcome.stopped, vec![ThemeIdentity::cloud(42)]);
        assert!(starter.token(ThemeIdentity::cloud(42)).is_cancelled());
        assert!(!starter.token(ThemeIdentity::cloud(7)).is_cancelled());
        assert_eq!(registry.identities(), vec![ThemeIdentity::cloud(7)]);
    }

    #[test]
    fn leaving_cloud_empties_the_registry() {
        let mut registry = TaskRegistry::new();
        let mut starter = Starter::default();

        registry.reconcile(cloud_settings(42), |seed| starter.start(seed));
        let outcome = registry.reconcile(
            SharedThemeSettings {
                theme: ThemeReference::Builtin {
                    theme: BuiltinTheme::Night,
                },
                ..SharedThemeSettings::default()
            },
            |seed| starter.start(seed),
        );

        assert_eq!(outcome.stopped, vec![ThemeIdentity::cloud(42)]);
        assert!(registry.is_empty());
    }

    #[test]
    fn key_set_tracks_latest_snapshot_over_a_sequence() {
        let mut registry = TaskRegistry::new();
        let mut starter = Starter::default();
        let sequence = [
            Some(42),
            Some(42),
            None,
            Some(7),
            Some(42),
            Some(42),
            None,
            None,
        ];

        for selection in sequence {
            let settings = selection
                .map(cloud_settings)
                .unwrap_or_default();
            registry.reconcile(settings, |seed| starter.start(seed));

            let expected: Vec<_> =
                selection.map(ThemeIdentity::cloud).into_iter().collect();
            assert_eq!(registry.identities(), expected);
        }
        assert_eq!(starter.started.len(), 3);
    }

    #[test]
    fn clear_cancels_everything() {
        let mut registry = TaskRegistry::new();
        let mut starter = Starter::default();

        registry.reconcile(cloud_settings(42), |seed| starter.start(seed));
        registry.clear();

        assert!(registry.is_empty());
        assert!(starter.token(ThemeIdentity::cloud(42)).is_cancelled());
    }
}
