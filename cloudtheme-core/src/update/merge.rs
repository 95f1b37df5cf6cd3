use std::sync::Arc;

use cloudtheme_contracts::settings::SettingsStore;
use cloudtheme_model::{ResolvedTheme, SharedThemeSettings, ThemeIdentity, Wallpaper};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Chat wallpaper to persist for `resolved`, in priority order: the user's
/// override for this theme, the wallpaper resolved for the cloud theme, the
/// parsed theme's default, and finally whatever is stored already.
pub fn chat_wallpaper_for(
    current: &SharedThemeSettings,
    resolved: &ResolvedTheme,
) -> Wallpaper {
    let identity = resolved.updated_reference.identity();
    if let Some(wallpaper) = current.chat_wallpaper_override(&identity) {
        return wallpaper.clone();
    }
    if let Some(wallpaper) = resolved
        .updated_reference
        .as_cloud()
        .and_then(|cloud| cloud.resolved_wallpaper.as_ref())
    {
        return wallpaper.clone();
    }
    if let Some(theme) = &resolved.parsed_theme {
        return theme.default_wallpaper.clone();
    }
    current.chat_wallpaper.clone()
}

/// New settings value with only the theme and chat wallpaper replaced.
pub fn merge_resolved(
    current: Option<SharedThemeSettings>,
    resolved: &ResolvedTheme,
) -> SharedThemeSettings {
    let current = current.unwrap_or_default();
    let chat_wallpaper = chat_wallpaper_for(&current, resolved);
    current.with_theme(resolved.updated_reference.clone(), chat_wallpaper)
}

/// Merge of `resolved` into `current`, or `None` when the stored selection is
/// no longer the theme `identity` was resolved for. An empty store holds the
/// default builtin selection, so it never matches.
pub fn merge_for_selection(
    current: Option<SharedThemeSettings>,
    identity: ThemeIdentity,
    resolved: &ResolvedTheme,
) -> Option<SharedThemeSettings> {
    let selected = current.as_ref().map(|settings| settings.theme.identity())?;
    if selected != identity {
        return None;
    }
    Some(merge_resolved(current, resolved))
}

/// Writes `resolved` into the shared settings on a separate task.
///
/// The transaction is skipped if `cancel` fires before the store applies the
/// update, or if the user selected another theme since the task emitted, so
/// a torn-down or stale resolution never lands.
pub fn spawn_persist(
    store: Arc<dyn SettingsStore>,
    identity: ThemeIdentity,
    resolved: ResolvedTheme,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if cancel.is_cancelled() {
            debug!(target: "theme::merge", identity = %identity, "write skipped, task cancelled");
            return;
        }

        let guard = cancel.clone();
        let result = store
            .transaction(Box::new(move |current| {
                if guard.is_cancelled() {
                    return None;
                }
                let merged = merge_for_selection(current, identity, &resolved);
                if merged.is_none() {
                    debug!(target: "theme::merge", identity = %identity, "write skipped, selection changed");
                }
                merged
            }))
            .await;

        match result {
            Ok(()) => {
                debug!(target: "theme::merge", identity = %identity, "persisted resolved theme")
            }
            Err(err) => {
                warn!(target: "theme::merge", identity = %identity, error = %err, "failed to persist resolved theme")
            }
        }
    })
}
