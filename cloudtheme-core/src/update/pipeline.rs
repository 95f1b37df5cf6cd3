use std::{fmt, sync::Arc};

use cloudtheme_contracts::{
    media::{MediaFetcher, WallpaperData, WallpaperDataRequest},
    resources::ResourceCache,
    theme::{RemoteThemeFetcher, ThemeParser, WallpaperCache},
};
use cloudtheme_model::{
    CloudTheme, ImageRepresentation, PixelDimensions, RemoteTheme,
    ResolvedTheme, ThemeIdentity, ThemeObject, ThemeReference, Wallpaper,
    WallpaperFile,
};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::task::TaskGeneration;

/// Collaborators a resolution pipeline calls into.
#[derive(Clone)]
pub struct PipelineDeps {
    pub remote: Arc<dyn RemoteThemeFetcher>,
    pub resources: Arc<dyn ResourceCache>,
    pub wallpapers: Arc<dyn WallpaperCache>,
    pub media: Arc<dyn MediaFetcher>,
    pub parser: Arc<dyn ThemeParser>,
    pub preview_dimensions: PixelDimensions,
}

impl fmt::Debug for PipelineDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineDeps")
            .field("preview_dimensions", &self.preview_dimensions)
            .finish_non_exhaustive()
    }
}

/// A resolution delivered back to the reconciliation loop.
#[derive(Debug, Clone)]
pub struct PipelineEmission {
    pub identity: ThemeIdentity,
    pub generation: TaskGeneration,
    pub resolved: ResolvedTheme,
}

/// How a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineExit {
    /// Metadata updates stopped; whatever could be resolved was emitted.
    Done,
    Cancelled,
    /// The reconciliation loop is gone.
    Disconnected,
}

/// Steps of resolving one metadata value.
///
/// `FetchingMetadata` is driven by [`ResolutionPipeline::run`], which feeds
/// each metadata update into a fresh `FetchingResource` stage.
#[derive(Debug)]
enum Stage {
    FetchingResource {
        metadata: RemoteTheme,
    },
    Parsing {
        metadata: RemoteTheme,
        data: Vec<u8>,
    },
    ResolvingWallpaper {
        metadata: RemoteTheme,
        parsed: ThemeObject,
    },
    FetchingWallpaperImage {
        metadata: RemoteTheme,
        parsed: ThemeObject,
        wallpaper: WallpaperFile,
    },
    Emitting(ResolvedTheme),
    Done,
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::FetchingResource { .. } => "fetching_resource",
            Stage::Parsing { .. } => "parsing",
            Stage::ResolvingWallpaper { .. } => "resolving_wallpaper",
            Stage::FetchingWallpaperImage { .. } => "fetching_wallpaper_image",
            Stage::Emitting(_) => "emitting",
            Stage::Done => "done",
        }
    }

    async fn advance(self, deps: &PipelineDeps) -> Stage {
        match self {
            Stage::FetchingResource { metadata } => {
                let Some(file) = &metadata.file else {
                    debug!(target: "theme::pipeline", theme = metadata.id, "remote theme has no file");
                    return Stage::Done;
                };
                match deps.resources.fetch(&file.resource).await {
                    Some(data) => Stage::Parsing { metadata, data },
                    None => {
                        debug!(target: "theme::pipeline", theme = metadata.id, resource = %file.resource, "theme data unavailable");
                        Stage::Done
                    }
                }
            }
            Stage::Parsing { metadata, data } => {
                match deps.parser.parse(&data) {
                    Some(parsed) => Stage::ResolvingWallpaper { metadata, parsed },
                    None => {
                        debug!(target: "theme::pipeline", theme = metadata.id, bytes = data.len(), "theme data failed to parse");
                        Stage::Done
                    }
                }
            }
            Stage::ResolvingWallpaper { metadata, parsed } => {
                let resolved = match parsed.default_wallpaper.unresolved_slug() {
                    Some(slug) => deps.wallpapers.lookup_by_slug(slug).await,
                    None => None,
                };
                match resolved {
                    Some(Wallpaper::File(wallpaper)) => {
                        Stage::FetchingWallpaperImage {
                            metadata,
                            parsed,
                            wallpaper,
                        }
                    }
                    other => Stage::Emitting(resolved_theme(metadata, other, parsed)),
                }
            }
            Stage::FetchingWallpaperImage {
                metadata,
                parsed,
                wallpaper,
            } => {
                let resource = wallpaper.resource().clone();
                let request = WallpaperDataRequest {
                    file: wallpaper.file.clone(),
                    representations: vec![ImageRepresentation {
                        dimensions: deps.preview_dimensions,
                        resource: resource.clone(),
                    }],
                    only_full_size: true,
                    auto_fetch_full_size: true,
                };
                let full_size = deps
                    .media
                    .fetch_full_size(request)
                    .filter_map(|data: WallpaperData| async move {
                        data.into_complete_full_size()
                    })
                    .boxed()
                    .next()
                    .await;

                match full_size {
                    Some(data) => {
                        deps.resources.store(&resource, data).await;
                        Stage::Emitting(resolved_theme(
                            metadata,
                            Some(Wallpaper::File(wallpaper)),
                            parsed,
                        ))
                    }
                    None => {
                        debug!(target: "theme::pipeline", theme = metadata.id, resource = %resource, "wallpaper download did not complete");
                        Stage::Done
                    }
                }
            }
            terminal @ (Stage::Emitting(_) | Stage::Done) => terminal,
        }
    }
}

fn resolved_theme(
    metadata: RemoteTheme,
    resolved_wallpaper: Option<Wallpaper>,
    parsed: ThemeObject,
) -> ResolvedTheme {
    ResolvedTheme {
        updated_reference: ThemeReference::Cloud(CloudTheme {
            theme: metadata,
            resolved_wallpaper,
        }),
        parsed_theme: Some(parsed),
    }
}

/// Runs the stages for one metadata value. `None` is a quiet stop.
async fn resolve(
    deps: &PipelineDeps,
    identity: ThemeIdentity,
    metadata: RemoteTheme,
) -> Option<ResolvedTheme> {
    let mut stage = Stage::FetchingResource { metadata };
    loop {
        trace!(target: "theme::pipeline", identity = %identity, stage = stage.name(), "pipeline stage");
        stage = match stage {
            Stage::Emitting(resolved) => return Some(resolved),
            Stage::Done => return None,
            pending => pending.advance(deps).await,
        };
    }
}

enum Step {
    Resolved(Option<ResolvedTheme>),
    Update(Option<RemoteTheme>),
}

/// Resolution pipeline for one cloud theme identity.
#[derive(Debug)]
pub struct ResolutionPipeline {
    identity: ThemeIdentity,
    generation: TaskGeneration,
    theme: RemoteTheme,
    deps: Arc<PipelineDeps>,
    cancel: CancellationToken,
}

impl ResolutionPipeline {
    pub fn new(
        identity: ThemeIdentity,
        generation: TaskGeneration,
        cloud: &CloudTheme,
        deps: Arc<PipelineDeps>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            identity,
            generation,
            theme: cloud.theme.clone(),
            deps,
            cancel,
        }
    }

    /// Drives the pipeline until metadata updates stop or the task is
    /// cancelled, sending each resolution to `emissions`.
    pub async fn run(
        self,
        emissions: mpsc::Sender<PipelineEmission>,
    ) -> PipelineExit {
        let cancel = self.cancel.clone();
        let identity = self.identity;
        let exit = tokio::select! {
            biased;
            _ = cancel.cancelled() => PipelineExit::Cancelled,
            exit = self.drive(&emissions) => exit,
        };
        debug!(target: "theme::pipeline", identity = %identity, exit = ?exit, "pipeline finished");
        exit
    }

    /// Each metadata update supersedes the resolution still running for the
    /// previous one. Once updates end, the last resolution runs to completion.
    async fn drive(
        &self,
        emissions: &mpsc::Sender<PipelineEmission>,
    ) -> PipelineExit {
        trace!(target: "theme::pipeline", identity = %self.identity, stage = "fetching_metadata", "pipeline stage");
        let mut updates = self.deps.remote.actualize(&self.theme);
        let Some(mut metadata) = updates.next().await else {
            debug!(target: "theme::pipeline", identity = %self.identity, "no remote metadata");
            return PipelineExit::Done;
        };
        let mut updates_open = true;

        loop {
            let resolution = resolve(&self.deps, self.identity, metadata);
            tokio::pin!(resolution);

            let superseded = loop {
                let step = tokio::select! {
                    resolved = &mut resolution => Step::Resolved(resolved),
                    update = updates.next(), if updates_open => Step::Update(update),
                };
                match step {
                    Step::Resolved(resolved) => {
                        if let Some(resolved) = resolved
                            && !self.emit(emissions, resolved).await
                        {
                            return PipelineExit::Disconnected;
                        }
                        break None;
                    }
                    Step::Update(Some(newer)) => {
                        trace!(target: "theme::pipeline", identity = %self.identity, "metadata superseded");
                        break Some(newer);
                    }
                    Step::Update(None) => updates_open = false,
                }
            };

            let next = match superseded {
                Some(newer) => Some(newer),
                None if updates_open => updates.next().await,
                None => None,
            };
            match next {
                Some(newer) => metadata = newer,
                None => return PipelineExit::Done,
            }
        }
    }

    async fn emit(
        &self,
        emissions: &mpsc::Sender<PipelineEmission>,
        resolved: ResolvedTheme,
    ) -> bool {
        if self.cancel.is_cancelled() {
            return true;
        }
        emissions
            .send(PipelineEmission {
                identity: self.identity,
                generation: self.generation,
                resolved,
            })
            .await
            .is_ok()
    }
}
