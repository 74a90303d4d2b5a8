//! Pipeline - the sequential driver over every stage.
//!
//! The pipeline owns the weighted progress model and the only piece of
//! shared state: its [`PipelineState`]. Stages run strictly in order on the
//! calling task; fan-out happens inside a stage and reports back here.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use provis_fetch::{CancellationToken, HttpClient};
use provis_manifest::{VersionDescriptor, VersionIndex};

use crate::addons::{self, AddonDescriptor, AddonReport};
use crate::assets::{self, AssetsSummary};
use crate::context::check_cancelled;
use crate::libraries::{self, BatchSummary};
use crate::loader::{self, ProfileSource};
use crate::natives::{self, NativesSummary};
use crate::progress::{ProgressSink, Reporter, Stage};
use crate::{Context, InstallError, InstallerConfig, Result, manifest};

/// Result of a stage that may find its work already done.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageOutcome<T> {
    AlreadySatisfied,
    Done(T),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Resolving,
    FetchingLibraries,
    ExtractingNatives,
    SyncingAssets,
    InstallingLoader,
    InstallingAddons,
    Complete,
    Failed,
}

impl Phase {
    /// Whether an install is running in this phase.
    pub fn is_active(self) -> bool {
        !matches!(self, Phase::Idle | Phase::Complete | Phase::Failed)
    }
}

/// Observable state of a pipeline, updated as stages run.
#[derive(Clone, Debug, Default)]
pub struct PipelineState {
    pub phase: Phase,
    pub completed: BTreeSet<Stage>,
    pub progress: f64,
    pub last_status: String,
}

/// Summary of one successful install. Best-effort failures only show up
/// here, as counts and names.
#[derive(Clone, Debug)]
pub struct InstallReport {
    pub version: String,
    pub loader: Option<String>,
    pub loader_source: Option<ProfileSource>,
    pub client_downloaded: bool,
    pub libraries: BatchSummary,
    pub natives: StageOutcome<NativesSummary>,
    pub assets: AssetsSummary,
    pub addons: AddonReport,
}

/// Sequential driver over every stage, owning one installation root.
///
/// At most one install runs at a time per pipeline.
pub struct Pipeline<C: HttpClient> {
    ctx: Context<C>,
    state: Mutex<PipelineState>,
}

impl<C: HttpClient> Pipeline<C> {
    /// A pipeline over `client` installing into `root`.
    pub fn new(client: C, config: InstallerConfig, root: impl AsRef<Path>) -> Self {
        Self {
            ctx: Context::new(client, config, root),
            state: Mutex::new(PipelineState::default()),
        }
    }

    /// Shared stage context.
    pub fn context(&self) -> &Context<C> {
        &self.ctx
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PipelineState {
        lock(&self.state).clone()
    }

    /// The remote version index.
    pub async fn versions(&self) -> Result<VersionIndex> {
        manifest::fetch_index(&self.ctx).await
    }

    /// [`install_with`](Self::install_with) without cancellation.
    pub async fn install(&self, version_id: &str, sink: &dyn ProgressSink) -> Result<InstallReport> {
        self.install_with(version_id, sink, &CancellationToken::new()).await
    }

    /// Run every stage for `version_id`.
    ///
    /// Rejected with [`InstallError::AlreadyInProgress`] while another
    /// install on this pipeline is running.
    pub async fn install_with(
        &self,
        version_id: &str,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<InstallReport> {
        let guard = self.begin()?;
        let tracked = TrackedSink {
            inner: sink,
            state: &self.state,
        };
        let mut reporter = Reporter::new(&tracked);

        let result = self.run(version_id, &guard, &mut reporter, cancel).await;
        match &result {
            Ok(report) => {
                tracing::info!(version = %report.version, loader = ?report.loader, "installation complete");
                guard.finish(Phase::Complete);
                reporter.status("Installation complete");
                reporter.complete();
            }
            Err(e) => {
                tracing::error!(version = version_id, error = %e, "installation failed");
                guard.finish(Phase::Failed);
                reporter.status(&format!("Installation failed: {e}"));
            }
        }

        result
    }

    /// Classpath of an installed version, including its loader overlay
    /// when one is installed.
    pub fn classpath(&self, version_id: &str) -> Result<Vec<PathBuf>> {
        let base = manifest::load_local(&self.ctx.layout, version_id)?.ok_or_else(|| InstallError::NotFound {
            what: "installed version",
            id: version_id.to_string(),
        })?;
        let loader_id = loader::loader_id(&self.ctx.config.loader_version, version_id);
        let descriptor = match manifest::load_local(&self.ctx.layout, &loader_id)? {
            Some(overlay) => overlay.merge_onto(&base),
            None => base,
        };
        libraries::resolve_classpath(&self.ctx, &descriptor)
    }

    pub(crate) fn begin(&self) -> Result<InstallGuard<'_>> {
        let mut state = lock(&self.state);
        if state.phase.is_active() {
            return Err(InstallError::AlreadyInProgress);
        }
        *state = PipelineState {
            phase: Phase::Resolving,
            ..Default::default()
        };
        Ok(InstallGuard {
            state: &self.state,
            finished: false,
        })
    }

    async fn run(
        &self,
        version_id: &str,
        guard: &InstallGuard<'_>,
        reporter: &mut Reporter<'_>,
        cancel: &CancellationToken,
    ) -> Result<InstallReport> {
        let ctx = &self.ctx;

        reporter.enter(Stage::Resolve);
        reporter.status(&format!("Resolving {version_id}"));
        let base = resolve_base(ctx, version_id).await?;
        guard.complete(Stage::Resolve);
        reporter.finish_stage();
        check_cancelled(cancel)?;

        guard.transition(Phase::FetchingLibraries);
        reporter.enter(Stage::Libraries);
        reporter.status("Downloading client");
        let client_downloaded = matches!(libraries::download_client(ctx, &base).await?, StageOutcome::Done(_));
        let resolution = libraries::resolve(ctx, &base.libraries)?;
        let mut library_summary = BatchSummary {
            failed: resolution.invalid,
            ..Default::default()
        };
        library_summary.absorb(libraries::download(ctx, resolution.pending, reporter, cancel).await?);
        guard.complete(Stage::Libraries);
        reporter.finish_stage();

        guard.transition(Phase::ExtractingNatives);
        reporter.enter(Stage::Natives);
        reporter.status("Extracting natives");
        let natives = natives::extract(ctx, &base.libraries, reporter, cancel).await?;
        guard.complete(Stage::Natives);
        reporter.finish_stage();

        guard.transition(Phase::SyncingAssets);
        reporter.enter(Stage::Assets);
        reporter.status("Downloading assets");
        let assets = match &base.asset_index {
            Some(index) => assets::sync(ctx, index, reporter, cancel).await?,
            None => {
                tracing::warn!(version = %base.id, "descriptor has no asset index");
                AssetsSummary::default()
            }
        };
        guard.complete(Stage::Assets);
        reporter.finish_stage();
        check_cancelled(cancel)?;

        guard.transition(Phase::InstallingLoader);
        reporter.enter(Stage::Loader);
        reporter.status("Installing loader");
        let loader = loader::install(ctx, &base, reporter, cancel).await?;
        library_summary.absorb(loader.libraries);
        guard.complete(Stage::Loader);
        reporter.finish_stage();

        guard.transition(Phase::InstallingAddons);
        reporter.enter(Stage::Addons);
        let wanted: Vec<_> = ctx.config.addon_slugs.iter().map(AddonDescriptor::new).collect();
        let addons = addons::install_all(ctx, &wanted, &base.id, ctx.config.essential_addons, cancel, |name, index, total| {
            reporter.count(index, total);
            if index < total {
                reporter.status(&format!("Installing {name}"));
            }
        })
        .await;
        check_cancelled(cancel)?;
        guard.complete(Stage::Addons);
        reporter.finish_stage();

        Ok(InstallReport {
            version: base.id,
            loader: Some(loader.id),
            loader_source: Some(loader.source),
            client_downloaded,
            libraries: library_summary,
            natives,
            assets,
            addons,
        })
    }
}

/// The local descriptor when one exists, the network otherwise.
async fn resolve_base<C: HttpClient>(ctx: &Context<C>, version_id: &str) -> Result<VersionDescriptor> {
    match manifest::load_local(&ctx.layout, version_id)? {
        Some(descriptor) => {
            tracing::debug!(version = version_id, "using installed descriptor");
            Ok(descriptor)
        }
        None => manifest::resolve(ctx, version_id).await,
    }
}

fn lock(state: &Mutex<PipelineState>) -> std::sync::MutexGuard<'_, PipelineState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks the pipeline busy for the lifetime of one install. Dropping it
/// without [`finish`](InstallGuard::finish), e.g. when the install future
/// is dropped, leaves the pipeline `Failed` rather than stuck.
pub(crate) struct InstallGuard<'a> {
    state: &'a Mutex<PipelineState>,
    finished: bool,
}

impl InstallGuard<'_> {
    fn transition(&self, phase: Phase) {
        tracing::debug!(?phase, "pipeline transition");
        lock(self.state).phase = phase;
    }

    fn complete(&self, stage: Stage) {
        lock(self.state).completed.insert(stage);
    }

    fn finish(mut self, phase: Phase) {
        lock(self.state).phase = phase;
        self.finished = true;
    }
}

impl Drop for InstallGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let mut state = lock(self.state);
            state.phase = Phase::Failed;
            state.last_status = "Installation interrupted".to_string();
        }
    }
}

/// Records progress into the pipeline state before forwarding it.
struct TrackedSink<'a> {
    inner: &'a dyn ProgressSink,
    state: &'a Mutex<PipelineState>,
}

impl ProgressSink for TrackedSink<'_> {
    fn progress(&self, fraction: f64) {
        lock(self.state).progress = fraction;
        self.inner.progress(fraction);
    }

    fn status(&self, message: &str) {
        lock(self.state).last_status = message.to_string();
        self.inner.status(message);
    }
}
