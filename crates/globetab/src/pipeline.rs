//! The three-phase pipeline the deployment host drives.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use globetab_autoscale::SynthesisError;
use globetab_config::{RegionId, ReplicationConfig, RetryPolicy, SubstitutionMode};
use globetab_provider::TableService;
use globetab_reconcile::{ReconcileError, Reconciler, WorkUnit};
use globetab_substitute::{SubstituteError, SubstitutionEngine};
use globetab_template::TemplateDocument;

/// Result type alias for pipeline phases.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// A phase failure. Each wraps the failing component's error unchanged;
/// the host must report the overall operation as failed when any phase
/// returns one of these.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Substitute(#[from] SubstituteError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Runs the replication phases for one deployment region.
///
/// Collaborators are explicit: the control-plane client, the local
/// region, and the substitution policy are injected here, never read
/// from ambient context.
pub struct Pipeline {
    local_region: RegionId,
    engine: SubstitutionEngine,
    reconciler: Reconciler,
}

impl Pipeline {
    /// New pipeline with the default substitution policy and the
    /// env-tunable retry budget.
    pub fn new(client: Arc<dyn TableService>, local_region: impl Into<RegionId>) -> Self {
        Self {
            local_region: local_region.into(),
            engine: SubstitutionEngine::new(Arc::clone(&client)),
            reconciler: Reconciler::new(client),
        }
    }

    pub fn with_substitution_mode(mut self, mode: SubstitutionMode) -> Self {
        self.engine = self.engine.with_mode(mode);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.engine = self.engine.with_retry_policy(retry);
        self
    }

    /// Phase 1, during template preparation: resolve table identities and
    /// rewrite placeholders in the document.
    pub async fn prepare_template(
        &self,
        cfg: Option<&ReplicationConfig>,
        doc: &mut TemplateDocument,
    ) -> PipelineResult<()> {
        self.engine
            .resolve_and_substitute(cfg, &self.local_region, doc)
            .await?;
        Ok(())
    }

    /// Phase 2, during template compilation: synthesize autoscaling
    /// resources and merge them (additively) into the resource graph.
    pub fn compile_artifacts(
        &self,
        cfg: Option<&ReplicationConfig>,
        doc: &mut TemplateDocument,
    ) -> PipelineResult<()> {
        let fragment = globetab_autoscale::synthesize(cfg, &self.local_region, doc)?;
        if !fragment.is_empty() {
            info!(resources = fragment.len(), "merging autoscaling resources");
            doc.merge_resources(fragment);
        }
        Ok(())
    }

    /// Phase 3, after the deployment has been applied: converge replica
    /// regions. Returns the per-table work units for reporting.
    pub async fn post_deploy(
        &self,
        cfg: Option<&ReplicationConfig>,
        doc: &TemplateDocument,
    ) -> PipelineResult<Vec<WorkUnit>> {
        let units = self
            .reconciler
            .reconcile(cfg, &self.local_region, doc)
            .await?;
        Ok(units)
    }
}
