//! The substitution engine: concurrent lookups, then one rewrite pass.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use globetab_config::{ReplicationConfig, RetryPolicy, SubstitutionMode};
use globetab_provider::{with_retry, TableService};
use globetab_template::{apply_substitutions, ResolvedRefs, SubstitutionMap, TemplateDocument};

use crate::error::{SubstituteError, SubstituteResult};

/// Resolves deferred table identities and splices them into the template
/// document. All collaborators are explicit: the control-plane client,
/// the policy flag, and the retry budget are injected at construction.
pub struct SubstitutionEngine {
    client: Arc<dyn TableService>,
    mode: SubstitutionMode,
    retry: RetryPolicy,
}

impl SubstitutionEngine {
    /// New engine with the default policy (`RetryDescribe`) and the
    /// env-tunable retry budget.
    pub fn new(client: Arc<dyn TableService>) -> Self {
        Self {
            client,
            mode: SubstitutionMode::default(),
            retry: RetryPolicy::from_env(),
        }
    }

    pub fn with_mode(mut self, mode: SubstitutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Resolve ARNs for every replicated table and rewrite the document's
    /// placeholders in place.
    ///
    /// Per-table lookups run concurrently; the rewrite pass starts only
    /// after every lookup has settled, because it reads the complete map
    /// in one shot. Any lookup failure aborts the run, but sibling
    /// lookups already in flight still run to completion first.
    pub async fn resolve_and_substitute(
        &self,
        cfg: Option<&ReplicationConfig>,
        local_region: &str,
        doc: &mut TemplateDocument,
    ) -> SubstituteResult<()> {
        let Some(cfg) = cfg else {
            warn!("skipping table reference substitution: not configured");
            return Ok(());
        };
        let Some(primary_region) = cfg.primary_region.as_deref() else {
            warn!("skipping table reference substitution: no primary region");
            return Ok(());
        };
        if cfg.tables.is_empty() {
            warn!("skipping table reference substitution: no tables");
            return Ok(());
        }

        let mut map = SubstitutionMap::new();
        let mut lookups: Vec<(String, JoinHandle<SubstituteResult<ResolvedRefs>>)> = Vec::new();

        for table in cfg.replicated_tables() {
            let needs_lookup = match self.mode {
                SubstitutionMode::RetryDescribe => local_region != primary_region,
                SubstitutionMode::FallbackReference => {
                    table.add_regions.iter().any(|r| r == local_region)
                }
            };

            if !needs_lookup {
                info!(
                    table = %table.table,
                    region = local_region,
                    "using deferred resource references"
                );
                map.insert(table.table.clone(), ResolvedRefs::deferred());
                continue;
            }

            let table_name = doc.physical_table_name(&table.table)?;
            info!(
                table = %table.table,
                region = local_region,
                "retrieving table arns"
            );

            let client = Arc::clone(&self.client);
            let mode = self.mode;
            let retry = self.retry;
            let logical = table.table.clone();
            lookups.push((
                table.table.clone(),
                tokio::spawn(async move { lookup(client, mode, retry, logical, table_name).await }),
            ));
        }

        // Join every lookup before touching the document; the first
        // failure wins but does not cancel its siblings.
        let mut first_err = None;
        for (table, handle) in lookups {
            match handle.await {
                Ok(Ok(refs)) => {
                    map.insert(table, refs);
                }
                Ok(Err(err)) => {
                    error!(table = %table, error = %err, "arn resolution failed");
                    first_err.get_or_insert(err);
                }
                Err(join_err) => {
                    error!(table = %table, error = %join_err, "lookup task failed");
                    first_err.get_or_insert(SubstituteError::Task(join_err.to_string()));
                }
            }
        }
        if let Some(err) = first_err {
            return Err(err);
        }

        for replacement in apply_substitutions(doc, &map) {
            info!(
                section = %replacement.section,
                token = %replacement.token,
                "replaced placeholder"
            );
        }
        Ok(())
    }
}

async fn lookup(
    client: Arc<dyn TableService>,
    mode: SubstitutionMode,
    retry: RetryPolicy,
    logical: String,
    table_name: String,
) -> SubstituteResult<ResolvedRefs> {
    match mode {
        SubstitutionMode::RetryDescribe => {
            let desc = with_retry(retry, || client.describe_table(&table_name))
                .await
                .map_err(|source| SubstituteError::Lookup {
                    table: logical.clone(),
                    source,
                })?;
            info!(table = %logical, arn = %desc.table_arn, "found table arn");
            Ok(ResolvedRefs::resolved(desc.table_arn, desc.latest_stream_arn))
        }
        SubstitutionMode::FallbackReference => match client.describe_table(&table_name).await {
            Ok(desc) => {
                info!(table = %logical, arn = %desc.table_arn, "found table arn");
                Ok(ResolvedRefs::resolved(desc.table_arn, desc.latest_stream_arn))
            }
            Err(err) if err.is_retryable() => {
                warn!(
                    table = %logical,
                    error = %err,
                    "lookup failed, falling back to deferred references"
                );
                Ok(ResolvedRefs::deferred())
            }
            Err(source) => Err(SubstituteError::Lookup {
                table: logical,
                source,
            }),
        },
    }
}
