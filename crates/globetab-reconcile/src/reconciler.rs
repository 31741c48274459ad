//! Per-table replica convergence.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use globetab_config::{RegionId, ReplicationConfig};
use globetab_provider::TableService;
use globetab_template::TemplateDocument;

use crate::error::{ReconcileError, ReconcileResult};

/// Outcome of one table's reconciliation: the ephemeral per-table context,
/// reported back to the caller and discarded after the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    /// Logical name of the table resource.
    pub table: String,
    /// Physical table name the calls were issued against.
    pub table_name: String,
    /// Regions that should hold a replica (local region excluded).
    pub desired: Vec<RegionId>,
    /// Regions the control plane reported as existing replicas.
    pub existing: Vec<RegionId>,
    /// Regions the update call requested; empty for a converged table.
    pub added: Vec<RegionId>,
}

/// Converges each replicated table's actual replica regions toward the
/// configured set.
pub struct Reconciler {
    client: Arc<dyn TableService>,
}

impl Reconciler {
    pub fn new(client: Arc<dyn TableService>) -> Self {
        Self { client }
    }

    /// Reconcile every replicated table, concurrently. Returns one
    /// `WorkUnit` per table in dispatch order; fails (after every unit
    /// has settled) with the first table failure observed.
    pub async fn reconcile(
        &self,
        cfg: Option<&ReplicationConfig>,
        local_region: &str,
        doc: &TemplateDocument,
    ) -> ReconcileResult<Vec<WorkUnit>> {
        let Some(cfg) = cfg else {
            warn!("skipping replica reconciliation: not configured");
            return Ok(Vec::new());
        };
        if cfg.tables.is_empty() {
            warn!("skipping replica reconciliation: no tables");
            return Ok(Vec::new());
        }

        let mut units: Vec<(String, JoinHandle<ReconcileResult<WorkUnit>>)> = Vec::new();
        for table in cfg.replicated_tables() {
            let table_name = doc.physical_table_name(&table.table)?;
            let desired: Vec<RegionId> = table
                .add_regions
                .iter()
                .filter(|region| region.as_str() != local_region)
                .cloned()
                .collect();

            let client = Arc::clone(&self.client);
            let logical = table.table.clone();
            units.push((
                table.table.clone(),
                tokio::spawn(async move {
                    reconcile_table(client, logical, table_name, desired).await
                }),
            ));
        }

        // All units settle before the aggregate result is decided; a
        // failed sibling never cancels the others.
        let mut outcomes = Vec::new();
        let mut first_err = None;
        for (table, handle) in units {
            match handle.await {
                Ok(Ok(unit)) => outcomes.push(unit),
                Ok(Err(err)) => {
                    error!(table = %table, error = %err, "table reconciliation failed");
                    first_err.get_or_insert(err);
                }
                Err(join_err) => {
                    error!(table = %table, error = %join_err, "reconcile task failed");
                    first_err.get_or_insert(ReconcileError::Task(join_err.to_string()));
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(outcomes),
        }
    }
}

async fn reconcile_table(
    client: Arc<dyn TableService>,
    table: String,
    table_name: String,
    desired: Vec<RegionId>,
) -> ReconcileResult<WorkUnit> {
    let description = client
        .describe_table(&table_name)
        .await
        .map_err(|source| ReconcileError::Table {
            table: table.clone(),
            source,
        })?;

    let existing = description.replica_regions;
    let to_add: Vec<RegionId> = desired
        .iter()
        .filter(|region| !existing.contains(region))
        .cloned()
        .collect();

    if to_add.is_empty() {
        info!(
            table = %table,
            table_name = %table_name,
            regions = ?desired,
            "replica regions already present"
        );
        return Ok(WorkUnit {
            table,
            table_name,
            desired,
            existing,
            added: Vec::new(),
        });
    }

    // One all-or-nothing update; per-region partial success is the
    // control plane's concern, not ours.
    client
        .update_table_replicas(&table_name, &to_add)
        .await
        .map_err(|source| ReconcileError::Table {
            table: table.clone(),
            source,
        })?;

    info!(
        table = %table,
        table_name = %table_name,
        regions = ?to_add,
        "added replica regions"
    );
    Ok(WorkUnit {
        table,
        table_name,
        desired,
        existing,
        added: to_add,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use globetab_config::GlobalTableConfig;
    use globetab_provider::memory::TableRecord;
    use globetab_provider::{MemoryTableService, ProviderError};

    fn table(name: &str, add_regions: &[&str]) -> GlobalTableConfig {
        GlobalTableConfig {
            table: name.to_string(),
            add_regions: add_regions.iter().map(|r| r.to_string()).collect(),
            read: None,
            write: None,
        }
    }

    fn cfg(tables: Vec<GlobalTableConfig>) -> ReplicationConfig {
        ReplicationConfig {
            primary_region: Some("us-east-1".to_string()),
            autoscale: false,
            tables,
        }
    }

    fn doc_for(tables: &[&str]) -> TemplateDocument {
        let mut resources = serde_json::Map::new();
        for name in tables {
            resources.insert(
                name.to_string(),
                json!({
                    "Type": "AWS::DynamoDB::Table",
                    "Properties": { "TableName": format!("{}-prod", name.to_lowercase()) }
                }),
            );
        }
        TemplateDocument::new().with_section("resources", serde_json::Value::Object(resources))
    }

    fn reconciler(svc: &Arc<MemoryTableService>) -> Reconciler {
        Reconciler::new(Arc::clone(svc) as Arc<dyn TableService>)
    }

    #[tokio::test]
    async fn adds_only_the_missing_regions() {
        let svc = Arc::new(MemoryTableService::new());
        svc.put_table(
            "orders-prod",
            TableRecord::new("arn").with_replicas(["us-west-2"]),
        );
        let cfg = cfg(vec![table("Orders", &["us-west-2", "eu-west-1"])]);

        let units = reconciler(&svc)
            .reconcile(Some(&cfg), "us-east-1", &doc_for(&["Orders"]))
            .await
            .unwrap();

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].added, vec!["eu-west-1".to_string()]);
        assert_eq!(
            svc.update_calls(),
            vec![("orders-prod".to_string(), vec!["eu-west-1".to_string()])]
        );
    }

    #[tokio::test]
    async fn local_region_is_excluded_from_desired() {
        let svc = Arc::new(MemoryTableService::new());
        svc.put_table("orders-prod", TableRecord::new("arn"));
        let cfg = cfg(vec![table("Orders", &["us-west-2", "eu-west-1"])]);

        let units = reconciler(&svc)
            .reconcile(Some(&cfg), "us-west-2", &doc_for(&["Orders"]))
            .await
            .unwrap();

        assert_eq!(units[0].desired, vec!["eu-west-1".to_string()]);
        assert_eq!(units[0].added, vec!["eu-west-1".to_string()]);
    }

    #[tokio::test]
    async fn converged_table_issues_no_update() {
        let svc = Arc::new(MemoryTableService::new());
        svc.put_table(
            "orders-prod",
            TableRecord::new("arn").with_replicas(["us-west-2", "eu-west-1"]),
        );
        let cfg = cfg(vec![table("Orders", &["us-west-2", "eu-west-1"])]);

        let units = reconciler(&svc)
            .reconcile(Some(&cfg), "us-east-1", &doc_for(&["Orders"]))
            .await
            .unwrap();

        assert!(units[0].added.is_empty());
        assert!(svc.update_calls().is_empty());
    }

    #[tokio::test]
    async fn reconciling_twice_issues_at_most_one_update() {
        let svc = Arc::new(MemoryTableService::new());
        svc.put_table("orders-prod", TableRecord::new("arn"));
        let cfg = cfg(vec![table("Orders", &["us-west-2"])]);
        let doc = doc_for(&["Orders"]);
        let rec = reconciler(&svc);

        let first = rec.reconcile(Some(&cfg), "us-east-1", &doc).await.unwrap();
        assert_eq!(first[0].added, vec!["us-west-2".to_string()]);

        let second = rec.reconcile(Some(&cfg), "us-east-1", &doc).await.unwrap();
        assert!(second[0].added.is_empty());

        assert_eq!(svc.update_calls().len(), 1);
    }

    #[tokio::test]
    async fn tables_without_add_regions_are_skipped_entirely() {
        let svc = Arc::new(MemoryTableService::new());
        let cfg = cfg(vec![table("Orders", &[])]);

        let units = reconciler(&svc)
            .reconcile(Some(&cfg), "us-east-1", &doc_for(&["Orders"]))
            .await
            .unwrap();

        assert!(units.is_empty());
        assert!(svc.describe_calls().is_empty());
        assert!(svc.update_calls().is_empty());
    }

    #[tokio::test]
    async fn missing_config_is_a_no_op() {
        let svc = Arc::new(MemoryTableService::new());
        let units = reconciler(&svc)
            .reconcile(None, "us-east-1", &doc_for(&[]))
            .await
            .unwrap();
        assert!(units.is_empty());
        assert!(svc.describe_calls().is_empty());
    }

    #[tokio::test]
    async fn failing_table_does_not_block_siblings() {
        let svc = Arc::new(MemoryTableService::new());
        svc.put_table("one-prod", TableRecord::new("arn1"));
        svc.put_table("two-prod", TableRecord::new("arn2"));
        svc.put_table("three-prod", TableRecord::new("arn3"));
        svc.fail_update("two-prod", ProviderError::Conflict("replica update in flight".into()));

        let cfg = cfg(vec![
            table("One", &["us-west-2"]),
            table("Two", &["us-west-2"]),
            table("Three", &["us-west-2"]),
        ]);

        let err = reconciler(&svc)
            .reconcile(Some(&cfg), "us-east-1", &doc_for(&["One", "Two", "Three"]))
            .await
            .unwrap_err();

        // The aggregate failure names the failing table...
        assert!(matches!(err, ReconcileError::Table { ref table, .. } if table == "Two"));
        // ...but every sibling still completed its own calls.
        let updated: Vec<String> = svc.update_calls().into_iter().map(|(name, _)| name).collect();
        assert!(updated.contains(&"one-prod".to_string()));
        assert!(updated.contains(&"two-prod".to_string()));
        assert!(updated.contains(&"three-prod".to_string()));
    }

    #[tokio::test]
    async fn describe_failure_fails_that_table() {
        let svc = Arc::new(MemoryTableService::new());
        let cfg = cfg(vec![table("Orders", &["us-west-2"])]);

        let err = reconciler(&svc)
            .reconcile(Some(&cfg), "us-east-1", &doc_for(&["Orders"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Table {
                source: ProviderError::NotFound(_),
                ..
            }
        ));
        assert!(svc.update_calls().is_empty());
    }
}
