//! In-memory table service for tests.
//!
//! Behaves like a tiny regional control plane: tables are registered with
//! their ARNs and replica sets, `update_table_replicas` actually mutates
//! the replica set, and failures can be scripted per table (persistently
//! or for the next N calls). Call history is recorded so tests can assert
//! on exactly which remote operations were issued.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use globetab_config::RegionId;

use crate::client::{TableDescription, TableService};
use crate::error::{ProviderError, ProviderResult};

/// A registered table and its current remote state.
#[derive(Debug, Clone)]
pub struct TableRecord {
    pub table_arn: String,
    pub latest_stream_arn: Option<String>,
    pub replica_regions: Vec<RegionId>,
}

impl TableRecord {
    pub fn new(table_arn: impl Into<String>) -> Self {
        Self {
            table_arn: table_arn.into(),
            latest_stream_arn: None,
            replica_regions: Vec::new(),
        }
    }

    pub fn with_stream(mut self, stream_arn: impl Into<String>) -> Self {
        self.latest_stream_arn = Some(stream_arn.into());
        self
    }

    pub fn with_replicas<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<RegionId>,
    {
        self.replica_regions = regions.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone)]
enum FailureScript {
    Always(ProviderError),
    Times(ProviderError, u32),
}

impl FailureScript {
    /// Take the next scripted failure, if any remain.
    fn next(&mut self) -> Option<ProviderError> {
        match self {
            Self::Always(err) => Some(err.clone()),
            Self::Times(err, remaining) => {
                if *remaining == 0 {
                    None
                } else {
                    *remaining -= 1;
                    Some(err.clone())
                }
            }
        }
    }
}

#[derive(Default)]
struct State {
    tables: HashMap<String, TableRecord>,
    describe_failures: HashMap<String, FailureScript>,
    update_failures: HashMap<String, FailureScript>,
    describe_calls: Vec<String>,
    update_calls: Vec<(String, Vec<RegionId>)>,
}

/// Scripted in-memory `TableService`.
#[derive(Default)]
pub struct MemoryTableService {
    state: Mutex<State>,
}

impl MemoryTableService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a table.
    pub fn put_table(&self, table_name: impl Into<String>, record: TableRecord) {
        self.state
            .lock()
            .unwrap()
            .tables
            .insert(table_name.into(), record);
    }

    /// Current remote state of a table.
    pub fn table(&self, table_name: &str) -> Option<TableRecord> {
        self.state.lock().unwrap().tables.get(table_name).cloned()
    }

    /// Fail every subsequent describe of `table_name` with `err`.
    pub fn fail_describe(&self, table_name: impl Into<String>, err: ProviderError) {
        self.state
            .lock()
            .unwrap()
            .describe_failures
            .insert(table_name.into(), FailureScript::Always(err));
    }

    /// Fail the next `times` describes of `table_name`, then recover.
    pub fn fail_describe_times(
        &self,
        table_name: impl Into<String>,
        err: ProviderError,
        times: u32,
    ) {
        self.state
            .lock()
            .unwrap()
            .describe_failures
            .insert(table_name.into(), FailureScript::Times(err, times));
    }

    /// Fail every subsequent replica update of `table_name` with `err`.
    pub fn fail_update(&self, table_name: impl Into<String>, err: ProviderError) {
        self.state
            .lock()
            .unwrap()
            .update_failures
            .insert(table_name.into(), FailureScript::Always(err));
    }

    /// How many times `table_name` has been described.
    pub fn describe_count(&self, table_name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .describe_calls
            .iter()
            .filter(|name| name.as_str() == table_name)
            .count()
    }

    /// All describe calls, in dispatch order.
    pub fn describe_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().describe_calls.clone()
    }

    /// All replica update calls, in dispatch order.
    pub fn update_calls(&self) -> Vec<(String, Vec<RegionId>)> {
        self.state.lock().unwrap().update_calls.clone()
    }
}

#[async_trait]
impl TableService for MemoryTableService {
    async fn describe_table(&self, table_name: &str) -> ProviderResult<TableDescription> {
        let mut state = self.state.lock().unwrap();
        state.describe_calls.push(table_name.to_string());

        if let Some(script) = state.describe_failures.get_mut(table_name)
            && let Some(err) = script.next()
        {
            return Err(err);
        }

        match state.tables.get(table_name) {
            Some(record) => Ok(TableDescription {
                table_arn: record.table_arn.clone(),
                latest_stream_arn: record.latest_stream_arn.clone(),
                replica_regions: record.replica_regions.clone(),
            }),
            None => Err(ProviderError::NotFound(table_name.to_string())),
        }
    }

    async fn update_table_replicas(
        &self,
        table_name: &str,
        add_regions: &[RegionId],
    ) -> ProviderResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .update_calls
            .push((table_name.to_string(), add_regions.to_vec()));

        if let Some(script) = state.update_failures.get_mut(table_name)
            && let Some(err) = script.next()
        {
            return Err(err);
        }

        match state.tables.get_mut(table_name) {
            Some(record) => {
                for region in add_regions {
                    if !record.replica_regions.contains(region) {
                        record.replica_regions.push(region.clone());
                    }
                }
                Ok(())
            }
            None => Err(ProviderError::NotFound(table_name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn describe_returns_registered_state() {
        let svc = MemoryTableService::new();
        svc.put_table(
            "orders-prod",
            TableRecord::new("arn:aws:dynamodb:us-east-1:123:table/orders-prod")
                .with_stream("arn:aws:dynamodb:us-east-1:123:table/orders-prod/stream/1")
                .with_replicas(["us-west-2"]),
        );

        let desc = svc.describe_table("orders-prod").await.unwrap();
        assert_eq!(
            desc.table_arn,
            "arn:aws:dynamodb:us-east-1:123:table/orders-prod"
        );
        assert_eq!(desc.replica_regions, vec!["us-west-2".to_string()]);
        assert_eq!(svc.describe_count("orders-prod"), 1);
    }

    #[tokio::test]
    async fn unknown_table_is_not_found() {
        let svc = MemoryTableService::new();
        assert!(matches!(
            svc.describe_table("ghost").await,
            Err(ProviderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_mutates_replica_set() {
        let svc = MemoryTableService::new();
        svc.put_table("orders-prod", TableRecord::new("arn").with_replicas(["us-west-2"]));

        svc.update_table_replicas(
            "orders-prod",
            &["eu-west-1".to_string(), "us-west-2".to_string()],
        )
        .await
        .unwrap();

        let replicas = svc.table("orders-prod").unwrap().replica_regions;
        assert_eq!(replicas, vec!["us-west-2", "eu-west-1"]);
        assert_eq!(svc.update_calls().len(), 1);
    }

    #[tokio::test]
    async fn scripted_failures_run_out() {
        let svc = MemoryTableService::new();
        svc.put_table("orders-prod", TableRecord::new("arn"));
        svc.fail_describe_times(
            "orders-prod",
            ProviderError::Throttled("rate exceeded".into()),
            2,
        );

        assert!(svc.describe_table("orders-prod").await.is_err());
        assert!(svc.describe_table("orders-prod").await.is_err());
        assert!(svc.describe_table("orders-prod").await.is_ok());
    }
}
