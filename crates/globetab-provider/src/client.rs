//! The table service client trait.

use async_trait::async_trait;

use globetab_config::RegionId;

use crate::error::ProviderResult;

/// What `describe_table` reports about an existing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    /// Full resource ARN of the table.
    pub table_arn: String,
    /// ARN of the table's latest change stream, when streams are enabled.
    pub latest_stream_arn: Option<String>,
    /// Regions currently holding a replica. Empty when the table has
    /// never been replicated.
    pub replica_regions: Vec<RegionId>,
}

/// The two idempotent control-plane operations the core consumes.
///
/// Implementations wrap whatever transport the host uses; both calls are
/// safe to repeat on the caller's retry.
#[async_trait]
pub trait TableService: Send + Sync {
    /// Look up a table by its physical name.
    async fn describe_table(&self, table_name: &str) -> ProviderResult<TableDescription>;

    /// Request creation of a replica in each of `add_regions`.
    async fn update_table_replicas(
        &self,
        table_name: &str,
        add_regions: &[RegionId],
    ) -> ProviderResult<()>;
}
