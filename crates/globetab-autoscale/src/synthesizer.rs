//! Resource synthesis for table autoscaling.
//!
//! Shapes follow the platform's declarative resource schema: scalable
//! targets and target-tracking policies in the application-autoscaling
//! namespace, plus one shared IAM role the autoscaling service assumes.

use serde_json::{json, Value};
use tracing::{info, warn};

use globetab_config::{CapacityConfig, GlobalTableConfig, ReplicationConfig};
use globetab_template::{ResourceFragment, TemplateDocument};

use crate::error::{SynthesisError, SynthesisResult};

/// Cooldown, in seconds, applied in both scaling directions.
const COOLDOWN_SECS: u64 = 60;

/// Logical name of the shared scaling role.
const SCALING_ROLE: &str = "ScalingRole";

/// A table dimension that can be autoscaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Read,
    Write,
}

impl Dimension {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::Write => "Write",
        }
    }

    fn capacity(self, table: &GlobalTableConfig) -> Option<&CapacityConfig> {
        match self {
            Self::Read => table.read.as_ref(),
            Self::Write => table.write.as_ref(),
        }
    }
}

/// One table's synthesis inputs: its config plus, outside the primary
/// region, the already-known physical table name.
struct TablePlan<'a> {
    config: &'a GlobalTableConfig,
    physical_name: Option<String>,
}

/// Synthesize the autoscaling resource fragment for every configured
/// table. Returns an empty fragment (after a warning) when autoscaling is
/// not configured; fails whole on malformed capacity input so that no
/// partial target/policy pair is ever emitted.
pub fn synthesize(
    cfg: Option<&ReplicationConfig>,
    local_region: &str,
    doc: &TemplateDocument,
) -> SynthesisResult<ResourceFragment> {
    let Some(cfg) = cfg else {
        warn!("skipping autoscale synthesis: not configured");
        return Ok(ResourceFragment::new());
    };
    let Some(primary_region) = cfg.primary_region.as_deref() else {
        warn!("skipping autoscale synthesis: no primary region");
        return Ok(ResourceFragment::new());
    };
    if !cfg.autoscale || cfg.tables.is_empty() {
        warn!("skipping autoscale synthesis: not configured");
        return Ok(ResourceFragment::new());
    }

    // Validate every capacity config up front: a malformed table fails
    // the run before anything is emitted.
    for table in &cfg.tables {
        for dimension in [Dimension::Read, Dimension::Write] {
            if let Some(capacity) = dimension.capacity(table) {
                capacity.validate().map_err(|source| SynthesisError::Capacity {
                    table: table.table.clone(),
                    dimension: dimension.as_str(),
                    source,
                })?;
            }
        }
    }

    // Outside the primary region the table already exists; look up its
    // physical name from the document rather than deriving it.
    let plans: Vec<TablePlan<'_>> = cfg
        .tables
        .iter()
        .map(|config| {
            let physical_name = if local_region != primary_region {
                Some(doc.physical_table_name(&config.table)?)
            } else {
                None
            };
            Ok(TablePlan {
                config,
                physical_name,
            })
        })
        .collect::<SynthesisResult<_>>()?;

    let mut fragment = ResourceFragment::new();

    info!("autoscale: synthesizing shared scaling role");
    fragment.insert(SCALING_ROLE.to_string(), scaling_role(&plans));

    for plan in &plans {
        for dimension in [Dimension::Read, Dimension::Write] {
            let Some(capacity) = dimension.capacity(plan.config) else {
                continue;
            };
            info!(
                table = %plan.config.table,
                dimension = dimension.as_str(),
                "autoscale: synthesizing scalable target and policy"
            );
            let (name, target) = scalable_target(plan, dimension, capacity);
            fragment.insert(name, target);
            let (name, policy) = scaling_policy(plan, dimension, capacity);
            fragment.insert(name, policy);
        }
    }

    Ok(fragment)
}

fn scalable_target(
    plan: &TablePlan<'_>,
    dimension: Dimension,
    capacity: &CapacityConfig,
) -> (String, Value) {
    let table = &plan.config.table;
    let mut depends_on = vec![Value::String(SCALING_ROLE.to_string())];
    let resource_id = match &plan.physical_name {
        Some(name) => json!(format!("table/{name}")),
        None => {
            // Table is created in this same deployment; reference it and
            // order the target after it.
            depends_on.push(Value::String(table.clone()));
            json!({ "Fn::Join": ["", ["table/", { "Ref": table }]] })
        }
    };

    let scheduled_actions: Vec<Value> = capacity
        .actions
        .iter()
        .map(|action| {
            json!({
                "ScalableTargetAction": {
                    "MinCapacity": action.minimum,
                    "MaxCapacity": action.maximum,
                },
                "ScheduledActionName": action.name,
                "Schedule": action.schedule,
            })
        })
        .collect();

    let resource = json!({
        "Type": "AWS::ApplicationAutoScaling::ScalableTarget",
        "DependsOn": depends_on,
        "Properties": {
            "MinCapacity": capacity.minimum,
            "MaxCapacity": capacity.maximum,
            "ScheduledActions": scheduled_actions,
            "ResourceId": resource_id,
            "RoleARN": { "Fn::GetAtt": [SCALING_ROLE, "Arn"] },
            "ScalableDimension": format!("dynamodb:table:{}CapacityUnits", dimension.as_str()),
            "ServiceNamespace": "dynamodb",
        },
    });

    (target_name(table, dimension), resource)
}

fn scaling_policy(
    plan: &TablePlan<'_>,
    dimension: Dimension,
    capacity: &CapacityConfig,
) -> (String, Value) {
    let table = &plan.config.table;
    let mut depends_on = vec![Value::String(target_name(table, dimension))];
    if plan.physical_name.is_none() {
        depends_on.push(Value::String(table.clone()));
    }

    let name = policy_name(table, dimension);
    let resource = json!({
        "Type": "AWS::ApplicationAutoScaling::ScalingPolicy",
        "DependsOn": depends_on,
        "Properties": {
            "PolicyName": name,
            "PolicyType": "TargetTrackingScaling",
            "ScalingTargetId": { "Ref": target_name(table, dimension) },
            "TargetTrackingScalingPolicyConfiguration": {
                "PredefinedMetricSpecification": {
                    "PredefinedMetricType":
                        format!("DynamoDB{}CapacityUtilization", dimension.as_str()),
                },
                "ScaleInCooldown": COOLDOWN_SECS,
                "ScaleOutCooldown": COOLDOWN_SECS,
                "TargetValue": capacity.usage * 100.0,
            },
        },
    });

    (name, resource)
}

/// The single shared role the autoscaling service assumes. Its inline
/// policy is scoped to exactly the tables being autoscaled; when every
/// table is still pending creation the authorized ARNs are themselves
/// forward references, so the role depends on all table resources.
fn scaling_role(plans: &[TablePlan<'_>]) -> Value {
    let table_arns: Vec<Value> = plans
        .iter()
        .map(|plan| {
            let name_ref = match &plan.physical_name {
                Some(name) => json!(name),
                None => json!({ "Ref": plan.config.table }),
            };
            json!({
                "Fn::Join": [
                    "",
                    [
                        "arn:aws:dynamodb:*:",
                        { "Ref": "AWS::AccountId" },
                        ":table/",
                        name_ref,
                    ],
                ],
            })
        })
        .collect();

    let mut role = json!({
        "Type": "AWS::IAM::Role",
        "Properties": {
            "AssumeRolePolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Action": "sts:AssumeRole",
                    "Effect": "Allow",
                    "Principal": { "Service": "application-autoscaling.amazonaws.com" },
                }],
            },
            "Policies": [{
                "PolicyName": "ScalingRolePolicy",
                "PolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [
                        {
                            "Action": [
                                "cloudwatch:PutMetricAlarm",
                                "cloudwatch:DescribeAlarms",
                                "cloudwatch:DeleteAlarms",
                                "cloudwatch:GetMetricStatistics",
                                "cloudwatch:SetAlarmState",
                            ],
                            "Effect": "Allow",
                            "Resource": "*",
                        },
                        {
                            "Action": [
                                "dynamodb:DescribeTable",
                                "dynamodb:UpdateTable",
                            ],
                            "Effect": "Allow",
                            "Resource": table_arns,
                        },
                    ],
                },
            }],
        },
    });

    if plans.iter().all(|plan| plan.physical_name.is_none()) {
        let tables: Vec<Value> = plans
            .iter()
            .map(|plan| Value::String(plan.config.table.clone()))
            .collect();
        role["DependsOn"] = Value::Array(tables);
    }

    role
}

fn target_name(table: &str, dimension: Dimension) -> String {
    format!("{table}AutoScalableTarget{}", dimension.as_str())
}

fn policy_name(table: &str, dimension: Dimension) -> String {
    format!("{table}AutoScalingPolicy{}", dimension.as_str())
}
