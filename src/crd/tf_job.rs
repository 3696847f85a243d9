//! TFJob Custom Resource Definition

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ListMeta;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// TFJob resource specification
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kubeflow.org",
    version = "v1alpha2",
    kind = "TFJob",
    plural = "tfjobs",
    singular = "tfjob",
    namespaced,
    status = "TFJobStatus",
    printcolumn = r#"{"name": "State", "type": "string", "jsonPath": ".status.conditions[-1:].type"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct TFJobSpec {
    /// Policy for cleaning up pods after the TFJob completes (defaults to Running)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean_pod_policy: Option<CleanPodPolicy>,

    /// TTL for cleaning up finished TFJobs; unset means the job is never deleted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_seconds_after_finished: Option<i32>,

    /// TensorFlow cluster configuration, keyed by replica type (PS, Worker, Chief, Evaluator)
    #[serde(rename = "tfReplicaSpecs")]
    pub tf_replica_specs: BTreeMap<TFReplicaType, ReplicaSpec>,
}

/// Type of a TensorFlow replica.
///
/// `PS` is a parameter server, `Chief` is a worker that also handles
/// checkpointing and summaries, and `Evaluator` runs evaluation against
/// checkpoints.
// Variant docs would make schemars emit `oneOf`, which swagger 2.0 lacks
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, JsonSchema)]
pub enum TFReplicaType {
    PS,
    Worker,
    Chief,
    Evaluator,
}

/// Replica description: pod template, count, and restart policy
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaSpec {
    /// Desired number of replicas of the given template (defaults to 1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    /// Pod template describing the replica
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PodTemplateSpec>,

    /// Restart policy for all replicas within the job (defaults to Never)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<RestartPolicy>,
}

/// Restart policy of a replica. `ExitCode` restarts on retryable exit codes only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum RestartPolicy {
    Always,
    OnFailure,
    Never,
    ExitCode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum CleanPodPolicy {
    Undefined,
    All,
    Running,
    None,
}

/// TFJob status
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TFJobStatus {
    /// Latest available observations of the job's current state
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<TFJobCondition>,

    /// Observed state of each replica type
    #[serde(default)]
    pub replica_statuses: BTreeMap<TFReplicaType, TFReplicaStatus>,

    /// Time the job was acknowledged by the controller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    /// Time the job completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<DateTime<Utc>>,

    /// Last time the job was reconciled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reconcile_time: Option<DateTime<Utc>>,
}

/// Pod counts for one replica type
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TFReplicaStatus {
    /// Number of actively running pods
    #[serde(default)]
    pub active: i32,

    /// Number of pods which reached phase Succeeded
    #[serde(default)]
    pub succeeded: i32,

    /// Number of pods which reached phase Failed
    #[serde(default)]
    pub failed: i32,
}

/// State of the TFJob at a certain point
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TFJobCondition {
    /// Condition type (Created, Running, Restarting, Succeeded, Failed)
    #[serde(rename = "type")]
    pub type_: String,

    /// Status (True, False, Unknown)
    pub status: String,

    /// Reason for the condition's last transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time this condition was updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<DateTime<Utc>>,

    /// Last time the condition transitioned from one status to another
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

/// List of TFJobs
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TFJobList {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Standard list metadata
    #[serde(default)]
    pub metadata: ListMeta,

    /// List of TFJobs
    pub items: Vec<TFJob>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::Resource;

    #[test]
    fn test_resource_metadata() {
        assert_eq!(TFJob::group(&()), "kubeflow.org");
        assert_eq!(TFJob::version(&()), "v1alpha2");
        assert_eq!(TFJob::kind(&()), "TFJob");
        assert_eq!(TFJob::plural(&()), "tfjobs");
        assert_eq!(TFJob::api_version(&()), "kubeflow.org/v1alpha2");
    }

    #[test]
    fn test_spec_round_trips_replica_map() {
        let json = r#"{
            "tfReplicaSpecs": {
                "PS": {"replicas": 1},
                "Worker": {"replicas": 4, "restartPolicy": "OnFailure"}
            },
            "cleanPodPolicy": "All"
        }"#;

        let spec: TFJobSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.tf_replica_specs.len(), 2);
        assert_eq!(
            spec.tf_replica_specs[&TFReplicaType::Worker].replicas,
            Some(4)
        );
        assert_eq!(
            spec.tf_replica_specs[&TFReplicaType::Worker].restart_policy,
            Some(RestartPolicy::OnFailure)
        );
        assert_eq!(spec.clean_pod_policy, Some(CleanPodPolicy::All));

        let value = serde_json::to_value(&spec).unwrap();
        assert!(value["tfReplicaSpecs"]["PS"].is_object());
        assert!(value.get("ttlSecondsAfterFinished").is_none());
    }

    #[test]
    fn test_restart_policy_schema_is_single_enum() {
        let schema = serde_json::to_value(schemars::schema_for!(RestartPolicy)).unwrap();
        assert!(schema.get("oneOf").is_none(), "{schema}");
        assert_eq!(schema["type"], "string");
        assert_eq!(
            schema["enum"],
            serde_json::json!(["Always", "OnFailure", "Never", "ExitCode"])
        );
    }
}
