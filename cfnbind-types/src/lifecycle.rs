//! Lifecycle - resource attributes every CloudFormation record carries
//!
//! These are template-level attributes (`DeletionPolicy`, `DependsOn`, ...),
//! not properties from the resource schema. Every generated record embeds
//! exactly one `LifecycleMetadata`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::policy::{DeletionPolicy, UpdateReplacePolicy};

/// Shape of a lifecycle field, as described to code renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleShape {
    /// Optional enum with the given spellings
    Policy(&'static [&'static str]),
    /// Ordered list of logical IDs
    LogicalIdList,
    /// String keys to arbitrary JSON values
    Metadata,
    /// Optional condition name
    ConditionName,
}

/// One entry of the fixed lifecycle block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LifecycleField {
    /// Key used in the template next to `Type` and `Properties`
    pub template_key: &'static str,
    /// Field name on the generated record
    pub binding_name: &'static str,
    pub shape: LifecycleShape,
    pub description: &'static str,
}

const POLICY_SPELLINGS: &[&str] = &["Retain", "Delete", "Snapshot"];

/// The lifecycle block in emission order. `LifecycleMetadata` declares its
/// fields in the same order.
pub const LIFECYCLE_FIELDS: [LifecycleField; 5] = [
    LifecycleField {
        template_key: "DeletionPolicy",
        binding_name: "deletion_policy",
        shape: LifecycleShape::Policy(POLICY_SPELLINGS),
        description: "What happens to the resource when it is removed from the template",
    },
    LifecycleField {
        template_key: "UpdateReplacePolicy",
        binding_name: "update_replace_policy",
        shape: LifecycleShape::Policy(POLICY_SPELLINGS),
        description: "What happens to the old resource when an update replaces it",
    },
    LifecycleField {
        template_key: "DependsOn",
        binding_name: "depends_on",
        shape: LifecycleShape::LogicalIdList,
        description: "Logical IDs of resources that must be created first",
    },
    LifecycleField {
        template_key: "Metadata",
        binding_name: "metadata",
        shape: LifecycleShape::Metadata,
        description: "Structured data attached to the resource",
    },
    LifecycleField {
        template_key: "Condition",
        binding_name: "condition",
        shape: LifecycleShape::ConditionName,
        description: "Logical ID of the condition that must hold for the resource to be created",
    },
];

/// Lifecycle attributes of one record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<DeletionPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<UpdateReplacePolicy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl LifecycleMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deletion_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self
    }

    pub fn with_update_replace_policy(mut self, policy: UpdateReplacePolicy) -> Self {
        self.update_replace_policy = Some(policy);
        self
    }

    /// Append a dependency. The list is kept exactly as declared, repeats included.
    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.push(logical_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Returns true if no lifecycle attribute is set
    pub fn is_empty(&self) -> bool {
        self.deletion_policy.is_none()
            && self.update_replace_policy.is_none()
            && self.depends_on.is_empty()
            && self.metadata.is_empty()
            && self.condition.is_none()
    }
}

/// Implemented by every generated record
pub trait CloudFormationResource {
    /// Fully-qualified type name, e.g. `AWS::MediaLive::Channel`
    fn aws_cloudformation_type(&self) -> &'static str;

    fn lifecycle(&self) -> &LifecycleMetadata;

    fn lifecycle_mut(&mut self) -> &mut LifecycleMetadata;
}
