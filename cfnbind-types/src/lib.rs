//! cfnbind Types
//!
//! Runtime vocabulary shared by generated CloudFormation bindings: lifecycle
//! attributes, deletion/update-replace policies, and literal-or-intrinsic
//! property values.

pub mod intrinsic;
pub mod lifecycle;
pub mod policy;

pub use intrinsic::{FieldValue, Intrinsic, is_intrinsic_key};
pub use lifecycle::{
    CloudFormationResource, LIFECYCLE_FIELDS, LifecycleField, LifecycleMetadata, LifecycleShape,
};
pub use policy::{DeletionPolicy, PolicyParseError, UpdateReplacePolicy};
