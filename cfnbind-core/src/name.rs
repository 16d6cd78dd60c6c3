//! Type names - fully-qualified CloudFormation type identifiers
//!
//! `AWS::MediaLive::Channel` names a resource type,
//! `AWS::MediaLive::Channel.MediaPackageOutputDestinationSettings` one of its
//! property types. A handful of property types shared by every service (`Tag`)
//! have no namespace at all.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{SchemaError, SchemaResult};

static QUALIFIED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_]+)::([A-Za-z0-9_]+)::([A-Za-z0-9_]+)(?:\.([A-Za-z0-9_]+))?$")
        .expect("static type name pattern")
});

static GLOBAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("static global name pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Namespace {
    vendor: String,
    service: String,
    resource: String,
}

/// Parsed type name. Ordering and equality follow the raw string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceTypeName {
    raw: String,
    namespace: Option<Namespace>,
    property: Option<String>,
}

impl ResourceTypeName {
    pub fn parse(s: &str) -> SchemaResult<Self> {
        if let Some(caps) = QUALIFIED.captures(s) {
            return Ok(Self {
                raw: s.to_string(),
                namespace: Some(Namespace {
                    vendor: caps[1].to_string(),
                    service: caps[2].to_string(),
                    resource: caps[3].to_string(),
                }),
                property: caps.get(4).map(|m| m.as_str().to_string()),
            });
        }
        if GLOBAL.is_match(s) {
            return Ok(Self {
                raw: s.to_string(),
                namespace: None,
                property: None,
            });
        }
        Err(SchemaError::parse(
            s,
            "type name must look like Vendor::Service::Resource or Vendor::Service::Resource.Property",
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Property types are nested structures; only resource types are creatable on their own
    pub fn is_property_type(&self) -> bool {
        self.property.is_some() || self.namespace.is_none()
    }

    pub fn service(&self) -> Option<&str> {
        self.namespace.as_ref().map(|ns| ns.service.as_str())
    }

    pub fn resource(&self) -> Option<&str> {
        self.namespace.as_ref().map(|ns| ns.resource.as_str())
    }

    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// `AWS::ECS::Service.LoadBalancer` -> `AWS::ECS::Service`
    pub fn parent_resource(&self) -> Option<ResourceTypeName> {
        let ns = self.namespace.as_ref()?;
        Some(Self {
            raw: format!("{}::{}::{}", ns.vendor, ns.service, ns.resource),
            namespace: Some(ns.clone()),
            property: None,
        })
    }

    /// Name a property type that is local to this type's resource.
    /// `AWS::ECS::Service` + `Listener` -> `AWS::ECS::Service.Listener`
    pub fn qualify(&self, local: &str) -> Option<String> {
        self.namespace
            .as_ref()
            .map(|ns| format!("{}::{}::{}.{}", ns.vendor, ns.service, ns.resource, local))
    }

    /// Record identifier: `Channel_MediaPackageOutputDestinationSettings`, `Channel`, `Tag`
    pub fn record_name(&self) -> String {
        match (&self.namespace, &self.property) {
            (Some(ns), Some(prop)) => format!("{}_{}", ns.resource, prop),
            (Some(ns), None) => ns.resource.clone(),
            (None, _) => self.raw.clone(),
        }
    }

    /// Package grouping records of one service, e.g. `medialive`
    pub fn package(&self) -> String {
        match &self.namespace {
            Some(ns) => ns.service.to_lowercase(),
            None => "global".to_string(),
        }
    }

    /// Artifact file stem: `aws-medialive-channel_mediapackageoutputdestinationsettings`
    pub fn file_stem(&self) -> String {
        match (&self.namespace, &self.property) {
            (Some(ns), Some(prop)) => format!(
                "{}-{}-{}_{}",
                ns.vendor, ns.service, ns.resource, prop
            )
            .to_lowercase(),
            (Some(ns), None) => format!("{}-{}-{}", ns.vendor, ns.service, ns.resource).to_lowercase(),
            (None, _) => self.raw.to_lowercase(),
        }
    }
}

impl fmt::Display for ResourceTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for ResourceTypeName {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ResourceTypeName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for ResourceTypeName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
