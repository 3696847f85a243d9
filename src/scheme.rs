//! Type registry mapping group/version/kind triples to reflected schemas
//!
//! The scheme owns a single `schemars` generator so every registered type
//! shares one definitions table. References point at `#/definitions/`, which
//! is where swagger 2.0 keeps them. Schemas are rewritten on the way out so
//! they only use keywords swagger 2.0 knows.

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    APIGroup, APIGroupList, APIResourceList, DeleteOptions, Patch, Status, WatchEvent,
};
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use k8s_openapi::apimachinery::pkg::version::Info;
use schemars::gen::{SchemaGenerator, SchemaSettings};
use schemars::schema::{InstanceType, Schema, SchemaObject, SingleOrVec, SubschemaValidation};
use schemars::visit::{visit_schema_object, Visitor};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

const DEFINITIONS_PATH: &str = "#/definitions/";

/// API group and version, e.g. `kubeflow.org/v1alpha2`
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupVersion {
    pub group: String,
    pub version: String,
}

impl GroupVersion {
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }

    /// The group/version the shared meta types live in
    pub fn meta() -> Self {
        Self::new("", "v1")
    }

    pub fn with_kind(&self, kind: impl Into<String>) -> GroupVersionKind {
        GroupVersionKind {
            group: self.group.clone(),
            version: self.version.clone(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.version)
        } else {
            write!(f, "{}/{}", self.group, self.version)
        }
    }
}

/// Fully qualified kind of an API type
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn group_version(&self) -> GroupVersion {
        GroupVersion::new(self.group.clone(), self.version.clone())
    }

    /// Kind of the list wrapping this kind
    pub fn list(&self) -> Self {
        self.group_version().with_kind(format!("{}List", self.kind))
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Kind={}", self.group_version(), self.kind)
    }
}

/// Identifies the single resource exposed by a server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeInfo {
    pub group_version: GroupVersion,
    /// Plural resource name used in URL paths
    pub resource: String,
    pub kind: String,
}

impl TypeInfo {
    pub fn group_version_kind(&self) -> GroupVersionKind {
        self.group_version.with_kind(self.kind.clone())
    }
}

/// Rewrites schemas into the subset of JSON schema swagger 2.0 accepts.
///
/// schemars splits string enums into `oneOf` branches when a variant carries
/// a doc comment; those are folded back into a single `enum`.
struct SwaggerCompat;

impl Visitor for SwaggerCompat {
    fn visit_schema_object(&mut self, schema: &mut SchemaObject) {
        collapse_string_enum(schema);
        visit_schema_object(self, schema);
    }
}

fn collapse_string_enum(schema: &mut SchemaObject) {
    let Some(branches) = schema.subschemas.as_ref().and_then(|s| s.one_of.as_ref()) else {
        return;
    };

    let string = Some(SingleOrVec::Single(Box::new(InstanceType::String)));
    let mut values = Vec::new();
    for branch in branches {
        let Schema::Object(branch) = branch else {
            return;
        };
        if branch.instance_type != string {
            return;
        }
        match (&branch.enum_values, &branch.const_value) {
            (Some(enum_values), _) => values.extend(enum_values.iter().cloned()),
            (None, Some(value)) => values.push(value.clone()),
            (None, None) => return,
        }
    }

    let emptied = match schema.subschemas.as_mut() {
        Some(subschemas) => {
            subschemas.one_of = None;
            **subschemas == SubschemaValidation::default()
        }
        None => true,
    };
    if emptied {
        schema.subschemas = None;
    }
    schema.instance_type = string;
    schema.enum_values = Some(values);
}

/// Registry of API types and their reflected schemas
pub struct Scheme {
    generator: SchemaGenerator,
    known_types: BTreeMap<GroupVersionKind, String>,
    inlined: BTreeMap<String, Schema>,
}

impl Default for Scheme {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheme")
            .field("known_types", &self.known_types)
            .finish_non_exhaustive()
    }
}

impl Scheme {
    pub fn new() -> Self {
        let settings = SchemaSettings::draft07().with(|s| {
            s.definitions_path = DEFINITIONS_PATH.to_string();
            s.option_nullable = false;
            s.option_add_null_type = false;
            s.meta_schema = None;
        });

        Self {
            generator: settings.into_generator(),
            known_types: BTreeMap::new(),
            inlined: BTreeMap::new(),
        }
    }

    /// Register `T` as the type behind `gvk`.
    ///
    /// Registering the same type again is a no-op; registering a different
    /// type under an existing kind fails.
    pub fn add_known_type<T: JsonSchema>(&mut self, gvk: GroupVersionKind) -> Result<()> {
        let name = self.reflect::<T>();

        if let Some(existing) = self.known_types.get(&gvk) {
            if *existing == name {
                return Ok(());
            }
            return Err(Error::AlreadyRegistered {
                gvk,
                existing: existing.clone(),
            });
        }

        debug!(kind = %gvk, definition = %name, "Registered type");
        self.known_types.insert(gvk, name);
        Ok(())
    }

    /// Register the meta types every API group relies on: status, delete
    /// options, watch events, patches, and the discovery documents.
    pub fn add_meta_types(&mut self) -> Result<()> {
        let gv = GroupVersion::meta();
        self.add_known_type::<Status>(gv.with_kind("Status"))?;
        self.add_known_type::<DeleteOptions>(gv.with_kind("DeleteOptions"))?;
        // the event schema does not depend on the object type
        self.add_known_type::<WatchEvent<RawExtension>>(gv.with_kind("WatchEvent"))?;
        self.add_known_type::<Patch>(gv.with_kind("Patch"))?;
        self.add_known_type::<APIGroupList>(gv.with_kind("APIGroupList"))?;
        self.add_known_type::<APIGroup>(gv.with_kind("APIGroup"))?;
        self.add_known_type::<APIResourceList>(gv.with_kind("APIResourceList"))?;
        self.add_known_type::<Info>(gv.with_kind("Info"))?;
        Ok(())
    }

    pub fn recognizes(&self, gvk: &GroupVersionKind) -> bool {
        self.known_types.contains_key(gvk)
    }

    /// Name of the definition reflected for `gvk`
    pub fn definition_name(&self, gvk: &GroupVersionKind) -> Result<&str> {
        self.known_types
            .get(gvk)
            .map(String::as_str)
            .ok_or_else(|| Error::NotRegistered(gvk.clone()))
    }

    /// Every reflected schema as JSON, keyed by definition name
    pub fn definitions(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        let mut definitions = BTreeMap::new();
        for (name, schema) in self.generator.definitions().iter().chain(&self.inlined) {
            let mut schema = schema.clone();
            SwaggerCompat.visit_schema(&mut schema);
            definitions.insert(name.clone(), serde_json::to_value(&schema)?);
        }
        Ok(definitions)
    }

    fn reflect<T: JsonSchema>(&mut self) -> String {
        let schema = self.generator.subschema_for::<T>();

        let referenced = match &schema {
            Schema::Object(object) => object
                .reference
                .as_deref()
                .and_then(|r| r.strip_prefix(DEFINITIONS_PATH))
                .map(str::to_string),
            Schema::Bool(_) => None,
        };

        referenced.unwrap_or_else(|| {
            let name = T::schema_name();
            self.inlined.insert(name.clone(), schema);
            name
        })
    }
}
