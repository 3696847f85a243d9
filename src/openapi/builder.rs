//! Assembles a swagger 2.0 document from a route table and a scheme

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use super::spec::{
    GroupVersionKindExtension, Operation, Parameter, PathItem, Reference, Response, Swagger,
};
use crate::scheme::{GroupVersionKind, Scheme};
use crate::server::routes::{Method, Param, ParamLocation, ParamType, Route};
use crate::server::OpenApiConfig;
use crate::{Error, Result};

const SWAGGER_VERSION: &str = "2.0";

/// Build the OpenAPI document describing `routes`.
///
/// Every kind a route refers to must be registered in `scheme`. Parameters
/// shared by all operations of a path are declared once on the path.
pub fn build_openapi_spec(
    routes: &[Route],
    scheme: &Scheme,
    config: &OpenApiConfig,
) -> Result<Swagger> {
    let definitions = scheme.definitions()?;
    let resolver = Resolver {
        scheme,
        definitions: &definitions,
    };

    let mut paths: BTreeMap<String, PathItem> = BTreeMap::new();
    for route in routes {
        let operation = resolver.operation(route)?;
        let item = paths.entry(route.path.clone()).or_default();

        let slot = match route.method {
            Method::Get => &mut item.get,
            Method::Put => &mut item.put,
            Method::Post => &mut item.post,
            Method::Delete => &mut item.delete,
            Method::Patch => &mut item.patch,
        };
        if slot.is_some() {
            return Err(Error::DuplicateRoute {
                method: route.method.to_string(),
                path: route.path.clone(),
            });
        }
        *slot = Some(operation);
    }

    for item in paths.values_mut() {
        hoist_common_parameters(item);
    }

    let security = config
        .security_definitions
        .keys()
        .map(|name| BTreeMap::from([(name.clone(), Vec::new())]))
        .collect();

    debug!(
        paths = paths.len(),
        definitions = definitions.len(),
        "Built OpenAPI spec"
    );

    Ok(Swagger {
        swagger: SWAGGER_VERSION.to_string(),
        info: config.info.clone(),
        paths,
        definitions,
        security_definitions: config.security_definitions.clone(),
        security,
    })
}

struct Resolver<'a> {
    scheme: &'a Scheme,
    definitions: &'a BTreeMap<String, Value>,
}

impl Resolver<'_> {
    fn reference(&self, kind: &GroupVersionKind, path: &str) -> Result<Reference> {
        let name = self
            .scheme
            .definition_name(kind)
            .map_err(|_| Error::MissingDefinition {
                path: path.to_string(),
                name: kind.to_string(),
            })?;

        if !self.definitions.contains_key(name) {
            return Err(Error::MissingDefinition {
                path: path.to_string(),
                name: name.to_string(),
            });
        }
        Ok(Reference::definition(name))
    }

    fn parameter(&self, param: &Param, path: &str) -> Result<Parameter> {
        let (type_, schema) = match &param.param_type {
            ParamType::String => (Some("string".to_string()), None),
            ParamType::Integer => (Some("integer".to_string()), None),
            ParamType::Boolean => (Some("boolean".to_string()), None),
            ParamType::Kind(kind) => (None, Some(self.reference(kind, path)?)),
        };

        let location = match param.location {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Body => "body",
        };

        Ok(Parameter {
            name: param.name.clone(),
            location: location.to_string(),
            description: (!param.description.is_empty()).then(|| param.description.clone()),
            required: param.required.then_some(true),
            type_,
            unique_items: param.unique_items.then_some(true),
            schema,
        })
    }

    fn operation(&self, route: &Route) -> Result<Operation> {
        let parameters = route
            .params
            .iter()
            .map(|param| self.parameter(param, &route.path))
            .collect::<Result<Vec<_>>>()?;

        let mut responses = BTreeMap::new();
        for response in &route.responses {
            let schema = response
                .kind
                .as_ref()
                .map(|kind| self.reference(kind, &route.path))
                .transpose()?;
            responses.insert(
                response.code.to_string(),
                Response {
                    description: response.message.clone(),
                    schema,
                },
            );
        }

        Ok(Operation {
            description: route.description.clone(),
            consumes: route.consumes.clone(),
            produces: route.produces.clone(),
            schemes: vec!["https".to_string()],
            tags: route.tags.clone(),
            operation_id: route.operation_id.clone(),
            parameters,
            responses,
            x_kubernetes_action: route.action.map(|action| action.as_str().to_string()),
            x_kubernetes_group_version_kind: route.kind.as_ref().map(|kind| {
                GroupVersionKindExtension {
                    group: kind.group.clone(),
                    kind: kind.kind.clone(),
                    version: kind.version.clone(),
                }
            }),
        })
    }
}

/// Move non-body parameters declared identically by every operation of
/// `item` to the path level.
fn hoist_common_parameters(item: &mut PathItem) {
    let mut operations = item.operations();
    let Some(first) = operations.next() else {
        return;
    };
    let others: Vec<&Operation> = operations.collect();

    let common: Vec<Parameter> = first
        .parameters
        .iter()
        .filter(|param| param.location != "body")
        .filter(|param| others.iter().all(|op| op.parameters.contains(*param)))
        .cloned()
        .collect();

    if common.is_empty() {
        return;
    }

    for operation in item.operations_mut() {
        operation.parameters.retain(|param| !common.contains(param));
    }
    item.parameters = common;
}
