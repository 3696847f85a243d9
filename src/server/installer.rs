//! Maps resources to REST routes, the way a Kubernetes API server lays them out

use crate::scheme::{GroupVersion, GroupVersionKind};

use super::routes::{Action, Method, Param, ParamType, Route, RouteResponse};
use super::storage::{Storage, Verb};

const SERIALIZED: [&str; 3] = [
    "application/json",
    "application/yaml",
    "application/vnd.kubernetes.protobuf",
];

const STREAMED: [&str; 5] = [
    "application/json",
    "application/yaml",
    "application/vnd.kubernetes.protobuf",
    "application/json;stream=watch",
    "application/vnd.kubernetes.protobuf;stream=watch",
];

const PATCH_TYPES: [&str; 3] = [
    "application/json-patch+json",
    "application/merge-patch+json",
    "application/strategic-merge-patch+json",
];

/// `kubeflow.org` -> `KubeflowOrg`, core group -> `Core`
pub fn camel_group(group: &str) -> String {
    if group.is_empty() {
        return "Core".to_string();
    }
    group
        .split(['.', '-'])
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

/// Infix inserted into operation ids, e.g. `KubeflowOrgV1alpha2`
pub fn operation_infix(gv: &GroupVersion) -> String {
    format!("{}{}", camel_group(&gv.group), capitalize(&gv.version))
}

/// Tag for a group, e.g. `kubeflowOrg`
pub fn group_tag(group: &str) -> String {
    lower_first(&camel_group(group))
}

/// Tag for a group/version, e.g. `kubeflowOrg_v1alpha2`
pub fn group_version_tag(gv: &GroupVersion) -> String {
    format!("{}_{}", group_tag(&gv.group), gv.version)
}

/// Path prefix of a group/version: `/api/v1` for the core group, `/apis/<group>/<version>` otherwise
pub fn group_version_prefix(gv: &GroupVersion) -> String {
    if gv.group.is_empty() {
        format!("/api/{}", gv.version)
    } else {
        format!("/apis/{}/{}", gv.group, gv.version)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn pretty() -> Param {
    Param::query(
        "pretty",
        ParamType::String,
        "If 'true', then the output is pretty printed.",
    )
}

fn namespace() -> Param {
    Param::path(
        "namespace",
        "object name and auth scope, such as for teams and projects",
    )
}

fn name(kind: &str) -> Param {
    Param::path("name", &format!("name of the {kind}"))
}

fn list_params() -> Vec<Param> {
    vec![
        Param::query(
            "continue",
            ParamType::String,
            "The continue option should be set when retrieving more results from the server.",
        ),
        Param::query(
            "fieldSelector",
            ParamType::String,
            "A selector to restrict the list of returned objects by their fields. Defaults to everything.",
        ),
        Param::query(
            "labelSelector",
            ParamType::String,
            "A selector to restrict the list of returned objects by their labels. Defaults to everything.",
        ),
        Param::query(
            "limit",
            ParamType::Integer,
            "limit is a maximum number of responses to return for a list call.",
        ),
        Param::query(
            "resourceVersion",
            ParamType::String,
            "When specified with a watch call, shows changes that occur after that particular version of a resource. Defaults to changes from the beginning of history.",
        ),
        Param::query(
            "timeoutSeconds",
            ParamType::Integer,
            "Timeout for the list/watch call.",
        ),
        Param::query(
            "watch",
            ParamType::Boolean,
            "Watch for changes to the described resources and return them as a stream of add, update, and remove notifications.",
        ),
    ]
}

fn get_params() -> Vec<Param> {
    vec![
        Param::query(
            "exact",
            ParamType::Boolean,
            "Should the export be exact.  Exact export maintains cluster-specific fields like 'Namespace'.",
        ),
        Param::query(
            "export",
            ParamType::Boolean,
            "Should this value be exported.  Export strips fields that a user can not specify.",
        ),
    ]
}

fn delete_params(delete_options: &GroupVersionKind) -> Vec<Param> {
    vec![
        Param::body(delete_options.clone()),
        Param::query(
            "gracePeriodSeconds",
            ParamType::Integer,
            "The duration in seconds before the object should be deleted. Value must be non-negative integer. The value zero indicates delete immediately.",
        ),
        Param::query(
            "orphanDependents",
            ParamType::Boolean,
            "Deprecated: please use the PropagationPolicy, this field will be deprecated in 1.7. Should the dependent objects be orphaned.",
        ),
        Param::query(
            "propagationPolicy",
            ParamType::String,
            "Whether and how garbage collection will be performed. Either this field or OrphanDependents may be set, but not both.",
        ),
    ]
}

/// Shared attributes of the routes installed for one resource
struct ResourceScope<'a> {
    gv: &'a GroupVersion,
    resource: &'a str,
    kind: &'a GroupVersionKind,
    list_kind: GroupVersionKind,
    namespaced: bool,
    infix: String,
    tag: String,
}

impl ResourceScope<'_> {
    fn scope_word(&self) -> &'static str {
        if self.namespaced {
            "Namespaced"
        } else {
            ""
        }
    }

    fn collection_path(&self, watch: bool) -> String {
        let mut path = group_version_prefix(self.gv);
        if watch {
            path.push_str("/watch");
        }
        if self.namespaced {
            path.push_str("/namespaces/{namespace}");
        }
        path.push('/');
        path.push_str(self.resource);
        path
    }

    fn item_path(&self, watch: bool) -> String {
        format!("{}/{{name}}", self.collection_path(watch))
    }

    fn scope_params(&self, item: bool) -> Vec<Param> {
        let mut params = Vec::new();
        if item {
            params.push(name(&self.kind.kind));
        }
        if self.namespaced {
            params.push(namespace());
        }
        params.push(pretty());
        params
    }

    #[allow(clippy::too_many_arguments)]
    fn route(
        &self,
        method: Method,
        path: String,
        operation_id: String,
        description: String,
        action: Action,
        mut params: Vec<Param>,
        responses: Vec<RouteResponse>,
    ) -> Route {
        let consumes = match method {
            Method::Patch => strings(&PATCH_TYPES),
            _ => strings(&["*/*"]),
        };
        let produces = match action {
            Action::List | Action::Watch | Action::WatchList => strings(&STREAMED),
            _ => strings(&SERIALIZED),
        };

        let item = path.ends_with("/{name}");
        params.extend(self.scope_params(item));

        let mut responses = responses;
        responses.push(RouteResponse::unauthorized());

        Route {
            method,
            path,
            operation_id,
            description,
            tags: vec![self.tag.clone()],
            action: Some(action),
            kind: Some(self.kind.clone()),
            consumes,
            produces,
            params,
            responses,
        }
    }
}

/// Build the REST routes for `resource` according to the verbs `storage` supports
pub fn resource_routes(
    gv: &GroupVersion,
    resource: &str,
    storage: &dyn Storage,
) -> Vec<Route> {
    let meta = GroupVersion::meta();
    let status = meta.with_kind("Status");
    let watch_event = meta.with_kind("WatchEvent");

    let scope = ResourceScope {
        gv,
        resource,
        kind: storage.kind(),
        list_kind: storage.list_kind(),
        namespaced: storage.namespaced(),
        infix: operation_infix(gv),
        tag: group_version_tag(gv),
    };
    let kind = scope.kind;
    let k = kind.kind.as_str();
    let infix = scope.infix.as_str();
    let ns = scope.scope_word();

    let mut routes = Vec::new();

    if storage.supports(Verb::List) {
        routes.push(scope.route(
            Method::Get,
            scope.collection_path(false),
            format!("list{infix}{ns}{k}"),
            format!("list or watch objects of kind {k}"),
            Action::List,
            list_params(),
            vec![RouteResponse::ok(200, scope.list_kind.clone())],
        ));
    }
    if storage.supports(Verb::Create) {
        routes.push(scope.route(
            Method::Post,
            scope.collection_path(false),
            format!("create{infix}{ns}{k}"),
            format!("create a {k}"),
            Action::Post,
            vec![Param::body(kind.clone())],
            vec![
                RouteResponse::ok(200, kind.clone()),
                RouteResponse::ok(201, kind.clone()),
                RouteResponse::ok(202, kind.clone()),
            ],
        ));
    }
    if storage.supports(Verb::DeleteCollection) {
        routes.push(scope.route(
            Method::Delete,
            scope.collection_path(false),
            format!("delete{infix}Collection{ns}{k}"),
            format!("delete collection of {k}"),
            Action::DeleteCollection,
            list_params(),
            vec![RouteResponse::ok(200, status.clone())],
        ));
    }
    if storage.supports(Verb::Get) {
        routes.push(scope.route(
            Method::Get,
            scope.item_path(false),
            format!("read{infix}{ns}{k}"),
            format!("read the specified {k}"),
            Action::Get,
            get_params(),
            vec![RouteResponse::ok(200, kind.clone())],
        ));
    }
    if storage.supports(Verb::Update) {
        routes.push(scope.route(
            Method::Put,
            scope.item_path(false),
            format!("replace{infix}{ns}{k}"),
            format!("replace the specified {k}"),
            Action::Put,
            vec![Param::body(kind.clone())],
            vec![
                RouteResponse::ok(200, kind.clone()),
                RouteResponse::ok(201, kind.clone()),
            ],
        ));
    }
    if storage.supports(Verb::Patch) {
        routes.push(scope.route(
            Method::Patch,
            scope.item_path(false),
            format!("patch{infix}{ns}{k}"),
            format!("partially update the specified {k}"),
            Action::Patch,
            vec![Param::body(meta.with_kind("Patch"))],
            vec![RouteResponse::ok(200, kind.clone())],
        ));
    }
    if storage.supports(Verb::Delete) {
        routes.push(scope.route(
            Method::Delete,
            scope.item_path(false),
            format!("delete{infix}{ns}{k}"),
            format!("delete a {k}"),
            Action::Delete,
            delete_params(&meta.with_kind("DeleteOptions")),
            vec![RouteResponse::ok(200, status.clone())],
        ));
    }
    if storage.supports(Verb::WatchList) {
        routes.push(scope.route(
            Method::Get,
            scope.collection_path(true),
            format!("watch{infix}{ns}{k}List"),
            format!("watch individual changes to a list of {k}"),
            Action::WatchList,
            list_params(),
            vec![RouteResponse::ok(200, watch_event.clone())],
        ));
    }
    if storage.supports(Verb::Watch) {
        routes.push(scope.route(
            Method::Get,
            scope.item_path(true),
            format!("watch{infix}{ns}{k}"),
            format!("watch changes to an object of kind {k}"),
            Action::Watch,
            list_params(),
            vec![RouteResponse::ok(200, watch_event.clone())],
        ));
    }

    if scope.namespaced {
        let all = ResourceScope {
            namespaced: false,
            infix: scope.infix.clone(),
            tag: scope.tag.clone(),
            list_kind: scope.list_kind.clone(),
            ..scope
        };
        if storage.supports(Verb::List) {
            routes.push(all.route(
                Method::Get,
                all.collection_path(false),
                format!("list{infix}{k}ForAllNamespaces"),
                format!("list or watch objects of kind {k}"),
                Action::List,
                list_params(),
                vec![RouteResponse::ok(200, all.list_kind.clone())],
            ));
        }
        if storage.supports(Verb::WatchList) {
            routes.push(all.route(
                Method::Get,
                all.collection_path(true),
                format!("watch{infix}{k}ListForAllNamespaces"),
                format!("watch individual changes to a list of {k}"),
                Action::WatchList,
                list_params(),
                vec![RouteResponse::ok(200, watch_event)],
            ));
        }
    }

    routes
}

fn discovery_route(
    path: String,
    operation_id: String,
    description: &str,
    tag: String,
    kind: GroupVersionKind,
) -> Route {
    Route {
        method: Method::Get,
        path,
        operation_id,
        description: description.to_string(),
        tags: vec![tag],
        action: None,
        kind: None,
        consumes: strings(&SERIALIZED),
        produces: strings(&SERIALIZED),
        params: Vec::new(),
        responses: vec![RouteResponse::ok(200, kind), RouteResponse::unauthorized()],
    }
}

/// `GET /version/`
pub fn version_route() -> Route {
    let mut route = discovery_route(
        "/version/".to_string(),
        "getCode".to_string(),
        "get the code version",
        "version".to_string(),
        GroupVersion::meta().with_kind("Info"),
    );
    route.consumes = strings(&["application/json"]);
    route.produces = strings(&["application/json"]);
    route
}

/// `GET /apis/`
pub fn api_versions_route() -> Route {
    discovery_route(
        "/apis/".to_string(),
        "getAPIVersions".to_string(),
        "get available API versions",
        "apis".to_string(),
        GroupVersion::meta().with_kind("APIGroupList"),
    )
}

/// `GET /apis/<group>/`
pub fn group_route(group: &str) -> Route {
    discovery_route(
        format!("/apis/{group}/"),
        format!("get{}APIGroup", camel_group(group)),
        "get information of a group",
        group_tag(group),
        GroupVersion::meta().with_kind("APIGroup"),
    )
}

/// `GET /apis/<group>/<version>/`
pub fn group_version_route(gv: &GroupVersion) -> Route {
    discovery_route(
        format!("{}/", group_version_prefix(gv)),
        format!("get{}APIResources", operation_infix(gv)),
        "get available resources",
        group_version_tag(gv),
        GroupVersion::meta().with_kind("APIResourceList"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::routes::ParamLocation;
    use crate::server::storage::{ResourceInfo, StandardStorage};

    fn tfjob_gv() -> GroupVersion {
        GroupVersion::new("kubeflow.org", "v1alpha2")
    }

    fn tfjob_storage() -> StandardStorage {
        StandardStorage::new(ResourceInfo::new(tfjob_gv().with_kind("TFJob")))
    }

    #[test]
    fn test_naming() {
        assert_eq!(camel_group("kubeflow.org"), "KubeflowOrg");
        assert_eq!(camel_group("my-group.example.com"), "MyGroupExampleCom");
        assert_eq!(camel_group(""), "Core");
        assert_eq!(operation_infix(&tfjob_gv()), "KubeflowOrgV1alpha2");
        assert_eq!(group_tag("kubeflow.org"), "kubeflowOrg");
        assert_eq!(group_version_tag(&tfjob_gv()), "kubeflowOrg_v1alpha2");
        assert_eq!(group_version_prefix(&GroupVersion::meta()), "/api/v1");
    }

    #[test]
    fn test_namespaced_routes() {
        let routes = resource_routes(&tfjob_gv(), "tfjobs", &tfjob_storage());
        assert_eq!(routes.len(), 11);

        let find = |op: &str| {
            routes
                .iter()
                .find(|r| r.operation_id == op)
                .unwrap_or_else(|| panic!("missing {op}"))
        };

        let list = find("listKubeflowOrgV1alpha2NamespacedTFJob");
        assert_eq!(list.method, Method::Get);
        assert_eq!(
            list.path,
            "/apis/kubeflow.org/v1alpha2/namespaces/{namespace}/tfjobs"
        );
        assert_eq!(list.responses[0].kind.as_ref().unwrap().kind, "TFJobList");

        let patch = find("patchKubeflowOrgV1alpha2NamespacedTFJob");
        assert_eq!(patch.method, Method::Patch);
        assert_eq!(patch.consumes.len(), 3);
        assert_eq!(
            patch.path,
            "/apis/kubeflow.org/v1alpha2/namespaces/{namespace}/tfjobs/{name}"
        );

        let watch = find("watchKubeflowOrgV1alpha2NamespacedTFJobList");
        assert_eq!(
            watch.path,
            "/apis/kubeflow.org/v1alpha2/watch/namespaces/{namespace}/tfjobs"
        );
        assert_eq!(watch.action, Some(Action::WatchList));

        let all = find("listKubeflowOrgV1alpha2TFJobForAllNamespaces");
        assert_eq!(all.path, "/apis/kubeflow.org/v1alpha2/tfjobs");
        assert!(all.params.iter().all(|p| p.name != "namespace"));

        find("deleteKubeflowOrgV1alpha2CollectionNamespacedTFJob");
        find("watchKubeflowOrgV1alpha2TFJobListForAllNamespaces");
    }

    #[test]
    fn test_every_route_is_unauthorized_capable() {
        let routes = resource_routes(&tfjob_gv(), "tfjobs", &tfjob_storage());
        for route in &routes {
            assert!(route.responses.iter().any(|r| r.code == 401));
            assert_eq!(route.tags, vec!["kubeflowOrg_v1alpha2".to_string()]);
        }
    }

    #[test]
    fn test_item_routes_carry_name() {
        let routes = resource_routes(&tfjob_gv(), "tfjobs", &tfjob_storage());
        for route in routes.iter().filter(|r| r.path.ends_with("{name}")) {
            assert!(route.params.iter().any(|p| p.name == "name"));
        }
    }

    #[test]
    fn test_create_has_body() {
        let routes = resource_routes(&tfjob_gv(), "tfjobs", &tfjob_storage());
        let create = routes.iter().find(|r| r.method == Method::Post).unwrap();
        assert!(create
            .params
            .iter()
            .any(|p| p.location == ParamLocation::Body));
        assert_eq!(create.responses.len(), 4);
    }

    #[test]
    fn test_cluster_scoped_routes() {
        let storage = StandardStorage::new(
            ResourceInfo::new(tfjob_gv().with_kind("TFJob")).cluster_scoped(),
        );
        let routes = resource_routes(&tfjob_gv(), "tfjobs", &storage);

        assert_eq!(routes.len(), 9);
        assert!(routes.iter().all(|r| !r.path.contains("namespaces")));
        assert!(routes
            .iter()
            .any(|r| r.operation_id == "listKubeflowOrgV1alpha2TFJob"));
    }

    #[test]
    fn test_discovery_routes() {
        assert_eq!(group_route("kubeflow.org").path, "/apis/kubeflow.org/");
        assert_eq!(
            group_route("kubeflow.org").operation_id,
            "getKubeflowOrgAPIGroup"
        );
        let version = group_version_route(&tfjob_gv());
        assert_eq!(version.path, "/apis/kubeflow.org/v1alpha2/");
        assert_eq!(version.operation_id, "getKubeflowOrgV1alpha2APIResources");
        assert_eq!(api_versions_route().operation_id, "getAPIVersions");
        assert_eq!(version_route().path, "/version/");
    }
}
