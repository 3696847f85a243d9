//! Throwaway API server used only to collect a route table
//!
//! Nothing here binds a socket. Installing an API group records the routes
//! the group would serve so the OpenAPI builder can describe them.

pub mod config;
pub mod installer;
pub mod options;
pub mod routes;
pub mod storage;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::scheme::{GroupVersion, Scheme};
use crate::{Error, Result};

pub use config::{default_openapi_config, CompletedConfig, OpenApiConfig, ServerConfig};
pub use options::{RecommendedOptions, APISERVER_LOCAL_CONFIG_PATH};
pub use routes::Route;
pub use storage::{ResourceInfo, StandardStorage, Storage};

/// Resource name -> storage, for one version
pub type ResourceStorageMap = BTreeMap<String, Box<dyn Storage>>;

/// Everything needed to install one API group
pub struct ApiGroupInfo<'a> {
    pub group: String,
    pub scheme: &'a Scheme,
    /// Version -> resource -> storage
    pub versioned_resources_storage_map: BTreeMap<String, ResourceStorageMap>,
}

impl<'a> ApiGroupInfo<'a> {
    pub fn new(group: impl Into<String>, scheme: &'a Scheme) -> Self {
        Self {
            group: group.into(),
            scheme,
            versioned_resources_storage_map: BTreeMap::new(),
        }
    }
}

/// Server holding the routes of every installed group
#[derive(Debug)]
pub struct GenericServer {
    name: String,
    routes: Vec<Route>,
    installed_groups: BTreeSet<String>,
}

impl GenericServer {
    /// Create a server with the routes every generic server exposes
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            routes: vec![installer::version_route(), installer::api_versions_route()],
            installed_groups: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every route registered so far, in installation order
    pub fn registered_routes(&self) -> &[Route] {
        &self.routes
    }

    /// Install the discovery and REST routes of an API group
    pub fn install_api_group(&mut self, info: &ApiGroupInfo<'_>) -> Result<()> {
        if self.installed_groups.contains(&info.group) {
            return Err(Error::Server(format!(
                "API group {} is already installed",
                info.group
            )));
        }
        if info.versioned_resources_storage_map.is_empty() {
            return Err(Error::Server(format!(
                "no resources to install for API group {}",
                info.group
            )));
        }

        let mut routes = Vec::new();
        for (version, resources) in &info.versioned_resources_storage_map {
            let gv = GroupVersion::new(info.group.clone(), version.clone());

            for (resource, storage) in resources {
                for kind in [storage.kind().clone(), storage.list_kind()] {
                    if kind.group_version() != gv {
                        return Err(Error::Server(format!(
                            "resource {resource} serves {kind}, outside {gv}"
                        )));
                    }
                    if !info.scheme.recognizes(&kind) {
                        return Err(Error::NotRegistered(kind));
                    }
                }

                let resource_routes = installer::resource_routes(&gv, resource, storage.as_ref());
                for route in &resource_routes {
                    debug!(method = %route.method, path = %route.path, "Installed route");
                }
                routes.extend(resource_routes);
            }

            routes.push(installer::group_version_route(&gv));
        }
        routes.push(installer::group_route(&info.group));

        info!(
            server = %self.name,
            group = %info.group,
            routes = routes.len(),
            "Installed API group"
        );
        self.routes.extend(routes);
        self.installed_groups.insert(info.group.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd;

    fn tfjob_group(scheme: &Scheme) -> ApiGroupInfo<'_> {
        let type_info = crd::type_info();
        let storage = StandardStorage::new(ResourceInfo::new(type_info.group_version_kind()));

        let mut resources: ResourceStorageMap = BTreeMap::new();
        resources.insert(type_info.resource.clone(), Box::new(storage));

        let mut info = ApiGroupInfo::new(crd::GROUP, scheme);
        info.versioned_resources_storage_map
            .insert(crd::VERSION.to_string(), resources);
        info
    }

    #[test]
    fn test_new_server_has_non_resource_routes() {
        let server = GenericServer::new("test");
        let paths: Vec<_> = server.registered_routes().iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/version/", "/apis/"]);
    }

    #[test]
    fn test_install_api_group() {
        let mut scheme = Scheme::new();
        crd::install(&mut scheme).unwrap();

        let mut server = GenericServer::new("test");
        server.install_api_group(&tfjob_group(&scheme)).unwrap();

        // 2 non-resource + 11 resource + version + group discovery
        assert_eq!(server.registered_routes().len(), 15);
        assert!(server
            .registered_routes()
            .iter()
            .any(|r| r.path == "/apis/kubeflow.org/"));
    }

    #[test]
    fn test_install_twice_fails() {
        let mut scheme = Scheme::new();
        crd::install(&mut scheme).unwrap();

        let mut server = GenericServer::new("test");
        server.install_api_group(&tfjob_group(&scheme)).unwrap();
        let err = server.install_api_group(&tfjob_group(&scheme)).unwrap_err();
        assert!(err.to_string().contains("already installed"));
    }

    #[test]
    fn test_install_unregistered_kind_fails() {
        let scheme = Scheme::new();
        let mut server = GenericServer::new("test");

        let err = server.install_api_group(&tfjob_group(&scheme)).unwrap_err();
        assert!(matches!(err, Error::NotRegistered(_)));
        assert_eq!(server.registered_routes().len(), 2);
    }

    #[test]
    fn test_install_empty_group_fails() {
        let scheme = Scheme::new();
        let mut server = GenericServer::new("test");
        let info = ApiGroupInfo::new("kubeflow.org", &scheme);
        assert!(server.install_api_group(&info).is_err());
    }
}
