//! Renders the TFJob swagger document
//!
//! A throwaway server is configured with every external subsystem disabled,
//! the TFJob group is installed on it, and its route table is handed to the
//! OpenAPI builder together with the scheme's reflected definitions.

use std::collections::BTreeMap;
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::crd;
use crate::openapi::{build_openapi_spec, Contact, Info, License};
use crate::scheme::{Scheme, TypeInfo};
use crate::server::{
    default_openapi_config, ApiGroupInfo, RecommendedOptions, ResourceInfo, ResourceStorageMap,
    ServerConfig, StandardStorage, Storage,
};
use crate::{Error, Result};

const SERVER_NAME: &str = "openapi-server";
const STORAGE_PREFIX: &str = "/registry/kubeflow.org";
const BIND_PORT: u16 = 8443;

/// Inputs to the server configuration
pub struct Config {
    pub info: Info,
    /// Directory the serving options write their local config into
    pub local_config_path: PathBuf,
}

/// Build a server config whose only live subsystem is OpenAPI publishing.
///
/// Writes the local serving config under `config.local_config_path`.
pub fn new_server_config_with_spec(config: Config) -> Result<ServerConfig> {
    let mut options = RecommendedOptions::new(STORAGE_PREFIX, &config.local_config_path);
    options.secure_serving.bind_port = BIND_PORT;
    options.etcd = None;
    options.authentication = None;
    options.authorization = None;
    options.core_api = None;

    options
        .secure_serving
        .maybe_default_with_local_config("localhost", &[IpAddr::V4(Ipv4Addr::LOCALHOST)])
        .map_err(|e| Error::Config(format!("error creating local serving config: {e}")))?;

    let mut server_config = ServerConfig::new();
    options.apply_to(&mut server_config)?;

    let mut openapi = default_openapi_config();
    openapi.info = config.info;
    server_config.openapi_config = Some(openapi);

    Ok(server_config)
}

/// Storage serving CRUD routes for `type_info`
pub fn route_storage(type_info: &TypeInfo, scheme: &Scheme) -> Result<ResourceStorageMap> {
    let gvk = type_info.group_version_kind();
    let resource = ResourceInfo::new(gvk);

    for kind in [&resource.kind, &resource.list_kind] {
        if !scheme.recognizes(kind) {
            return Err(Error::NotRegistered(kind.clone()));
        }
    }

    let storage: Box<dyn Storage> = Box::new(StandardStorage::new(resource));
    Ok(BTreeMap::from([(type_info.resource.clone(), storage)]))
}

/// Info block published with the TFJob spec
pub fn tfjob_info() -> Info {
    Info {
        title: "tf-operator".to_string(),
        version: crd::VERSION.to_string(),
        description: None,
        contact: Some(Contact {
            name: "kubeflow.org".to_string(),
            url: Some("https://kubeflow.org".to_string()),
            email: None,
        }),
        license: Some(License {
            name: "Apache 2.0".to_string(),
            url: Some("https://www.apache.org/licenses/LICENSE-2.0.html".to_string()),
        }),
    }
}

/// Render the TFJob OpenAPI specification as indented JSON.
///
/// `local_config_path` receives the incidental serving config; callers are
/// responsible for removing it (see [`LocalConfigGuard`]).
pub fn render_swagger_json(local_config_path: &Path) -> Result<String> {
    let mut scheme = Scheme::new();
    crd::install(&mut scheme).map_err(|e| e.context("failed to register API group to schema"))?;

    let server_config = new_server_config_with_spec(Config {
        info: tfjob_info(),
        local_config_path: local_config_path.to_path_buf(),
    })
    .map_err(|e| e.context("failed to create server config"))?;

    let completed = server_config.complete();
    let mut server = completed
        .new_server(SERVER_NAME)
        .map_err(|e| e.context("failed to create server"))?;

    let type_info = crd::type_info();
    let mut api_group_info = ApiGroupInfo::new(type_info.group_version.group.clone(), &scheme);
    let storage = route_storage(&type_info, &scheme)?;
    api_group_info
        .versioned_resources_storage_map
        .insert(type_info.group_version.version.clone(), storage);
    server.install_api_group(&api_group_info)?;

    let openapi_config = completed
        .openapi_config()
        .ok_or_else(|| Error::Config("OpenAPI config is not set".to_string()))?;
    let spec = build_openapi_spec(server.registered_routes(), &scheme, openapi_config)
        .map_err(|e| e.context("failed to render OpenAPI spec"))?;

    info!(
        server = server.name(),
        paths = spec.paths.len(),
        definitions = spec.definitions.len(),
        "Rendered OpenAPI spec"
    );

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    serde::Serialize::serialize(&spec, &mut serializer)?;

    String::from_utf8(buf).map_err(|e| Error::Server(format!("spec is not valid UTF-8: {e}")))
}

/// Remove the local config directory if it exists
pub fn cleanup_config(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
        debug!(path = %path.display(), "Removed local config");
    }
    Ok(())
}

/// Removes the local config directory when dropped
#[derive(Debug)]
pub struct LocalConfigGuard {
    path: PathBuf,
}

impl LocalConfigGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LocalConfigGuard {
    fn drop(&mut self) {
        if let Err(e) = cleanup_config(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove local config");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::APISERVER_LOCAL_CONFIG_PATH;

    #[test]
    fn test_server_config_disables_subsystems() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join(APISERVER_LOCAL_CONFIG_PATH);

        let config = new_server_config_with_spec(Config {
            info: tfjob_info(),
            local_config_path: local.clone(),
        })
        .unwrap();

        assert!(config.authentication.is_none());
        assert_eq!(config.secure_serving.as_ref().unwrap().bind_port, 8443);
        assert_eq!(config.openapi_config.as_ref().unwrap().info.version, "v1alpha2");
        assert!(local.join("certificates").exists());
    }

    #[test]
    fn test_route_storage() {
        let mut scheme = Scheme::new();
        crd::install(&mut scheme).unwrap();

        let storage = route_storage(&crd::type_info(), &scheme).unwrap();
        assert_eq!(storage.len(), 1);
        assert_eq!(storage["tfjobs"].kind().kind, "TFJob");
    }

    #[test]
    fn test_route_storage_requires_registration() {
        let scheme = Scheme::new();
        assert!(matches!(
            route_storage(&crd::type_info(), &scheme),
            Err(Error::NotRegistered(_))
        ));
    }

    #[test]
    fn test_render_swagger_json() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join(APISERVER_LOCAL_CONFIG_PATH);

        let json = render_swagger_json(&local).unwrap();
        assert!(json.contains("\n\t\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["swagger"], "2.0");
        assert_eq!(value["info"]["contact"]["name"], "kubeflow.org");
        assert_eq!(value["info"]["license"]["name"], "Apache 2.0");
        assert!(value["paths"]["/apis/kubeflow.org/v1alpha2/namespaces/{namespace}/tfjobs"]["post"]
            .is_object());
        assert!(value["paths"]["/version/"]["get"].is_object());
        assert!(value.get("securityDefinitions").is_none());
    }

    #[test]
    fn test_cleanup_config() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join(APISERVER_LOCAL_CONFIG_PATH);
        fs::create_dir_all(local.join("certificates")).unwrap();

        cleanup_config(&local).unwrap();
        assert!(!local.exists());

        // missing directory is fine
        cleanup_config(&local).unwrap();
    }

    #[test]
    fn test_guard_removes_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join(APISERVER_LOCAL_CONFIG_PATH);

        {
            let guard = LocalConfigGuard::new(&local);
            render_swagger_json(guard.path()).unwrap();
            assert!(local.exists());
        }
        assert!(!local.exists());
    }
}
