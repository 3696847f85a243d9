//! Recommended options for the generation server
//!
//! Every subsystem that would make the server talk to the outside world is
//! an `Option` here. The spec generator leaves storage, authorization and
//! the core API unset; the server never listens on its serving address.

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::{AuthenticationInfo, SecureServingInfo, ServerConfig};
use crate::{Error, Result};

/// Directory created as a side effect of defaulting the serving options
pub const APISERVER_LOCAL_CONFIG_PATH: &str = "apiserver.local.config";

const SERVING_CONFIG_FILE: &str = "serving.yaml";

/// Serving options (bind address, port, and certificate location)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureServingOptions {
    pub bind_address: IpAddr,
    pub bind_port: u16,
    /// Directory holding the serving configuration and certificates
    pub cert_directory: PathBuf,
    pub pair_name: String,
}

/// Contents of the local serving configuration file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalServingConfig {
    pub public_address: String,
    pub alternate_ips: Vec<IpAddr>,
    pub bind_address: IpAddr,
    pub bind_port: u16,
}

impl SecureServingOptions {
    pub fn new(local_config_path: &Path) -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            bind_port: 443,
            cert_directory: local_config_path.join("certificates"),
            pair_name: "apiserver".to_string(),
        }
    }

    pub fn serving_config_path(&self) -> PathBuf {
        self.cert_directory.join(SERVING_CONFIG_FILE)
    }

    /// Write the local serving configuration for `public_address` unless one
    /// already exists in the certificate directory.
    pub fn maybe_default_with_local_config(
        &self,
        public_address: &str,
        alternate_ips: &[IpAddr],
    ) -> Result<()> {
        let path = self.serving_config_path();
        if path.exists() {
            debug!(path = %path.display(), "Using existing local serving config");
            return Ok(());
        }

        fs::create_dir_all(&self.cert_directory)?;

        let config = LocalServingConfig {
            public_address: public_address.to_string(),
            alternate_ips: alternate_ips.to_vec(),
            bind_address: self.bind_address,
            bind_port: self.bind_port,
        };
        fs::write(&path, serde_yaml::to_string(&config)?)?;

        info!(path = %path.display(), "Generated local serving config");
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.bind_port == 0 {
            return Err(Error::Config("secure serving bind port must be non-zero".to_string()));
        }
        if self.pair_name.is_empty() {
            return Err(Error::Config("secure serving pair name must be set".to_string()));
        }
        Ok(())
    }
}

/// Storage backend options
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EtcdOptions {
    pub servers: Vec<String>,
}

/// Delegated authentication options
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthenticationOptions {
    pub remote_kubeconfig_file: Option<PathBuf>,
}

/// Delegated authorization options
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorizationOptions {
    pub remote_kubeconfig_file: Option<PathBuf>,
}

/// Core API client options
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoreApiOptions {
    pub core_api_kubeconfig_path: Option<PathBuf>,
}

/// Recommended set of options for a generic API server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecommendedOptions {
    /// Key prefix resources would be stored under
    pub storage_prefix: String,
    pub secure_serving: SecureServingOptions,
    pub etcd: Option<EtcdOptions>,
    pub authentication: Option<AuthenticationOptions>,
    pub authorization: Option<AuthorizationOptions>,
    pub core_api: Option<CoreApiOptions>,
}

impl RecommendedOptions {
    pub fn new(storage_prefix: impl Into<String>, local_config_path: &Path) -> Self {
        let storage_prefix = storage_prefix.into();
        Self {
            secure_serving: SecureServingOptions::new(local_config_path),
            etcd: Some(EtcdOptions {
                servers: vec!["http://127.0.0.1:2379".to_string()],
            }),
            authentication: Some(AuthenticationOptions::default()),
            authorization: Some(AuthorizationOptions::default()),
            core_api: Some(CoreApiOptions::default()),
            storage_prefix,
        }
    }

    /// Validate the options and apply them to `config`.
    ///
    /// The generation server has no storage backend, authorizer, or core API
    /// client, so those options must be disabled.
    pub fn apply_to(&self, config: &mut ServerConfig) -> Result<()> {
        self.secure_serving.validate()?;

        if self.etcd.is_some() {
            return Err(Error::Config(
                "etcd storage is not supported by the generation server".to_string(),
            ));
        }
        if self.authorization.is_some() {
            return Err(Error::Config(
                "authorization is not supported by the generation server".to_string(),
            ));
        }
        if self.core_api.is_some() {
            return Err(Error::Config(
                "core API access is not supported by the generation server".to_string(),
            ));
        }

        config.storage_prefix = self.storage_prefix.clone();
        config.secure_serving = Some(SecureServingInfo {
            bind_address: self.secure_serving.bind_address,
            bind_port: self.secure_serving.bind_port,
            cert_directory: self.secure_serving.cert_directory.clone(),
        });
        config.authentication = self.authentication.as_ref().map(|_| AuthenticationInfo);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_options(dir: &Path) -> RecommendedOptions {
        let mut options = RecommendedOptions::new("/registry/foo.com", dir);
        options.etcd = None;
        options.authentication = None;
        options.authorization = None;
        options.core_api = None;
        options
    }

    #[test]
    fn test_defaults_enable_everything() {
        let options = RecommendedOptions::new("/registry", Path::new("local"));
        assert!(options.etcd.is_some());
        assert!(options.authentication.is_some());
        assert_eq!(options.secure_serving.bind_port, 443);
        assert_eq!(
            options.secure_serving.cert_directory,
            Path::new("local").join("certificates")
        );
    }

    #[test]
    fn test_apply_rejects_etcd() {
        let mut options = disabled_options(Path::new("local"));
        options.etcd = Some(EtcdOptions { servers: vec![] });

        let err = options.apply_to(&mut ServerConfig::new()).unwrap_err();
        assert!(err.to_string().contains("etcd"));
    }

    #[test]
    fn test_apply_rejects_zero_port() {
        let mut options = disabled_options(Path::new("local"));
        options.secure_serving.bind_port = 0;
        assert!(options.apply_to(&mut ServerConfig::new()).is_err());
    }

    #[test]
    fn test_apply_copies_serving_settings() {
        let mut options = disabled_options(Path::new("local"));
        options.secure_serving.bind_port = 8443;

        let mut config = ServerConfig::new();
        options.apply_to(&mut config).unwrap();

        assert_eq!(config.storage_prefix, "/registry/foo.com");
        assert_eq!(config.secure_serving.as_ref().unwrap().bind_port, 8443);
        assert!(config.authentication.is_none());
    }

    #[test]
    fn test_apply_keeps_authentication() {
        let mut options = disabled_options(Path::new("local"));
        options.authentication = Some(AuthenticationOptions::default());

        let mut config = ServerConfig::new();
        options.apply_to(&mut config).unwrap();
        assert!(config.authentication.is_some());
    }

    #[test]
    fn test_local_config_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join(APISERVER_LOCAL_CONFIG_PATH);
        let serving = SecureServingOptions::new(&local);

        serving
            .maybe_default_with_local_config("localhost", &["127.0.0.1".parse().unwrap()])
            .unwrap();

        let path = serving.serving_config_path();
        let written: LocalServingConfig =
            serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.public_address, "localhost");
        assert_eq!(written.alternate_ips.len(), 1);

        serving
            .maybe_default_with_local_config("other", &[])
            .unwrap();
        let again: LocalServingConfig =
            serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(again, written);
    }
}
