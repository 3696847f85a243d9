//! Generation server configuration

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;

use tracing::debug;

use super::GenericServer;
use crate::openapi::{Info, SecurityScheme};
use crate::{Error, Result};

/// Resolved serving settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecureServingInfo {
    pub bind_address: IpAddr,
    pub bind_port: u16,
    pub cert_directory: PathBuf,
}

/// Marker for a configured authenticator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthenticationInfo;

/// Settings passed to the OpenAPI builder
#[derive(Clone, Debug, PartialEq)]
pub struct OpenApiConfig {
    pub info: Info,
    pub security_definitions: BTreeMap<String, SecurityScheme>,
}

/// Default OpenAPI settings for a generic server
pub fn default_openapi_config() -> OpenApiConfig {
    OpenApiConfig {
        info: Info {
            title: "Generic".to_string(),
            version: "unversioned".to_string(),
            ..Default::default()
        },
        security_definitions: BTreeMap::new(),
    }
}

/// Configuration of the generation server
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    pub storage_prefix: String,
    pub secure_serving: Option<SecureServingInfo>,
    pub authentication: Option<AuthenticationInfo>,
    pub openapi_config: Option<OpenApiConfig>,
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill in the fields that depend on each other
    pub fn complete(mut self) -> CompletedConfig {
        if let (Some(_), Some(openapi)) = (&self.authentication, &mut self.openapi_config) {
            openapi
                .security_definitions
                .entry("BearerToken".to_string())
                .or_insert_with(SecurityScheme::bearer_token);
        }
        CompletedConfig { config: self }
    }
}

/// Server configuration ready to build a server from
#[derive(Clone, Debug)]
pub struct CompletedConfig {
    config: ServerConfig,
}

impl CompletedConfig {
    pub fn openapi_config(&self) -> Option<&OpenApiConfig> {
        self.config.openapi_config.as_ref()
    }

    /// Create the server, with only the non-resource routes installed
    pub fn new_server(&self, name: &str) -> Result<GenericServer> {
        if name.is_empty() {
            return Err(Error::Server("server name must not be empty".to_string()));
        }
        if self.config.openapi_config.is_none() {
            return Err(Error::Server(format!(
                "{name} has no OpenAPI config to publish"
            )));
        }
        debug!(server = name, storage_prefix = %self.config.storage_prefix, "Creating server");
        Ok(GenericServer::new(name))
    }
}
