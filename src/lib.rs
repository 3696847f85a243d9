//! TFJob OpenAPI specification generator
//!
//! Registers the Kubeflow TFJob custom resource with a throwaway API server
//! and renders the server's routes and the resource schema as a swagger 2.0
//! document.

pub mod crd;
pub mod error;
pub mod generator;
pub mod openapi;
pub mod scheme;
pub mod server;

pub use error::{Error, Result};
