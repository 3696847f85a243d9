//! Custom Resource Definitions exposed by the spec generator

mod tf_job;

pub use tf_job::*;

use kube::CustomResourceExt;

use crate::scheme::{GroupVersion, Scheme, TypeInfo};
use crate::Result;

pub const GROUP: &str = "kubeflow.org";
pub const VERSION: &str = "v1alpha2";
pub const KIND: &str = "TFJob";
pub const PLURAL: &str = "tfjobs";

pub fn scheme_group_version() -> GroupVersion {
    GroupVersion::new(GROUP, VERSION)
}

/// Group/version, resource plural and kind of the TFJob resource
pub fn type_info() -> TypeInfo {
    TypeInfo {
        group_version: scheme_group_version(),
        resource: PLURAL.to_string(),
        kind: KIND.to_string(),
    }
}

/// Register the TFJob types and the meta types they depend on
pub fn install(scheme: &mut Scheme) -> Result<()> {
    let gv = scheme_group_version();
    scheme.add_meta_types()?;
    scheme.add_known_type::<TFJob>(gv.with_kind(KIND))?;
    scheme.add_known_type::<TFJobList>(gv.with_kind(format!("{KIND}List")))?;
    Ok(())
}

/// Generate CRD YAML manifests for all custom resources
pub fn generate_crds() -> Result<Vec<String>> {
    Ok(vec![serde_yaml::to_string(&TFJob::crd())?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_info() {
        let info = type_info();
        assert_eq!(info.group_version.to_string(), "kubeflow.org/v1alpha2");
        assert_eq!(info.resource, "tfjobs");
        assert_eq!(info.group_version_kind().kind, "TFJob");
    }

    #[test]
    fn test_install_registers_object_and_list() {
        let mut scheme = Scheme::new();
        install(&mut scheme).unwrap();

        let gvk = type_info().group_version_kind();
        assert!(scheme.recognizes(&gvk));
        assert!(scheme.recognizes(&gvk.list()));

        let definitions = scheme.definitions().unwrap();
        assert!(definitions.contains_key(scheme.definition_name(&gvk).unwrap()));
        assert!(definitions.contains_key(scheme.definition_name(&gvk.list()).unwrap()));
    }

    #[test]
    fn test_install_twice_is_idempotent() {
        let mut scheme = Scheme::new();
        install(&mut scheme).unwrap();
        assert!(install(&mut scheme).is_ok());
    }

    #[test]
    fn test_generate_crds() {
        let crds = generate_crds().unwrap();
        assert_eq!(crds.len(), 1);
        assert!(crds[0].contains("name: tfjobs.kubeflow.org"));
        assert!(crds[0].contains("kind: TFJob"));
    }
}
