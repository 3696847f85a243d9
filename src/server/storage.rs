//! REST storage declarations
//!
//! The generation server never stores anything. A storage only tells the
//! installer which kind a resource carries and which verbs it answers to.

use crate::scheme::GroupVersionKind;

/// REST verbs a storage can support
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verb {
    Create,
    List,
    DeleteCollection,
    WatchList,
    Get,
    Update,
    Patch,
    Delete,
    Watch,
}

impl Verb {
    pub const STANDARD: [Verb; 9] = [
        Verb::Create,
        Verb::List,
        Verb::DeleteCollection,
        Verb::WatchList,
        Verb::Get,
        Verb::Update,
        Verb::Patch,
        Verb::Delete,
        Verb::Watch,
    ];
}

pub trait Storage {
    /// Kind of the objects served
    fn kind(&self) -> &GroupVersionKind;

    /// Kind of the list returned by list calls
    fn list_kind(&self) -> GroupVersionKind {
        self.kind().list()
    }

    fn namespaced(&self) -> bool;

    fn supports(&self, verb: Verb) -> bool;
}

/// Kind information for a resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceInfo {
    pub kind: GroupVersionKind,
    pub list_kind: GroupVersionKind,
    pub namespaced: bool,
}

impl ResourceInfo {
    /// Namespaced resource whose list kind is `<Kind>List`
    pub fn new(kind: GroupVersionKind) -> Self {
        Self {
            list_kind: kind.list(),
            kind,
            namespaced: true,
        }
    }

    pub fn cluster_scoped(mut self) -> Self {
        self.namespaced = false;
        self
    }
}

/// Storage answering to every standard verb
#[derive(Clone, Debug)]
pub struct StandardStorage {
    info: ResourceInfo,
}

impl StandardStorage {
    pub fn new(info: ResourceInfo) -> Self {
        Self { info }
    }
}

impl Storage for StandardStorage {
    fn kind(&self) -> &GroupVersionKind {
        &self.info.kind
    }

    fn list_kind(&self) -> GroupVersionKind {
        self.info.list_kind.clone()
    }

    fn namespaced(&self) -> bool {
        self.info.namespaced
    }

    fn supports(&self, verb: Verb) -> bool {
        Verb::STANDARD.contains(&verb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::GroupVersion;

    #[test]
    fn test_standard_storage() {
        let gvk = GroupVersion::new("kubeflow.org", "v1alpha2").with_kind("TFJob");
        let storage = StandardStorage::new(ResourceInfo::new(gvk.clone()));

        assert_eq!(storage.kind(), &gvk);
        assert_eq!(storage.list_kind().kind, "TFJobList");
        assert!(storage.namespaced());
        assert!(Verb::STANDARD.iter().all(|v| storage.supports(*v)));
    }

    #[test]
    fn test_cluster_scoped() {
        let gvk = GroupVersion::new("a.io", "v1").with_kind("Widget");
        let storage = StandardStorage::new(ResourceInfo::new(gvk).cluster_scoped());
        assert!(!storage.namespaced());
    }
}
