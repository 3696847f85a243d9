//! Route table entries recorded by the generation server

use std::fmt;

use crate::scheme::GroupVersionKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// Kubernetes action a resource route performs (`x-kubernetes-action`)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Get,
    List,
    Post,
    Put,
    Patch,
    Delete,
    DeleteCollection,
    Watch,
    WatchList,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Get => "get",
            Action::List => "list",
            Action::Post => "post",
            Action::Put => "put",
            Action::Patch => "patch",
            Action::Delete => "delete",
            Action::DeleteCollection => "deletecollection",
            Action::Watch => "watch",
            Action::WatchList => "watchlist",
        }
    }
}

/// Where a parameter is carried
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Body,
}

/// Type of a parameter value
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Boolean,
    /// Body parameter described by a registered kind
    Kind(GroupVersionKind),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub location: ParamLocation,
    pub description: String,
    pub param_type: ParamType,
    pub required: bool,
    pub unique_items: bool,
}

impl Param {
    pub fn path(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            location: ParamLocation::Path,
            description: description.to_string(),
            param_type: ParamType::String,
            required: true,
            unique_items: true,
        }
    }

    pub fn query(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            location: ParamLocation::Query,
            description: description.to_string(),
            param_type,
            required: false,
            unique_items: true,
        }
    }

    pub fn body(kind: GroupVersionKind) -> Self {
        Self {
            name: "body".to_string(),
            location: ParamLocation::Body,
            description: String::new(),
            param_type: ParamType::Kind(kind),
            required: true,
            unique_items: false,
        }
    }
}

/// A response code with the kind it returns, if any
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteResponse {
    pub code: u16,
    pub message: String,
    pub kind: Option<GroupVersionKind>,
}

impl RouteResponse {
    pub fn ok(code: u16, kind: GroupVersionKind) -> Self {
        let message = match code {
            201 => "Created",
            202 => "Accepted",
            _ => "OK",
        };
        Self {
            code,
            message: message.to_string(),
            kind: Some(kind),
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            code: 401,
            message: "Unauthorized".to_string(),
            kind: None,
        }
    }
}

/// One entry of the server's route table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub operation_id: String,
    pub description: String,
    pub tags: Vec<String>,
    pub action: Option<Action>,
    /// Kind the route operates on (`x-kubernetes-group-version-kind`)
    pub kind: Option<GroupVersionKind>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub params: Vec<Param>,
    pub responses: Vec<RouteResponse>,
}
