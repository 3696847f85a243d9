//! OpenAPI (swagger 2.0) document model and builder

mod builder;
mod spec;

pub use builder::build_openapi_spec;
pub use spec::*;
