//! CRD YAML Generator
//!
//! This binary generates the Kubernetes CRD manifest for the TFJob resource
//! whose OpenAPI specification genspec renders.
//!
//! Usage: cargo run --bin crdgen > deploy/crds/tfjob.yaml

use genspec::crd::generate_crds;

fn main() -> anyhow::Result<()> {
    for crd in generate_crds()? {
        println!("---");
        print!("{}", crd);
    }
    Ok(())
}
