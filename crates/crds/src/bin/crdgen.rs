//! Prints the UptimeMonitor CRD as YAML.
//!
//! ```sh
//! cargo run -p crds --bin crdgen | kubectl apply -f -
//! ```

use crds::UptimeMonitor;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(&UptimeMonitor::crd())
        .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
    print!("{yaml}");
    Ok(())
}
