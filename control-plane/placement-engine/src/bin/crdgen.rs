use kube::core::CustomResourceExt;
use placement_api::{Deployer, PlacementRule};

fn main() {
    let rule_crd = serde_yaml::to_string(&PlacementRule::crd())
        .expect("serialize PlacementRule CRD to YAML");
    let deployer_crd = serde_yaml::to_string(&Deployer::crd())
        .expect("serialize Deployer CRD to YAML");
    println!("{}---\n{}", rule_crd, deployer_crd);
}
