use thiserror::Error;

/// Errors surfaced from a reconcile pass. All of these are transient from
/// the controller's point of view; the error policy requeues with backoff.
#[derive(Error, Debug)]
pub enum Error {
    #[error("kube api error: {0}")]
    Kube(#[from] kube::Error),

    #[error(transparent)]
    Selector(#[from] placement_api::SelectorError),

    #[error("status serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
