pub mod client;
pub mod protocol;
pub mod registry;
pub mod sync;

pub use client::PeerClient;
pub use registry::{NodeRegistry, normalize_endpoint};
pub use sync::RemoteChainOutcome;
