pub mod migrate;
pub mod reconcile;
pub mod rpc;
