// [libs/infra/store/src/lib.rs]

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::{StoreClient, StoreConfig};
pub use errors::StoreError;
pub use repositories::{EventLedgerRepository, SimStateRepository};
