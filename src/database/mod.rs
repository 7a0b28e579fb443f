pub mod client;
pub mod manager;
pub mod query_builder;

pub use client::{AuthAccount, AuthSession, DataClient};
pub use manager::{CredentialTier, DataClients, DatabaseError};
pub use query_builder::{Order, Query};
