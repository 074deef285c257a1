pub mod credentials;
pub mod federated;
pub mod google;
pub mod principal;

pub use credentials::{register, verify};
pub use federated::{upsert_from_provider, FederatedProfile};
pub use google::GoogleOAuth;
