//! Account authentication against the remote auth provider.

pub mod gateway;
pub mod provider;

pub use gateway::AuthGateway;
pub use provider::{AuthProvider, HttpAuthProvider, LoginResponse};
