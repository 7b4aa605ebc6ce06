//! Outbound port: the authentication collaborator.

use async_trait::async_trait;
use shared_types::Identity;

use crate::domain::SupervisorError;

/// Resolves a bearer credential to the identity it was issued for.
///
/// The supervisor never trusts an identity claimed in a client payload;
/// it only uses what this port returns.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Identity, SupervisorError>;
}
