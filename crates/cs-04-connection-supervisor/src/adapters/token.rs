//! HMAC-signed bearer tokens.
//!
//! Format: `<role>.<id>.<hex hmac-sha256(secret, "<role>:<id>")>`
//!
//! The id may itself contain dots; the signature is always the last
//! segment and the role always the first.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use shared_types::{CustomerId, Identity, Role, VendorId};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::domain::SupervisorError;
use crate::ports::IdentityResolver;

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct HmacTokenResolver {
    secret: Vec<u8>,
}

impl HmacTokenResolver {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Produce a token for `identity`.
    pub fn issue(&self, identity: &Identity) -> Result<String, SupervisorError> {
        let signature = self.sign(identity.role(), identity.id_str())?;
        Ok(format!(
            "{}.{}.{}",
            identity.role(),
            identity.id_str(),
            hex::encode(signature)
        ))
    }

    /// Verify a token and return the identity it names.
    pub fn verify(&self, token: &str) -> Result<Identity, SupervisorError> {
        let (head, signature) = token
            .rsplit_once('.')
            .ok_or(SupervisorError::InvalidCredential)?;
        let (role, id) = head
            .split_once('.')
            .ok_or(SupervisorError::InvalidCredential)?;
        let role = Role::parse(role).ok_or(SupervisorError::InvalidCredential)?;
        if id.is_empty() {
            return Err(SupervisorError::InvalidCredential);
        }

        let provided = hex::decode(signature).map_err(|_| SupervisorError::InvalidCredential)?;
        let expected = self.sign(role, id)?;
        if !bool::from(expected.ct_eq(&provided)) {
            debug!(role = %role, "Token signature mismatch");
            return Err(SupervisorError::InvalidCredential);
        }

        Ok(match role {
            Role::Vendor => Identity::Vendor(VendorId::new(id)),
            Role::Customer => Identity::Customer(CustomerId::new(id)),
        })
    }

    fn sign(&self, role: Role, id: &str) -> Result<Vec<u8>, SupervisorError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| SupervisorError::InvalidCredential)?;
        mac.update(role.as_str().as_bytes());
        mac.update(b":");
        mac.update(id.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl std::fmt::Debug for HmacTokenResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacTokenResolver").finish_non_exhaustive()
    }
}

#[async_trait]
impl IdentityResolver for HmacTokenResolver {
    async fn resolve(&self, token: &str) -> Result<Identity, SupervisorError> {
        self.verify(token)
    }
}
