//! Static credential table: identity → secret, loaded once at startup.

use std::collections::HashMap;

use subtle::ConstantTimeEq;

pub struct CredentialStore {
    users: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    /// Exact-match credential check. Unknown identity and wrong secret are
    /// deliberately indistinguishable to the caller, and the secret
    /// comparison is constant-time — neither the return value nor its
    /// timing says which half failed.
    pub fn verify(&self, identity: &str, secret: &str) -> bool {
        let Some(expected) = self.users.get(identity) else {
            // Burn a comparison anyway so the miss doesn't return faster.
            let _ = secret.as_bytes().ct_eq(b"missing-identity-filler");
            return false;
        };
        expected.as_bytes().ct_eq(secret.as_bytes()).into()
    }
}
