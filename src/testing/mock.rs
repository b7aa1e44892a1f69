//! Mock collaborators

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::identity::{IdentityStore, ProvisioningError};

/// In-memory identity store that records every provisioning call
pub struct MockIdentityStore {
    calls: Mutex<Vec<String>>,
    fail: bool,
}

impl MockIdentityStore {
    /// A store that accepts every write
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    /// A store that rejects every write
    #[must_use]
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    /// Tokens passed to `provision_identity`, in call order
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn recorded_tokens(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityStore for MockIdentityStore {
    async fn provision_identity(&self, auth_token: &str) -> Result<(), ProvisioningError> {
        self.calls.lock().unwrap().push(auth_token.to_string());
        if self.fail {
            return Err(ProvisioningError::Store {
                status: 500,
                body: "mock store rejected the write".to_string(),
            });
        }
        Ok(())
    }
}
