//! Purpose: Own the signed-in user's status text and its read/write round trips.
//! Exports: `StatusSession`, status flow messages.
//! Role: Independent state slice; never touches feed state, so it may run alongside a posts load.
//! Invariants: `submit` sends the currently held text, not a separate draft.
//! Invariants: Updates overwrite unconditionally; the echoed value is logged, not stored.
use super::config::Credential;
use super::flight::{InFlight, lock};
use super::gateway::Gateway;
use crate::core::error::Error;
use std::sync::Mutex;
use tracing::{debug, info, warn};

pub const STATUS_FETCH_FAILED: &str = "Failed to fetch user status.";
pub const STATUS_UPDATE_FAILED: &str = "Can't update status!";

#[derive(Debug, Default)]
pub struct StatusSession {
    text: Mutex<String>,
    loading: InFlight,
    updating: InFlight,
}

impl StatusSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        lock(&self.text).clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        *lock(&self.text) = text.into();
    }

    pub async fn load<G: Gateway>(
        &self,
        gateway: &G,
        credential: &Credential,
    ) -> Result<(), Error> {
        let _flight = self.loading.enter("status load")?;
        debug!("loading user status");
        match gateway.fetch_status(credential).await {
            Ok(status) => {
                *lock(&self.text) = status;
                Ok(())
            }
            Err(err) => {
                let err = err.into_error(STATUS_FETCH_FAILED);
                warn!(kind = ?err.kind(), error = %err, "status load failed");
                Err(err)
            }
        }
    }

    pub async fn submit<G: Gateway>(
        &self,
        gateway: &G,
        credential: &Credential,
    ) -> Result<String, Error> {
        let _flight = self.updating.enter("status update")?;
        let text = self.text();
        debug!(status = %text, "updating user status");
        match gateway.update_status(credential, &text).await {
            Ok(echo) => {
                info!(status = %echo, "user status updated");
                Ok(echo)
            }
            Err(err) => {
                let err = err.into_error(STATUS_UPDATE_FAILED);
                warn!(kind = ?err.kind(), error = %err, "status update failed");
                Err(err)
            }
        }
    }
}
