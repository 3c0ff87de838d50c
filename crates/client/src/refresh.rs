//! Opt-in background renewal of the access token.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use blogdesk_auth::CredentialError;
use blogdesk_auth::credentials::{expiry_instant, remaining, validate_expiry};

use crate::account::AccountService;
use crate::error::ClientError;
use crate::session::{Session, SessionState};

/// Floor between two refresh attempts.
const MIN_DELAY: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Time until the next refresh attempt, or `None` when there is nothing to
/// refresh (no token, or no known expiry).
pub(crate) fn next_delay(state: &SessionState, now: DateTime<Utc>, lead: Duration, failures: u32) -> Option<Duration> {
    state.refresh_token.as_ref()?;
    expiry_instant(state.expires_at)?;

    let due_in = chrono::Duration::from_std(lead)
        .ok()
        .and_then(|lead| now.checked_add_signed(lead))
        .and_then(|due| remaining(state.expires_at, due))
        .and_then(|left| left.to_std().ok())
        .unwrap_or_default();

    let floor = if failures == 0 {
        MIN_DELAY
    } else {
        let factor = 1u32.checked_shl(failures).unwrap_or(u32::MAX);
        MIN_DELAY.checked_mul(factor).unwrap_or(MAX_BACKOFF).min(MAX_BACKOFF)
    };
    Some(due_in.max(floor))
}

/// Handle to the running refresh task.
///
/// Dropping the handle does not stop the task; call
/// [`shutdown`](RefreshScheduler::shutdown).
pub struct RefreshScheduler {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn start(account: AccountService, session: Session, lead: Duration) -> Self {
        let shutdown = Arc::new(Notify::new());
        let signal = shutdown.clone();

        let task = tokio::spawn(async move {
            tracing::info!(lead_secs = lead.as_secs(), "refresh scheduler started");

            let mut changes = session.subscribe();
            let mut failures = 0u32;

            loop {
                let state = changes.borrow_and_update().clone();
                let now = Utc::now();
                if state.refresh_token.is_some()
                    && validate_expiry(state.expires_at, now) == Err(CredentialError::Expired)
                {
                    tracing::debug!("access token already expired; refreshing as soon as allowed");
                }
                let delay = next_delay(&state, now, lead, failures);

                tokio::select! {
                    _ = signal.notified() => break,
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        failures = 0;
                    }
                    _ = tokio::time::sleep(delay.unwrap_or_default()), if delay.is_some() => {
                        match account.refresh().await {
                            Ok(()) => failures = 0,
                            Err(ClientError::NotAuthenticated) => {
                                tracing::debug!("refresh token gone; waiting for a new session");
                            }
                            Err(err) => {
                                failures = failures.saturating_add(1);
                                tracing::warn!(error = %err, failures, "token refresh failed");
                            }
                        }
                    }
                }
            }

            tracing::info!("refresh scheduler stopped");
        });

        Self { shutdown, task }
    }

    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "refresh task ended abnormally");
        }
    }
}
