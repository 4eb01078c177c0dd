//! QueuedSideChannel - Background worker for best-effort side effects.
//!
//! Workflows submit notifications and audit events and move on. A single
//! worker task drains the queue in submission order:
//!
//! 1. `Notify` - deliver through the `EmailClient`, retrying transient
//!    failures with linear backoff
//! 2. `Audit` - record through the `AuditLog` once
//!
//! Failures are logged and counted, never returned to the submitter.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `max_attempts` | 3 | Delivery attempts per email |
//! | `backoff` | 250ms | Delay before attempt `n` is `backoff * (n - 1)` |
//! | `notifications_enabled` | true | When false, `Notify` effects are dropped |

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::ports::{AuditLog, EmailClient, EmailMessage, SideChannel, SideEffect};

/// Retry settings for the side channel worker.
#[derive(Debug, Clone)]
pub struct SideChannelConfig {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub notifications_enabled: bool,
}

impl Default for SideChannelConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(250),
            notifications_enabled: true,
        }
    }
}

impl SideChannelConfig {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_notifications_enabled(mut self, enabled: bool) -> Self {
        self.notifications_enabled = enabled;
        self
    }
}

/// Counters describing what the worker has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideChannelStats {
    pub emails_sent: u64,
    pub emails_failed: u64,
    pub emails_skipped: u64,
    pub audits_recorded: u64,
    pub audits_failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    emails_sent: AtomicU64,
    emails_failed: AtomicU64,
    emails_skipped: AtomicU64,
    audits_recorded: AtomicU64,
    audits_failed: AtomicU64,
}

enum Job {
    Effect(SideEffect),
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget side channel backed by an unbounded queue.
#[derive(Clone)]
pub struct QueuedSideChannel {
    sender: mpsc::UnboundedSender<Job>,
    counters: Arc<Counters>,
}

impl QueuedSideChannel {
    /// Spawns the worker on the current tokio runtime.
    pub fn spawn(
        email: Arc<dyn EmailClient>,
        audit: Arc<dyn AuditLog>,
        config: SideChannelConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        let worker = Worker {
            email,
            audit,
            config,
            counters: Arc::clone(&counters),
        };
        tokio::spawn(worker.run(receiver));
        Self { sender, counters }
    }

    pub fn stats(&self) -> SideChannelStats {
        SideChannelStats {
            emails_sent: self.counters.emails_sent.load(Ordering::Relaxed),
            emails_failed: self.counters.emails_failed.load(Ordering::Relaxed),
            emails_skipped: self.counters.emails_skipped.load(Ordering::Relaxed),
            audits_recorded: self.counters.audits_recorded.load(Ordering::Relaxed),
            audits_failed: self.counters.audits_failed.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl SideChannel for QueuedSideChannel {
    fn submit(&self, effect: SideEffect) {
        if self.sender.send(Job::Effect(effect)).is_err() {
            warn!("Side channel worker has stopped; dropping side effect");
        }
    }

    async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(Job::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

struct Worker {
    email: Arc<dyn EmailClient>,
    audit: Arc<dyn AuditLog>,
    config: SideChannelConfig,
    counters: Arc<Counters>,
}

impl Worker {
    async fn run(self, mut receiver: mpsc::UnboundedReceiver<Job>) {
        while let Some(job) = receiver.recv().await {
            match job {
                Job::Effect(SideEffect::Notify(message)) => self.deliver(message).await,
                Job::Effect(SideEffect::Audit(event)) => {
                    let event_type = event.event_type.clone();
                    match self.audit.record(event).await {
                        Ok(()) => {
                            self.counters.audits_recorded.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(err) => {
                            self.counters.audits_failed.fetch_add(1, Ordering::Relaxed);
                            warn!(event_type = %event_type, error = %err, "Failed to record audit event");
                        }
                    }
                }
                Job::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        debug!("Side channel worker stopped");
    }

    async fn deliver(&self, message: EmailMessage) {
        if !self.config.notifications_enabled {
            self.counters.emails_skipped.fetch_add(1, Ordering::Relaxed);
            debug!(to = %message.to, "Notifications disabled; skipping email");
            return;
        }

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.email.send_email(&message).await {
                Ok(()) => {
                    self.counters.emails_sent.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    debug!(to = %message.to, attempt, error = %err, "Email attempt failed; retrying");
                    sleep(self.config.backoff * attempt).await;
                    attempt += 1;
                }
                Err(err) => {
                    self.counters.emails_failed.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        to = %message.to,
                        subject = %message.subject,
                        attempts = attempt,
                        error = %err,
                        "Giving up on email"
                    );
                    return;
                }
            }
        }
    }
}
