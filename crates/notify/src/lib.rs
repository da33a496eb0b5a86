//! Outbound webhook notifications for job lifecycle events.
//!
//! Receivers get a small JSON payload per event, signed with HMAC-SHA256
//! when a secret is configured. Delivery is best-effort: it retries a few
//! times, logs exhaustion, and never feeds back into job state.

pub mod event;
pub mod notifier;

pub use event::{EventStatus, JobEvent};
pub use notifier::{Notifier, NotifyError, WebhookConfig, WebhookNotifier};
