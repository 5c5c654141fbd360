//! Best-effort success notifications.
//!
//! Notification is a fire-and-forget side channel: whatever happens inside a
//! variant is caught and logged, and never affects pipeline state. The
//! desktop variant shells out to the platform notifier; the email variant is
//! a deliberately disabled capability (see [`Notifier::Email`]).

use std::process::Command;
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};

/// SMTP settings for the email channel.
///
/// Carried for completeness; delivery is disabled (see [`Notifier::Email`]).
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_server: String,
    /// SMTP SSL port.
    pub smtp_port: u16,
    /// Sender address.
    pub sender: String,
    /// Receiver address.
    pub receiver: String,
}

/// A delivered notification, as recorded by [`Notifier::Capture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub message: String,
}

/// Notification side channel invoked after a successful download.
#[derive(Debug)]
pub enum Notifier {
    /// Platform desktop notification: `osascript` on macOS, `notify-send` on
    /// Linux, a log line elsewhere.
    Desktop,
    /// Email delivery is intentionally disabled: the deployment never
    /// configured SMTP credentials, so this variant logs and drops the
    /// message instead of carrying dead SMTP code. Kept as a variant so the
    /// capability is explicit rather than rotting in a disabled branch.
    Email(EmailConfig),
    /// Records deliveries in memory so callers can assert on them.
    Capture(Arc<Mutex<Vec<Notification>>>),
    /// Discards notifications (useful in headless runs).
    Noop,
}

impl Notifier {
    /// Creates a capturing notifier plus a handle to its recorded deliveries.
    #[must_use]
    pub fn capture() -> (Self, Arc<Mutex<Vec<Notification>>>) {
        let sink = Arc::new(Mutex::new(Vec::new()));
        (Self::Capture(Arc::clone(&sink)), sink)
    }

    /// Delivers a notification, swallowing any failure.
    pub fn notify(&self, title: &str, message: &str) {
        match self {
            Self::Desktop => {
                if let Err(e) = desktop_notify(title, message) {
                    error!(error = %e, "desktop notification failed");
                } else {
                    info!(title, message, "notification sent");
                }
            }
            Self::Email(config) => {
                warn!(
                    receiver = %config.receiver,
                    "email notification is disabled in this build; dropping message"
                );
            }
            Self::Capture(sink) => {
                if let Ok(mut recorded) = sink.lock() {
                    recorded.push(Notification {
                        title: title.to_string(),
                        message: message.to_string(),
                    });
                }
            }
            Self::Noop => debug!(title, message, "notification suppressed"),
        }
    }
}

#[cfg(target_os = "macos")]
fn desktop_notify(title: &str, message: &str) -> std::io::Result<()> {
    let script = format!(
        r#"display notification "{}" with title "{}""#,
        escape_osascript(message),
        escape_osascript(title)
    );
    let status = Command::new("osascript").arg("-e").arg(script).status()?;
    exit_to_result("osascript", status)
}

#[cfg(target_os = "linux")]
fn desktop_notify(title: &str, message: &str) -> std::io::Result<()> {
    let status = Command::new("notify-send")
        .arg(title)
        .arg(message)
        .status()?;
    exit_to_result("notify-send", status)
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn desktop_notify(title: &str, message: &str) -> std::io::Result<()> {
    info!(title, message, "desktop notifications unsupported on this platform");
    Ok(())
}

/// A notifier that launches but exits non-zero still failed to notify.
#[cfg(any(target_os = "macos", target_os = "linux"))]
fn exit_to_result(program: &str, status: std::process::ExitStatus) -> std::io::Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!(
            "{program} exited with {status}"
        )))
    }
}

#[cfg(target_os = "macos")]
fn escape_osascript(value: &str) -> String {
    value.replace('\\', r"\\").replace('"', r#"\""#)
}
