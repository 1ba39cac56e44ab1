//! Session-end presentation: desktop notification and the break surface

#[cfg(test)]
use std::sync::Mutex;

use futures::future::{BoxFuture, FutureExt};
use notify_rust::Notification;
use tokio::process::Command;
use tracing::{debug, info};

pub const BREAK_NOTIFICATION_TITLE: &str = "Time for a Break!";
pub const BREAK_NOTIFICATION_BODY: &str = "Take a breather 🌊 — click to open your break.";

/// Presents session transitions to the user
pub trait Presenter: Send + Sync {
    /// Show a desktop notification
    fn notify<'a>(&'a self, title: &'a str, message: &'a str) -> BoxFuture<'a, Result<(), String>>;

    /// Open the break surface at `url`
    fn open_break_surface<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<(), String>>;
}

/// Presenter for a desktop session
#[derive(Debug, Default)]
pub struct DesktopPresenter;

impl Presenter for DesktopPresenter {
    fn notify<'a>(&'a self, title: &'a str, message: &'a str) -> BoxFuture<'a, Result<(), String>> {
        let title = title.to_string();
        let message = message.to_string();
        async move {
            // notify-rust talks to the notification daemon synchronously
            tokio::task::spawn_blocking(move || {
                Notification::new()
                    .summary(&title)
                    .body(&message)
                    .appname("mindful-breaks")
                    .show()
                    .map(|_| ())
                    .map_err(|e| format!("Failed to show notification: {}", e))
            })
            .await
            .map_err(|e| format!("Notification task failed: {}", e))?
        }
        .boxed()
    }

    fn open_break_surface<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<(), String>> {
        async move {
            let (program, args) = opener_command(url);
            debug!("Opening break surface with {} {:?}", program, args);

            let output = Command::new(program)
                .args(&args)
                .output()
                .await
                .map_err(|e| format!("Failed to execute {}: {}", program, e))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(format!("{} failed: {}", program, stderr));
            }

            info!("Break surface opened at {}", url);
            Ok(())
        }
        .boxed()
    }
}

/// Platform command that opens a URL in the default browser
fn opener_command(url: &str) -> (&'static str, Vec<String>) {
    if cfg!(target_os = "macos") {
        ("open", vec![url.to_string()])
    } else if cfg!(target_os = "windows") {
        ("cmd", vec!["/C".to_string(), "start".to_string(), String::new(), url.to_string()])
    } else {
        ("xdg-open", vec![url.to_string()])
    }
}

/// Presenter that only logs, for headless runs
#[derive(Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn notify<'a>(&'a self, title: &'a str, message: &'a str) -> BoxFuture<'a, Result<(), String>> {
        info!("Notification suppressed: {} - {}", title, message);
        futures::future::ready(Ok(())).boxed()
    }

    fn open_break_surface<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<(), String>> {
        info!("Break surface available at {}", url);
        futures::future::ready(Ok(())).boxed()
    }
}

/// Something the presenter was asked to show
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    Notification { title: String, message: String },
    BreakSurface { url: String },
}

/// Presenter that records every request, used by tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<Presentation>>,
}

#[cfg(test)]
impl RecordingPresenter {
    pub fn events(&self) -> Vec<Presentation> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn record(&self, event: Presentation) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
impl Presenter for RecordingPresenter {
    fn notify<'a>(&'a self, title: &'a str, message: &'a str) -> BoxFuture<'a, Result<(), String>> {
        self.record(Presentation::Notification {
            title: title.to_string(),
            message: message.to_string(),
        });
        futures::future::ready(Ok(())).boxed()
    }

    fn open_break_surface<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<(), String>> {
        self.record(Presentation::BreakSurface { url: url.to_string() });
        futures::future::ready(Ok(())).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opener_passes_the_url_last() {
        let (_, args) = opener_command("http://127.0.0.1:20554/break");
        assert_eq!(args.last().map(String::as_str), Some("http://127.0.0.1:20554/break"));
    }

    #[tokio::test]
    async fn recording_presenter_keeps_order() {
        let presenter = RecordingPresenter::default();
        presenter.notify("a", "b").await.unwrap();
        presenter.open_break_surface("http://x/break").await.unwrap();

        assert_eq!(
            presenter.events(),
            vec![
                Presentation::Notification { title: "a".into(), message: "b".into() },
                Presentation::BreakSurface { url: "http://x/break".into() },
            ]
        );
    }
}
