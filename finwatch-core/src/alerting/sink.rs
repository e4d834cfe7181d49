// alerting/sink.rs - Notification delivery trait and built-in sinks

use super::rules::{ActionChannel, ActionConfig};
use super::types::{Alert, AlertContext};
use crossbeam_channel::{bounded, Sender, TrySendError};
use finwatch_common::constraints::Severity;
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors from notification delivery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Channel transport reported a failure
    #[error("{channel} delivery failed: {reason}")]
    Delivery { channel: String, reason: String },

    /// Dispatch queue is full; the dispatch was dropped
    #[error("notification queue full, dropped {channel} dispatch")]
    QueueFull { channel: String },

    /// Dispatch queue worker is gone
    #[error("notification queue is shut down")]
    QueueClosed,
}

impl NotifyError {
    pub fn delivery(channel: ActionChannel, reason: impl Into<String>) -> Self {
        Self::Delivery {
            channel: channel.to_string(),
            reason: reason.into(),
        }
    }
}

/// Destination for alert notifications.
///
/// One method per channel; implementations own transport details. The
/// generator calls these with the matching subset of one batch, so a
/// single call may carry several alerts.
pub trait NotificationSink: Send + Sync {
    fn send_email(
        &self,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError>;

    fn send_webhook(
        &self,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError>;

    fn send_sms(
        &self,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError>;

    fn send_chat(
        &self,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError>;

    /// Dispatch to the method for the given channel.
    fn send(
        &self,
        channel: ActionChannel,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        match channel {
            ActionChannel::Email => self.send_email(config, alerts, context),
            ActionChannel::Webhook => self.send_webhook(config, alerts, context),
            ActionChannel::Sms => self.send_sms(config, alerts, context),
            ActionChannel::Chat => self.send_chat(config, alerts, context),
        }
    }
}

/// Sink that writes notifications to the log, severity-mapped.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }

    fn log(&self, channel: &str, alerts: &[Alert], context: &AlertContext) {
        for alert in alerts {
            match alert.severity {
                Severity::Info => info!(
                    channel = channel,
                    alert = %alert.id,
                    analysis = %context.analysis_id,
                    message = %alert.message,
                    "[NOTIFY:INFO]"
                ),
                Severity::Warning => warn!(
                    channel = channel,
                    alert = %alert.id,
                    analysis = %context.analysis_id,
                    message = %alert.message,
                    "[NOTIFY:WARNING]"
                ),
                Severity::Critical => error!(
                    channel = channel,
                    alert = %alert.id,
                    analysis = %context.analysis_id,
                    message = %alert.message,
                    "[NOTIFY:CRITICAL]"
                ),
            }
        }
    }
}

impl NotificationSink for LogSink {
    fn send_email(
        &self,
        _config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.log("email", alerts, context);
        Ok(())
    }

    fn send_webhook(
        &self,
        _config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.log("webhook", alerts, context);
        Ok(())
    }

    fn send_sms(
        &self,
        _config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.log("sms", alerts, context);
        Ok(())
    }

    fn send_chat(
        &self,
        _config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.log("chat", alerts, context);
        Ok(())
    }
}

/// Composite sink that fans out to several sinks.
///
/// Every sink is attempted even when an earlier one fails; the first
/// error is reported after all have run.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink<S: NotificationSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    fn fan_out(
        &self,
        mut send: impl FnMut(&dyn NotificationSink) -> Result<(), NotifyError>,
    ) -> Result<(), NotifyError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = send(sink.as_ref()) {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl NotificationSink for MultiSink {
    fn send_email(
        &self,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.fan_out(|sink| sink.send_email(config, alerts, context))
    }

    fn send_webhook(
        &self,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.fan_out(|sink| sink.send_webhook(config, alerts, context))
    }

    fn send_sms(
        &self,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.fan_out(|sink| sink.send_sms(config, alerts, context))
    }

    fn send_chat(
        &self,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.fan_out(|sink| sink.send_chat(config, alerts, context))
    }
}

struct QueuedDispatch {
    channel: ActionChannel,
    config: ActionConfig,
    alerts: Vec<Alert>,
    context: AlertContext,
}

/// Sink that hands dispatches to a background worker over a bounded
/// queue, so evaluation never blocks on transport latency.
///
/// A full queue drops the dispatch and reports `QueueFull` instead of
/// stalling the caller. Dropping the sink without calling
/// [`shutdown`](Self::shutdown) detaches the worker; it drains what was
/// queued and exits.
pub struct QueuedSink {
    tx: Sender<QueuedDispatch>,
    worker: JoinHandle<()>,
}

impl QueuedSink {
    /// Spawn a worker draining into `inner`.
    pub fn new(inner: Arc<dyn NotificationSink>, capacity: usize) -> Self {
        let (tx, rx) = bounded::<QueuedDispatch>(capacity);
        let worker = std::thread::Builder::new()
            .name("alert-dispatch".to_string())
            .spawn(move || {
                for dispatch in rx {
                    if let Err(e) = inner.send(
                        dispatch.channel,
                        &dispatch.config,
                        &dispatch.alerts,
                        &dispatch.context,
                    ) {
                        warn!(
                            channel = %dispatch.channel,
                            error = %e,
                            "background notification delivery failed"
                        );
                    }
                }
            })
            .expect("Failed to spawn alert dispatch worker");
        Self { tx, worker }
    }

    fn enqueue(
        &self,
        channel: ActionChannel,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        let dispatch = QueuedDispatch {
            channel,
            config: config.clone(),
            alerts: alerts.to_vec(),
            context: context.clone(),
        };
        match self.tx.try_send(dispatch) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(NotifyError::QueueFull {
                channel: channel.to_string(),
            }),
            Err(TrySendError::Disconnected(_)) => Err(NotifyError::QueueClosed),
        }
    }

    /// Drain the queue and stop the worker.
    pub fn shutdown(self) {
        let Self { tx, worker } = self;
        drop(tx);
        if worker.join().is_err() {
            warn!("alert dispatch worker panicked during shutdown");
        }
    }
}

impl NotificationSink for QueuedSink {
    fn send_email(
        &self,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.enqueue(ActionChannel::Email, config, alerts, context)
    }

    fn send_webhook(
        &self,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.enqueue(ActionChannel::Webhook, config, alerts, context)
    }

    fn send_sms(
        &self,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.enqueue(ActionChannel::Sms, config, alerts, context)
    }

    fn send_chat(
        &self,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.enqueue(ActionChannel::Chat, config, alerts, context)
    }
}
