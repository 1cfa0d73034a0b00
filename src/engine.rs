use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::checker::HostCheck;
use crate::config::MonitorConfig;
use crate::models::{AggregateStatus, CycleReport};
use crate::notifier::Notify;
use crate::store::{ReportLog, StatusStore};

const SECONDARY_ALERT_SUBJECT: &str = "[ALERT] System Issues on HTTPD ALL";
const SECONDARY_ALERT_BODY: &str = "HTTPD MONITOR ALERT FROM ALL";

/// What a single cycle decided. Returned so callers (and tests) can observe
/// the transition without touching the collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    pub previous: AggregateStatus,
    pub current: AggregateStatus,
    pub notified: bool,
}

/// Sequential monitoring engine. Checks every configured host in order,
/// derives the aggregate status, and alerts only when it changes from the
/// persisted value of the previous cycle.
pub struct Monitor<C: HostCheck, N: Notify> {
    config: MonitorConfig,
    checker: C,
    notifier: N,
    status_store: Box<dyn StatusStore>,
    log: Arc<dyn ReportLog>,
}

impl<C: HostCheck, N: Notify> Monitor<C, N> {
    pub fn new(
        config: MonitorConfig,
        checker: C,
        notifier: N,
        status_store: Box<dyn StatusStore>,
        log: Arc<dyn ReportLog>,
    ) -> Self {
        Self {
            config,
            checker,
            notifier,
            status_store,
            log,
        }
    }

    /// Runs cycles forever at the configured interval. Only an external kill
    /// stops the loop; a cycle where everything is down still completes and
    /// sleeps like any other.
    pub async fn run(&self) {
        info!(
            "Monitoring {} hosts every {}s",
            self.config.hosts.len(),
            self.config.poll_interval_secs
        );
        self.log.append("Monitor started.");
        loop {
            let outcome = self.run_cycle().await;
            info!(
                "Cycle complete: {} (previous {}, notified: {})",
                outcome.current, outcome.previous, outcome.notified
            );
            self.log.append(&format!(
                "Monitoring cycle finished. Sleeping for {} seconds...",
                self.config.poll_interval_secs
            ));
            tokio::time::sleep(Duration::from_secs(self.config.poll_interval_secs)).await;
        }
    }

    /// One full pass: check all hosts, compare the aggregate against the
    /// persisted status, notify and persist only on a transition.
    pub async fn run_cycle(&self) -> CycleOutcome {
        self.log.append("Starting new monitoring cycle...");
        let previous = self.load_previous_status();

        let mut report = CycleReport::new(Utc::now());
        for host in &self.config.hosts {
            let result = self.checker.check_host(host).await;
            report.push(host.clone(), result);
        }

        let current = report.aggregate();
        let text = report.render();
        self.log.append(&text);

        if current == previous {
            self.log.append(&format!(
                "Status remains {current}. No new notification sent."
            ));
            return CycleOutcome {
                previous,
                current,
                notified: false,
            };
        }

        self.log.append(&format!(
            "Status changed from {previous} to {current}. Sending notifications."
        ));
        if current == AggregateStatus::Fail {
            error!("Aggregate status transition: {} -> {}", previous, current);
        } else {
            warn!("Aggregate status transition: {} -> {}", previous, current);
        }

        // All three channels are attempted no matter how the others fare.
        let subject = format!("[STATUS CHANGE] Host Monitor - From {previous} to {current}");
        self.notifier
            .send_email(&self.config.alert_email, &subject, &text)
            .await;
        self.notifier
            .send_email(
                &self.config.alert_email_secondary,
                SECONDARY_ALERT_SUBJECT,
                SECONDARY_ALERT_BODY,
            )
            .await;
        let push_title = format!("Host Monitor Alert: {current}");
        let push_body = format!("Status changed from {previous} to {current}.\n\n{text}");
        self.notifier.send_push(&push_title, &push_body).await;

        if let Err(e) = self.status_store.write(current) {
            error!("Failed to persist status: {e:#}");
            self.log.append(&format!("Error writing status file: {e:#}"));
        }

        CycleOutcome {
            previous,
            current,
            notified: true,
        }
    }

    /// Missing, unreadable, or unparseable persisted status bootstraps to OK,
    /// so a healthy first cycle stays silent and a broken first cycle alerts.
    fn load_previous_status(&self) -> AggregateStatus {
        match self.status_store.read() {
            Ok(Some(raw)) => match AggregateStatus::parse(&raw) {
                Some(status) => status,
                None => {
                    self.log.append(&format!(
                        "Unrecognized persisted status '{raw}'. Assuming OK."
                    ));
                    AggregateStatus::Ok
                }
            },
            Ok(None) => {
                self.log
                    .append("Status file not found. Initializing with 'OK'.");
                AggregateStatus::Ok
            }
            Err(e) => {
                self.log
                    .append(&format!("Error reading status file: {e:#}. Assuming OK."));
                AggregateStatus::Ok
            }
        }
    }
}
