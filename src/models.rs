use chrono::{DateTime, Utc};
use std::fmt;

/// Outcome of checking a single host during one cycle.
///
/// Every transport-level problem is folded into a variant here; the checker
/// never surfaces an error to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    /// Server reachable and responding. Covers [200, 500): a 4xx still means
    /// the host is up and serving the virtual host we asked for.
    Ok(u16),
    /// Hostname did not resolve through the configured DNS servers.
    FailDns,
    /// The HTTPS request timed out.
    FailTimeout,
    /// Connection-level failure (refused, reset, TLS handshake).
    FailConnection(String),
    /// Response received but with a status outside [200, 500).
    FailHttpOther(u16),
    /// Any other transport or protocol error.
    FailUnexpected(String),
}

impl CheckResult {
    pub fn is_failure(&self) -> bool {
        !matches!(self, CheckResult::Ok(_))
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckResult::Ok(code) => write!(f, "HTTPS_OK({code})"),
            CheckResult::FailDns => write!(f, "HTTPS_FAIL(DNS_FAIL)"),
            CheckResult::FailTimeout => write!(f, "HTTPS_FAIL(TIMEOUT)"),
            CheckResult::FailConnection(detail) => write!(f, "HTTPS_FAIL(CONN_ERROR: {detail})"),
            CheckResult::FailHttpOther(code) => write!(f, "HTTPS_FAIL({code})"),
            CheckResult::FailUnexpected(detail) => write!(f, "HTTPS_FAIL(REQUEST_ERROR: {detail})"),
        }
    }
}

/// Single OK/FAIL summary carried across cycles. `Unknown` only appears when
/// the status file literally contains "UNKNOWN"; a missing or unreadable file
/// bootstraps to `Ok` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateStatus {
    Unknown,
    Ok,
    Fail,
}

impl AggregateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregateStatus::Unknown => "UNKNOWN",
            AggregateStatus::Ok => "OK",
            AggregateStatus::Fail => "FAIL",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "UNKNOWN" => Some(AggregateStatus::Unknown),
            "OK" => Some(AggregateStatus::Ok),
            "FAIL" => Some(AggregateStatus::Fail),
            _ => None,
        }
    }
}

impl fmt::Display for AggregateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered per-host results for one cycle. Built fresh each cycle and
/// discarded after the report text is rendered.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub timestamp: DateTime<Utc>,
    pub entries: Vec<(String, CheckResult)>,
}

impl CycleReport {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, host: String, result: CheckResult) {
        self.entries.push((host, result));
    }

    /// FAIL iff at least one host failed this cycle.
    pub fn aggregate(&self) -> AggregateStatus {
        if self.entries.iter().any(|(_, r)| r.is_failure()) {
            AggregateStatus::Fail
        } else {
            AggregateStatus::Ok
        }
    }

    /// Human-readable report used for the notification body and the log.
    pub fn render(&self) -> String {
        let mut out = String::from("Host Status Report\n");
        out.push_str(&format!("{}\n\n", self.timestamp));
        for (host, result) in &self.entries {
            out.push_str(&format!("\u{2022} {host}: HTTPS: {result}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(results: Vec<(&str, CheckResult)>) -> CycleReport {
        let mut report = CycleReport::new(Utc::now());
        for (host, result) in results {
            report.push(host.to_string(), result);
        }
        report
    }

    #[test]
    fn aggregate_is_ok_when_no_host_fails() {
        let report = report_with(vec![
            ("a.example", CheckResult::Ok(200)),
            ("b.example", CheckResult::Ok(404)),
        ]);
        assert_eq!(report.aggregate(), AggregateStatus::Ok);
    }

    #[test]
    fn aggregate_is_fail_when_one_host_fails() {
        let report = report_with(vec![
            ("a.example", CheckResult::Ok(200)),
            ("b.example", CheckResult::FailTimeout),
            ("c.example", CheckResult::Ok(301)),
        ]);
        assert_eq!(report.aggregate(), AggregateStatus::Fail);
    }

    #[test]
    fn aggregate_is_fail_when_all_hosts_fail() {
        let report = report_with(vec![
            ("a.example", CheckResult::FailDns),
            ("b.example", CheckResult::FailConnection("refused".into())),
        ]);
        assert_eq!(report.aggregate(), AggregateStatus::Fail);
    }

    #[test]
    fn aggregate_of_empty_report_is_ok() {
        assert_eq!(report_with(vec![]).aggregate(), AggregateStatus::Ok);
    }

    #[test]
    fn four_xx_is_not_a_failure() {
        assert!(!CheckResult::Ok(404).is_failure());
        assert!(CheckResult::FailHttpOther(503).is_failure());
    }

    #[test]
    fn display_matches_report_vocabulary() {
        assert_eq!(CheckResult::Ok(200).to_string(), "HTTPS_OK(200)");
        assert_eq!(CheckResult::FailDns.to_string(), "HTTPS_FAIL(DNS_FAIL)");
        assert_eq!(CheckResult::FailTimeout.to_string(), "HTTPS_FAIL(TIMEOUT)");
        assert_eq!(CheckResult::FailHttpOther(502).to_string(), "HTTPS_FAIL(502)");
        assert_eq!(
            CheckResult::FailConnection("reset".into()).to_string(),
            "HTTPS_FAIL(CONN_ERROR: reset)"
        );
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            AggregateStatus::Unknown,
            AggregateStatus::Ok,
            AggregateStatus::Fail,
        ] {
            assert_eq!(AggregateStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AggregateStatus::parse("  OK\n"), Some(AggregateStatus::Ok));
        assert_eq!(AggregateStatus::parse("garbage"), None);
    }

    #[test]
    fn render_lists_every_host_with_its_result() {
        let report = report_with(vec![
            ("a.example", CheckResult::Ok(200)),
            ("b.example", CheckResult::FailTimeout),
        ]);
        let text = report.render();
        assert!(text.starts_with("Host Status Report\n"));
        assert!(text.contains("\u{2022} a.example: HTTPS: HTTPS_OK(200)"));
        assert!(text.contains("\u{2022} b.example: HTTPS: HTTPS_FAIL(TIMEOUT)"));
    }
}
