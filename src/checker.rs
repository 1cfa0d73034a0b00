use async_trait::async_trait;
use reqwest::header;
use std::sync::Arc;
use std::time::Duration;

use crate::models::CheckResult;
use crate::resolver::Resolve;
use crate::store::ReportLog;

#[async_trait]
pub trait HostCheck: Send + Sync {
    /// Check one host. Infallible: every error is folded into a variant.
    async fn check_host(&self, host: &str) -> CheckResult;
}

/// Checks a host by resolving it through the custom DNS resolver and issuing
/// a single HEAD request against the literal resolved address, presenting the
/// original hostname in the `Host` header. Certificate validation is disabled
/// on purpose: an IP-literal target can never match the certificate issued
/// for the hostname, and the whole point is to not trust ambient DNS.
pub struct HttpsChecker {
    resolver: Arc<dyn Resolve>,
    client: reqwest::Client,
    log: Arc<dyn ReportLog>,
    scheme: &'static str,
    port: u16,
}

impl HttpsChecker {
    pub fn new(
        resolver: Arc<dyn Resolve>,
        timeout: Duration,
        log: Arc<dyn ReportLog>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            resolver,
            client,
            log,
            scheme: "https",
            port: 443,
        })
    }

    #[cfg(test)]
    fn with_endpoint(
        resolver: Arc<dyn Resolve>,
        timeout: Duration,
        log: Arc<dyn ReportLog>,
        scheme: &'static str,
        port: u16,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap();
        Self {
            resolver,
            client,
            log,
            scheme,
            port,
        }
    }
}

#[async_trait]
impl HostCheck for HttpsChecker {
    async fn check_host(&self, host: &str) -> CheckResult {
        let ip = match self.resolver.resolve_ipv4(host).await {
            Ok(ip) => ip,
            Err(_) => {
                self.log.append(&format!(
                    "Could not resolve IP for {host}. HTTPS check skipped."
                ));
                return CheckResult::FailDns;
            }
        };

        let url = format!("{}://{}:{}/", self.scheme, ip, self.port);
        match self
            .client
            .head(&url)
            .header(header::HOST, host)
            .send()
            .await
        {
            Ok(response) => classify_status(response.status().as_u16()),
            Err(e) => {
                let result = classify_request_error(&e);
                if matches!(result, CheckResult::FailUnexpected(_)) {
                    self.log.append(&format!(
                        "An unexpected error occurred during HTTPS check for {host} ({ip}): {e}"
                    ));
                }
                result
            }
        }
    }
}

/// 4xx means the server is reachable and serving the virtual host, so the
/// healthy range is [200, 500).
pub(crate) fn classify_status(code: u16) -> CheckResult {
    if (200..500).contains(&code) {
        CheckResult::Ok(code)
    } else {
        CheckResult::FailHttpOther(code)
    }
}

fn classify_request_error(e: &reqwest::Error) -> CheckResult {
    if e.is_timeout() {
        CheckResult::FailTimeout
    } else if e.is_connect() {
        CheckResult::FailConnection(e.to_string())
    } else {
        CheckResult::FailUnexpected(e.to_string())
    }
}
