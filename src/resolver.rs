use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfig, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::proto::ProtoErrorKind;
use hickory_resolver::{ResolveError, ResolveErrorKind, TokioResolver};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::store::ReportLog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    /// The configured servers answered that the domain does not exist.
    NxDomain,
    /// Per-query timeout or overall lifetime exceeded.
    Timeout,
    Other(String),
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionFailure::NxDomain => write!(f, "domain does not exist"),
            ResolutionFailure::Timeout => write!(f, "query timed out"),
            ResolutionFailure::Other(detail) => write!(f, "{detail}"),
        }
    }
}

#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve_ipv4(&self, hostname: &str) -> Result<Ipv4Addr, ResolutionFailure>;
}

/// Resolver that queries only an explicit list of DNS servers, bypassing the
/// OS configuration entirely. One attempt per call; callers treat a failure as
/// a failed check for the cycle and retry naturally on the next one.
pub struct CustomDnsResolver {
    inner: TokioResolver,
    servers: Vec<IpAddr>,
    lifetime: Duration,
    log: Arc<dyn ReportLog>,
}

impl CustomDnsResolver {
    pub fn new(
        servers: &[IpAddr],
        query_timeout: Duration,
        lifetime: Duration,
        log: Arc<dyn ReportLog>,
    ) -> Self {
        let name_servers: Vec<NameServerConfig> = servers
            .iter()
            .map(|ip| NameServerConfig::new(SocketAddr::new(*ip, 53), Protocol::Udp))
            .collect();
        let config = ResolverConfig::from_parts(None, vec![], name_servers);

        let mut builder =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default());
        builder.options_mut().timeout = query_timeout;
        // A single shot per server list; the cycle cadence is the retry policy.
        builder.options_mut().attempts = 0;

        debug!("DNS resolver configured with servers: {:?}", servers);

        Self {
            inner: builder.build(),
            servers: servers.to_vec(),
            lifetime,
            log,
        }
    }

    fn classify(err: &ResolveError) -> ResolutionFailure {
        if let ResolveErrorKind::Proto(proto) = err.kind() {
            match proto.kind() {
                ProtoErrorKind::NoRecordsFound { response_code, .. }
                    if *response_code == ResponseCode::NXDomain =>
                {
                    return ResolutionFailure::NxDomain;
                }
                ProtoErrorKind::Timeout => return ResolutionFailure::Timeout,
                _ => {}
            }
        }
        ResolutionFailure::Other(err.to_string())
    }
}

#[async_trait]
impl Resolve for CustomDnsResolver {
    async fn resolve_ipv4(&self, hostname: &str) -> Result<Ipv4Addr, ResolutionFailure> {
        self.log.append(&format!(
            "Attempting to resolve {} using custom DNS servers: {:?}...",
            hostname, self.servers
        ));

        let lookup = match tokio::time::timeout(self.lifetime, self.inner.ipv4_lookup(hostname))
            .await
        {
            Err(_) => {
                self.log.append(&format!(
                    "DNS Error: Query for '{}' exceeded the {}s lifetime",
                    hostname,
                    self.lifetime.as_secs()
                ));
                return Err(ResolutionFailure::Timeout);
            }
            Ok(Err(e)) => {
                let failure = Self::classify(&e);
                let line = match &failure {
                    ResolutionFailure::NxDomain => format!(
                        "DNS Error: Domain '{}' does not exist according to {:?}",
                        hostname, self.servers
                    ),
                    ResolutionFailure::Timeout => format!(
                        "DNS Error: Query for '{}' timed out when using {:?}",
                        hostname, self.servers
                    ),
                    ResolutionFailure::Other(detail) => format!(
                        "DNS Error: An unexpected DNS error occurred for '{}': {}",
                        hostname, detail
                    ),
                };
                self.log.append(&line);
                return Err(failure);
            }
            Ok(Ok(lookup)) => lookup,
        };

        match lookup.iter().next() {
            Some(record) => {
                let ip = record.0;
                self.log.append(&format!(
                    "Successfully resolved {hostname} to {ip} using custom DNS."
                ));
                Ok(ip)
            }
            None => {
                self.log
                    .append(&format!("DNS Error: No A records returned for '{hostname}'"));
                Err(ResolutionFailure::Other("no A records in response".into()))
            }
        }
    }
}
