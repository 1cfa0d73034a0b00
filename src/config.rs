use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitorConfig {
    /// Hosts to check each cycle, in the order they appear in the report.
    pub hosts: Vec<String>,
    pub alert_email: String,
    /// Recipient of the fixed generic alert sent alongside the main report.
    pub alert_email_secondary: String,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_status_file")]
    pub status_file: PathBuf,
    #[serde(default = "default_check_timeout")]
    pub check_timeout_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_dns_servers")]
    pub dns_servers: Vec<IpAddr>,
    #[serde(default = "default_dns_query_timeout")]
    pub dns_query_timeout_secs: u64,
    #[serde(default = "default_dns_lifetime")]
    pub dns_lifetime_secs: u64,
    pub email_api: EmailApiConfig,
    pub push_api: PushApiConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmailApiConfig {
    #[serde(default = "default_email_api_hostname")]
    pub api_hostname: String,
    #[serde(default = "default_email_api_path")]
    pub api_path: String,
    #[serde(default)]
    pub api_key: String,
    pub sender: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PushApiConfig {
    #[serde(default = "default_push_api_hostname")]
    pub api_hostname: String,
    #[serde(default = "default_push_api_path")]
    pub api_path: String,
    #[serde(default)]
    pub access_token: String,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("hostpulse.log")
}
fn default_status_file() -> PathBuf {
    PathBuf::from("hostpulse_status.current")
}
fn default_check_timeout() -> u64 {
    10
}
fn default_poll_interval() -> u64 {
    120
}
fn default_dns_servers() -> Vec<IpAddr> {
    vec![IpAddr::from([8, 8, 8, 8]), IpAddr::from([8, 8, 4, 4])]
}
fn default_dns_query_timeout() -> u64 {
    2
}
fn default_dns_lifetime() -> u64 {
    5
}
fn default_email_api_hostname() -> String {
    "api.sendgrid.com".to_string()
}
fn default_email_api_path() -> String {
    "/v3/mail/send".to_string()
}
fn default_push_api_hostname() -> String {
    "api.pushbullet.com".to_string()
}
fn default_push_api_path() -> String {
    "/v2/pushes".to_string()
}

impl MonitorConfig {
    /// Secrets can live in the environment instead of the config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("SENDGRID_API_KEY") {
            self.email_api.api_key = key;
        }
        if let Ok(sender) = std::env::var("SENDER_EMAIL_API") {
            self.email_api.sender = sender;
        }
        if let Ok(token) = std::env::var("PUSHBULLET_TOKEN") {
            self.push_api.access_token = token;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "hosts": ["a.example", "b.example"],
        "alert_email": "ops@example.com",
        "alert_email_secondary": "watcher@example.com",
        "email_api": { "sender": "monitor@example.com" },
        "push_api": {}
    }"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: MonitorConfig = serde_json::from_str(MINIMAL).unwrap();
        assert_eq!(config.hosts.len(), 2);
        assert_eq!(config.check_timeout_secs, 10);
        assert_eq!(config.poll_interval_secs, 120);
        assert_eq!(config.dns_query_timeout_secs, 2);
        assert_eq!(config.dns_lifetime_secs, 5);
        assert_eq!(
            config.dns_servers,
            vec![IpAddr::from([8, 8, 8, 8]), IpAddr::from([8, 8, 4, 4])]
        );
        assert_eq!(config.email_api.api_hostname, "api.sendgrid.com");
        assert_eq!(config.email_api.api_path, "/v3/mail/send");
        assert_eq!(config.push_api.api_hostname, "api.pushbullet.com");
        assert_eq!(config.push_api.api_path, "/v2/pushes");
        assert!(config.email_api.api_key.is_empty());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let raw = r#"{
            "hosts": ["a.example"],
            "alert_email": "ops@example.com",
            "alert_email_secondary": "watcher@example.com",
            "check_timeout_secs": 3,
            "dns_servers": ["1.1.1.1"],
            "email_api": { "sender": "monitor@example.com", "api_key": "sg-key" },
            "push_api": { "access_token": "pb-token" }
        }"#;
        let config: MonitorConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.check_timeout_secs, 3);
        assert_eq!(
            config.dns_servers,
            vec!["1.1.1.1".parse::<IpAddr>().unwrap()]
        );
        assert_eq!(config.email_api.api_key, "sg-key");
        assert_eq!(config.push_api.access_token, "pb-token");
    }

    #[test]
    fn env_overrides_replace_file_secrets() {
        let mut config: MonitorConfig = serde_json::from_str(MINIMAL).unwrap();
        std::env::set_var("SENDGRID_API_KEY", "env-key");
        std::env::set_var("PUSHBULLET_TOKEN", "env-token");
        config.apply_env_overrides();
        std::env::remove_var("SENDGRID_API_KEY");
        std::env::remove_var("PUSHBULLET_TOKEN");
        assert_eq!(config.email_api.api_key, "env-key");
        assert_eq!(config.push_api.access_token, "env-token");
    }
}
