//! The resolved Celery configuration record.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Seconds before an unacknowledged message becomes visible again (six hours).
pub const DEFAULT_VISIBILITY_TIMEOUT: u64 = 21600;

/// Finished configuration handed to the Celery client.
///
/// Built once by [`crate::resolver::resolve`] and read-only afterwards.
/// Serializes to the Celery setting names.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BrokerConfig {
    pub accept_content: Vec<String>,
    pub event_serializer: String,
    pub worker_prefetch_multiplier: i64,
    pub task_acks_late: bool,
    pub task_default_queue: String,
    pub task_default_exchange: String,
    pub task_track_started: bool,
    pub broker_url: String,
    pub broker_transport_options: Map<String, Value>,
    pub result_backend: String,
    pub database_engine_options: Map<String, Value>,
    pub worker_concurrency: i64,
    pub worker_enable_remote_control: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broker_use_ssl: Option<BrokerSsl>,
}

/// Key naming used by the broker's SSL options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslKeyStyle {
    /// `keyfile`, `certfile`, `ca_certs`, `cert_reqs` (AMQP)
    Plain,
    /// `ssl_keyfile`, `ssl_certfile`, `ssl_ca_certs`, `ssl_cert_reqs` (Redis, Sentinel)
    Prefixed,
}

impl SslKeyStyle {
    fn key(&self, name: &str) -> String {
        match self {
            SslKeyStyle::Plain => name.to_string(),
            SslKeyStyle::Prefixed => format!("ssl_{}", name),
        }
    }
}

/// Peer certificate verification mode. Brokers always verify the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum CertRequirement {
    #[serde(rename = "CERT_REQUIRED")]
    Required,
}

/// SSL options for the broker connection.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerSsl {
    pub style: SslKeyStyle,
    pub keyfile: String,
    pub certfile: String,
    pub ca_certs: String,
    pub cert_reqs: CertRequirement,
}

impl BrokerSsl {
    /// Option names in the order they are emitted.
    pub fn keys(&self) -> [String; 4] {
        [
            self.style.key("keyfile"),
            self.style.key("certfile"),
            self.style.key("ca_certs"),
            self.style.key("cert_reqs"),
        ]
    }
}

impl Serialize for BrokerSsl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let [keyfile, certfile, ca_certs, cert_reqs] = self.keys();
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry(&keyfile, &self.keyfile)?;
        map.serialize_entry(&certfile, &self.certfile)?;
        map.serialize_entry(&ca_certs, &self.ca_certs)?;
        map.serialize_entry(&cert_reqs, &self.cert_reqs)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ssl(style: SslKeyStyle) -> BrokerSsl {
        BrokerSsl {
            style,
            keyfile: "/certs/client.key".into(),
            certfile: "/certs/client.pem".into(),
            ca_certs: "/certs/ca.pem".into(),
            cert_reqs: CertRequirement::Required,
        }
    }

    #[test]
    fn test_plain_ssl_serialization() {
        assert_eq!(
            serde_json::to_value(ssl(SslKeyStyle::Plain)).unwrap(),
            json!({
                "keyfile": "/certs/client.key",
                "certfile": "/certs/client.pem",
                "ca_certs": "/certs/ca.pem",
                "cert_reqs": "CERT_REQUIRED"
            })
        );
    }

    #[test]
    fn test_prefixed_ssl_keys() {
        assert_eq!(
            ssl(SslKeyStyle::Prefixed).keys(),
            ["ssl_keyfile", "ssl_certfile", "ssl_ca_certs", "ssl_cert_reqs"].map(String::from)
        );
    }
}
