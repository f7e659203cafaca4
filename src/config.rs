use dotenvy::dotenv;
use reqwest::Url;
use std::{env, fmt, net::SocketAddr};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_BITQUERY_URL: &str = "https://graphql.bitquery.io/";
pub const DEFAULT_NETWORK: &str = "flow";
pub const DEFAULT_EXPLORER_TX_URL: &str = "https://explorer.bitquery.io/flow/tx/";
pub const DEFAULT_ADDRESS: &str = "0xa61efc2d53ae7035";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl { name: &'static str, reason: String },
    #[error("invalid listen address {0}")]
    InvalidListenAddr(String),
}

#[derive(Clone)]
pub struct Config {
    pub bitquery_url: Url,
    pub api_key: String,
    pub network: String,
    pub explorer_tx_url: String,
    pub default_address: String,
    pub listen_addr: SocketAddr,
}

// The API key stays out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bitquery_url", &self.bitquery_url.as_str())
            .field("api_key", &"<redacted>")
            .field("network", &self.network)
            .field("explorer_tx_url", &self.explorer_tx_url)
            .field("default_address", &self.default_address)
            .field("listen_addr", &self.listen_addr)
            .finish()
    }
}

pub fn load() -> Result<Config, ConfigError> {
    dotenv().ok(); // .env is optional

    let cfg = from_lookup(|key| env::var(key).ok())?;
    info!("Loaded config: {:?}", cfg);

    Ok(cfg)
}

/// Build a `Config` from any key lookup, applying defaults for unset keys.
pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let bitquery_url = non_empty("BITQUERY_URL").unwrap_or_else(|| DEFAULT_BITQUERY_URL.to_string());
    let bitquery_url = Url::parse(&bitquery_url).map_err(|e| ConfigError::InvalidUrl {
        name: "BITQUERY_URL",
        reason: e.to_string(),
    })?;

    let api_key = non_empty("BITQUERY_API_KEY").ok_or(ConfigError::Missing("BITQUERY_API_KEY"))?;

    let network = non_empty("BITQUERY_NETWORK").unwrap_or_else(|| DEFAULT_NETWORK.to_string());

    let explorer_tx_url =
        non_empty("EXPLORER_TX_URL").unwrap_or_else(|| DEFAULT_EXPLORER_TX_URL.to_string());

    let default_address =
        non_empty("DEFAULT_ADDRESS").unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

    let host = non_empty("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

    // unparsable ports fall back to 3000
    let port: u16 = non_empty("PORT")
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let listen_addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|_| ConfigError::InvalidListenAddr(format!("{}:{}", host, port)))?;

    Ok(Config {
        bitquery_url,
        api_key,
        network,
        explorer_tx_url,
        default_address,
        listen_addr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let cfg = from_lookup(lookup_from(&[("BITQUERY_API_KEY", "secret")])).unwrap();

        assert_eq!(cfg.bitquery_url.as_str(), DEFAULT_BITQUERY_URL);
        assert_eq!(cfg.api_key, "secret");
        assert_eq!(cfg.network, "flow");
        assert_eq!(cfg.explorer_tx_url, DEFAULT_EXPLORER_TX_URL);
        assert_eq!(cfg.default_address, DEFAULT_ADDRESS);
        assert_eq!(cfg.listen_addr, "127.0.0.1:3000".parse().unwrap());
    }

    #[test]
    fn missing_or_blank_api_key_is_an_error() {
        assert!(matches!(
            from_lookup(lookup_from(&[])),
            Err(ConfigError::Missing("BITQUERY_API_KEY"))
        ));
        assert!(matches!(
            from_lookup(lookup_from(&[("BITQUERY_API_KEY", "  ")])),
            Err(ConfigError::Missing("BITQUERY_API_KEY"))
        ));
    }

    #[test]
    fn overrides_and_bad_port_fallback() {
        let cfg = from_lookup(lookup_from(&[
            ("BITQUERY_API_KEY", "k"),
            ("BITQUERY_URL", "http://localhost:9999/graphql"),
            ("BITQUERY_NETWORK", "flow_testnet"),
            ("HOST", "0.0.0.0"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap();

        assert_eq!(cfg.bitquery_url.as_str(), "http://localhost:9999/graphql");
        assert_eq!(cfg.network, "flow_testnet");
        assert_eq!(cfg.listen_addr, "0.0.0.0:3000".parse().unwrap());
    }

    #[test]
    fn invalid_url_is_rejected() {
        let err = from_lookup(lookup_from(&[
            ("BITQUERY_API_KEY", "k"),
            ("BITQUERY_URL", "not a url"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { name: "BITQUERY_URL", .. }));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let cfg = from_lookup(lookup_from(&[("BITQUERY_API_KEY", "BQYsecret")])).unwrap();
        let printed = format!("{:?}", cfg);
        assert!(!printed.contains("BQYsecret"));
        assert!(printed.contains("<redacted>"));
    }
}
