use std::time::Duration;

use anyhow::Context as _;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Transport settings shared by every adapter instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Overrides the site's own TLS policy when set.
    pub accept_invalid_certs: Option<bool>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            accept_invalid_certs: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup("NOVELSHELF_HTTP_TIMEOUT_SECS") {
            config.timeout = parse_secs(&raw)
                .with_context(|| format!("invalid NOVELSHELF_HTTP_TIMEOUT_SECS={raw:?}"))?;
        }
        if let Some(raw) = lookup("NOVELSHELF_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = parse_secs(&raw)
                .with_context(|| format!("invalid NOVELSHELF_CONNECT_TIMEOUT_SECS={raw:?}"))?;
        }
        if let Some(raw) = lookup("NOVELSHELF_ACCEPT_INVALID_CERTS") {
            config.accept_invalid_certs = Some(
                parse_bool(&raw)
                    .with_context(|| format!("invalid NOVELSHELF_ACCEPT_INVALID_CERTS={raw:?}"))?,
            );
        }

        Ok(config)
    }
}

fn parse_secs(raw: &str) -> anyhow::Result<Duration> {
    let secs = raw.trim().parse::<u64>().context("expected whole seconds")?;
    if secs == 0 {
        anyhow::bail!("timeout must be > 0");
    }
    Ok(Duration::from_secs(secs))
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {other:?}"),
    }
}

/// Fixed request headers a site expects on every call. `origin` is derived
/// from the site's base URL when the template leaves it unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderTemplate {
    pub user_agent: &'static str,
    pub origin: Option<&'static str>,
    pub requested_with: Option<&'static str>,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_finite() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.accept_invalid_certs, None);
    }

    #[test]
    fn reads_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("NOVELSHELF_HTTP_TIMEOUT_SECS", "5"),
            ("NOVELSHELF_CONNECT_TIMEOUT_SECS", " 2 "),
            ("NOVELSHELF_ACCEPT_INVALID_CERTS", "False"),
        ]))
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.accept_invalid_certs, Some(false));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[("NOVELSHELF_HTTP_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(format!("{err:#}").contains("timeout must be > 0"));
    }

    #[test]
    fn rejects_garbage_bool() {
        assert!(
            ClientConfig::from_lookup(lookup(&[("NOVELSHELF_ACCEPT_INVALID_CERTS", "maybe")]))
                .is_err()
        );
    }
}
