//! Monitored endpoint identity.

use std::fmt;
use url::Url;

use crate::config::EndpointConfig;

/// A monitored target. Immutable for the lifetime of the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Position in the configured set (0-based, stable).
    pub index: usize,
    /// Stable display name.
    pub name: String,
    /// URL probed with GET.
    pub url: Url,
}

impl Endpoint {
    pub fn new(index: usize, name: impl Into<String>, url: Url) -> Self {
        Self {
            index,
            name: name.into(),
            url,
        }
    }

    /// Build the endpoint list from configuration, preserving order.
    pub fn from_configs(configs: &[EndpointConfig]) -> Result<Vec<Endpoint>, url::ParseError> {
        configs
            .iter()
            .enumerate()
            .map(|(index, c)| Ok(Endpoint::new(index, c.name.trim(), Url::parse(&c.url)?)))
            .collect()
    }

    /// Whether `selector` names this endpoint, either by exact name or by
    /// 1-based position. Configuration rejects all-digit names, so the two
    /// forms cannot collide; callers building endpoints by hand get the
    /// first match in configured order.
    pub fn matches(&self, selector: &str) -> bool {
        if self.name == selector {
            return true;
        }
        selector
            .parse::<usize>()
            .map(|position| position == self.index + 1)
            .unwrap_or(false)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_configs_keeps_order() {
        let configs = vec![
            EndpointConfig {
                name: "one".into(),
                url: "https://a.example/h".into(),
            },
            EndpointConfig {
                name: "two".into(),
                url: "https://b.example/h".into(),
            },
        ];
        let endpoints = Endpoint::from_configs(&configs).unwrap();
        assert_eq!(endpoints[0].index, 0);
        assert_eq!(endpoints[1].name, "two");
        assert_eq!(endpoints[1].url.host_str(), Some("b.example"));
    }

    #[test]
    fn test_matches_name_or_position() {
        let endpoint = Endpoint::new(1, "billing", Url::parse("https://b.example/h").unwrap());
        assert!(endpoint.matches("billing"));
        assert!(endpoint.matches("2"));
        assert!(!endpoint.matches("1"));
        assert!(!endpoint.matches("Billing"));
        assert!(!endpoint.matches("0"));
    }
}
