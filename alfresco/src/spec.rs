//! Declarative description of a container, handed to the runtime on start.

use crate::image::ImageReference;
use crate::network::SharedNetwork;
use crate::probe::ReadinessProbe;

/// Ordered environment variables. Inserting an existing key replaces its
/// value without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVars {
    entries: Vec<(String, String)>
}

impl EnvVars {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a variable, returning the previous value when the key existed.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvVars {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut env = Self::new();
        for (key, value) in iter {
            env.insert(key, value);
        }
        env
    }
}

/// Everything the runtime needs to create and start one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    name: String,
    image: ImageReference,
    exposed_ports: Vec<u16>,
    env: EnvVars,
    network: Option<SharedNetwork>,
    network_aliases: Vec<String>,
    readiness: Option<ReadinessProbe>
}

impl ContainerSpec {
    /// `name` identifies the container in logs and errors.
    pub fn new(name: impl Into<String>, image: ImageReference) -> Self {
        Self {
            name: name.into(),
            image,
            exposed_ports: Vec::new(),
            env: EnvVars::new(),
            network: None,
            network_aliases: Vec::new(),
            readiness: None
        }
    }

    /// Adds a port to the exposed set; duplicates are ignored.
    #[must_use]
    pub fn with_exposed_port(mut self, port: u16) -> Self {
        if !self.exposed_ports.contains(&port) {
            self.exposed_ports.push(port);
        }
        self
    }

    #[must_use]
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key, value);
        self
    }

    /// Joins `network`, reachable by the other members under `alias`.
    #[must_use]
    pub fn with_network(mut self, network: SharedNetwork, alias: impl Into<String>) -> Self {
        self.network = Some(network);
        let alias = alias.into();
        if !self.network_aliases.contains(&alias) {
            self.network_aliases.push(alias);
        }
        self
    }

    #[must_use]
    pub fn with_readiness(mut self, probe: ReadinessProbe) -> Self {
        self.readiness = Some(probe);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &ImageReference {
        &self.image
    }

    pub fn exposed_ports(&self) -> &[u16] {
        &self.exposed_ports
    }

    pub fn env(&self) -> &EnvVars {
        &self.env
    }

    pub fn network(&self) -> Option<&SharedNetwork> {
        self.network.as_ref()
    }

    pub fn network_aliases(&self) -> &[String] {
        &self.network_aliases
    }

    pub fn readiness(&self) -> Option<&ReadinessProbe> {
        self.readiness.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_env_insert_replaces_in_place() {
        let mut env: EnvVars = [("A", "1"), ("B", "2")].into_iter().collect();
        assert_eq!(env.insert("A", "10"), Some("1".to_string()));
        assert_eq!(env.insert("C", "3"), None);
        let pairs: Vec<_> = env.iter().collect();
        assert_eq!(pairs, vec![("A", "10"), ("B", "2"), ("C", "3")]);
    }

    #[test]
    fn test_spec_builder() {
        let image = ImageReference::parse("apache/activemq-classic:5.18.3").unwrap();
        let network = SharedNetwork::named("stack");
        let spec = ContainerSpec::new("activemq", image.clone())
            .with_exposed_port(61616)
            .with_exposed_port(8161)
            .with_exposed_port(61616)
            .with_network(network.clone(), "activemq")
            .with_readiness(ReadinessProbe::log_messages(
                [(crate::probe::LogStream::Stdout, "started")],
                Duration::from_secs(120)
            ));

        assert_eq!(spec.name(), "activemq");
        assert_eq!(spec.image(), &image);
        assert_eq!(spec.exposed_ports(), &[61616, 8161]);
        assert_eq!(spec.network(), Some(&network));
        assert_eq!(spec.network_aliases(), &["activemq".to_string()]);
        assert!(spec.env().is_empty());
        assert!(spec.readiness().is_some());
    }
}
