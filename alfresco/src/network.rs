//! Shared virtual network joined by every container of one fixture.

use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Handle to a named Docker network.
///
/// Clones share the same name; the runtime creates the network on first use
/// and removes it once the last container attached to it is gone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SharedNetwork {
    name: Arc<str>
}

impl SharedNetwork {
    /// Creates a handle with a fresh, process-unique name.
    #[must_use]
    pub fn new() -> Self {
        Self::named(format!("alfresco-tc-{}", Uuid::new_v4().simple()))
    }

    /// Wraps an existing network name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into())
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for SharedNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SharedNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_networks_are_unique() {
        let a = SharedNetwork::new();
        let b = SharedNetwork::new();
        assert_ne!(a, b);
        assert!(a.name().starts_with("alfresco-tc-"));
    }

    #[test]
    fn test_clones_share_the_name() {
        let network = SharedNetwork::named("stack");
        let clone = network.clone();
        assert_eq!(clone, network);
        assert!(std::ptr::eq(clone.name(), network.name()));
    }
}
