use std::fmt;
use std::sync::Arc;

use notify_domain::NotificationProxy;

/// Named slot of the registry. `proxy` is `None` when the slot is declared
/// in configuration but could not be bound to a backend.
#[derive(Clone)]
pub struct ProxyEntry {
    pub name: String,
    pub proxy: Option<Arc<dyn NotificationProxy>>,
}

impl fmt::Debug for ProxyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyEntry")
            .field("name", &self.name)
            .field("protocol", &self.proxy.as_ref().map(|proxy| proxy.protocol()))
            .finish()
    }
}

/// Cache empty proxies in registration order. Built once at startup.
#[derive(Clone, Debug, Default)]
pub struct ProxyRegistry {
    entries: Vec<ProxyEntry>,
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_proxy(mut self, name: impl Into<String>, proxy: Arc<dyn NotificationProxy>) -> Self {
        self.register(name, proxy);
        self
    }

    pub fn register(&mut self, name: impl Into<String>, proxy: Arc<dyn NotificationProxy>) {
        self.entries.push(ProxyEntry {
            name: name.into(),
            proxy: Some(proxy),
        });
    }

    pub fn register_unconfigured(&mut self, name: impl Into<String>) {
        self.entries.push(ProxyEntry {
            name: name.into(),
            proxy: None,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProxyEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn configured_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.proxy.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProxy;

    #[test]
    fn keeps_registration_order_and_counts_configured_slots() {
        let mut registry =
            ProxyRegistry::new().with_proxy("primary", Arc::new(MockProxy::populated()));
        registry.register_unconfigured("broken");

        let names: Vec<&str> = registry.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["primary", "broken"]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.configured_count(), 1);
        assert!(!registry.is_empty());
    }
}
