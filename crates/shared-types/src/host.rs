//! # Host Model
//!
//! A host is the object candidates are declared on. It carries an identity,
//! an optional parent (used for context containment checks) and a mutable
//! attribute map that discovery reads and the controllers annotate.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Well-known attribute names.
pub mod attributes {
    /// Candidate declaration (single path or JSON array of candidates).
    pub const MODULE: &str = "data-module";
    /// Condition-set expression for a single-path declaration.
    pub const CONDITIONS: &str = "data-conditions";
    /// Node priority, parsed as an integer.
    pub const PRIORITY: &str = "data-priority";
    /// Set to `"true"` once a node controller owns the host.
    pub const PROCESSED: &str = "data-processed";
    /// Set to `"true"` while a module built on `BaseModule` is loaded.
    pub const INITIALIZED: &str = "data-initialized";
}

/// Shared handle to a host.
pub type HostRef = Arc<Host>;

/// An object candidates attach to.
pub struct Host {
    id: String,
    parent: Option<HostRef>,
    attributes: RwLock<HashMap<String, String>>,
}

impl Host {
    /// Create a root host.
    pub fn new(id: impl Into<String>) -> HostRef {
        Arc::new(Self {
            id: id.into(),
            parent: None,
            attributes: RwLock::new(HashMap::new()),
        })
    }

    /// Create a host nested under `parent`.
    pub fn with_parent(id: impl Into<String>, parent: &HostRef) -> HostRef {
        Arc::new(Self {
            id: id.into(),
            parent: Some(Arc::clone(parent)),
            attributes: RwLock::new(HashMap::new()),
        })
    }

    /// Host identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Parent host, if any.
    pub fn parent(&self) -> Option<&HostRef> {
        self.parent.as_ref()
    }

    /// Read an attribute.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.read().get(name).cloned()
    }

    /// Whether an attribute is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.read().contains_key(name)
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.write().insert(name.into(), value.into());
    }

    /// Remove an attribute. Returns the previous value.
    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.attributes.write().remove(name)
    }

    /// Whether `other` is this host or one of its descendants.
    pub fn contains(&self, other: &Host) -> bool {
        let mut current = Some(other);
        while let Some(host) = current {
            if std::ptr::eq(host, self) {
                return true;
            }
            current = host.parent.as_deref();
        }
        false
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("id", &self.id)
            .field("parent", &self.parent.as_ref().map(|p| p.id.clone()))
            .field("attributes", &*self.attributes.read())
            .finish()
    }
}

// =============================================================================
// SELECTOR MATCHING
// =============================================================================

/// Matches a selector query against a host.
///
/// Selector languages are an external concern; the node controller only
/// delegates to whichever matcher it was built with.
pub trait SelectorMatcher: Send + Sync {
    /// Whether `host` matches `selector`.
    fn matches(&self, host: &Host, selector: &str) -> bool;
}

/// Minimal attribute selector.
///
/// Supports `*`, `#id`, `[name]`, `[name=value]` (value optionally quoted),
/// compounds such as `#nav[data-module]` and comma-separated alternatives.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeSelector;

impl AttributeSelector {
    fn matches_compound(host: &Host, compound: &str) -> bool {
        let compound = compound.trim();
        if compound.is_empty() {
            return false;
        }
        if compound == "*" {
            return true;
        }

        let mut rest = compound;
        while !rest.is_empty() {
            if let Some(after_hash) = rest.strip_prefix('#') {
                let end = after_hash.find('[').unwrap_or(after_hash.len());
                if &after_hash[..end] != host.id() {
                    return false;
                }
                rest = &after_hash[end..];
            } else if let Some(after_bracket) = rest.strip_prefix('[') {
                let Some(close) = after_bracket.find(']') else {
                    return false;
                };
                if !Self::matches_attribute(host, &after_bracket[..close]) {
                    return false;
                }
                rest = &after_bracket[close + 1..];
            } else {
                return false;
            }
        }
        true
    }

    fn matches_attribute(host: &Host, clause: &str) -> bool {
        match clause.split_once('=') {
            None => host.has_attribute(clause.trim()),
            Some((name, value)) => {
                let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                host.attribute(name.trim()).as_deref() == Some(value)
            }
        }
    }
}

impl SelectorMatcher for AttributeSelector {
    fn matches(&self, host: &Host, selector: &str) -> bool {
        selector
            .split(',')
            .any(|compound| Self::matches_compound(host, compound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_roundtrip() {
        let host = Host::new("nav");
        assert!(!host.has_attribute(attributes::PROCESSED));

        host.set_attribute(attributes::PROCESSED, "true");
        assert_eq!(host.attribute(attributes::PROCESSED).as_deref(), Some("true"));

        assert_eq!(host.remove_attribute(attributes::PROCESSED).as_deref(), Some("true"));
        assert!(!host.has_attribute(attributes::PROCESSED));
    }

    #[test]
    fn test_contains_walks_ancestors() {
        let page = Host::new("page");
        let main = Host::with_parent("main", &page);
        let nav = Host::with_parent("nav", &main);
        let aside = Host::new("aside");

        assert!(page.contains(&nav));
        assert!(main.contains(&nav));
        assert!(nav.contains(&nav));
        assert!(!nav.contains(&main));
        assert!(!aside.contains(&nav));
    }

    #[test]
    fn test_contains_compares_identity() {
        let page = Host::new("page");
        let nav = Host::with_parent("nav", &page);
        let other_nav = Host::new("nav");
        let other_page = Host::new("page");

        assert!(!nav.contains(&other_nav));
        assert!(!other_nav.contains(&nav));
        assert!(!other_page.contains(&nav));
        assert!(page.contains(&nav));
    }

    #[test]
    fn test_selector_id_and_attributes() {
        let host = Host::new("nav");
        host.set_attribute(attributes::MODULE, "ui/menu");

        let matcher = AttributeSelector;
        assert!(matcher.matches(&host, "#nav"));
        assert!(matcher.matches(&host, "[data-module]"));
        assert!(matcher.matches(&host, "[data-module=\"ui/menu\"]"));
        assert!(matcher.matches(&host, "#nav[data-module=ui/menu]"));
        assert!(matcher.matches(&host, "#footer, #nav"));
        assert!(matcher.matches(&host, "*"));

        assert!(!matcher.matches(&host, "#footer"));
        assert!(!matcher.matches(&host, "[data-module=ui/map]"));
        assert!(!matcher.matches(&host, "nav"));
        assert!(!matcher.matches(&host, "[data-module"));
    }
}
