//! Lookup queries accepted by the registry.

use shared_types::HostRef;

/// What to look controllers or nodes up by.
///
/// A text query matches a candidate path first and falls back to selector
/// matching against the host. A host query matches by identity.
#[derive(Debug, Clone)]
pub enum Query {
    Text(String),
    Host(HostRef),
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Query {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<HostRef> for Query {
    fn from(host: HostRef) -> Self {
        Self::Host(host)
    }
}

impl From<&HostRef> for Query {
    fn from(host: &HostRef) -> Self {
        Self::Host(host.clone())
    }
}
