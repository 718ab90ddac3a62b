use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A provider-native message kept verbatim in the request history.
///
/// The neutral message types of this crate can't express everything a
/// backend wants echoed back on the next turn (function call parts with
/// their thought signatures, for instance). A provider wraps its own wire
/// message in an `OpaqueMessage`, and unwraps it again when it serializes
/// the next request.
///
/// Two opaque messages are equal when they come from the same provider and
/// carry the same `id`.
pub struct OpaqueMessage(Arc<dyn Payload>);

impl OpaqueMessage {
    /// Wraps `value` produced by `provider` under a conversation-unique `id`.
    #[inline]
    pub fn new<ID, T>(provider: &'static str, id: ID, value: T) -> Self
    where
        ID: Into<String>,
        T: Send + Sync + 'static,
    {
        Self(Arc::new(Tagged {
            provider,
            id: id.into(),
            value,
        }))
    }

    /// Returns the name of the provider that produced the message.
    #[inline]
    pub fn provider(&self) -> &'static str {
        self.0.provider()
    }

    /// Returns the message identifier.
    #[inline]
    pub fn id(&self) -> &str {
        self.0.id()
    }

    /// Borrows the wrapped value if it has type `T`.
    #[inline]
    pub fn to_raw<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }
}

impl Clone for OpaqueMessage {
    #[inline]
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl Debug for OpaqueMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueMessage")
            .field("provider", &self.0.provider())
            .field("id", &self.0.id())
            .finish()
    }
}

impl PartialEq for OpaqueMessage {
    fn eq(&self, other: &Self) -> bool {
        self.0.provider() == other.0.provider() && self.0.id() == other.0.id()
    }
}

impl Eq for OpaqueMessage {}

impl Hash for OpaqueMessage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.provider().hash(state);
        self.0.id().hash(state);
    }
}

trait Payload: Send + Sync {
    fn provider(&self) -> &'static str;
    fn id(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
}

struct Tagged<T> {
    provider: &'static str,
    id: String,
    value: T,
}

impl<T: Send + Sync + 'static> Payload for Tagged<T> {
    fn provider(&self) -> &'static str {
        self.provider
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn as_any(&self) -> &dyn Any {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[derive(Clone)]
    struct WireTurn(Vec<String>);

    #[test]
    fn test_unwrap_native_value() {
        let turn = WireTurn(vec!["searching".to_owned()]);
        let opaque = OpaqueMessage::new("fake", "resp-1", turn);
        assert_eq!(opaque.provider(), "fake");
        assert_eq!(opaque.id(), "resp-1");
        assert_eq!(opaque.to_raw::<WireTurn>().unwrap().0[0], "searching");
        assert!(opaque.to_raw::<String>().is_none());
    }

    #[test]
    fn test_identity_includes_provider() {
        let a = OpaqueMessage::new("fake", "resp-1", WireTurn(vec![]));
        let b = OpaqueMessage::new("other", "resp-1", WireTurn(vec![]));
        let c = OpaqueMessage::new("fake", "resp-2", WireTurn(vec![]));

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a.clone(), a, b, c].into_iter().collect();
        assert_eq!(set.len(), 3);
    }
}
