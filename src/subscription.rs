//! # Subscription set: which message types a worker wants to receive.
//!
//! [`Subscription`] is either the wildcard (accept all, including future
//! and unknown tags) or a finite set of type-tag strings. Matching is
//! exact-string and case-sensitive — no prefix or pattern matching.
//!
//! The transport bridge strips reserved control tags (`PING`, `PONG`,
//! handshake types) **before** consulting the subscription, so they never
//! reach the filter or the application queue regardless of its contents.
//!
//! ## Example
//! ```rust
//! use comet_runtime::Subscription;
//!
//! let all = Subscription::all();
//! assert!(all.accepts("ANYTHING"));
//!
//! let some = Subscription::to(["COMMAND", "CONFIG"]);
//! assert!(some.accepts("COMMAND"));
//! assert!(!some.accepts("STATUS"));
//! assert!(!some.accepts("command")); // case-sensitive
//!
//! // An empty explicit set accepts nothing (send-only worker).
//! assert!(!Subscription::none().accepts("COMMAND"));
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

/// Literal marker selecting the wildcard subscription on the wire.
pub const WILDCARD: &str = "*";

/// Declared set of accepted message type tags.
///
/// Fixed at construction and valid for the process lifetime; the bridge
/// sends it to the core process as part of the registration handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscription {
    /// Accept every type tag, including ones unknown at build time.
    All,
    /// Accept exactly these tags; the empty set accepts nothing.
    Only(HashSet<String>),
}

impl Subscription {
    /// Wildcard subscription.
    pub fn all() -> Self {
        Subscription::All
    }

    /// Empty explicit set: the worker receives no application messages
    /// (it may still send).
    pub fn none() -> Self {
        Subscription::Only(HashSet::new())
    }

    /// Builds a subscription from tags.
    ///
    /// A literal `"*"` element anywhere in the input selects the wildcard.
    pub fn to<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = HashSet::new();
        for tag in tags {
            let tag = tag.into();
            if tag == WILDCARD {
                return Subscription::All;
            }
            set.insert(tag);
        }
        Subscription::Only(set)
    }

    /// Pure filter predicate: true iff this subscription delivers
    /// envelopes of type `kind` to the application queue.
    #[inline]
    pub fn accepts(&self, kind: &str) -> bool {
        match self {
            Subscription::All => true,
            Subscription::Only(set) => set.contains(kind),
        }
    }

    /// True for the wildcard subscription.
    #[inline]
    pub fn is_all(&self) -> bool {
        matches!(self, Subscription::All)
    }
}

// Wire representation inside the registration payload: the wildcard is the
// literal string "*", an explicit set is an array of tag strings.
impl Serialize for Subscription {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Subscription::All => serializer.serialize_str(WILDCARD),
            Subscription::Only(set) => {
                let mut tags: Vec<&str> = set.iter().map(String::as_str).collect();
                tags.sort_unstable();
                let mut seq = serializer.serialize_seq(Some(tags.len()))?;
                for tag in tags {
                    seq.serialize_element(tag)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Subscription {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SubscriptionVisitor;

        impl<'de> Visitor<'de> for SubscriptionVisitor {
            type Value = Subscription;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("\"*\" or an array of type-tag strings")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                if v == WILDCARD {
                    Ok(Subscription::All)
                } else {
                    Err(E::custom(format!("unexpected subscription string {v:?}")))
                }
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut tags: Vec<String> = Vec::new();
                while let Some(tag) = seq.next_element::<String>()? {
                    tags.push(tag);
                }
                Ok(Subscription::to(tags))
            }
        }

        deserializer.deserialize_any(SubscriptionVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_accepts_everything() {
        let sub = Subscription::all();
        assert!(sub.accepts("COMMAND"));
        assert!(sub.accepts("ANYTHING"));
        assert!(sub.accepts(""));
    }

    #[test]
    fn explicit_set_is_exact_and_case_sensitive() {
        let sub = Subscription::to(["COMMAND"]);
        assert!(sub.accepts("COMMAND"));
        assert!(!sub.accepts("STATUS"));
        assert!(!sub.accepts("command"));
        assert!(!sub.accepts("COMMANDS"));
    }

    #[test]
    fn empty_set_accepts_nothing() {
        let sub = Subscription::none();
        assert!(!sub.accepts("COMMAND"));
        assert!(!sub.accepts(""));
    }

    #[test]
    fn star_element_selects_wildcard() {
        let sub = Subscription::to(["COMMAND", "*", "STATUS"]);
        assert!(sub.is_all());
        assert!(sub.accepts("SOMETHING_ELSE"));
    }

    #[test]
    fn wire_roundtrip() {
        let all = Subscription::all();
        let json = serde_json::to_string(&all).unwrap();
        assert_eq!(json, "\"*\"");
        assert_eq!(serde_json::from_str::<Subscription>(&json).unwrap(), all);

        let some = Subscription::to(["B", "A"]);
        let json = serde_json::to_string(&some).unwrap();
        assert_eq!(json, "[\"A\",\"B\"]");
        assert_eq!(serde_json::from_str::<Subscription>(&json).unwrap(), some);
    }

    #[test]
    fn unknown_string_is_rejected() {
        assert!(serde_json::from_str::<Subscription>("\"COMMAND\"").is_err());
    }
}
