//! Type-safe, efficient identifiers for transit entities.
//!
//! All identifiers use Arc<str> for cheap cloning and minimal memory overhead.
//! Identifiers order lexicographically; query results use that for tie breaks.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

macro_rules! impl_identifier {
    ($name:ident) => {
        #[derive(Clone, Debug)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(s.as_ref().into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
            }
        }

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.as_ref().cmp(other.0.as_ref())
            }
        }

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

impl_identifier!(RouteIdentifier);
impl_identifier!(StopIdentifier);
impl_identifier!(BusIdentifier);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_equality() {
        let id1 = StopIdentifier::new("23002");
        let id2 = StopIdentifier::new("23002");
        let id3 = id1.clone();

        assert_eq!(id1, id2);
        assert_eq!(id1, id3);
        assert!(Arc::ptr_eq(&id1.0, &id3.0)); // Clone shares Arc
    }

    #[test]
    fn test_identifier_ordering() {
        let mut ids = vec![
            StopIdentifier::new("23004"),
            StopIdentifier::new("23001"),
            StopIdentifier::new("23003"),
        ];
        ids.sort();
        assert_eq!(ids[0].as_str(), "23001");
        assert_eq!(ids[2].as_str(), "23004");
    }

    #[test]
    fn test_identifier_hash() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(RouteIdentifier::new("472"), 42);

        assert_eq!(map.get(&RouteIdentifier::new("472")), Some(&42));
    }

    #[test]
    fn test_identifier_display() {
        let id = BusIdentifier::new("472001");
        assert_eq!(format!("{}", id), "472001");
    }

    #[test]
    fn test_identifier_conversions() {
        let _id1: RouteIdentifier = "143".into();
        let _id2: RouteIdentifier = String::from("472").into();
    }
}
