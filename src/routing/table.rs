//! Route table
//!
//! Maps handler identifiers to their route patterns. Entries keep their
//! registration order: the matcher breaks specificity ties by keeping the
//! last registered pattern, so order is part of the contract. Handler
//! identifiers are relative module paths joined with `/` (`blog`,
//! `admin/user`, `blog/index`).

use crate::routing::pattern::RoutePattern;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;

/// Ordered mapping of handler identifier to route patterns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    entries: Vec<(String, Vec<RoutePattern>)>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern for a handler. Appends to the handler's pattern
    /// list when the handler is already present, preserving order in both
    /// dimensions.
    pub fn insert(&mut self, handler: &str, pattern: &str) {
        let parsed = RoutePattern::parse(pattern);
        match self.entries.iter_mut().find(|(h, _)| h == handler) {
            Some((_, patterns)) => patterns.push(parsed),
            None => self.entries.push((handler.to_string(), vec![parsed])),
        }
    }

    #[must_use]
    pub fn get(&self, handler: &str) -> Option<&[RoutePattern]> {
        self.entries
            .iter()
            .find(|(h, _)| h == handler)
            .map(|(_, patterns)| patterns.as_slice())
    }

    /// Entries in registration order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[RoutePattern])> {
        self.entries
            .iter()
            .map(|(h, patterns)| (h.as_str(), patterns.as_slice()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// Deserialized by hand: a generic map would land in a HashMap and lose the
// document order the last-wins tie-break depends on.
impl<'de> Deserialize<'de> for RouteTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = RouteTable;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of handler identifier to a list of route patterns")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut table = RouteTable::new();
                while let Some((handler, patterns)) = map.next_entry::<String, Vec<String>>()? {
                    for pattern in &patterns {
                        table.insert(&handler, pattern);
                    }
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_preserves_registration_order() {
        let mut table = RouteTable::new();
        table.insert("blog", "/blog/$id");
        table.insert("user", "/user/$id");
        table.insert("blog", "/weblog/$id");

        let handlers: Vec<&str> = table.entries().map(|(h, _)| h).collect();
        assert_eq!(handlers, vec!["blog", "user"]);
        assert_eq!(table.get("blog").unwrap().len(), 2);
    }

    #[test]
    fn deserialize_from_toml() {
        let table: RouteTable = toml::from_str(
            r#"
            blog = ["/blog/$id", "/weblog/$id"]
            "user/profile" = ["/profile/$name"]
            "#,
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("blog").unwrap().len(), 2);
        assert_eq!(
            table.get("user/profile").unwrap()[0].to_string(),
            "/profile/$name"
        );
    }
}
