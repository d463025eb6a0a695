//! Document collection client interface and query filters.

use serde_json::{json, Map, Value as JsonValue};

use crate::error::Result;

/// A stored document: an ordered map of field names to JSON values.
pub type Document = Map<String, JsonValue>;

/// Query filter built by the document engine.
///
/// [`Filter::to_query`] renders the filter in the Mongo query language so a
/// remote client can send it as is.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every document
    All,
    /// `field` holds exactly the string `value`
    Eq { field: String, value: String },
    /// `field` is a string containing `needle`, ignoring case
    Contains { field: String, needle: String },
    /// `field`, converted to its string form on the server, contains
    /// `needle`, ignoring case
    StringifiedContains { field: String, needle: String },
}

impl Filter {
    pub fn to_query(&self) -> JsonValue {
        match self {
            Filter::All => json!({}),
            Filter::Eq { field, value } => json!({ field.as_str(): value }),
            Filter::Contains { field, needle } => {
                json!({ field.as_str(): { "$regex": regex::escape(needle), "$options": "i" } })
            }
            Filter::StringifiedContains { field, needle } => json!({
                "$expr": {
                    "$regexMatch": {
                        "input": { "$toString": format!("${}", field) },
                        "regex": regex::escape(needle),
                        "options": "i",
                    }
                }
            }),
        }
    }
}

/// Connection to a document database holding named collections.
///
/// Methods take `&self` like a pooled network client; implementations
/// provide their own interior synchronization.
pub trait DocumentClient {
    /// Handshake with the server.
    fn ping(&self) -> Result<()>;

    /// A fresh collection-assigned identifier.
    fn object_id(&self) -> String;

    /// Insert `document`, assigning `_id` if it has none.
    fn insert_one(&self, collection: &str, document: Document) -> Result<()>;

    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>>;

    /// Set the fields of `set` on the first match; returns the match count.
    fn update_one(&self, collection: &str, filter: &Filter, set: Document) -> Result<u64>;

    /// Delete the first match; returns the deleted count.
    fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_search_stringifies_on_server() {
        let filter = Filter::StringifiedContains {
            field: "unitPrice".to_string(),
            needle: "2.5".to_string(),
        };
        assert_eq!(
            filter.to_query(),
            json!({
                "$expr": {
                    "$regexMatch": {
                        "input": { "$toString": "$unitPrice" },
                        "regex": "2\\.5",
                        "options": "i",
                    }
                }
            })
        );
    }

    #[test]
    fn test_substring_search_escapes_needle() {
        let filter = Filter::Contains {
            field: "description".to_string(),
            needle: "a+b".to_string(),
        };
        assert_eq!(
            filter.to_query(),
            json!({ "description": { "$regex": "a\\+b", "$options": "i" } })
        );
    }

    #[test]
    fn test_eq_and_all_queries() {
        let filter = Filter::Eq {
            field: "_id".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(filter.to_query(), json!({ "_id": "abc" }));
        assert_eq!(Filter::All.to_query(), json!({}));
    }
}
