//! Domain events
//!
//! The closed set of facts the store records and reports. `ItemAdded`,
//! `ItemRemoved` and `ItemChanged` are persisted to the log; `IoError`
//! exists only on the output side.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::{Id, Item};
use crate::storage::StoreError;

/// A new item with this ID now exists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemAdded {
    #[serde(rename = "ID")]
    pub id: Id,
    #[serde(rename = "Item")]
    pub item: Item,
}

/// The item with this ID no longer exists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemRemoved {
    #[serde(rename = "ID")]
    pub id: Id,
}

/// The item with this ID now has this content (full replace)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemChanged {
    #[serde(rename = "ID")]
    pub id: Id,
    #[serde(rename = "Item")]
    pub item: Item,
}

/// A durability operation failed
#[derive(Debug, Clone)]
pub struct IoError {
    pub error: Arc<StoreError>,
}

/// Tag written for [`Event::ItemAdded`]
pub const TAG_ADD: &str = "add";
/// Tag written for [`Event::ItemRemoved`]
pub const TAG_REMOVE: &str = "remove";
/// Tag written for [`Event::ItemChanged`]
pub const TAG_CHANGE: &str = "change";
/// Tag of [`Event::IoError`]; never written
pub const TAG_IO_ERROR: &str = "ioerror";

/// An event flowing into or out of the store
#[derive(Debug, Clone)]
pub enum Event {
    ItemAdded(ItemAdded),
    ItemRemoved(ItemRemoved),
    ItemChanged(ItemChanged),
    IoError(IoError),
}

impl Event {
    pub fn added(id: Id, item: Item) -> Self {
        Event::ItemAdded(ItemAdded { id, item })
    }

    pub fn removed(id: Id) -> Self {
        Event::ItemRemoved(ItemRemoved { id })
    }

    pub fn changed(id: Id, item: Item) -> Self {
        Event::ItemChanged(ItemChanged { id, item })
    }

    pub fn io_error(error: StoreError) -> Self {
        Event::IoError(IoError {
            error: Arc::new(error),
        })
    }

    /// The record type tag
    pub fn type_tag(&self) -> &'static str {
        match self {
            Event::ItemAdded(_) => TAG_ADD,
            Event::ItemRemoved(_) => TAG_REMOVE,
            Event::ItemChanged(_) => TAG_CHANGE,
            Event::IoError(_) => TAG_IO_ERROR,
        }
    }

    /// Whether this event is written to the log
    pub fn is_persistent(&self) -> bool {
        !matches!(self, Event::IoError(_))
    }

    /// The item ID this event refers to, if any
    pub fn id(&self) -> Option<&Id> {
        match self {
            Event::ItemAdded(e) => Some(&e.id),
            Event::ItemRemoved(e) => Some(&e.id),
            Event::ItemChanged(e) => Some(&e.id),
            Event::IoError(_) => None,
        }
    }
}

// Two failures compare equal when they render the same message.
impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Event::ItemAdded(a), Event::ItemAdded(b)) => a == b,
            (Event::ItemRemoved(a), Event::ItemRemoved(b)) => a == b,
            (Event::ItemChanged(a), Event::ItemChanged(b)) => a == b,
            (Event::IoError(a), Event::IoError(b)) => a.error.to_string() == b.error.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tags() {
        let id = Id::random();
        assert_eq!(Event::added(id.clone(), Item::new("a")).type_tag(), "add");
        assert_eq!(Event::removed(id.clone()).type_tag(), "remove");
        assert_eq!(Event::changed(id, Item::new("a")).type_tag(), "change");
        assert_eq!(Event::io_error(StoreError::Closed).type_tag(), "ioerror");
    }

    #[test]
    fn test_only_domain_events_persist() {
        assert!(Event::removed(Id::random()).is_persistent());
        assert!(!Event::io_error(StoreError::Closed).is_persistent());
        assert!(Event::io_error(StoreError::Closed).id().is_none());
    }

    #[test]
    fn test_payload_field_names() {
        let id = Id::from("00112233445566778899aabbccddeeff");
        let json = serde_json::to_string(&ItemChanged {
            id,
            item: Item::new("x").with_done(true),
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"ID":"00112233445566778899aabbccddeeff","Item":{"Text":"x","Done":true}}"#
        );
    }

    #[test]
    fn test_equality() {
        let id = Id::random();
        assert_eq!(Event::removed(id.clone()), Event::removed(id.clone()));
        assert_ne!(
            Event::added(id.clone(), Item::new("a")),
            Event::changed(id, Item::new("a"))
        );
        assert_eq!(
            Event::io_error(StoreError::Closed),
            Event::io_error(StoreError::Closed)
        );
    }
}
