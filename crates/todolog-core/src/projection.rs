//! In-memory item projection
//!
//! `TodoList` folds the store's output events into the current item set,
//! keeping items in the order they were added. It is owned by the consumer
//! (a UI tick loop or a CLI command); the store knows nothing about it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::event::Event;
use crate::models::{Id, Item};
use crate::storage::StoreError;

/// Which items to show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    /// Whether an item passes this filter
    pub fn matches(self, item: &Item) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !item.done,
            Filter::Completed => item.done,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
        })
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "completed" | "done" => Ok(Filter::Completed),
            other => Err(format!(
                "unknown filter '{}', expected all, active or completed",
                other
            )),
        }
    }
}

/// Errors from resolving a user-supplied ID prefix
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no item matches '{0}'")]
    NotFound(String),
    #[error("'{prefix}' is ambiguous ({count} items match)")]
    Ambiguous { prefix: String, count: usize },
}

/// Current item set, folded from store events
#[derive(Debug, Default)]
pub struct TodoList {
    items: HashMap<Id, Item>,
    order: Vec<Id>,
    last_error: Option<Arc<StoreError>>,
}

impl TodoList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the list
    ///
    /// `ItemChanged` and `ItemRemoved` for IDs never added are ignored.
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::ItemAdded(e) => {
                if self.items.insert(e.id.clone(), e.item.clone()).is_none() {
                    self.order.push(e.id.clone());
                }
            }
            Event::ItemRemoved(e) => {
                if self.items.remove(&e.id).is_some() {
                    self.order.retain(|id| id != &e.id);
                } else {
                    debug!(id = %e.id, "remove for unknown item");
                }
            }
            Event::ItemChanged(e) => match self.items.get_mut(&e.id) {
                Some(item) => *item = e.item.clone(),
                None => debug!(id = %e.id, "change for unknown item"),
            },
            Event::IoError(e) => {
                self.last_error = Some(Arc::clone(&e.error));
            }
        }
    }

    /// Fold a batch of events in order
    pub fn apply_all<'a>(&mut self, events: impl IntoIterator<Item = &'a Event>) {
        for event in events {
            self.apply(event);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &Id) -> Option<&Item> {
        self.items.get(id)
    }

    /// All items in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Id, &Item)> {
        self.order
            .iter()
            .filter_map(|id| self.items.get(id).map(|item| (id, item)))
    }

    /// Items passing `filter`, in insertion order
    pub fn filtered(&self, filter: Filter) -> Vec<(&Id, &Item)> {
        self.iter().filter(|(_, item)| filter.matches(item)).collect()
    }

    pub fn done_count(&self) -> usize {
        self.items.values().filter(|item| item.done).count()
    }

    /// Number of items not yet done
    pub fn remaining(&self) -> usize {
        self.len() - self.done_count()
    }

    /// IDs of every completed item
    pub fn done_ids(&self) -> Vec<Id> {
        self.filtered(Filter::Completed)
            .into_iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Find the single item whose ID starts with `prefix`
    pub fn resolve(&self, prefix: &str) -> Result<Id, ResolveError> {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty() {
            return Err(ResolveError::NotFound(prefix));
        }
        // full IDs may be given in hyphenated form
        if let Ok(id) = Id::parse(&prefix) {
            if self.items.contains_key(&id) {
                return Ok(id);
            }
        }

        let matches: Vec<&Id> = self
            .order
            .iter()
            .filter(|id| id.as_str().starts_with(&prefix))
            .collect();

        match matches.as_slice() {
            [] => Err(ResolveError::NotFound(prefix)),
            [id] => Ok((*id).clone()),
            many => Err(ResolveError::Ambiguous {
                count: many.len(),
                prefix,
            }),
        }
    }

    /// The most recent store failure, if not yet cleared
    pub fn last_error(&self) -> Option<&StoreError> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Status text: the last error, or how many items are left
    pub fn status_line(&self) -> String {
        if let Some(err) = &self.last_error {
            return err.to_string();
        }
        match self.remaining() {
            1 => "1 item left".to_string(),
            n => format!("{} items left", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milk() -> Item {
        Item::new("buy milk")
    }

    #[test]
    fn test_fold_add_change_remove() {
        let id = Id::random();
        let events = vec![
            Event::added(id.clone(), milk()),
            Event::changed(id.clone(), milk().with_done(true)),
            Event::removed(id.clone()),
        ];

        let mut partial = TodoList::new();
        partial.apply_all(&events[..2]);
        assert_eq!(partial.len(), 1);
        assert_eq!(partial.get(&id), Some(&milk().with_done(true)));

        let mut full = TodoList::new();
        full.apply_all(&events);
        assert!(full.is_empty());
        assert_eq!(full.iter().count(), 0);
    }

    #[test]
    fn test_unknown_ids_are_tolerated() {
        let mut list = TodoList::new();
        list.apply(&Event::changed(Id::random(), milk()));
        list.apply(&Event::removed(Id::random()));
        assert!(list.is_empty());
        assert!(list.last_error().is_none());
    }

    #[test]
    fn test_insertion_order_and_filters() {
        let mut list = TodoList::new();
        let ids: Vec<Id> = (0..4).map(|_| Id::random()).collect();
        for (i, id) in ids.iter().enumerate() {
            list.apply(&Event::added(id.clone(), Item::new(format!("item {}", i))));
        }
        list.apply(&Event::changed(ids[1].clone(), Item::new("item 1").with_done(true)));
        list.apply(&Event::changed(ids[3].clone(), Item::new("item 3").with_done(true)));
        list.apply(&Event::removed(ids[0].clone()));

        let all: Vec<&str> = list
            .filtered(Filter::All)
            .iter()
            .map(|(_, item)| item.text.as_str())
            .collect();
        assert_eq!(all, vec!["item 1", "item 2", "item 3"]);

        let active: Vec<&Id> = list.filtered(Filter::Active).into_iter().map(|(id, _)| id).collect();
        assert_eq!(active, vec![&ids[2]]);

        assert_eq!(list.done_count(), 2);
        assert_eq!(list.remaining(), 1);
        assert_eq!(list.done_ids(), vec![ids[1].clone(), ids[3].clone()]);
    }

    #[test]
    fn test_status_line() {
        let mut list = TodoList::new();
        assert_eq!(list.status_line(), "0 items left");

        let id = Id::random();
        list.apply(&Event::added(id.clone(), milk()));
        assert_eq!(list.status_line(), "1 item left");

        list.apply(&Event::added(Id::random(), Item::new("bread")));
        assert_eq!(list.status_line(), "2 items left");

        list.apply(&Event::io_error(StoreError::Closed));
        assert_eq!(list.status_line(), "Event log is closed");
        assert_eq!(list.len(), 2, "errors do not touch items");

        list.clear_error();
        assert_eq!(list.status_line(), "2 items left");
    }

    #[test]
    fn test_resolve_prefix() {
        let mut list = TodoList::new();
        let a = Id::from("aaaa1111000000000000000000000000");
        let b = Id::from("aaaa2222000000000000000000000000");
        list.apply(&Event::added(a.clone(), milk()));
        list.apply(&Event::added(b.clone(), milk()));

        assert_eq!(list.resolve("aaaa1"), Ok(a.clone()));
        assert_eq!(list.resolve("AAAA2"), Ok(b));
        assert_eq!(list.resolve(a.as_str()), Ok(a.clone()));
        assert_eq!(list.resolve("aaaa1111-0000-0000-0000-000000000000"), Ok(a));
        assert_eq!(
            list.resolve("aaaa"),
            Err(ResolveError::Ambiguous {
                prefix: "aaaa".to_string(),
                count: 2
            })
        );
        assert!(matches!(list.resolve("ffff"), Err(ResolveError::NotFound(_))));
        assert!(matches!(list.resolve(""), Err(ResolveError::NotFound(_))));
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("all".parse::<Filter>(), Ok(Filter::All));
        assert_eq!("Active".parse::<Filter>(), Ok(Filter::Active));
        assert_eq!("done".parse::<Filter>(), Ok(Filter::Completed));
        assert!("everything".parse::<Filter>().is_err());
        assert_eq!(Filter::Completed.to_string(), "completed");
    }
}
