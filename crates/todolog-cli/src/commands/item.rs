//! Item command handlers
//!
//! Every one-shot command runs the same session: open the store, wait for
//! replay, fold history, submit at most a few mutations, then persist,
//! close and fold whatever came back.

use anyhow::{anyhow, bail, Context, Result};

use todolog_core::{Config, Event, Filter, Id, Item, Store, TodoList};

use crate::output::{Output, OutputFormat};

/// An open store plus the items folded from it so far
pub struct Session {
    pub store: Store,
    pub todos: TodoList,
}

impl Session {
    /// Open the store and fold its history
    ///
    /// A replay failure is reported as a warning; the items read before it
    /// are still usable.
    pub async fn open(config: &Config, output: &Output) -> Self {
        let mut store = Store::open_with_config(config);
        store.replayed().await;

        let mut todos = TodoList::new();
        todos.apply_all(&store.events());
        if let Some(err) = todos.last_error() {
            output.warning(&err.to_string());
            if let Some(hint) = err.recovery_suggestion() {
                output.warning(hint);
            }
        }
        todos.clear_error();

        Self { store, todos }
    }

    /// Resolve a user-supplied ID or prefix
    pub fn resolve(&self, id: &str) -> Result<Id> {
        Ok(self.todos.resolve(id)?)
    }

    /// Persist, close, and fold the remaining events
    ///
    /// Fails with the first I/O error reported after open.
    pub async fn finish(mut self) -> Result<TodoList> {
        self.store.persist();
        self.store.close().await;

        let events = self.store.events();
        self.todos.apply_all(&events);

        if let Some(Event::IoError(e)) = events.iter().find(|e| matches!(e, Event::IoError(_))) {
            let mut err = anyhow!("{}", e.error);
            if let Some(hint) = e.error.recovery_suggestion() {
                err = err.context(hint);
            }
            return Err(err).context("Failed to save changes");
        }
        Ok(self.todos)
    }
}

/// Join CLI words into item text, rejecting empty text
fn item_text(words: &[String]) -> Result<String> {
    let text = words.join(" ").trim().to_string();
    if text.is_empty() {
        bail!("Item text must not be empty");
    }
    Ok(text)
}

/// Add a new item
pub async fn add(config: &Config, words: Vec<String>, output: &Output) -> Result<()> {
    let item = Item::new(item_text(&words)?);

    let session = Session::open(config, output).await;
    let id = session.store.add_item(item.clone()).await;
    session.finish().await?;

    match output.format {
        OutputFormat::Human => output.success(&format!("Added {}", id.short())),
        _ => output.print_item(&id, &item),
    }
    Ok(())
}

/// List items
pub async fn list(config: &Config, filter: Filter, output: &Output) -> Result<()> {
    let session = Session::open(config, output).await;
    let todos = session.finish().await?;
    output.print_items(&todos.filtered(filter), &todos.status_line());
    Ok(())
}

/// Mark an item done or not done
pub async fn set_done(config: &Config, id: String, done: bool, output: &Output) -> Result<()> {
    let session = Session::open(config, output).await;
    let id = session.resolve(&id)?;
    let item = current(&session.todos, &id)?.with_done(done);

    session.store.update_item(id.clone(), item).await;
    session.finish().await?;

    let verb = if done { "Completed" } else { "Reopened" };
    output.success(&format!("{} {}", verb, id.short()));
    Ok(())
}

/// Replace an item's text
pub async fn edit(config: &Config, id: String, words: Vec<String>, output: &Output) -> Result<()> {
    let text = item_text(&words)?;

    let session = Session::open(config, output).await;
    let id = session.resolve(&id)?;
    let item = current(&session.todos, &id)?.with_text(text);

    session.store.update_item(id.clone(), item).await;
    session.finish().await?;

    output.success(&format!("Updated {}", id.short()));
    Ok(())
}

/// Remove an item
pub async fn remove(config: &Config, id: String, output: &Output) -> Result<()> {
    let session = Session::open(config, output).await;
    let id = session.resolve(&id)?;

    session.store.remove_item(id.clone()).await;
    session.finish().await?;

    output.success(&format!("Removed {}", id.short()));
    Ok(())
}

/// Remove every completed item
pub async fn clear(config: &Config, output: &Output) -> Result<()> {
    let session = Session::open(config, output).await;
    let done = session.todos.done_ids();

    for id in &done {
        session.store.remove_item(id.clone()).await;
    }
    session.finish().await?;

    output.success(&format!("Cleared {} completed item(s)", done.len()));
    Ok(())
}

fn current<'a>(todos: &'a TodoList, id: &Id) -> Result<&'a Item> {
    todos
        .get(id)
        .with_context(|| format!("Item {} not found", id.short()))
}
