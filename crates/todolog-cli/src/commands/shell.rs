//! Interactive shell
//!
//! A line-mode front end driven like a UI frame loop: each tick (or store
//! wake-up) drains the store's output events, folds them into the list and
//! redraws when something changed. Commands typed at the prompt only submit
//! intents; their effect shows up once the store reports it.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use todolog_core::{Config, Filter, Id, Item, Store, StoreOptions, TodoList};

use crate::output::item_line;

const TICK: Duration = Duration::from_millis(250);

const HELP: &str = "\
Commands:
  add <text>     add an item
  done <n>       mark item n done
  undo <n>       mark item n not done
  rm <n>         remove item n
  clear          remove all completed items
  filter <f>     show all, active or completed items
  list           redraw the list
  sync           flush the log to disk
  help           show this help
  quit           leave the shell";

/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Add(String),
    Done(usize),
    Undo(usize),
    Remove(usize),
    Clear,
    Filter(Filter),
    List,
    Sync,
    Help,
    Quit,
}

/// Parse one input line; blank lines yield `None`
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let index = || -> Result<usize, String> {
        match rest.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(format!("{} expects an item number", word)),
        }
    };

    let command = match word {
        "add" | "a" => {
            if rest.is_empty() {
                return Err("add expects some text".to_string());
            }
            ShellCommand::Add(rest.to_string())
        }
        "done" | "d" => ShellCommand::Done(index()?),
        "undo" | "u" => ShellCommand::Undo(index()?),
        "rm" | "delete" => ShellCommand::Remove(index()?),
        "clear" => ShellCommand::Clear,
        "filter" | "f" => ShellCommand::Filter(rest.parse()?),
        "list" | "ls" => ShellCommand::List,
        "sync" => ShellCommand::Sync,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{}', try help", other)),
    };
    Ok(Some(command))
}

/// Shell view state
struct Shell {
    todos: TodoList,
    filter: Filter,
    /// IDs in display order, for resolving item numbers
    shown: Vec<Id>,
}

impl Shell {
    fn new() -> Self {
        Self {
            todos: TodoList::new(),
            filter: Filter::All,
            shown: Vec::new(),
        }
    }

    /// Fold pending store events; true if anything arrived
    fn refresh(&mut self, store: &mut Store) -> bool {
        let events = store.events();
        if events.is_empty() {
            return false;
        }
        debug!(count = events.len(), "applying store events");
        self.todos.apply_all(&events);
        true
    }

    fn render(&mut self) {
        let visible = self.todos.filtered(self.filter);
        self.shown = visible.iter().map(|(id, _)| (*id).clone()).collect();

        println!();
        if visible.is_empty() {
            println!("  (no {} items)", self.filter);
        }
        for (n, (id, item)) in visible.iter().enumerate() {
            println!("{:>3}. {}", n + 1, item_line(id, item));
        }
        println!("-- {} [{}]", self.todos.status_line(), self.filter);
    }

    fn nth(&self, n: usize) -> Option<Id> {
        n.checked_sub(1).and_then(|i| self.shown.get(i)).cloned()
    }

    async fn set_done(&self, n: usize, done: bool, store: &Store) {
        let Some(id) = self.nth(n) else {
            println!("no item {}", n);
            return;
        };
        if let Some(item) = self.todos.get(&id) {
            store.update_item(id, item.with_done(done)).await;
        }
    }

    async fn execute(&mut self, command: ShellCommand, store: &Store) {
        match command {
            ShellCommand::Add(text) => {
                store.add_item(Item::new(text)).await;
            }
            ShellCommand::Done(n) => self.set_done(n, true, store).await,
            ShellCommand::Undo(n) => self.set_done(n, false, store).await,
            ShellCommand::Remove(n) => match self.nth(n) {
                Some(id) => store.remove_item(id).await,
                None => println!("no item {}", n),
            },
            ShellCommand::Clear => {
                for id in self.todos.done_ids() {
                    store.remove_item(id).await;
                }
            }
            ShellCommand::Filter(filter) => {
                self.filter = filter;
                self.render();
            }
            ShellCommand::List => {
                self.todos.clear_error();
                self.render();
            }
            ShellCommand::Sync => {
                store.persist();
                println!("flush requested");
            }
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => {}
        }
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Run the shell until `quit` or end of input
pub async fn run(config: &Config) -> Result<()> {
    let wake = Arc::new(Notify::new());
    let waker = Arc::clone(&wake);
    let options = StoreOptions::new(&config.data_dir)
        .with_input_capacity(config.input_capacity)
        .with_waker(move || waker.notify_one());
    let mut store = Store::with_options(options);

    let mut shell = Shell::new();
    store.replayed().await;
    shell.refresh(&mut store);
    shell.render();
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(TICK);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = wake.notified() => {}
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(ShellCommand::Quit)) => break,
                    Ok(Some(command)) => shell.execute(command, &store).await,
                    Ok(None) => {}
                    Err(msg) => println!("{}", msg),
                }
                prompt();
            }
        }

        if shell.refresh(&mut store) {
            shell.render();
            prompt();
        }
    }

    store.persist();
    store.close().await;
    if shell.refresh(&mut store) {
        shell.render();
    }
    Ok(())
}
