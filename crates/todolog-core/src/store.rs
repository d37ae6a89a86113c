//! Event-sourced item store
//!
//! The `Store` is the single authority over the on-disk event log. All
//! mutation intents travel through one bounded channel to a single control
//! loop task, which appends them to the log in arrival order and forwards
//! the resulting events (or an `IoError` in their place) to the output
//! queue.
//!
//! ## Data flow
//!
//! ```text
//! add_item / remove_item / update_item
//!        │  bounded mpsc (256)
//!        ▼
//!   control loop ──► events.json (append)
//!        │
//!        ▼  unbounded mpsc
//!   events() / recv()  ──► caller folds into TodoList
//! ```
//!
//! On start the loop opens the log and replays it, so historical events are
//! queued before the result of any mutation. I/O failures never surface as
//! a `Result`; they arrive as [`Event::IoError`].
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open(data_dir);
//! let id = store.add_item(Item::new("buy milk")).await;
//!
//! // once per tick
//! for event in store.events() {
//!     todos.apply(&event);
//! }
//!
//! store.close().await;
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::Config;
use crate::event::Event;
use crate::models::{Id, Item};
use crate::storage::{EventLog, StoreError, EVENTS_FILE};

/// Default capacity of the input channel
pub const DEFAULT_INPUT_CAPACITY: usize = 256;

/// Callback run after each output event is queued
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Options for opening a store
#[derive(Clone)]
pub struct StoreOptions {
    /// Directory holding `events.json`
    pub data_dir: PathBuf,
    /// Capacity of the bounded input channel
    pub input_capacity: usize,
    /// Optional hook to wake the consumer (e.g. request a redraw)
    pub waker: Option<Waker>,
}

impl StoreOptions {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            input_capacity: DEFAULT_INPUT_CAPACITY,
            waker: None,
        }
    }

    pub fn with_input_capacity(mut self, capacity: usize) -> Self {
        self.input_capacity = capacity.max(1);
        self
    }

    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        self.waker = Some(Arc::new(waker));
        self
    }
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOptions")
            .field("data_dir", &self.data_dir)
            .field("input_capacity", &self.input_capacity)
            .field("waker", &self.waker.is_some())
            .finish()
    }
}

/// Handle to the store and its control loop
pub struct Store {
    data_file: PathBuf,
    input_tx: mpsc::Sender<Event>,
    flush: Arc<Notify>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    ready_rx: watch::Receiver<bool>,
    output_rx: mpsc::UnboundedReceiver<Event>,
    task: Option<JoinHandle<()>>,
}

impl Store {
    /// Open the store in `data_dir`
    ///
    /// Nothing is created on disk by this call; the control loop does that
    /// in the background and reports failures as `IoError` events. Must be
    /// called from within a tokio runtime.
    pub fn open(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_options(StoreOptions::new(data_dir))
    }

    /// Open the store described by a configuration
    pub fn open_with_config(config: &Config) -> Self {
        Self::with_options(
            StoreOptions::new(&config.data_dir).with_input_capacity(config.input_capacity),
        )
    }

    /// Open the store with explicit options
    pub fn with_options(options: StoreOptions) -> Self {
        let log = EventLog::new(&options.data_dir);
        Self::start(options, log)
    }

    fn start(options: StoreOptions, log: EventLog) -> Self {
        let (input_tx, input_rx) = mpsc::channel(options.input_capacity.max(1));
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (ready_tx, ready_rx) = watch::channel(false);
        let flush = Arc::new(Notify::new());

        let data_file = options.data_dir.join(EVENTS_FILE);
        let control = ControlLoop {
            log,
            input_rx,
            flush: Arc::clone(&flush),
            shutdown_rx: shutdown_rx.clone(),
            ready_tx,
            output: Output {
                tx: output_tx,
                waker: options.waker,
            },
        };
        let task = tokio::spawn(control.run());

        Self {
            data_file,
            input_tx,
            flush,
            shutdown_tx,
            shutdown_rx,
            ready_rx,
            output_rx,
            task: Some(task),
        }
    }

    /// Path of the log file
    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// Add a new item under a fresh random ID
    pub async fn add_item(&self, item: Item) -> Id {
        let id = Id::random();
        self.submit(Event::added(id.clone(), item)).await;
        id
    }

    /// Remove an item
    pub async fn remove_item(&self, id: Id) {
        self.submit(Event::removed(id)).await;
    }

    /// Replace an item's content
    pub async fn update_item(&self, id: Id, item: Item) {
        self.submit(Event::changed(id, item)).await;
    }

    /// Ask the control loop to sync the log to disk
    ///
    /// Requests made while one is still pending are merged into it.
    pub fn persist(&self) {
        self.flush.notify_one();
    }

    /// Drain every output event queued so far, without waiting
    pub fn events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.output_rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Wait for the next output event
    ///
    /// Returns `None` once the control loop has exited and every event has
    /// been received.
    pub async fn recv(&mut self) -> Option<Event> {
        self.output_rx.recv().await
    }

    /// Wait until the initial open-and-replay attempt has finished
    ///
    /// Afterwards all historical events (or the failure to read them) are
    /// already in the output queue.
    pub async fn replayed(&self) {
        let mut ready = self.ready_rx.clone();
        // An error means the loop is gone, which also ends replay.
        let _ = ready.wait_for(|done| *done).await;
    }

    /// Shut down the control loop and wait for it to finish
    ///
    /// Intents already accepted are written (or reported) first, then the
    /// file is closed. Calling `close` again does nothing. Output events
    /// remain available through `events()` afterwards.
    pub async fn close(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        self.shutdown_tx.send_replace(true);
        if let Err(e) = task.await {
            warn!(error = %e, "store control loop ended abnormally");
        }
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.task.is_none()
    }

    async fn submit(&self, event: Event) {
        let mut shutdown = self.shutdown_rx.clone();
        if *shutdown.borrow_and_update() {
            debug!(kind = event.type_tag(), "store is shutting down, dropping event");
            return;
        }
        tokio::select! {
            result = self.input_tx.send(event) => {
                if let Err(mpsc::error::SendError(event)) = result {
                    debug!(kind = event.type_tag(), "store is closed, dropping event");
                }
            }
            _ = shutdown.changed() => {
                debug!("store shut down while waiting to submit, dropping event");
            }
        }
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        // The loop still drains and closes the file on its own.
        if self.task.is_some() {
            self.shutdown_tx.send_replace(true);
        }
    }
}

/// Output side of the control loop
struct Output {
    tx: mpsc::UnboundedSender<Event>,
    waker: Option<Waker>,
}

impl Output {
    fn emit(&self, event: Event) {
        if self.tx.send(event).is_err() {
            // Receiver dropped along with the Store; nobody is listening.
            return;
        }
        if let Some(waker) = &self.waker {
            (waker.as_ref())();
        }
    }
}

struct ControlLoop {
    log: EventLog,
    input_rx: mpsc::Receiver<Event>,
    flush: Arc<Notify>,
    shutdown_rx: watch::Receiver<bool>,
    ready_tx: watch::Sender<bool>,
    output: Output,
}

impl ControlLoop {
    async fn run(mut self) {
        let output = &self.output;
        let mut emit = |event: Event| output.emit(event);

        if let Err(e) = self.log.ensure_open(&mut emit).await {
            report(e, &mut emit);
        }
        self.ready_tx.send_replace(true);

        loop {
            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }
                Some(event) = self.input_rx.recv() => {
                    Self::apply(&mut self.log, event, &mut emit).await;
                }
                _ = self.flush.notified() => {
                    Self::sync(&mut self.log, &mut emit).await;
                }
            }
        }

        // Refuse new intents, then finish the ones already accepted.
        self.input_rx.close();
        while let Some(event) = self.input_rx.recv().await {
            Self::apply(&mut self.log, event, &mut emit).await;
        }

        // A persist requested before close still gets its sync.
        let pending_flush = tokio::select! {
            biased;
            _ = self.flush.notified() => true,
            _ = std::future::ready(()) => false,
        };
        if pending_flush {
            Self::sync(&mut self.log, &mut emit).await;
        }
        self.log.close().await;
    }

    async fn apply(log: &mut EventLog, event: Event, emit: &mut impl FnMut(Event)) {
        match log.append(&event, emit).await {
            Ok(()) => emit(event),
            Err(e) => report(e, emit),
        }
    }

    async fn sync(log: &mut EventLog, emit: &mut impl FnMut(Event)) {
        if let Err(e) = log.sync(emit).await {
            report(e, emit);
        }
    }
}

/// Log a failure and forward it in place of the event it replaces
fn report(error: StoreError, emit: &mut impl FnMut(Event)) {
    warn!(error = %error, "store I/O error");
    emit(Event::io_error(error));
}
