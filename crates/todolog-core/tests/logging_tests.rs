//! Store log output
//!
//! Capture what the store writes through `tracing` while it runs.

use std::io;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use todolog_core::storage::{encode_to_vec, EVENTS_FILE};
use todolog_core::{Event, Id, Item, Store};

/// Shared buffer the subscriber writes into
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Install a capturing subscriber for the current thread
fn capture() -> (Capture, tracing::subscriber::DefaultGuard) {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}

#[tokio::test]
async fn test_persist_then_close_flushes_data_file() {
    let temp_dir = TempDir::new().unwrap();
    let (capture, _guard) = capture();

    let mut store = Store::open(temp_dir.path());
    store.add_item(Item::new("a")).await;
    store.persist();
    store.close().await;

    let lines = capture.lines();
    let flushed = lines
        .iter()
        .position(|l| l.contains("data file flushed"))
        .expect("no flush logged");
    let closed = lines
        .iter()
        .position(|l| l.contains("data file closed"))
        .expect("no close logged");
    assert!(flushed < closed);
    assert!(lines[flushed].contains("ok=true"));
}

#[tokio::test]
async fn test_corruption_is_warned_once() {
    let temp_dir = TempDir::new().unwrap();
    let mut bytes = encode_to_vec(&Event::added(Id::random(), Item::new("a"))).unwrap();
    bytes.extend(encode_to_vec(&Event::added(Id::random(), Item::new("b"))).unwrap());
    bytes.extend_from_slice(b"#@!xj");
    std::fs::write(temp_dir.path().join(EVENTS_FILE), &bytes).unwrap();

    let (capture, _guard) = capture();
    let mut store = Store::open(temp_dir.path());
    store.replayed().await;
    store.close().await;
    assert_eq!(store.events().len(), 3);

    let warnings: Vec<String> = capture
        .lines()
        .into_iter()
        .filter(|l| l.contains("WARN"))
        .collect();
    assert_eq!(warnings.len(), 1, "warnings: {:?}", warnings);
    assert!(warnings[0].contains("decode error"));
}
