#![allow(dead_code)]

use bpool::Reset;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Installs a subscriber so `RUST_LOG=bpool=trace` shows pool events.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A pooled object that knows who it is and counts its resets.
#[derive(Debug)]
pub struct Probe {
    pub id: char,
    pub dirty: bool,
    pub resets: Arc<AtomicUsize>,
}

impl Probe {
    pub fn new(id: char) -> Self {
        Probe {
            id,
            dirty: false,
            resets: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl Reset for Probe {
    fn reset(&mut self) {
        self.dirty = false;
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}
