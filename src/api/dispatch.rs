//! Runs backend requests off the UI thread.
//!
//! Each submitted request gets its own worker thread; completions come back
//! over a channel and are drained by the event loop. Nothing is cancelled,
//! so when two requests touch the same record the one that finishes last
//! decides the final state.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::api::{Backend, Request, Response};
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

#[derive(Debug)]
pub struct Completion {
    pub id: RequestId,
    pub request: Request,
    pub result: Result<Response, ApiError>,
}

pub struct Dispatcher {
    backend: Arc<dyn Backend>,
    next_id: u64,
    in_flight: usize,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            backend,
            next_id: 1,
            in_flight: 0,
            tx,
            rx,
        }
    }

    pub fn submit(&mut self, request: Request) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        self.in_flight += 1;
        debug!(id = id.0, request = %request.describe(), "submit");

        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = request.execute(backend.as_ref());
            if let Err(err) = &result {
                warn!(id = id.0, request = %request.describe(), error = %err, "request failed");
            }
            // The receiver only goes away on shutdown.
            let _ = tx.send(Completion {
                id,
                request,
                result,
            });
        });
        id
    }

    /// Collect every completion that has arrived, without blocking.
    pub fn drain(&mut self) -> Vec<Completion> {
        let mut done = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            done.push(completion);
        }
        self.in_flight = self.in_flight.saturating_sub(done.len());
        done
    }

    /// Block up to `timeout` for the next completion.
    pub fn wait(&mut self, timeout: Duration) -> Option<Completion> {
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(completion)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}
