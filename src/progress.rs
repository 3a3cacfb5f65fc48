/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines progress reporting messages, sinks, and helper functions for long-running solves.
//
// Created on: 21 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Progress reporting primitives for long-running solves.

use std::fmt::Debug;
use std::sync::{mpsc, Arc};
use std::thread;

/// Progress events emitted during long-running solves.
#[derive(Debug, Clone)]
pub enum ProgressMsg {
    /// Event indicating that the coarse stage finished its exact solve at
    /// the down-scaled lattice sizes.
    CoarseSolveFinished { sizes: Vec<usize> },

    /// Event indicating that a refinement tile finished solving.
    TileSolved { completed: usize, total: usize },

    /// Event indicating iteration status for an iterative solver.
    SolverIteration {
        iter: usize,
        residual: f64,
        progress: f64,
    },

    /// Arbitrary informational message.
    Message { message: String },
}

/// Sink that consumes progress messages.
pub trait ProgressSink: Send + Sync + Debug {
    fn emit(&self, msg: ProgressMsg);
}

/// Progress sink that forwards messages over a channel.
#[derive(Debug)]
pub struct ClosureSink {
    tx: mpsc::SyncSender<ProgressMsg>,
}

impl ProgressSink for ClosureSink {
    #[inline]
    fn emit(&self, msg: ProgressMsg) {
        let _ = self.tx.try_send(msg);
    }
}

/// Spawns a listener thread that runs a handler closure for each progress
/// message.
pub fn closure_sink<F>(
    buffer: usize,
    mut handler: F,
) -> (Arc<dyn ProgressSink>, thread::JoinHandle<()>)
where
    F: FnMut(ProgressMsg) + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel::<ProgressMsg>(buffer.max(1));
    let sink: Arc<dyn ProgressSink> = Arc::new(ClosureSink { tx });

    let handle = thread::spawn(move || {
        while let Ok(msg) = rx.recv() {
            handler(msg);
        }
    });

    (sink, handle)
}

/// Calculates the percentage progress of the solver based on the
/// current residual and the requested accuracy tolerance. Returns
/// the percentage as a value between [0, 1].
#[inline]
pub(crate) fn progress_from_rel(current_res: f64, start_res: f64, target_res: f64) -> f64 {
    if current_res <= target_res {
        1.0
    } else {
        (start_res.log10() - current_res.log10()) / (start_res.log10() - target_res.log10())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn progress_saturates_at_the_target_residual() {
        assert_eq!(progress_from_rel(1e-6, 1.0, 1e-3), 1.0);
        assert_eq!(progress_from_rel(1e-3, 1.0, 1e-3), 1.0);
    }

    #[test]
    fn progress_is_logarithmic_in_the_residual() {
        let halfway = progress_from_rel(1e-3, 1.0, 1e-6);
        assert!((halfway - 0.5).abs() < 1e-12);
    }

    #[test]
    fn closure_sink_delivers_messages_to_the_handler() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_in_handler = received.clone();
        let (sink, handle) = closure_sink(16, move |msg| {
            received_in_handler.lock().unwrap().push(msg);
        });

        sink.emit(ProgressMsg::Message {
            message: "tile pass".to_string(),
        });
        drop(sink);
        handle.join().unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert!(matches!(received[0], ProgressMsg::Message { .. }));
    }
}
