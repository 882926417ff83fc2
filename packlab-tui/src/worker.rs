//! Background worker thread — compute runs here, off the UI thread.
//!
//! Communication with the TUI main thread is via `mpsc` channels. Requests
//! are handled in order; the UI applies whatever lands, newest ticket last.

use std::io;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use packlab_core::compute::{ComputeBoundary, ComputeResult};
use packlab_core::controls::FormValues;

/// Commands sent from the TUI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    Run { ticket: u64, inputs: FormValues },
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug, Clone)]
pub enum WorkerResponse {
    RunComplete {
        ticket: u64,
        result: Box<ComputeResult>,
    },
    RunError {
        ticket: u64,
        error: String,
    },
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    compute: Box<dyn ComputeBoundary + Send>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("packlab-worker".into())
        .spawn(move || worker_loop(rx, tx, compute))
}

fn worker_loop(
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    compute: Box<dyn ComputeBoundary + Send>,
) {
    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(WorkerCommand::Run { ticket, inputs }) => {
                let response = handle_run(ticket, &inputs, compute.as_ref());
                if tx.send(response).is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!("worker stopped");
}

fn handle_run(ticket: u64, inputs: &FormValues, compute: &dyn ComputeBoundary) -> WorkerResponse {
    tracing::debug!(ticket, fields = inputs.len(), "compute started");
    match compute.compute(inputs) {
        Ok(result) => WorkerResponse::RunComplete {
            ticket,
            result: Box::new(result),
        },
        Err(e) => {
            tracing::warn!(ticket, error = %e, "compute failed");
            WorkerResponse::RunError {
                ticket,
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    use packlab_core::compute::ComputeError;
    use packlab_core::DemoCompute;

    #[test]
    fn worker_answers_in_order_then_stops() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = spawn_worker(cmd_rx, resp_tx, Box::new(DemoCompute::default())).unwrap();

        for ticket in 1..=2 {
            cmd_tx
                .send(WorkerCommand::Run {
                    ticket,
                    inputs: FormValues::new(),
                })
                .unwrap();
        }
        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();

        let tickets: Vec<u64> = resp_rx
            .try_iter()
            .map(|r| match r {
                WorkerResponse::RunComplete { ticket, result } => {
                    assert!(!result.equity.is_empty());
                    ticket
                }
                WorkerResponse::RunError { ticket, .. } => ticket,
            })
            .collect();
        assert_eq!(tickets, vec![1, 2]);
    }

    #[test]
    fn compute_errors_become_responses() {
        let failing = |_: &FormValues| -> Result<ComputeResult, ComputeError> {
            Err(ComputeError::Failed("boom".into()))
        };
        match handle_run(7, &FormValues::new(), &failing) {
            WorkerResponse::RunError { ticket, error } => {
                assert_eq!(ticket, 7);
                assert!(error.contains("boom"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }
}
