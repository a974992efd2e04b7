//! Background combine worker
//!
//! Every sprite owns one worker thread. Decoded image sets are submitted over
//! a channel and combined strictly in submission order, so two combines for
//! the same sprite never overlap. Each result is published with the
//! generation of the decode that produced it; exports wait for the
//! generation they were issued against.

use crate::config::PackMode;
use crate::error::ExportError;
use crate::spritesheet::{encode_png, render_spritesheet};
use crate::sync::lock;
use image::RgbaImage;
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// PNG-encoded sheet shared between the worker and every export waiting on it.
pub type EncodedSheet = Arc<Vec<u8>>;

/// One unit of combine work.
#[derive(Debug, Clone)]
pub struct Job {
    pub generation: u64,
    pub images: Arc<Vec<RgbaImage>>,
    pub mode: PackMode,
    pub padding: u32,
}

#[derive(Debug, Default)]
struct Published {
    generation: u64,
    outcome: Option<Result<EncodedSheet, ExportError>>,
    stopped: bool,
}

/// Latest combine outcome, guarded by its own lock.
#[derive(Debug, Default)]
pub struct CombineResults {
    state: Mutex<Published>,
    ready: Condvar,
}

impl CombineResults {
    pub(crate) fn publish(&self, generation: u64, outcome: Result<EncodedSheet, ExportError>) {
        let mut state = lock(&self.state);
        state.generation = generation;
        state.outcome = Some(outcome);
        self.ready.notify_all();
    }

    fn stop(&self) {
        lock(&self.state).stopped = true;
        self.ready.notify_all();
    }

    /// Block until the result for exactly `generation` is available.
    ///
    /// Only the newest result is kept, so once a later generation has been
    /// published the requested one is gone and [`ExportError::Superseded`]
    /// is returned.
    pub fn wait_for(&self, generation: u64) -> Result<EncodedSheet, ExportError> {
        let mut state = lock(&self.state);
        loop {
            if state.generation > generation {
                return Err(ExportError::Superseded { generation });
            }
            if state.generation == generation {
                if let Some(outcome) = &state.outcome {
                    return outcome.clone();
                }
            }
            if state.stopped {
                return Err(ExportError::WorkerStopped);
            }
            state = self.ready.wait(state).unwrap_or_else(std::sync::PoisonError::into_inner);
        }
    }

    /// Whether `generation` has been combined successfully.
    pub fn is_combined(&self, generation: u64) -> bool {
        let state = lock(&self.state);
        state.generation == generation && matches!(state.outcome, Some(Ok(_)))
    }
}

/// Marks the results as stopped when the worker exits, including by panic.
struct StopOnExit(Arc<CombineResults>);

impl Drop for StopOnExit {
    fn drop(&mut self) {
        self.0.stop();
    }
}

/// Handle to a sprite's combine worker.
#[derive(Debug)]
pub struct Combiner {
    jobs: Mutex<Option<Sender<Job>>>,
    results: Arc<CombineResults>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Combiner {
    /// Start the worker thread.
    pub fn spawn() -> Self {
        let (tx, rx) = channel::<Job>();
        let results = Arc::new(CombineResults::default());
        let worker_results = Arc::clone(&results);

        let worker = thread::Builder::new().name("sprite-combine".to_string()).spawn(move || {
            let _guard = StopOnExit(Arc::clone(&worker_results));
            for job in rx {
                let outcome = combine(&job);
                worker_results.publish(job.generation, outcome);
            }
        });

        let (jobs, worker) = match worker {
            Ok(handle) => (Some(tx), Some(handle)),
            Err(e) => {
                warn!("failed to start combine worker: {}", e);
                results.stop();
                (None, None)
            }
        };

        Self { jobs: Mutex::new(jobs), results, worker: Mutex::new(worker) }
    }

    /// Queue a job. Exports waiting on its generation observe
    /// [`ExportError::WorkerStopped`] if the worker is gone.
    pub fn submit(&self, job: Job) {
        let generation = job.generation;
        let sent = match lock(&self.jobs).as_ref() {
            Some(tx) => tx.send(job).is_ok(),
            None => false,
        };
        if !sent {
            warn!(generation, "combine worker is not running, job dropped");
        }
    }

    pub fn results(&self) -> Arc<CombineResults> {
        Arc::clone(&self.results)
    }

    /// Close the queue and wait for the worker to drain it.
    pub fn shutdown(&self) {
        lock(&self.jobs).take();
        if let Some(handle) = lock(&self.worker).take() {
            if handle.join().is_err() {
                warn!("combine worker panicked");
            }
        }
    }
}

impl Drop for Combiner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn combine(job: &Job) -> Result<EncodedSheet, ExportError> {
    let sheet = render_spritesheet(&job.images, job.mode, job.padding);
    debug!(
        generation = job.generation,
        width = sheet.width(),
        height = sheet.height(),
        "combining sprite"
    );
    let bytes = encode_png(&sheet).map_err(|e| ExportError::Combine(e.to_string()))?;
    debug!(generation = job.generation, bytes = bytes.len(), "combined sprite");
    Ok(Arc::new(bytes))
}
