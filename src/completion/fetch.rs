use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, error};

use crate::error::FetchError;
use crate::model::token::Token;
use crate::model::translation::TranslationEntry;
use crate::services::provider::{fetch_translations, TranslationProvider};

#[derive(Debug, Default, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A finished lookup, tagged with the generation that requested it.
#[derive(Debug, Clone)]
pub struct FetchCompletion {
    pub generation: u64,
    pub token: Token,
    pub outcome: Result<Vec<TranslationEntry>, FetchError>,
}

struct InFlight {
    generation: u64,
    cancel: CancellationToken,
}

struct Job {
    generation: u64,
    token: Token,
    cancel: CancellationToken,
}

/// Runs lookups on one background thread, one request at a time.
///
/// Every [`submit`](Self::submit) supersedes the previous request: a job
/// still waiting in the slot is dropped before it reaches the provider, a
/// running one is cancelled and whatever it produces is discarded. Only the
/// latest trigger's result is ever handed back.
pub struct FetchWorker {
    generation: u64,
    in_flight: Option<InFlight>,
    // `None` when the worker thread could not be started.
    jobs: Option<Sender<Job>>,
    queued: Receiver<Job>,
    done_tx: Sender<FetchCompletion>,
    done_rx: Receiver<FetchCompletion>,
}

impl FetchWorker {
    pub fn new(provider: Arc<dyn TranslationProvider>) -> Self {
        let (jobs, queued) = crossbeam_channel::bounded(1);
        let (done_tx, done_rx) = crossbeam_channel::unbounded();

        let worker_jobs = queued.clone();
        let worker_done = done_tx.clone();
        let spawned = thread::Builder::new()
            .name("translate-fetch".into())
            .spawn(move || run_jobs(provider, worker_jobs, worker_done));

        let jobs = match spawned {
            Ok(_) => Some(jobs),
            Err(e) => {
                error!(error = %e, "failed to spawn fetch thread");
                None
            }
        };

        Self {
            generation: 0,
            in_flight: None,
            jobs,
            queued,
            done_tx,
            done_rx,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Queues a lookup for `token` and returns its generation.
    pub fn submit(&mut self, token: Token) -> u64 {
        self.cancel_in_flight();

        while let Ok(stale) = self.queued.try_recv() {
            debug!(generation = stale.generation, "dropping queued fetch");
        }

        self.generation += 1;
        let generation = self.generation;
        let cancel = CancellationToken::default();
        self.in_flight = Some(InFlight {
            generation,
            cancel: cancel.clone(),
        });

        let job = Job {
            generation,
            token: token.clone(),
            cancel,
        };
        let sent = match &self.jobs {
            Some(jobs) => jobs.try_send(job).map_err(|e| e.to_string()),
            None => Err("fetch thread is not running".to_string()),
        };

        if let Err(reason) = sent {
            error!(generation, %reason, "could not queue fetch");
            // The receiver lives in `self`.
            let _ = self.done_tx.send(FetchCompletion {
                generation,
                token,
                outcome: Err(FetchError::Unknown(format!("failed to queue fetch: {reason}"))),
            });
        }

        generation
    }

    /// Cancels the outstanding request, if any.
    pub fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!(generation = in_flight.generation, "cancelling in-flight fetch");
            in_flight.cancel.cancel();
        }
    }

    fn accept(&mut self, completion: FetchCompletion) -> Option<FetchCompletion> {
        match &self.in_flight {
            Some(current) if current.generation == completion.generation => {
                self.in_flight = None;
                Some(completion)
            }
            _ => {
                debug!(generation = completion.generation, "discarding stale fetch");
                None
            }
        }
    }

    /// Returns the current request's result if it has already arrived.
    pub fn try_recv(&mut self) -> Option<FetchCompletion> {
        while let Ok(completion) = self.done_rx.try_recv() {
            if let Some(accepted) = self.accept(completion) {
                return Some(accepted);
            }
        }
        None
    }

    /// Blocks up to `timeout` for the current request's result.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<FetchCompletion> {
        let deadline = Instant::now() + timeout;

        loop {
            if self.in_flight.is_none() {
                return None;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.done_rx.recv_timeout(remaining) {
                Ok(completion) => {
                    if let Some(accepted) = self.accept(completion) {
                        return Some(accepted);
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

impl Drop for FetchWorker {
    fn drop(&mut self) {
        // Dropping `jobs` afterwards ends the thread once its current job is done.
        self.cancel_in_flight();
    }
}

fn run_jobs(
    provider: Arc<dyn TranslationProvider>,
    jobs: Receiver<Job>,
    done: Sender<FetchCompletion>,
) {
    for job in jobs.iter() {
        if job.cancel.is_cancelled() {
            continue;
        }

        let outcome = fetch_translations(&*provider, &job.token.text);

        if job.cancel.is_cancelled() {
            debug!(generation = job.generation, "dropping superseded translation");
            continue;
        }

        let completion = FetchCompletion {
            generation: job.generation,
            token: job.token,
            outcome,
        };
        if done.send(completion).is_err() {
            break;
        }
    }
    debug!("fetch thread stopped");
}
