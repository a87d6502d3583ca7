//! Dedicated OCR thread.
//!
//! Recognition engines keep per-thread plan caches and cannot be shared
//! between threads, so one worker thread builds its engine and owns it for
//! its whole life. Callers hand it page images over a channel. One job runs
//! at a time; the timeout covers only the caller's own job, never time spent
//! waiting behind another caller. A worker that misses its deadline is
//! abandoned and a fresh one is built for the next job.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::OcrError;

/// Text recognition over one image. Built and used on the worker thread
/// only.
pub trait ImageRecognizer {
    fn extract_text(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

type Factory = dyn Fn() -> Result<Box<dyn ImageRecognizer>, OcrError> + Send + Sync;

struct Job {
    images: Vec<DynamicImage>,
    reply: mpsc::Sender<Result<String, OcrError>>,
}

/// Handle to the OCR thread.
pub struct OcrWorker {
    factory: Arc<Factory>,
    jobs: Mutex<Option<mpsc::Sender<Job>>>,
}

impl OcrWorker {
    /// Start the worker, building the engine on its thread. Fails when the
    /// engine cannot be built.
    pub fn start<F>(factory: F) -> Result<Self, OcrError>
    where
        F: Fn() -> Result<Box<dyn ImageRecognizer>, OcrError> + Send + Sync + 'static,
    {
        let factory: Arc<Factory> = Arc::new(factory);
        let jobs = spawn(&factory)?;
        Ok(Self {
            factory,
            jobs: Mutex::new(Some(jobs)),
        })
    }

    /// Recognize every image and join the page texts.
    pub fn run(&self, images: Vec<DynamicImage>, timeout: Duration) -> Result<String, OcrError> {
        let mut slot = self
            .jobs
            .lock()
            .map_err(|_| OcrError::Recognition("OCR worker lock poisoned".to_string()))?;

        let jobs = match slot.take() {
            Some(jobs) => jobs,
            None => {
                info!("Restarting OCR worker");
                spawn(&self.factory)?
            }
        };

        let (reply, result) = mpsc::channel();
        if jobs.send(Job { images, reply }).is_err() {
            return Err(OcrError::Recognition("OCR worker exited".to_string()));
        }

        match result.recv_timeout(timeout) {
            Ok(text) => {
                *slot = Some(jobs);
                text
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // Dropping `jobs` lets the stuck thread exit once its job ends.
                warn!("OCR job exceeded {:?}; abandoning worker", timeout);
                Err(OcrError::Timeout(timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(OcrError::Recognition("OCR worker exited".to_string()))
            }
        }
    }
}

fn spawn(factory: &Arc<Factory>) -> Result<mpsc::Sender<Job>, OcrError> {
    let (ready_tx, ready_rx) = mpsc::channel();
    let (jobs_tx, jobs_rx) = mpsc::channel::<Job>();
    let factory = Arc::clone(factory);

    thread::Builder::new()
        .name("ocr-worker".to_string())
        .spawn(move || {
            let engine = match factory() {
                Ok(engine) => {
                    let _ = ready_tx.send(Ok(()));
                    engine
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            for job in jobs_rx {
                let start = Instant::now();
                let text = job
                    .images
                    .iter()
                    .map(|image| engine.extract_text(image))
                    .collect::<Result<Vec<_>, _>>()
                    .map(|pages| pages.join("\n\n"));
                debug!("OCR job: {} images in {:?}", job.images.len(), start.elapsed());
                // Caller may have timed out.
                let _ = job.reply.send(text);
            }
        })
        .map_err(|e| OcrError::ModelLoad(format!("cannot start OCR worker: {}", e)))?;

    ready_rx
        .recv()
        .map_err(|_| OcrError::ModelLoad("OCR worker exited during startup".to_string()))??;
    Ok(jobs_tx)
}
