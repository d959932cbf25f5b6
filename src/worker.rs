//! Background transcription with cooperative cancellation
//!
//! A [`TranscriptionWorker`] runs each submitted buffer on its own thread. Submitting
//! again cancels the job in flight and supersedes it: only the most recent job ever
//! publishes a result, over a single-shot channel owned by its handle.
//!
//! # Example
//!
//! ```no_run
//! use stratum_transcribe::io::sample_buffer::AudioBuffer;
//! use stratum_transcribe::worker::TranscriptionWorker;
//! use stratum_transcribe::TranscriptionConfig;
//!
//! let mut worker = TranscriptionWorker::new(TranscriptionConfig::default());
//! let handle = worker.submit(AudioBuffer::mono(vec![0.0; 44100], 44100)?);
//! if let Some(Ok(result)) = handle.wait() {
//!     println!("{} notes in {}", result.notes.len(), result.key_label());
//! }
//! # Ok::<(), stratum_transcribe::AnalysisError>(())
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, TryRecvError};

use crate::analysis::result::TranscriptionResult;
use crate::config::TranscriptionConfig;
use crate::error::AnalysisError;
use crate::io::sample_buffer::AudioBuffer;

/// Shared stop flag checked between frames and tempo blocks
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this token to stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// True once [`CancelToken::cancel`] has been called on any clone
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Outcome delivered to a handle
pub type JobOutcome = Result<TranscriptionResult, AnalysisError>;

/// Runs transcriptions off the calling thread, latest request wins
#[derive(Debug)]
pub struct TranscriptionWorker {
    config: TranscriptionConfig,
    latest: Arc<AtomicU64>,
    in_flight: Option<CancelToken>,
}

impl TranscriptionWorker {
    /// Worker that analyzes every buffer with `config`
    pub fn new(config: TranscriptionConfig) -> Self {
        Self {
            config,
            latest: Arc::new(AtomicU64::new(0)),
            in_flight: None,
        }
    }

    /// Configuration used for new jobs
    pub fn config(&self) -> &TranscriptionConfig {
        &self.config
    }

    /// Replace the configuration used for jobs submitted from now on
    pub fn set_config(&mut self, config: TranscriptionConfig) {
        self.config = config;
    }

    /// Start transcribing `buffer`, cancelling and superseding the previous job
    pub fn submit(&mut self, buffer: AudioBuffer) -> TranscriptionHandle {
        if let Some(previous) = self.in_flight.take() {
            previous.cancel();
        }

        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        let cancel = CancelToken::new();
        self.in_flight = Some(cancel.clone());

        let (sender, receiver) = bounded(1);
        let config = self.config.clone();
        let latest = Arc::clone(&self.latest);
        let token = cancel.clone();

        log::debug!(
            "Submitting transcription job {} ({:.2}s of audio)",
            generation,
            buffer.duration_seconds()
        );

        thread::spawn(move || {
            let mono = buffer.to_mono();
            let outcome =
                crate::transcribe_with_cancel(&mono, buffer.sample_rate(), &config, &token);

            if matches!(outcome, Err(AnalysisError::Cancelled)) {
                log::debug!("Transcription job {} cancelled", generation);
                return;
            }
            if latest.load(Ordering::Acquire) != generation {
                log::debug!("Transcription job {} superseded, dropping result", generation);
                return;
            }
            // The handle may already be gone; nobody is waiting then.
            let _ = sender.send(outcome);
        });

        TranscriptionHandle {
            receiver,
            cancel,
            generation,
            latest: Arc::clone(&self.latest),
        }
    }

    /// Cancel the job in flight, if any
    pub fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}

impl Drop for TranscriptionWorker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Handle to one submitted job
#[derive(Debug)]
pub struct TranscriptionHandle {
    receiver: Receiver<JobOutcome>,
    cancel: CancelToken,
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl TranscriptionHandle {
    /// Ask the job to stop; `wait` will then return `None`
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once a newer job has been submitted to the same worker
    pub fn is_superseded(&self) -> bool {
        self.latest.load(Ordering::Acquire) != self.generation
    }

    /// Block until the job finishes
    ///
    /// Returns `None` if the job was cancelled or superseded.
    pub fn wait(self) -> Option<JobOutcome> {
        let outcome = self.receiver.recv().ok()?;
        self.publishable(outcome)
    }

    /// Non-blocking poll
    ///
    /// `Ok(None)` means the job is still running. `Err(())` means the job ended
    /// without publishing (cancelled or superseded).
    #[allow(clippy::result_unit_err)]
    pub fn try_result(&self) -> Result<Option<JobOutcome>, ()> {
        match self.receiver.try_recv() {
            Ok(outcome) => self.publishable(outcome).map(Some).ok_or(()),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(()),
        }
    }

    fn publishable(&self, outcome: JobOutcome) -> Option<JobOutcome> {
        if self.cancel.is_cancelled() || self.is_superseded() {
            None
        } else {
            Some(outcome)
        }
    }
}
