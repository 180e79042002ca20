//! Staged, single-flight batch state around [`crate::convert::run_batch`].
//!
//! A [`Batch`] models the lifecycle of one conversion widget: files are
//! staged, a conversion runs over the staged set, and the batch returns
//! to [`Idle`](BatchStateKind::Idle) whether the run succeeded or failed.
//! At most one conversion is in flight at a time; concurrent attempts get
//! [`ConvertError::BatchBusy`].

use crate::config::ConvertConfig;
use crate::convert;
use crate::error::ConvertError;
use crate::input::SourceFile;
use crate::mode::ConversionMode;
use crate::output::BatchOutput;
use crate::report::UsageReporter;
use crate::validate;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStateKind {
    /// No files staged.
    Idle,
    /// Files staged and ready to convert.
    Staged,
    /// A conversion is in flight.
    Converting,
}

enum BatchState {
    Idle,
    Staged(Vec<SourceFile>),
    Converting,
}

/// One conversion widget: a fixed mode, staged inputs, single-flight runs.
pub struct Batch {
    mode: ConversionMode,
    config: ConvertConfig,
    reporter: Option<Arc<UsageReporter>>,
    state: Mutex<BatchState>,
}

impl Batch {
    /// Create an idle batch for `mode`.
    ///
    /// When `config.report_url` is set, a [`UsageReporter`] is attached:
    /// the session visit fires on the first staging and a mode counter
    /// fires after each successful conversion.
    pub fn new(mode: ConversionMode, config: ConvertConfig) -> Self {
        let reporter = config
            .report_url
            .as_ref()
            .map(|url| Arc::new(UsageReporter::new(url.clone())));
        Self {
            mode,
            config,
            reporter,
            state: Mutex::new(BatchState::Idle),
        }
    }

    pub fn mode(&self) -> ConversionMode {
        self.mode
    }

    pub fn state(&self) -> BatchStateKind {
        match *self.lock_state() {
            BatchState::Idle => BatchStateKind::Idle,
            BatchState::Staged(_) => BatchStateKind::Staged,
            BatchState::Converting => BatchStateKind::Converting,
        }
    }

    /// Number of staged files, zero outside [`BatchStateKind::Staged`].
    pub fn staged_len(&self) -> usize {
        match *self.lock_state() {
            BatchState::Staged(ref files) => files.len(),
            _ => 0,
        }
    }

    /// Names of the staged files, in selection order. Empty outside
    /// [`BatchStateKind::Staged`].
    pub fn staged_files(&self) -> Vec<String> {
        match *self.lock_state() {
            BatchState::Staged(ref files) => files.iter().map(|f| f.name.clone()).collect(),
            _ => Vec::new(),
        }
    }

    /// Validate and stage `files`, replacing any previously staged set.
    ///
    /// A rejected selection also clears whatever was staged before: the
    /// user acted on the old set, so keeping it around would convert
    /// files they no longer mean to convert. Staging during an in-flight
    /// conversion is [`ConvertError::BatchBusy`].
    pub async fn stage(&self, files: Vec<SourceFile>) -> Result<(), ConvertError> {
        // Refuse up front: an in-flight conversion must not see visit
        // reports or staging progress from a drop it will never accept.
        if matches!(*self.lock_state(), BatchState::Converting) {
            return Err(ConvertError::BatchBusy);
        }

        if let Err(e) = validate::validate(&files, self.mode) {
            let mut state = self.lock_state();
            if !matches!(*state, BatchState::Converting) {
                *state = BatchState::Idle;
            }
            return Err(e);
        }

        if let Some(ref reporter) = self.reporter {
            reporter.spawn_visit();
        }

        // Staging progress is deterministic pacing, not measurement: the
        // inputs are already in memory.
        let ticks = self.config.stage_ticks.max(1);
        for tick in 1..=ticks {
            if self.config.stage_tick_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.stage_tick_ms)).await;
            }
            if let Some(ref cb) = self.config.progress {
                cb.on_stage_progress(((tick * 100) / ticks) as u8);
            }
        }

        let mut state = self.lock_state();
        if matches!(*state, BatchState::Converting) {
            return Err(ConvertError::BatchBusy);
        }
        debug!("Staged {} file(s) for {}", files.len(), self.mode);
        *state = BatchState::Staged(files);
        Ok(())
    }

    /// Run the conversion over the staged files.
    ///
    /// The staged set is consumed. Whatever the outcome, the batch is
    /// [`Idle`](BatchStateKind::Idle) when this returns; a fatal error
    /// (corrupt PDF included) does not leave files behind to re-run.
    pub async fn convert(&self) -> Result<BatchOutput, ConvertError> {
        let files = {
            let mut state = self.lock_state();
            match std::mem::replace(&mut *state, BatchState::Converting) {
                BatchState::Staged(files) => files,
                BatchState::Idle => {
                    *state = BatchState::Idle;
                    return Err(ConvertError::NotStaged);
                }
                BatchState::Converting => {
                    return Err(ConvertError::BatchBusy);
                }
            }
        };

        let result = convert::run_batch(files, self.mode, &self.config).await;

        *self.lock_state() = BatchState::Idle;

        if result.is_ok() {
            if let Some(ref reporter) = self.reporter {
                reporter.spawn_use(self.mode);
            }
        }
        info!("Batch returned to idle");
        result
    }

    /// Discard staged files. No-op when idle; busy while converting.
    pub fn reset(&self) -> Result<(), ConvertError> {
        let mut state = self.lock_state();
        match *state {
            BatchState::Converting => Err(ConvertError::BatchBusy),
            _ => {
                *state = BatchState::Idle;
                Ok(())
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, BatchState> {
        // The lock is only held for state swaps, never across await
        // points, so poisoning can only follow a panic mid-swap.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
