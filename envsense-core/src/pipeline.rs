//! Window Pipeline - the Orchestrating State Machine
//!
//! ## Overview
//!
//! [`WindowPipeline`] drives one scan window from open to close:
//!
//! ```text
//! Idle ──begin_window──▶ Scanning ──close_window──▶ Aggregating ─┐
//!   ▲                       │                                    │
//!   │                  ingest/drain                   every 5th window
//!   │                                                            ▼
//!   └───────────────────────────────◀──────────────────── Classifying
//! ```
//!
//! During `Scanning` the pipeline only accumulates - events arrive either
//! directly via [`ingest`](WindowPipeline::ingest) or by draining the
//! observation queue. [`close_window`](WindowPipeline::close_window) must
//! only be called after the scanning collaborator has acknowledged its
//! stop (no further callbacks); it reduces the window to a feature row,
//! shifts the row into the rolling sample buffer, resets the accumulators
//! (snapshot first), and on every
//! [`CLASSIFY_INTERVAL_WINDOWS`](crate::constants::CLASSIFY_INTERVAL_WINDOWS)-th
//! completed window hands the assembled sample to the classifier.
//!
//! Elapsed-tick marks are captured at scan end, aggregation end, and
//! classification end, all relative to the window start - these become the
//! timing columns of the persisted sample record.

use crate::{
    aggregator::WindowAggregator,
    constants::CLASSIFY_INTERVAL_WINDOWS,
    events::BeaconEvent,
    features::{FeatureBuffer, FeatureRow, FEATURE_ROWS},
    queue::EventQueue,
    record,
    time::{tick_delta, TickSource, Ticks},
    traits::{Classification, Classifier, RecordSink},
};

/// Lifecycle phase of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    /// Between windows.
    Idle,
    /// A window is open and accumulating events.
    Scanning,
    /// Reducing accumulators into the feature row.
    Aggregating,
    /// Handing the assembled sample to the classifier.
    Classifying,
}

/// Elapsed ticks of each window stage, relative to the window start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WindowTiming {
    /// Window start to scan stop.
    pub scan: u32,
    /// Window start to end of feature aggregation.
    pub aggregate: u32,
    /// Window start to end of classification; 0 when this window was not
    /// classified.
    pub classify: u32,
}

/// Everything produced by one window close.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct WindowReport {
    /// 1-based count of completed windows, this one included.
    pub window: u32,
    /// The feature row this window contributed.
    pub row: FeatureRow,
    /// Classification result, present on classified windows only.
    pub classification: Option<Classification>,
    /// Stage timing marks.
    pub timing: WindowTiming,
}

/// Orchestrator owning the per-window accumulators and the rolling sample
/// buffer.
pub struct WindowPipeline {
    aggregator: WindowAggregator,
    buffer: FeatureBuffer,
    completed: u32,
    phase: WindowPhase,
    window_start: Ticks,
    last_classification: Option<Classification>,
}

impl WindowPipeline {
    /// Create an idle pipeline with an all-zero sample buffer.
    pub const fn new() -> Self {
        Self {
            aggregator: WindowAggregator::new(),
            buffer: FeatureBuffer::new(),
            completed: 0,
            phase: WindowPhase::Idle,
            window_start: 0,
            last_classification: None,
        }
    }

    /// Open a scan window. The scanning collaborator may deliver events
    /// from here until the stop acknowledgment.
    pub fn begin_window<T: TickSource>(&mut self, ticks: &T) {
        debug_assert!(matches!(self.phase, WindowPhase::Idle));
        self.window_start = ticks.now();
        self.phase = WindowPhase::Scanning;
    }

    /// Accumulate one discovery event into the open window.
    pub fn ingest(&mut self, event: &BeaconEvent) {
        debug_assert!(matches!(self.phase, WindowPhase::Scanning));
        self.aggregator.ingest(event);
    }

    /// Drain and accumulate all currently queued events. Returns how many
    /// were consumed.
    pub fn drain<const N: usize>(&mut self, queue: &EventQueue<N>) -> usize {
        let mut consumed = 0;
        for event in queue.drain() {
            self.ingest(&event);
            consumed += 1;
        }
        consumed
    }

    /// Close the open window: reduce, shift the row into the buffer, reset
    /// the accumulators, and classify when the cadence says so.
    ///
    /// The scan must be fully stopped first - after this call the window's
    /// accumulators are gone.
    pub fn close_window<T, C>(&mut self, ticks: &T, classifier: &mut C) -> WindowReport
    where
        T: TickSource,
        C: Classifier,
    {
        debug_assert!(matches!(self.phase, WindowPhase::Scanning));
        let scan_end = ticks.now();

        self.phase = WindowPhase::Aggregating;
        let row = FeatureRow::from_window(&self.aggregator);
        self.buffer.shift_insert(&row);
        // Snapshot for the next diff happens inside reset, before clearing
        self.aggregator.reset();
        self.completed += 1;
        let aggregate_end = ticks.now();

        let mut timing = WindowTiming {
            scan: tick_delta(self.window_start, scan_end),
            aggregate: tick_delta(self.window_start, aggregate_end),
            classify: 0,
        };

        let classification = if self.completed >= FEATURE_ROWS as u32
            && self.completed % CLASSIFY_INTERVAL_WINDOWS == 0
        {
            self.phase = WindowPhase::Classifying;
            let outcome = classifier.classify(self.buffer.as_values());
            timing.classify = tick_delta(self.window_start, ticks.now());
            self.last_classification = Some(outcome);
            Some(outcome)
        } else {
            None
        };

        self.phase = WindowPhase::Idle;
        WindowReport {
            window: self.completed,
            row,
            classification,
            timing,
        }
    }

    /// Format and persist the labeled sample record for a closed window,
    /// plus the evaluation line when the window was classified.
    ///
    /// `label` is the ground-truth label chosen by the operator;
    /// `class_labels` maps the classifier's indices to label text. Records
    /// that would overflow their formatting buffer are skipped rather than
    /// truncated.
    pub fn persist<S: RecordSink>(
        &self,
        label: &str,
        class_labels: &[&str],
        report: &WindowReport,
        sink: &mut S,
    ) -> Result<(), S::Error> {
        if let Ok(text) = record::sample_record(label, &self.buffer, &report.timing) {
            sink.write_sample(text.as_str())?;
        }
        if let Some(classification) = report.classification {
            if let Some(predicted) = class_labels.get(classification.class_index) {
                if let Ok(text) = record::eval_record(predicted, &classification) {
                    sink.append_eval(text.as_str())?;
                }
            }
        }
        Ok(())
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> WindowPhase {
        self.phase
    }

    /// The rolling 5-window sample buffer.
    pub fn buffer(&self) -> &FeatureBuffer {
        &self.buffer
    }

    /// The per-window accumulators (current window while scanning).
    pub fn aggregator(&self) -> &WindowAggregator {
        &self.aggregator
    }

    /// Completed windows since startup.
    pub fn completed_windows(&self) -> u32 {
        self.completed
    }

    /// Whether the buffer holds a full 5-window history.
    pub fn is_warmed_up(&self) -> bool {
        self.completed >= FEATURE_ROWS as u32
    }

    /// Most recent classification, if any window has been classified.
    pub fn last_classification(&self) -> Option<Classification> {
        self.last_classification
    }
}

impl Default for WindowPipeline {
    fn default() -> Self {
        Self::new()
    }
}
