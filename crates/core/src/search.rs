// Copyright 2025 MQ Throughput Contributors
// SPDX-License-Identifier: Apache-2.0

//! Two-phase search for the worker count with the highest throughput.
//!
//! # Algorithm
//!
//! 1. **Probing**: sample `W = 2^i` for `i = p, p+1, ...` (`p` is the starting
//!    power, `0` by default) while each probe strictly improves on the previous
//!    one. The first non-improving probe ends the phase and rolls `i` back to
//!    the last improving power.
//! 2. **Refining**: sample `2^i + 1, 2^i + 2, ...` up to (excluding) `2^(i+1)`
//!    while each sample strictly improves on the best so far.
//!
//! Equal rates never count as an improvement, so a flat curve settles on the
//! smaller worker count.
//!
//! # Limitations
//!
//! The search assumes throughput is unimodal in the worker count. On a curve
//! with several peaks it stops at the first local maximum it brackets. The
//! refinement window never extends past `2^(i+1) - 1`, so a peak just beyond
//! the next power of two can be missed.
//!
//! Samples run strictly one after another; the search never issues two
//! samples concurrently.

use crate::measurement::Results;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Source of throughput samples.
///
/// `sample` must return a result for every worker count it is asked for.
/// Returning `None` breaks the search contract and aborts the search.
#[cfg_attr(test, mockall::automock)]
pub trait Sampler {
    /// Measure throughput with `workers` concurrent workers.
    fn sample(&mut self, workers: usize) -> Option<Results>;
}

impl<F> Sampler for F
where
    F: FnMut(usize) -> Option<Results>,
{
    fn sample(&mut self, workers: usize) -> Option<Results> {
        self(workers)
    }
}

fn power_of_two(power: u32) -> Option<usize> {
    1usize.checked_shl(power)
}

/// Limits applied to the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBounds {
    starting_power: u32,
    max_workers: Option<usize>,
}

impl Default for SearchBounds {
    fn default() -> Self {
        Self {
            starting_power: 0,
            max_workers: None,
        }
    }
}

impl SearchBounds {
    /// Create bounds starting at `2^starting_power` workers and never
    /// sampling more than `max_workers`.
    pub fn new(starting_power: u32, max_workers: Option<usize>) -> Result<Self> {
        if max_workers == Some(0) {
            return Err(Error::invalid_input("max_workers must be at least 1"));
        }
        let first = power_of_two(starting_power).ok_or_else(|| {
            Error::invalid_input(format!(
                "starting power {} overflows the worker count",
                starting_power
            ))
        })?;
        if let Some(max) = max_workers {
            if first > max {
                return Err(Error::invalid_input(format!(
                    "first probe of {} workers exceeds max_workers {}",
                    first, max
                )));
            }
        }

        Ok(Self {
            starting_power,
            max_workers,
        })
    }

    /// Power of two of the first probe.
    pub fn starting_power(&self) -> u32 {
        self.starting_power
    }

    /// Upper limit on the worker count, if any.
    pub fn max_workers(&self) -> Option<usize> {
        self.max_workers
    }

    fn admits(&self, workers: usize) -> bool {
        self.max_workers.map_or(true, |max| workers <= max)
    }
}

/// Phase of a [`MaximumSearch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    /// Sampling powers of two.
    Probing,
    /// Sampling each worker count inside the bracket.
    Refining,
    /// No further samples are needed.
    Done,
}

/// One recorded sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    /// Worker count sampled.
    pub workers: usize,
    /// Phase the sample was taken in.
    pub phase: SearchPhase,
    /// Aggregate messages processed.
    pub messages_total: u64,
    /// Aggregate rate.
    pub messages_per_second: f64,
    /// Whether the sample became the new best.
    pub improved: bool,
}

/// Final state of a completed search.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Best result found, `None` if nothing was sampled.
    pub best: Option<Results>,
    /// Worker count of the best result.
    pub best_workers: Option<usize>,
    /// Every sample in the order it was taken.
    pub history: Vec<SamplePoint>,
}

/// Step-wise maximum search.
///
/// Ask [`next_workers`](Self::next_workers) for the next worker count,
/// measure it, and feed the measurement back with
/// [`record`](Self::record) until the search is done. [`run`](Self::run)
/// does this with a [`Sampler`].
#[derive(Debug, Clone)]
pub struct MaximumSearch {
    bounds: SearchBounds,
    phase: SearchPhase,
    /// Power of the current probe.
    power: u32,
    /// Next worker count while refining.
    cursor: usize,
    /// Exclusive end of the refinement window.
    refine_end: usize,
    best: Option<Results>,
    best_workers: Option<usize>,
    history: Vec<SamplePoint>,
}

impl Default for MaximumSearch {
    fn default() -> Self {
        Self::new(SearchBounds::default())
    }
}

impl MaximumSearch {
    /// Create a search within `bounds`.
    pub fn new(bounds: SearchBounds) -> Self {
        Self {
            bounds,
            phase: SearchPhase::Probing,
            power: bounds.starting_power,
            cursor: 0,
            refine_end: 0,
            best: None,
            best_workers: None,
            history: Vec::new(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    /// Bounds the search was created with.
    pub fn bounds(&self) -> &SearchBounds {
        &self.bounds
    }

    /// Best result recorded so far.
    pub fn best(&self) -> Option<&Results> {
        self.best.as_ref()
    }

    /// Worker count of the best result so far.
    pub fn best_workers(&self) -> Option<usize> {
        self.best_workers
    }

    /// Samples recorded so far.
    pub fn history(&self) -> &[SamplePoint] {
        &self.history
    }

    /// Whether the search needs no further samples.
    pub fn is_done(&self) -> bool {
        self.phase == SearchPhase::Done
    }

    /// Worker count to sample next, or `None` once the search is done.
    pub fn next_workers(&self) -> Option<usize> {
        match self.phase {
            SearchPhase::Probing => power_of_two(self.power),
            SearchPhase::Refining => Some(self.cursor),
            SearchPhase::Done => None,
        }
    }

    /// Record the measurement for the worker count returned by
    /// [`next_workers`](Self::next_workers).
    ///
    /// Fails if the search is already done.
    pub fn record(&mut self, results: Results) -> Result<()> {
        let workers = self
            .next_workers()
            .ok_or_else(|| Error::invalid_input("search is already complete"))?;
        self.apply(workers, results);
        Ok(())
    }

    /// Drive the search to completion with `sampler`.
    ///
    /// # Panics
    ///
    /// Panics if `sampler` returns `None` for any worker count.
    pub fn run<S: Sampler>(mut self, mut sampler: S) -> SearchOutcome {
        while let Some(workers) = self.next_workers() {
            debug!(workers, phase = ?self.phase, "Sampling workers");
            let results = sampler
                .sample(workers)
                .unwrap_or_else(|| panic!("Sampler returned no result for {} workers", workers));
            self.apply(workers, results);
        }
        self.into_outcome()
    }

    /// Consume the search and return what it found.
    pub fn into_outcome(self) -> SearchOutcome {
        SearchOutcome {
            best: self.best,
            best_workers: self.best_workers,
            history: self.history,
        }
    }

    fn apply(&mut self, workers: usize, results: Results) {
        let improved = match &self.best {
            None => true,
            Some(best) => results.improves_on(best),
        };

        debug!(
            workers,
            messages_total = results.messages_total(),
            messages_per_second = results.messages_per_second(),
            improved,
            "Sample recorded"
        );
        self.history.push(SamplePoint {
            workers,
            phase: self.phase,
            messages_total: results.messages_total(),
            messages_per_second: results.messages_per_second(),
            improved,
        });

        if improved {
            self.best = Some(results);
            self.best_workers = Some(workers);
        }

        match self.phase {
            SearchPhase::Probing => {
                if !improved {
                    // The first probe always improves, so power > starting_power here.
                    self.begin_refining(self.power - 1);
                    return;
                }
                let next_probe = self
                    .power
                    .checked_add(1)
                    .and_then(power_of_two)
                    .filter(|next| self.bounds.admits(*next));
                match next_probe {
                    Some(_) => self.power += 1,
                    None => self.begin_refining(self.power),
                }
            }
            SearchPhase::Refining => {
                if improved && self.cursor + 1 < self.refine_end {
                    self.cursor += 1;
                } else {
                    self.finish();
                }
            }
            SearchPhase::Done => {}
        }
    }

    fn begin_refining(&mut self, accepted_power: u32) {
        let low = power_of_two(accepted_power).unwrap_or(usize::MAX);
        let mut end = accepted_power
            .checked_add(1)
            .and_then(power_of_two)
            .unwrap_or(usize::MAX);
        if let Some(max) = self.bounds.max_workers {
            end = end.min(max.saturating_add(1));
        }
        let start = low.saturating_add(1);

        self.power = accepted_power;
        if start >= end {
            self.finish();
            return;
        }

        info!(
            bracket_low = low,
            window_start = start,
            window_end = end,
            "Probing complete, refining bracket"
        );
        self.phase = SearchPhase::Refining;
        self.cursor = start;
        self.refine_end = end;
    }

    fn finish(&mut self) {
        self.phase = SearchPhase::Done;
        if let (Some(best), Some(workers)) = (&self.best, self.best_workers) {
            info!(
                workers,
                messages_per_second = best.messages_per_second(),
                samples = self.history.len(),
                "Search complete"
            );
        }
    }
}

/// Find the worker count with the highest throughput, starting at one worker.
///
/// Returns the best result sampled, or `None` if nothing was sampled.
///
/// # Panics
///
/// Panics if `sampler` returns `None` for any worker count.
pub fn find_maximum<S: Sampler>(sampler: S) -> Option<Results> {
    MaximumSearch::default().run(sampler).best
}

/// Like [`find_maximum`], within `bounds`, returning the full outcome.
pub fn find_maximum_within<S: Sampler>(sampler: S, bounds: SearchBounds) -> SearchOutcome {
    MaximumSearch::new(bounds).run(sampler)
}
