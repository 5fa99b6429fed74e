//! Fitness state attached to every individual.
//!
//! Evaluators store a pure score; rankings (selection, elitism, best/worst
//! queries) use the augmented score, which folds in a size penalty to fight
//! bloat.

use serde::{Deserialize, Serialize};

/// Fitness of a single individual.
///
/// The score is unset until an evaluator assigns it. `bloat_weight` scales
/// the size penalty applied by [`Fitness::augmented`]; `higher_is_better`
/// fixes the ordering sense for comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fitness {
    score: Option<f64>,
    bloat_weight: f64,
    higher_is_better: bool,
}

impl Fitness {
    /// Create unevaluated fitness state.
    #[must_use]
    pub fn new(bloat_weight: f64, higher_is_better: bool) -> Self {
        Self {
            score: None,
            bloat_weight,
            higher_is_better,
        }
    }

    /// Assign the pure score.
    pub fn set_score(&mut self, score: f64) {
        self.score = Some(score);
    }

    /// Discard the score, returning to the unevaluated state.
    pub fn clear(&mut self) {
        self.score = None;
    }

    /// Whether a score has been assigned.
    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        self.score.is_some()
    }

    /// The pure score, if evaluated.
    #[must_use]
    pub fn pure(&self) -> Option<f64> {
        self.score
    }

    /// The pure score adjusted by the bloat penalty for a tree of `size`
    /// nodes: subtracted under maximization, added under minimization, so
    /// that larger trees always rank worse at equal pure score.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn augmented(&self, size: usize) -> Option<f64> {
        let penalty = self.bloat_weight * size as f64;
        self.score.map(|score| {
            if self.higher_is_better {
                score - penalty
            } else {
                score + penalty
            }
        })
    }

    /// Bloat penalty weight.
    #[must_use]
    pub fn bloat_weight(&self) -> f64 {
        self.bloat_weight
    }

    /// Ordering sense: `true` when larger scores are better.
    #[must_use]
    pub fn higher_is_better(&self) -> bool {
        self.higher_is_better
    }
}

/// Whether candidate score `a` is strictly better than incumbent `b`.
///
/// Unevaluated scores never win: `None` beats nothing, and any evaluated
/// score beats `None`. Ties are not wins, so first-seen incumbents survive.
#[must_use]
pub fn strictly_better(a: Option<f64>, b: Option<f64>, higher_is_better: bool) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            if higher_is_better {
                a > b
            } else {
                a < b
            }
        }
        (Some(_), None) => true,
        (None, _) => false,
    }
}
