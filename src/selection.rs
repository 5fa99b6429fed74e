//! Selection methods.
//!
//! Selection draws parents from the current population by fitness ordering.
//! Winners are returned as owned clones, keeping the clone-before-mutate
//! discipline between selection and the operator pipeline.

use std::fmt;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{GpError, GpResult};
use crate::fitness::strictly_better;
use crate::tree::Tree;

/// A method of drawing individuals from a population for reproduction.
pub trait SelectionMethod: fmt::Debug + Send + Sync {
    /// Select `n` individuals (clones) from the population.
    fn select(&self, population: &[Tree], n: usize, rng: &mut dyn RngCore) -> Vec<Tree>;
}

/// Tournament selection: each winner is the best of `tournament_size`
/// contestants sampled uniformly at random with replacement.
///
/// Ranking uses augmented fitness under the configured ordering sense; ties
/// keep the first-seen contestant. A tournament size of 1 degenerates to
/// uniform random selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TournamentSelection {
    tournament_size: usize,
    higher_is_better: bool,
}

impl TournamentSelection {
    /// Create a tournament selection method.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::Configuration`] when `tournament_size` is zero.
    pub fn new(tournament_size: usize, higher_is_better: bool) -> GpResult<Self> {
        if tournament_size == 0 {
            return Err(GpError::Configuration(
                "tournament size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            tournament_size,
            higher_is_better,
        })
    }

    /// Number of contestants per tournament.
    #[must_use]
    pub fn tournament_size(&self) -> usize {
        self.tournament_size
    }
}

impl SelectionMethod for TournamentSelection {
    fn select(&self, population: &[Tree], n: usize, rng: &mut dyn RngCore) -> Vec<Tree> {
        if population.is_empty() {
            return Vec::new();
        }
        let mut winners = Vec::with_capacity(n);
        for _ in 0..n {
            let mut best_index = rng.gen_range(0..population.len());
            let mut best_score = population[best_index].augmented_fitness();
            for _ in 1..self.tournament_size {
                let index = rng.gen_range(0..population.len());
                let score = population[index].augmented_fitness();
                if strictly_better(score, best_score, self.higher_is_better) {
                    best_index = index;
                    best_score = score;
                }
            }
            winners.push(population[best_index].clone());
        }
        winners
    }
}
