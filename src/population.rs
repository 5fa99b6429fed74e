//! Subpopulation container.
//!
//! A subpopulation owns its individuals plus the configuration that breeds
//! them: creators with creation-probability weights, the ordered operator
//! sequence, selection methods with proportions, and the elitism rate.

// Construction warns on stderr when a positive elitism rate rounds to zero
#![allow(clippy::print_stderr)]

use rand::{Rng, RngCore};

use crate::creator::TreeCreator;
use crate::error::{GpError, GpResult};
use crate::fitness::strictly_better;
use crate::operators::GeneticOperator;
use crate::selection::SelectionMethod;
use crate::tree::Tree;

/// Tolerance when checking that probability weights sum to 1.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Configuration for a [`Subpopulation`].
#[derive(Debug)]
pub struct SubpopulationConfig {
    /// Possible creators for the initial population.
    pub creators: Vec<Box<dyn TreeCreator>>,
    /// Creation probability per creator; must sum to 1. `None` means a
    /// uniform choice.
    pub creator_weights: Option<Vec<f64>>,
    /// Genetic operators applied, in order, each generation.
    pub operators: Vec<Box<dyn GeneticOperator>>,
    /// Selection methods with the proportion of offspring each produces;
    /// proportions must sum to 1.
    pub selection_methods: Vec<(Box<dyn SelectionMethod>, f64)>,
    /// Fraction of the population preserved unchanged each generation.
    pub elitism_rate: f64,
    /// Number of individuals in the subpopulation.
    pub population_size: usize,
    /// Ordering sense for fitness values.
    pub higher_is_better: bool,
}

/// A subgroup of the experiment population: its individuals plus the
/// creators, operators and selection methods that evolve them.
#[derive(Debug)]
pub struct Subpopulation {
    creators: Vec<Box<dyn TreeCreator>>,
    creator_weights: Vec<f64>,
    operators: Vec<Box<dyn GeneticOperator>>,
    selection_methods: Vec<(Box<dyn SelectionMethod>, f64)>,
    population_size: usize,
    n_elite: usize,
    higher_is_better: bool,
    individuals: Option<Vec<Tree>>,
}

impl Subpopulation {
    /// Validate a configuration and build the (not yet materialized)
    /// subpopulation.
    ///
    /// # Errors
    ///
    /// Returns [`GpError::Configuration`] for an empty creator, operator or
    /// selection list, weight/proportion lists that do not match or do not
    /// sum to 1, a zero population size, or an elitism rate outside
    /// `[0, 1]`.
    pub fn new(config: SubpopulationConfig) -> GpResult<Self> {
        let SubpopulationConfig {
            creators,
            creator_weights,
            operators,
            selection_methods,
            elitism_rate,
            population_size,
            higher_is_better,
        } = config;

        if creators.is_empty() {
            return Err(GpError::Configuration(
                "must specify at least one creator".to_string(),
            ));
        }
        if operators.is_empty() {
            return Err(GpError::Configuration(
                "must specify at least one operator".to_string(),
            ));
        }
        if selection_methods.is_empty() {
            return Err(GpError::Configuration(
                "must specify at least one selection method".to_string(),
            ));
        }
        if population_size == 0 {
            return Err(GpError::Configuration(
                "population size must be at least 1".to_string(),
            ));
        }

        #[allow(clippy::cast_precision_loss)]
        let creator_weights = match creator_weights {
            Some(weights) => {
                if weights.len() != creators.len() {
                    return Err(GpError::Configuration(format!(
                        "number of creators ({}) must match number of creation \
                         probabilities ({})",
                        creators.len(),
                        weights.len()
                    )));
                }
                validate_weights(&weights, "creation probabilities")?;
                weights
            }
            None => vec![1.0 / creators.len() as f64; creators.len()],
        };

        let proportions: Vec<f64> = selection_methods.iter().map(|(_, p)| *p).collect();
        validate_weights(&proportions, "selection proportions")?;

        if !(0.0..=1.0).contains(&elitism_rate) {
            return Err(GpError::Configuration(format!(
                "elitism rate {elitism_rate} is not in [0, 1]"
            )));
        }
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n_elite = (elitism_rate * population_size as f64).round() as usize;
        if n_elite == 0 && elitism_rate > 0.0 {
            eprintln!(
                "warning: elitism rate {elitism_rate} rounds to 0 elites for \
                 population size {population_size}; try increasing it"
            );
        }

        Ok(Self {
            creators,
            creator_weights,
            operators,
            selection_methods,
            population_size,
            n_elite,
            higher_is_better,
            individuals: None,
        })
    }

    /// Materialize the initial population if it does not exist yet.
    ///
    /// One creator is chosen by weighted random choice and generates all
    /// individuals. A later call with individuals already present does
    /// nothing.
    ///
    /// # Errors
    ///
    /// Propagates creation failures.
    pub fn create_individuals(&mut self, rng: &mut dyn RngCore) -> GpResult<()> {
        if self.individuals.is_some() {
            return Ok(());
        }
        let chosen = weighted_choice(&self.creator_weights, rng);
        let individuals = self.creators[chosen].create_individuals(
            self.population_size,
            self.higher_is_better,
            rng,
        )?;
        self.individuals = Some(individuals);
        Ok(())
    }

    /// The individuals, if the population has been materialized.
    #[must_use]
    pub fn individuals(&self) -> Option<&[Tree]> {
        self.individuals.as_deref()
    }

    /// Mutable access to the individuals (for fitness assignment).
    pub fn individuals_mut(&mut self) -> Option<&mut [Tree]> {
        self.individuals.as_deref_mut()
    }

    /// Replace the individual list wholesale with the next generation.
    pub fn set_individuals(&mut self, individuals: Vec<Tree>) {
        self.individuals = Some(individuals);
    }

    /// The configured population size.
    #[must_use]
    pub fn population_size(&self) -> usize {
        self.population_size
    }

    /// Number of elite slots per generation.
    #[must_use]
    pub fn n_elite(&self) -> usize {
        self.n_elite
    }

    /// Ordering sense for fitness values.
    #[must_use]
    pub fn higher_is_better(&self) -> bool {
        self.higher_is_better
    }

    /// The operator sequence, in application order.
    #[must_use]
    pub fn operators(&self) -> &[Box<dyn GeneticOperator>] {
        &self.operators
    }

    /// The selection methods with their proportions.
    #[must_use]
    pub fn selection_methods(&self) -> &[(Box<dyn SelectionMethod>, f64)] {
        &self.selection_methods
    }

    /// The individual with the best augmented fitness, scanning the whole
    /// list. Unevaluated individuals never win.
    #[must_use]
    pub fn get_best_individual(&self) -> Option<&Tree> {
        self.rank_individual(self.higher_is_better)
    }

    /// The individual with the worst augmented fitness among evaluated
    /// individuals, scanning the whole list.
    #[must_use]
    pub fn get_worst_individual(&self) -> Option<&Tree> {
        self.rank_individual(!self.higher_is_better)
    }

    fn rank_individual(&self, sense: bool) -> Option<&Tree> {
        let individuals = self.individuals.as_ref()?;
        let mut best: Option<&Tree> = None;
        for tree in individuals {
            let incumbent = best.and_then(Tree::augmented_fitness);
            if best.is_none() || strictly_better(tree.augmented_fitness(), incumbent, sense) {
                best = Some(tree);
            }
        }
        best
    }

    /// Mean pure fitness over the evaluated individuals, or `None` when no
    /// individual has been evaluated.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn get_average_fitness(&self) -> Option<f64> {
        let individuals = self.individuals.as_ref()?;
        let scores: Vec<f64> = individuals
            .iter()
            .filter_map(|tree| tree.fitness().pure())
            .collect();
        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }

    /// Whether a structurally equal individual is present.
    #[must_use]
    pub fn contains_individual(&self, individual: &Tree) -> bool {
        self.individuals
            .as_ref()
            .is_some_and(|individuals| individuals.iter().any(|tree| tree == individual))
    }
}

fn validate_weights(weights: &[f64], what: &str) -> GpResult<()> {
    if weights.iter().any(|w| *w < 0.0) {
        return Err(GpError::Configuration(format!("{what} must be non-negative")));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(GpError::Configuration(format!(
            "{what} must sum to 1, got {sum}"
        )));
    }
    Ok(())
}

/// Pick an index with probability proportional to the weights (which sum
/// to 1).
fn weighted_choice(weights: &[f64], rng: &mut dyn RngCore) -> usize {
    let mut remaining = rng.gen_range(0.0..1.0);
    for (index, weight) in weights.iter().enumerate() {
        if remaining < *weight {
            return index;
        }
        remaining -= weight;
    }
    weights.len() - 1
}
