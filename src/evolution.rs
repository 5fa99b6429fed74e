//! The generational breeding loop.
//!
//! Drives a [`Subpopulation`] through generations: evaluate fitness in
//! parallel, report statistics, check termination, carry elites forward,
//! select parents, apply the operator pipeline and replace the population
//! wholesale.

// The loop prints verbose progress lines to stderr and uses intentional
// casts for statistics
#![allow(clippy::print_stderr, clippy::cast_precision_loss)]

use std::fmt;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{GpError, GpResult};
use crate::fitness::strictly_better;
use crate::population::Subpopulation;
use crate::tree::Tree;

/// Computes the pure fitness of one individual.
///
/// Must be pure with respect to the tree structure: the same tree yields a
/// deterministic (or explicitly stochastic, at the implementor's choice)
/// fitness. Failures abort the run.
pub trait Evaluator: Send + Sync {
    /// Evaluate one individual, returning its pure fitness.
    ///
    /// # Errors
    ///
    /// Implementations report failures as
    /// [`GpError::Evaluation`](crate::GpError::Evaluation); the breeding
    /// loop propagates them without retrying.
    fn evaluate(&self, individual: &Tree) -> GpResult<f64>;
}

impl<F> Evaluator for F
where
    F: Fn(&Tree) -> GpResult<f64> + Send + Sync,
{
    fn evaluate(&self, individual: &Tree) -> GpResult<f64> {
        self(individual)
    }
}

/// Decides when the run is finished.
///
/// Consulted once per generation boundary with the best individual's pure
/// fitness and the generation index; never mid-generation.
pub trait TerminationChecker {
    /// Whether the run should stop now.
    fn should_terminate(&self, best_fitness: f64, generation: usize) -> bool;
}

impl<F> TerminationChecker for F
where
    F: Fn(f64, usize) -> bool,
{
    fn should_terminate(&self, best_fitness: f64, generation: usize) -> bool {
        self(best_fitness, generation)
    }
}

/// Read-only observer notified after each generation's evaluation.
pub trait GenerationObserver {
    /// Receive the statistics of the generation that just finished
    /// evaluating.
    fn on_generation(&mut self, stats: &GenerationStats);
}

/// Statistics of one evaluated generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation number (0 is the initial population).
    pub generation: usize,
    /// Pure fitness of the best individual by augmented ranking.
    pub best_fitness: f64,
    /// Mean pure fitness over the population.
    pub average_fitness: f64,
    /// Pure fitness of the worst individual by augmented ranking.
    pub worst_fitness: f64,
    /// Tree size of the best individual.
    pub best_size: usize,
    /// Mean tree size over the population.
    pub average_size: f64,
}

/// Configuration for the breeding loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Hard cap on the number of generations to breed.
    pub max_generation: usize,
    /// Worker-thread limit for parallel fitness evaluation; `None` uses the
    /// default thread count.
    pub max_workers: Option<usize>,
    /// RNG seed for reproducibility.
    pub seed: u64,
    /// Whether to print per-generation progress lines to stderr.
    pub verbose: bool,
    /// Whether to show a progress bar over generations.
    pub progress: bool,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            max_generation: 100,
            max_workers: None,
            seed: 42,
            verbose: false,
            progress: false,
        }
    }
}

/// Final report of an evolution run.
#[derive(Debug, Clone)]
pub struct EvolutionReport {
    /// Deep copy of the best individual seen across all generations.
    pub best_of_run: Tree,
    /// Statistics per evaluated generation.
    pub generations: Vec<GenerationStats>,
    /// Total wall-clock time in seconds.
    pub elapsed_seconds: f64,
}

/// The generational breeder: owns a subpopulation and the external
/// collaborators, and runs the evolve loop.
pub struct Evolution {
    subpopulation: Subpopulation,
    evaluator: Box<dyn Evaluator>,
    termination: Box<dyn TerminationChecker>,
    observers: Vec<Box<dyn GenerationObserver>>,
    config: EvolutionConfig,
    best_of_run: Option<Tree>,
}

impl fmt::Debug for Evolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evolution")
            .field("subpopulation", &self.subpopulation)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Evolution {
    /// Create a breeding loop over a subpopulation.
    #[must_use]
    pub fn new(
        subpopulation: Subpopulation,
        evaluator: Box<dyn Evaluator>,
        termination: Box<dyn TerminationChecker>,
        config: EvolutionConfig,
    ) -> Self {
        Self {
            subpopulation,
            evaluator,
            termination,
            observers: Vec::new(),
            config,
            best_of_run: None,
        }
    }

    /// Register a statistics observer.
    pub fn add_observer(&mut self, observer: Box<dyn GenerationObserver>) {
        self.observers.push(observer);
    }

    /// The subpopulation being evolved.
    #[must_use]
    pub fn subpopulation(&self) -> &Subpopulation {
        &self.subpopulation
    }

    /// Best individual seen so far across generations.
    #[must_use]
    pub fn best_of_run(&self) -> Option<&Tree> {
        self.best_of_run.as_ref()
    }

    /// Run the breeding loop until termination.
    ///
    /// Each cycle evaluates every individual, notifies observers, consults
    /// the termination checker, copies the elites unchanged, fills the
    /// remaining slots through selection and the operator pipeline, and
    /// replaces the population.
    ///
    /// # Errors
    ///
    /// Propagates configuration, creation, surgery and evaluation failures;
    /// none are retried.
    pub fn evolve(&mut self) -> GpResult<EvolutionReport> {
        let start = Instant::now();
        let mut rng = SmallRng::seed_from_u64(self.config.seed);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_workers.unwrap_or(0))
            .build()
            .map_err(|e| GpError::Configuration(format!("worker pool: {e}")))?;

        self.subpopulation.create_individuals(&mut rng)?;
        self.evaluate_population(&pool)?;

        let bar = if self.config.progress {
            let bar = ProgressBar::new(self.config.max_generation as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] \
                         {pos}/{len} generations",
                    )
                    .expect("valid template")
                    .progress_chars("=>-"),
            );
            Some(bar)
        } else {
            None
        };

        let mut history = Vec::new();
        let mut generation = 0usize;
        loop {
            let stats = self.collect_stats(generation)?;
            if self.config.verbose {
                eprintln!(
                    "Gen {:>4}: best={:.4} mean={:.4} worst={:.4} avg_size={:.1}",
                    generation,
                    stats.best_fitness,
                    stats.average_fitness,
                    stats.worst_fitness,
                    stats.average_size
                );
            }
            for observer in &mut self.observers {
                observer.on_generation(&stats);
            }
            history.push(stats);
            self.update_best_of_run();

            if generation >= self.config.max_generation
                || self
                    .termination
                    .should_terminate(stats.best_fitness, generation)
            {
                break;
            }

            let next = self.breed(&mut rng)?;
            self.subpopulation.set_individuals(next);
            self.evaluate_population(&pool)?;
            generation += 1;
            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }
        if let Some(bar) = &bar {
            bar.finish_and_clear();
        }

        let best_of_run = self
            .best_of_run
            .clone()
            .ok_or_else(|| GpError::Configuration("no individual was evaluated".to_string()))?;
        Ok(EvolutionReport {
            best_of_run,
            generations: history,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        })
    }

    /// Evaluate every individual's fitness on the worker pool.
    ///
    /// Individuals are independent, so evaluation is the only parallel step;
    /// the loop suspends here until all results are in.
    fn evaluate_population(&mut self, pool: &rayon::ThreadPool) -> GpResult<()> {
        let evaluator = self.evaluator.as_ref();
        let individuals = self
            .subpopulation
            .individuals_mut()
            .ok_or_else(|| GpError::Configuration("population was not created".to_string()))?;
        pool.install(|| {
            individuals.par_iter_mut().try_for_each(|tree| {
                let score = evaluator.evaluate(tree)?;
                tree.fitness_mut().set_score(score);
                Ok(())
            })
        })
    }

    fn collect_stats(&self, generation: usize) -> GpResult<GenerationStats> {
        let individuals = self
            .subpopulation
            .individuals()
            .ok_or_else(|| GpError::Configuration("population was not created".to_string()))?;
        let best = self
            .subpopulation
            .get_best_individual()
            .ok_or_else(|| GpError::Configuration("population is empty".to_string()))?;
        let worst = self
            .subpopulation
            .get_worst_individual()
            .ok_or_else(|| GpError::Configuration("population is empty".to_string()))?;
        let average_fitness = self.subpopulation.get_average_fitness().unwrap_or(f64::NAN);
        let total_size: usize = individuals.iter().map(Tree::size).sum();

        Ok(GenerationStats {
            generation,
            best_fitness: best.fitness().pure().unwrap_or(f64::NAN),
            average_fitness,
            worst_fitness: worst.fitness().pure().unwrap_or(f64::NAN),
            best_size: best.size(),
            average_size: total_size as f64 / individuals.len() as f64,
        })
    }

    fn update_best_of_run(&mut self) {
        let Some(best) = self.subpopulation.get_best_individual() else {
            return;
        };
        let incumbent = self.best_of_run.as_ref().and_then(Tree::augmented_fitness);
        if self.best_of_run.is_none()
            || strictly_better(
                best.augmented_fitness(),
                incumbent,
                self.subpopulation.higher_is_better(),
            )
        {
            self.best_of_run = Some(best.clone());
        }
    }

    /// Assemble the next generation: elites first, then offspring produced
    /// by selection and the operator pipeline.
    fn breed(&self, rng: &mut SmallRng) -> GpResult<Vec<Tree>> {
        let subpopulation = &self.subpopulation;
        let individuals = subpopulation
            .individuals()
            .ok_or_else(|| GpError::Configuration("population was not created".to_string()))?;
        let population_size = subpopulation.population_size();
        let n_elite = subpopulation.n_elite().min(population_size);

        let mut next = Vec::with_capacity(population_size);
        next.extend(
            elite_indices(individuals, n_elite, subpopulation.higher_is_better())
                .into_iter()
                .map(|index| individuals[index].clone()),
        );

        // Fill the remaining slots: each selection method contributes its
        // proportion of parents (clones), then the operator sequence runs
        // over them in declared order, in groups of the operator's arity.
        let remaining = population_size - n_elite;
        let methods = subpopulation.selection_methods();
        let mut offspring: Vec<Tree> = Vec::with_capacity(remaining);
        for (index, (method, proportion)) in methods.iter().enumerate() {
            let left = remaining - offspring.len();
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let count = if index == methods.len() - 1 {
                left
            } else {
                ((proportion * remaining as f64).round() as usize).min(left)
            };
            offspring.extend(method.select(individuals, count, rng));
        }

        for operator in subpopulation.operators() {
            let arity = operator.arity().max(1);
            for group in offspring.chunks_mut(arity) {
                if group.len() == arity {
                    operator.apply(group, rng)?;
                }
            }
        }

        next.append(&mut offspring);
        Ok(next)
    }
}

/// Indices of the top `n` individuals by augmented fitness.
fn elite_indices(individuals: &[Tree], n: usize, higher_is_better: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..individuals.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = individuals[a].augmented_fitness();
        let fb = individuals[b].augmented_fitness();
        // Unevaluated individuals rank last in either sense.
        let key = |f: Option<f64>| {
            f.unwrap_or(if higher_is_better {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            })
        };
        let ordering = key(fa)
            .partial_cmp(&key(fb))
            .unwrap_or(std::cmp::Ordering::Equal);
        if higher_is_better {
            ordering.reverse()
        } else {
            ordering
        }
    });
    order.truncate(n);
    order
}
