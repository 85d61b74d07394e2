//! Path Query Engine
//!
//! Executes multi-step traversals over a [`QuadStore`]. A query is a start
//! value and an ordered list of steps; each step follows one predicate either
//! outwards (subject -> object) or inwards (object -> subject), replacing the
//! working set ("frontier") with the union of the results.
//!
//! ```ignore
//! use apki_core::query::{PathQuery, QueryEngine};
//!
//! // Packages that satisfy the direct dependencies of `curl`
//! let query = PathQuery::new("curl").out("depend").in_("provide");
//! let result = QueryEngine::new(store).execute(&query)?;
//! ```

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::quad::Predicate;
use crate::store::{QuadStore, StoreError};

/// Errors that can occur while validating or executing a path query
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown direction '{0}' (expected 'out' or 'in')")]
    UnknownDirection(String),

    #[error("unknown predicate '{0}' (expected provide, depend or install-if)")]
    UnknownPredicate(String),

    #[error("malformed step '{0}' (expected <direction>:<predicate>)")]
    MalformedStep(String),

    #[error("query has no steps")]
    EmptyPath,

    #[error("hop count must be at least 1")]
    NoHops,

    #[error("query has {steps} steps, limit is {limit}")]
    TooManySteps { steps: usize, limit: usize },

    #[error("frontier grew to {size} values after step {step}, limit is {limit}")]
    FrontierTooLarge {
        step: usize,
        size: usize,
        limit: usize,
    },

    #[error("query timed out after {elapsed_ms} ms at step {step}")]
    TimedOut { step: usize, elapsed_ms: u128 },

    #[error("query cancelled at step {step}")]
    Cancelled { step: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// Query Model
// ============================================================================

/// Traversal direction of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// subject -> object
    Out,
    /// object -> subject
    In,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Out => "out",
            Direction::In => "in",
        }
    }
}

impl FromStr for Direction {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "out" => Ok(Direction::Out),
            "in" => Ok(Direction::In),
            other => Err(QueryError::UnknownDirection(other.to_string())),
        }
    }
}

/// One traversal step: follow `predicate` in `direction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub direction: Direction,
    pub predicate: String,
}

impl Step {
    pub fn out(predicate: impl Into<String>) -> Self {
        Self {
            direction: Direction::Out,
            predicate: predicate.into(),
        }
    }

    pub fn in_(predicate: impl Into<String>) -> Self {
        Self {
            direction: Direction::In,
            predicate: predicate.into(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.direction.as_str(), self.predicate)
    }
}

/// Parses `out:depend` / `in:provide`.
impl FromStr for Step {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (direction, predicate) = s
            .split_once(':')
            .ok_or_else(|| QueryError::MalformedStep(s.to_string()))?;
        let direction = direction.trim().parse()?;
        let predicate = predicate.trim();
        if predicate.is_empty() {
            return Err(QueryError::MalformedStep(s.to_string()));
        }
        Ok(Step {
            direction,
            predicate: predicate.to_string(),
        })
    }
}

/// A start value plus an ordered list of steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathQuery {
    pub start: String,
    pub steps: Vec<Step>,
}

impl PathQuery {
    /// Query starting at `start` with no steps yet.
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            steps: Vec::new(),
        }
    }

    /// Append an outward step.
    pub fn out(mut self, predicate: impl Into<String>) -> Self {
        self.steps.push(Step::out(predicate));
        self
    }

    /// Append an inward step.
    pub fn in_(mut self, predicate: impl Into<String>) -> Self {
        self.steps.push(Step::in_(predicate));
        self
    }

    /// Append a step.
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Packages providing the direct dependencies of `package`.
    pub fn dependents(package: impl Into<String>) -> Self {
        Self::transitive_dependents(package, 1)
    }

    /// Repeat the (out depend, in provide) pair `hops` times.
    pub fn transitive_dependents(package: impl Into<String>, hops: usize) -> Self {
        let mut query = Self::new(package);
        for _ in 0..hops {
            query = query
                .out(Predicate::Depend.as_str())
                .in_(Predicate::Provide.as_str());
        }
        query
    }

    /// [`transitive_dependents`](Self::transitive_dependents) with the hop
    /// count checked against `limits` before any step is built.
    pub fn bounded_transitive_dependents(
        package: impl Into<String>,
        hops: usize,
        limits: &QueryLimits,
    ) -> Result<Self, QueryError> {
        if hops == 0 {
            return Err(QueryError::NoHops);
        }
        let steps = hops.checked_mul(2).unwrap_or(usize::MAX);
        if steps > limits.max_steps {
            return Err(QueryError::TooManySteps {
                steps,
                limit: limits.max_steps,
            });
        }
        Ok(Self::transitive_dependents(package, hops))
    }

    /// Check the step list without touching the store.
    pub fn validate(&self, limits: &QueryLimits) -> Result<(), QueryError> {
        if self.steps.is_empty() {
            return Err(QueryError::EmptyPath);
        }
        if self.steps.len() > limits.max_steps {
            return Err(QueryError::TooManySteps {
                steps: self.steps.len(),
                limit: limits.max_steps,
            });
        }
        for step in &self.steps {
            step.predicate
                .parse::<Predicate>()
                .map_err(QueryError::UnknownPredicate)?;
        }
        Ok(())
    }
}

impl fmt::Display for PathQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)?;
        for step in &self.steps {
            write!(f, " {}", step)?;
        }
        Ok(())
    }
}

// ============================================================================
// Limits and Cancellation
// ============================================================================

/// Bounds on the cost of a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub max_steps: usize,
    pub max_frontier: usize,
    /// None disables the deadline
    pub timeout: Option<Duration>,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_steps: 16,
            max_frontier: 100_000,
            timeout: Some(Duration::from_secs(5)),
        }
    }
}

/// Shared flag a caller raises to stop a running query between steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Materialized final frontier of a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub values: HashSet<String>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    /// Values in lexicographic order, for stable display.
    pub fn sorted(&self) -> Vec<String> {
        let mut values: Vec<String> = self.values.iter().cloned().collect();
        values.sort();
        values
    }
}

/// Runs path queries against a store.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn QuadStore>,
    limits: QueryLimits,
}

impl QueryEngine {
    /// Engine with default limits.
    pub fn new(store: Arc<dyn QuadStore>) -> Self {
        Self::with_limits(store, QueryLimits::default())
    }

    pub fn with_limits(store: Arc<dyn QuadStore>, limits: QueryLimits) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> &QueryLimits {
        &self.limits
    }

    /// Execute `query` to completion.
    pub fn execute(&self, query: &PathQuery) -> Result<QueryResult, QueryError> {
        self.execute_with_cancel(query, &CancelToken::new())
    }

    /// Execute `query`, checking `cancel` and the deadline before every step.
    pub fn execute_with_cancel(
        &self,
        query: &PathQuery,
        cancel: &CancelToken,
    ) -> Result<QueryResult, QueryError> {
        query.validate(&self.limits)?;

        let started = Instant::now();
        let mut frontier: HashSet<String> = HashSet::from([query.start.clone()]);

        for (i, step) in query.steps.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(QueryError::Cancelled { step: i });
            }
            if let Some(timeout) = self.limits.timeout {
                let elapsed = started.elapsed();
                if elapsed >= timeout {
                    return Err(QueryError::TimedOut {
                        step: i,
                        elapsed_ms: elapsed.as_millis(),
                    });
                }
            }

            frontier = match step.direction {
                Direction::Out => self.store.traverse_out(&frontier, &step.predicate)?,
                Direction::In => self.store.traverse_in(&frontier, &step.predicate)?,
            };

            if frontier.len() > self.limits.max_frontier {
                return Err(QueryError::FrontierTooLarge {
                    step: i,
                    size: frontier.len(),
                    limit: self.limits.max_frontier,
                });
            }
            if frontier.is_empty() {
                break;
            }
        }

        debug!(
            query = %query,
            results = frontier.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "path query executed"
        );
        Ok(QueryResult { values: frontier })
    }
}
