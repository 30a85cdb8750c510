//! # croft-algo: Cultivation Planning Solvers
//!
//! This crate provides the planning engine for multi-field, multi-crop
//! cultivation: candidate generation from weather and crop thermal
//! profiles, feasibility and objective evaluation, and two
//! interchangeable combinatorial solvers.
//!
//! | Solver | Description | Guarantee |
//! |--------|-------------|-----------|
//! | [`dp::solve_dp`] | Per-field weighted-interval scheduling | Optimal per field on static profits |
//! | [`greedy::construct_greedy`] | Profit-rate greedy construction | Feasible start solution |
//! | [`local_search::hill_climb`] | Operator-based hill climbing | Monotone improvement |
//! | [`alns::run_alns`] | Destroy/repair ALNS with SA acceptance | Returns global best observed |
//!
//! ## Architecture
//!
//! - [`thermal`] / [`growth`]: trapezoidal GDD, stress accounting, and
//!   the day-by-day growth walk
//! - [`period`]: best start dates per (field, crop), with a prefix-sum
//!   sliding-window path for uniform thermal profiles
//! - [`candidates`]: the immutable [`candidates::CandidatePool`]
//! - [`interaction`]: group-pair rule index and impact lookup
//! - [`solution`]: working state, shared context and the single
//!   evaluation path (impacts, kernel scoring, cap trimming)
//! - [`adjust`]: user move/remove/add directives with residual
//!   re-optimization
//! - [`assemble`]: invariant enforcement and final [`croft_core::Plan`]
//!   emission
//!
//! Every solver accepts a [`deadline::Deadline`]; on expiry it returns
//! the best solution found so far with `timed_out` set. Stochastic
//! search is driven by a `StdRng` seeded from the configuration, so a
//! fixed seed reproduces the run exactly.
//!
//! ## Example
//!
//! ```ignore
//! use croft_algo::optimize_allocation;
//! use croft_core::AlgorithmConfig;
//!
//! let plan = optimize_allocation(&instance, &AlgorithmConfig::default())?;
//! println!("profit: {:.2}", plan.total_profit);
//! ```

pub mod adjust;
pub mod alns;
pub mod assemble;
pub mod candidates;
pub mod deadline;
pub mod dp;
pub mod engine;
pub mod greedy;
pub mod growth;
pub mod interaction;
pub mod local_search;
pub mod operators;
pub mod period;
pub mod solution;
pub mod test_utils;
pub mod thermal;
pub mod validation;

pub use adjust::{adjust_allocation, AdjustResult, RejectedMove};
pub use alns::{AlnsOutcome, AlnsStats};
pub use candidates::{generate_candidates, CandidatePool};
pub use deadline::Deadline;
pub use engine::optimize_allocation;
pub use growth::{GrowthOutcome, GrowthResult};
pub use period::{optimize_period, PeriodCandidate, PeriodResult};
pub use solution::{CandidateHandle, PlanContext, SolutionState};
