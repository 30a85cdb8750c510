//! Candidate generation: the immutable pool every solver draws from.
//!
//! For each (field, crop) pair the period optimizer supplies top-K start
//! dates at full capacity; each is then rescaled to the configured
//! quantity levels. Under linear revenue and occupancy-based cost the
//! best period is independent of quantity, so one period evaluation per
//! pair covers every level.
//!
//! Generation fans out over (field, crop) pairs with rayon when the
//! `parallel` feature is enabled; results are reassembled in pair order,
//! so the candidate set is identical either way.

use crate::period::optimize_period;
use croft_core::{
    AlgorithmConfig, AllocationCandidate, CropId, CroftResult, FieldId, PlanningInstance,
};
use std::collections::HashMap;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Immutable candidate pool with per-field and per-pair indexes.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    candidates: Vec<AllocationCandidate>,
    by_field: HashMap<FieldId, Vec<usize>>,
    by_pair: HashMap<(FieldId, CropId), Vec<usize>>,
    /// (field, crop) pairs with no feasible period, for reporting.
    pub infeasible_pairs: usize,
}

impl CandidatePool {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, index: usize) -> &AllocationCandidate {
        &self.candidates[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &AllocationCandidate)> {
        self.candidates.iter().enumerate()
    }

    /// Candidate indices on one field, sorted by (start, quantity).
    pub fn for_field(&self, field: &FieldId) -> &[usize] {
        self.by_field.get(field).map_or(&[], Vec::as_slice)
    }

    /// Candidate indices for one (field, crop), sorted by (start, quantity).
    pub fn for_pair(&self, field: &FieldId, crop: &CropId) -> &[usize] {
        self.by_pair
            .get(&(field.clone(), crop.clone()))
            .map_or(&[], Vec::as_slice)
    }

    /// Exact-start lookup: the highest-profit candidate at `start` for the
    /// pair, matching `quantity` when given.
    pub fn at(
        &self,
        field: &FieldId,
        crop: &CropId,
        start: chrono::NaiveDate,
        quantity: Option<u32>,
    ) -> Option<usize> {
        self.for_pair(field, crop)
            .iter()
            .copied()
            .filter(|&i| {
                let c = &self.candidates[i];
                c.start_date == start && quantity.map_or(true, |q| c.quantity == q)
            })
            .max_by(|&a, &b| {
                let pa = self.candidates[a].metrics().profit();
                let pb = self.candidates[b].metrics().profit();
                pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Best-profit candidate for the pair within `tolerance_days` of
    /// `start`. Ties prefer the nearer, then earlier, start and the larger
    /// quantity.
    pub fn best_near(
        &self,
        field: &FieldId,
        crop: &CropId,
        start: chrono::NaiveDate,
        tolerance_days: i64,
    ) -> Option<usize> {
        self.for_pair(field, crop)
            .iter()
            .copied()
            .filter(|&i| {
                (self.candidates[i].start_date - start).num_days().abs() <= tolerance_days
            })
            .max_by(|&a, &b| {
                let ca = &self.candidates[a];
                let cb = &self.candidates[b];
                let pa = ca.metrics().profit();
                let pb = cb.metrics().profit();
                pa.partial_cmp(&pb)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| {
                        let da = (ca.start_date - start).num_days().abs();
                        let db = (cb.start_date - start).num_days().abs();
                        db.cmp(&da)
                    })
                    .then_with(|| cb.start_date.cmp(&ca.start_date))
                    .then_with(|| ca.quantity.cmp(&cb.quantity))
            })
    }

    /// Alternative starts for the pair at the same quantity, best profit
    /// first, excluding `exclude_start`.
    pub fn alternatives(
        &self,
        field: &FieldId,
        crop: &CropId,
        quantity: u32,
        exclude_start: chrono::NaiveDate,
        limit: usize,
    ) -> Vec<usize> {
        let mut found: Vec<usize> = self
            .for_pair(field, crop)
            .iter()
            .copied()
            .filter(|&i| {
                let c = &self.candidates[i];
                c.quantity == quantity && c.start_date != exclude_start
            })
            .collect();
        found.sort_by(|&a, &b| {
            let pa = self.candidates[a].metrics().profit();
            let pb = self.candidates[b].metrics().profit();
            pb.partial_cmp(&pa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| self.candidates[a].start_date.cmp(&self.candidates[b].start_date))
        });
        found.truncate(limit);
        found
    }
}

/// Generate the candidate pool for an instance.
pub fn generate_candidates(
    instance: &PlanningInstance,
    config: &AlgorithmConfig,
) -> CroftResult<CandidatePool> {
    let pairs: Vec<(usize, usize)> = (0..instance.fields().len())
        .flat_map(|f| (0..instance.profiles().len()).map(move |c| (f, c)))
        .collect();

    let evaluate = |&(f, c): &(usize, usize)| -> CroftResult<Vec<AllocationCandidate>> {
        let field = &instance.fields()[f];
        let profile = &instance.profiles()[c];
        let period = optimize_period(field, profile, instance.weather(), instance.window(), config)?;

        let mut out = Vec::new();
        for candidate in &period.candidates {
            for &level in &config.quantity_levels {
                let target_area = field.area_m2 * level;
                let quantity = (target_area / profile.crop.area_per_unit).floor() as u32;
                if quantity == 0 {
                    continue;
                }
                let area_used = f64::from(quantity) * profile.crop.area_per_unit;
                let allocation = AllocationCandidate {
                    field_id: field.id.clone(),
                    crop_id: profile.crop.id.clone(),
                    crop_name: profile.crop.name.clone(),
                    start_date: candidate.start_date,
                    completion_date: candidate.completion_date,
                    growth_days: candidate.growth_days,
                    area_used,
                    quantity,
                    yield_factor: candidate.yield_factor,
                    daily_fixed_cost: field.daily_fixed_cost,
                    revenue_per_area: profile.crop.revenue_per_area,
                    revenue_cap: profile.crop.revenue_cap,
                };
                if config.enable_candidate_filtering {
                    let metrics = allocation.metrics();
                    if metrics.profit() < 0.0
                        || metrics.profit_rate() < config.min_profit_rate_threshold
                    {
                        continue;
                    }
                }
                out.push(allocation);
            }
        }
        Ok(out)
    };

    #[cfg(feature = "parallel")]
    let results: Vec<CroftResult<Vec<AllocationCandidate>>> =
        pairs.par_iter().map(evaluate).collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<CroftResult<Vec<AllocationCandidate>>> =
        pairs.iter().map(evaluate).collect();

    let mut pool = CandidatePool::default();
    for result in results {
        let batch = result?;
        if batch.is_empty() {
            pool.infeasible_pairs += 1;
            continue;
        }
        pool.candidates.extend(batch);
    }

    // Deterministic order regardless of generation scheduling, then
    // dedupe on the candidate key.
    pool.candidates.sort_by(|a, b| {
        (&a.field_id, &a.crop_id, a.start_date, a.quantity).cmp(&(
            &b.field_id,
            &b.crop_id,
            b.start_date,
            b.quantity,
        ))
    });
    pool.candidates
        .dedup_by(|a, b| {
            a.field_id == b.field_id
                && a.crop_id == b.crop_id
                && a.start_date == b.start_date
                && a.quantity == b.quantity
        });

    for (i, candidate) in pool.candidates.iter().enumerate() {
        pool.by_field
            .entry(candidate.field_id.clone())
            .or_default()
            .push(i);
        pool.by_pair
            .entry((candidate.field_id.clone(), candidate.crop_id.clone()))
            .or_default()
            .push(i);
    }

    debug!(
        candidates = pool.len(),
        infeasible_pairs = pool.infeasible_pairs,
        "candidate pool generated"
    );
    Ok(pool)
}
