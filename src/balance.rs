use std::fmt;

use num_traits::ToPrimitive;

use crate::algorithms::{check_part_count, Error};
use crate::PartId;

/// Weight unit used to balance parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BalanceMode {
    /// Every vertex (or forest node) weighs 1.
    Vertex,

    /// Vertices weigh their degree; forest nodes weigh their partial spanning
    /// tree weight.
    #[default]
    Edge,
}

/// Immutable description of a partitioning run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionConfig {
    /// Number of parts requested.
    pub num_parts: usize,

    /// Whether parts are balanced by edge incidence or by vertex count.
    pub mode: BalanceMode,

    /// Multiplicative allowance (>= 1.0) over a perfectly even split.
    pub balance_factor: f64,
}

impl PartitionConfig {
    pub fn new(num_parts: usize, mode: BalanceMode, balance_factor: f64) -> Result<Self, Error> {
        let config = PartitionConfig { num_parts, mode, balance_factor };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        check_part_count(self.num_parts)?;
        if !(self.balance_factor >= 1.0) {
            return Err(Error::InvalidBalanceFactor(self.balance_factor));
        }
        Ok(())
    }

    /// Hard per-part capacity for a run whose total weight is `total_weight`.
    pub fn max_component(&self, total_weight: u64) -> u64 {
        max_component(total_weight, self.num_parts, self.balance_factor)
    }
}

impl Default for PartitionConfig {
    fn default() -> Self {
        PartitionConfig {
            num_parts: 2,
            mode: BalanceMode::Edge,
            balance_factor: 1.03,
        }
    }
}

/// `floor((total_weight / num_parts) * balance_factor)`, with the even split
/// rounded down before the slack is applied.
///
/// `total_weight` must be expressed in the same unit as every weight later
/// compared against the result.
pub fn max_component(total_weight: u64, num_parts: usize, balance_factor: f64) -> u64 {
    debug_assert!(num_parts > 0);
    let even_split = total_weight / num_parts as u64;
    (even_split as f64 * balance_factor).floor() as u64
}

/// Running per-part totals of a single partitioning run.
///
/// Parts are opened in index order: every part below `high_water()` has been
/// opened, none at or above it has received weight yet. Scans that only care
/// about opened parts plus one fresh part rely on this.
#[derive(Debug, Clone)]
pub struct PartSizes {
    sizes: Vec<u64>,
    high_water: usize,
    max_component: u64,
}

impl PartSizes {
    /// A fixed set of `num_parts` empty parts.
    pub fn bounded(num_parts: usize, max_component: u64) -> Self {
        PartSizes {
            sizes: vec![0; num_parts],
            high_water: 0,
            max_component,
        }
    }

    /// No parts yet; parts are appended with [`PartSizes::open`].
    pub fn growable(max_component: u64) -> Self {
        PartSizes {
            sizes: Vec::new(),
            high_water: 0,
            max_component,
        }
    }

    /// Append a new empty part and return its index.
    pub fn open(&mut self) -> usize {
        self.sizes.push(0);
        self.high_water = self.sizes.len();
        self.high_water - 1
    }

    pub fn size(&self, part: usize) -> u64 {
        self.sizes[part]
    }

    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    pub fn max_component(&self) -> u64 {
        self.max_component
    }

    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Opened parts followed by the first unopened one, if any.
    pub fn candidates(&self) -> std::ops::Range<usize> {
        0..(self.high_water + 1).min(self.sizes.len())
    }

    pub fn fits(&self, part: usize, weight: u64) -> bool {
        self.sizes[part] + weight <= self.max_component
    }

    /// First opened part, in opening order, that can take `weight`.
    pub fn first_fit(&self, weight: u64) -> Option<usize> {
        (0..self.high_water).find(|&part| self.fits(part, weight))
    }

    /// Most recently opened part that can take `weight`.
    pub fn last_fit(&self, weight: u64) -> Option<usize> {
        (0..self.high_water).rev().find(|&part| self.fits(part, weight))
    }

    pub fn add(&mut self, part: usize, weight: u64) {
        assert!(part <= self.high_water, "part {part} opened out of order");
        self.sizes[part] += weight;
        if part == self.high_water && self.sizes[part] > 0 {
            self.high_water += 1;
        }
    }
}

/// Calculates the total weight for each part of a given partition.
pub fn compute_parts_load(partition: &[Option<PartId>], num_parts: usize, weights: &[u64]) -> Vec<u64> {
    let mut loads = vec![0; num_parts];

    for (part, w) in partition.iter().zip(weights) {
        if let Some(part) = part.map(usize::from).filter(|&p| p < num_parts) {
            loads[part] += w;
        }
    }

    loads
}

/// Compute imbalance after passing part loads.
pub fn compute_imbalance_from_part_loads(num_parts: usize, part_loads: &[u64]) -> f64 {
    let total_weight: u64 = part_loads.iter().sum();

    let ideal_part_weight = total_weight.to_f64().unwrap_or(0.0) / num_parts.to_f64().unwrap_or(1.0);
    if ideal_part_weight == 0.0 {
        return 0.0;
    }

    part_loads
        .iter()
        .map(|part_weight| {
            let part_weight: f64 = part_weight.to_f64().unwrap_or(0.0);
            (part_weight - ideal_part_weight) / ideal_part_weight
        })
        .fold(0.0f64, |acc, dev| acc.max(dev))
}

/// Compute the imbalance of the given partition.
pub fn imbalance(num_parts: usize, partition: &[Option<PartId>], weights: &[u64]) -> f64 {
    if num_parts == 0 {
        return 0.0;
    }

    let part_loads = compute_parts_load(partition, num_parts, weights);

    compute_imbalance_from_part_loads(num_parts, &part_loads)
}

/// Number of parts referenced by an assignment: one more than its largest id.
pub fn parts_used(partition: &[Option<PartId>]) -> usize {
    partition
        .iter()
        .flatten()
        .max()
        .map_or(0, |&part| usize::from(part) + 1)
}

/// Verify that every element is assigned and that no part exceeds
/// `max_component`. Returns the per-part loads.
pub(crate) fn check_balance(partition: &[Option<PartId>], weights: &[u64], max_component: u64) -> Result<Vec<u64>, Error> {
    if let Some(vertex) = partition.iter().position(Option::is_none) {
        return Err(Error::Unassigned { vertex });
    }
    let loads = compute_parts_load(partition, parts_used(partition), weights);
    if let Some((part, &load)) = loads.iter().enumerate().find(|(_, &load)| load > max_component) {
        return Err(Error::CapacityExceeded { part, load, max_component });
    }
    Ok(loads)
}

/// Short human readable description of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSummary {
    pub parts_created: usize,
    pub first_part: usize,
    pub second_part: usize,
}

impl PartitionSummary {
    pub fn new(partition: &[Option<PartId>]) -> Self {
        let count = |wanted: PartId| partition.iter().filter(|&&part| part == Some(wanted)).count();
        PartitionSummary {
            parts_created: parts_used(partition),
            first_part: count(0),
            second_part: count(1),
        }
    }
}

impl fmt::Display for PartitionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Actually created {} partitions.", self.parts_created)?;
        write!(f, "First two partition sizes: {} and {}", self.first_part, self.second_part)
    }
}
