//! Rolling time series of run statistics for the external chart.

use std::collections::VecDeque;

use super::types::Statistics;

/// One chart sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeriesPoint {
	pub time_step: u32,
	pub infected: usize,
	pub healthy: usize,
}

/// The last `capacity` samples, strictly increasing in time step.
#[derive(Clone, Debug, PartialEq)]
pub struct StatsSeries {
	points: VecDeque<SeriesPoint>,
	capacity: usize,
}

impl Default for StatsSeries {
	fn default() -> Self {
		Self::new(Self::DEFAULT_CAPACITY)
	}
}

impl StatsSeries {
	pub const DEFAULT_CAPACITY: usize = 50;

	/// An empty series. A capacity of zero is treated as one.
	pub fn new(capacity: usize) -> Self {
		let capacity = capacity.max(1);
		Self {
			points: VecDeque::with_capacity(capacity),
			capacity,
		}
	}

	/// Replace everything with the all-healthy baseline at step 0.
	pub fn reset(&mut self, total_nodes: usize) {
		self.points.clear();
		self.points.push_back(SeriesPoint {
			time_step: 0,
			infected: 0,
			healthy: total_nodes,
		});
	}

	/// Append a sample if its time step is newer than the last one.
	pub fn push(&mut self, stats: &Statistics) -> bool {
		if self.points.back().is_some_and(|p| stats.time_step <= p.time_step) {
			return false;
		}
		if self.points.len() == self.capacity {
			self.points.pop_front();
		}
		self.points.push_back(SeriesPoint {
			time_step: stats.time_step,
			infected: stats.infected_count,
			healthy: stats.healthy_count,
		});
		true
	}

	pub fn points(&self) -> impl ExactSizeIterator<Item = &SeriesPoint> + '_ {
		self.points.iter()
	}

	pub fn len(&self) -> usize {
		self.points.len()
	}

	pub fn is_empty(&self) -> bool {
		self.points.is_empty()
	}

	pub fn last(&self) -> Option<&SeriesPoint> {
		self.points.back()
	}
}
