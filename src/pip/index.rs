//! Per-state region index.

use hashbrown::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::models::Region;

/// Regions grouped by owning state, most populous first.
///
/// Built once and never mutated, so it can be read from any number of
/// threads without locking.
#[derive(Debug, Default)]
pub struct RegionIndex {
    by_state: HashMap<String, Vec<Arc<Region>>>,
    len: usize,
}

impl RegionIndex {
    /// Group regions by state and order each group by descending weight.
    ///
    /// The sort is stable: regions of equal weight keep their input order.
    pub fn build(regions: Vec<Region>) -> Self {
        info!("Building region index for {} regions...", regions.len());

        let len = regions.len();
        let mut by_state: HashMap<String, Vec<Arc<Region>>> = HashMap::new();
        for region in regions {
            by_state
                .entry(region.state.clone())
                .or_default()
                .push(Arc::new(region));
        }

        for group in by_state.values_mut() {
            group.sort_by(|a, b| b.weight.cmp(&a.weight));
        }

        info!("Region index built: {} regions across {} states", len, by_state.len());
        for (state, group) in &by_state {
            debug!("  {}: {} regions", state, group.len());
        }

        Self { by_state, len }
    }

    /// Regions of a state in search order. Unknown states yield an empty slice.
    pub fn regions_in(&self, state: &str) -> &[Arc<Region>] {
        self.by_state.get(state).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Indexed state names, sorted
    pub fn states(&self) -> Vec<&str> {
        let mut states: Vec<&str> = self.by_state.keys().map(String::as_str).collect();
        states.sort_unstable();
        states
    }

    pub fn state_count(&self) -> usize {
        self.by_state.len()
    }

    /// Total number of indexed regions
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
