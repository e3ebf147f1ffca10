//! Probe query construction and splitting.

use lo_core::{DimensionName, ExploreName, ModelName};

/// A probe over a set of dimensions in one explore.
///
/// The dimension list preserves the model's declaration order and is never
/// empty; splits are contiguous, so repeated runs descend through identical
/// subsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationQuery {
    pub model: ModelName,
    pub explore: ExploreName,
    dimensions: Vec<DimensionName>,
}

impl ValidationQuery {
    /// Create a probe query.
    ///
    /// # Panics
    ///
    /// Panics if `dimensions` is empty. An empty probe is a caller bug,
    /// distinct from any remote failure.
    pub fn new(model: ModelName, explore: ExploreName, dimensions: Vec<DimensionName>) -> Self {
        assert!(
            !dimensions.is_empty(),
            "a validation query must name at least one dimension"
        );
        Self {
            model,
            explore,
            dimensions,
        }
    }

    /// The probed dimensions, in order.
    pub fn dimensions(&self) -> &[DimensionName] {
        &self.dimensions
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    /// Always false; the constructor rejects empty dimension lists.
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Whether this probe selects a single dimension.
    pub fn is_singleton(&self) -> bool {
        self.dimensions.len() == 1
    }

    /// Dimension names as plain strings for query submission.
    pub fn field_names(&self) -> Vec<String> {
        self.dimensions.iter().map(|d| d.to_string()).collect()
    }

    /// Split into contiguous halves of sizes ceil(n/2) and floor(n/2).
    ///
    /// # Panics
    ///
    /// Panics when the query has a single dimension; a singleton is already
    /// a minimal group.
    pub fn split(&self) -> (Self, Self) {
        assert!(
            self.dimensions.len() > 1,
            "cannot split a single-dimension query"
        );
        let mid = self.dimensions.len().div_ceil(2);
        let (left, right) = self.dimensions.split_at(mid);
        (
            Self::new(self.model.clone(), self.explore.clone(), left.to_vec()),
            Self::new(self.model.clone(), self.explore.clone(), right.to_vec()),
        )
    }

    /// Split into independent subqueries of at most `chunk_size` dimensions.
    ///
    /// Most explores fit one chunk. Oversized dimension sets would exceed
    /// the platform's generated-query limits, so each chunk is probed and
    /// isolated on its own.
    pub fn chunked(&self, chunk_size: usize) -> Vec<Self> {
        self.dimensions
            .chunks(chunk_size.max(1))
            .map(|chunk| Self::new(self.model.clone(), self.explore.clone(), chunk.to_vec()))
            .collect()
    }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
