// Dweve KNNPerf - k-NN Performance Tool
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Exact in-process nearest-neighbour index.

use crate::adapters::VectorIndex;
use crate::error::{PerfError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const SERVICE: &str = "flat";

/// Distance space of an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceType {
    /// Euclidean distance.
    #[default]
    L2,
    /// One minus cosine similarity.
    CosineSimil,
    /// Negated dot product.
    InnerProduct,
}

impl SpaceType {
    /// Distance between two equally sized vectors. Smaller is closer.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            SpaceType::L2 => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
            SpaceType::CosineSimil => cosine_distance(dot(a, b), norm(a) * norm(b)),
            SpaceType::InnerProduct => -dot(a, b),
        }
    }
}

impl fmt::Display for SpaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpaceType::L2 => write!(f, "l2"),
            SpaceType::CosineSimil => write!(f, "cosinesimil"),
            SpaceType::InnerProduct => write!(f, "innerproduct"),
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f32]) -> f32 {
    dot(a, a).sqrt()
}

fn cosine_distance(product: f32, norms: f32) -> f32 {
    if norms == 0.0 {
        1.0
    } else {
        1.0 - product / norms
    }
}

/// One query hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    /// Insertion position of the vector.
    pub id: usize,
    /// Distance to the query in the index space.
    pub distance: f32,
}

/// Brute-force index scanning every stored vector per query.
///
/// Building caches the norm of every stored vector so that cosine queries
/// only compute one dot product per candidate.
#[derive(Debug, Default)]
pub struct FlatIndex {
    layout: Option<(SpaceType, usize)>,
    vectors: Vec<Vec<f32>>,
    /// Per-vector norms, present once built and dropped on any mutation.
    norms: Option<Vec<f32>>,
}

impl FlatIndex {
    /// Creates an uninitialised handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Returns `true` if no vectors are stored.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    fn layout(&self) -> Result<(SpaceType, usize)> {
        self.layout
            .ok_or_else(|| PerfError::adapter(SERVICE, "index is not initialised"))
    }
}

fn check_dimension(vector: &[f32], dimension: usize) -> Result<()> {
    if vector.len() != dimension {
        return Err(PerfError::adapter(
            SERVICE,
            format!(
                "vector has dimension {}, index expects {}",
                vector.len(),
                dimension
            ),
        ));
    }
    Ok(())
}

impl VectorIndex for FlatIndex {
    fn init(&mut self, space: SpaceType, dimension: usize) -> Result<()> {
        if dimension == 0 {
            return Err(PerfError::adapter(SERVICE, "dimension must be at least 1"));
        }
        self.layout = Some((space, dimension));
        self.vectors.clear();
        self.norms = None;
        Ok(())
    }

    fn add_batch(&mut self, vectors: &[Vec<f32>]) -> Result<usize> {
        let (_, dimension) = self.layout()?;
        for vector in vectors {
            check_dimension(vector, dimension)?;
        }
        self.vectors.extend_from_slice(vectors);
        self.norms = None;
        Ok(self.vectors.len())
    }

    fn build(&mut self) -> Result<()> {
        self.layout()?;
        self.norms = Some(self.vectors.iter().map(|v| norm(v)).collect());
        Ok(())
    }

    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let (space, dimension) = self.layout()?;
        let norms = self
            .norms
            .as_deref()
            .ok_or_else(|| PerfError::adapter(SERVICE, "index must be built before querying"))?;
        check_dimension(vector, dimension)?;

        let query_norm = norm(vector);
        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .iter()
            .zip(norms)
            .enumerate()
            .map(|(id, (stored, stored_norm))| Neighbor {
                id,
                distance: match space {
                    SpaceType::CosineSimil => {
                        cosine_distance(dot(vector, stored), query_norm * stored_norm)
                    }
                    _ => space.distance(vector, stored),
                },
            })
            .collect();
        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.id.cmp(&b.id))
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }

    fn clear(&mut self) {
        self.vectors = Vec::new();
        self.norms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built(space: SpaceType, vectors: &[Vec<f32>]) -> FlatIndex {
        let mut index = FlatIndex::new();
        index.init(space, vectors[0].len()).unwrap();
        index.add_batch(vectors).unwrap();
        index.build().unwrap();
        index
    }

    #[test]
    fn test_l2_orders_by_distance() {
        let index = built(
            SpaceType::L2,
            &[vec![0.0, 0.0], vec![3.0, 4.0], vec![1.0, 0.0]],
        );
        let hits = index.query(&[0.0, 0.0], 2).unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0], Neighbor { id: 0, distance: 0.0 });
        assert_eq!(hits[1], Neighbor { id: 2, distance: 1.0 });
    }

    #[test]
    fn test_l2_distance_is_euclidean() {
        assert_eq!(SpaceType::L2.distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
    }

    #[test]
    fn test_cosine_ignores_magnitude() {
        let index = built(
            SpaceType::CosineSimil,
            &[vec![0.0, 5.0], vec![10.0, 0.0]],
        );
        let hits = index.query(&[1.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].id, 1);
        assert!(hits[0].distance.abs() < 1e-6);
    }

    #[test]
    fn test_build_caches_norms() {
        let mut index = built(SpaceType::CosineSimil, &[vec![3.0, 4.0], vec![0.0, 2.0]]);
        assert_eq!(index.norms.as_deref(), Some(&[5.0, 2.0][..]));

        let hits = index.query(&[4.0, 3.0], 2).unwrap();
        let expected = SpaceType::CosineSimil.distance(&[4.0, 3.0], &[3.0, 4.0]);
        assert_eq!(hits[0].id, 0);
        assert!((hits[0].distance - expected).abs() < 1e-6);

        index.add_batch(&[vec![1.0, 0.0]]).unwrap();
        assert!(index.norms.is_none());
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(SpaceType::CosineSimil.distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[test]
    fn test_inner_product_prefers_largest_dot() {
        let index = built(
            SpaceType::InnerProduct,
            &[vec![1.0, 0.0], vec![4.0, 0.0], vec![-2.0, 0.0]],
        );
        let hits = index.query(&[1.0, 0.0], 3).unwrap();
        let ids: Vec<usize> = hits.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 0, 2]);
        assert_eq!(hits[0].distance, -4.0);
    }

    #[test]
    fn test_ties_break_by_id() {
        let index = built(SpaceType::L2, &[vec![1.0], vec![-1.0]]);
        let hits = index.query(&[0.0], 2).unwrap();
        assert_eq!(hits[0].id, 0);
        assert_eq!(hits[1].id, 1);
    }

    #[test]
    fn test_k_larger_than_index() {
        let index = built(SpaceType::L2, &[vec![1.0]]);
        assert_eq!(index.query(&[0.0], 10).unwrap().len(), 1);
    }

    #[test]
    fn test_query_before_build_fails() {
        let mut index = FlatIndex::new();
        index.init(SpaceType::L2, 1).unwrap();
        index.add_batch(&[vec![1.0]]).unwrap();

        let err = index.query(&[1.0], 1).unwrap_err();
        assert!(err.to_string().contains("must be built"));
    }

    #[test]
    fn test_add_before_init_fails() {
        let mut index = FlatIndex::new();
        assert!(index.add_batch(&[vec![1.0]]).is_err());
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = FlatIndex::new();
        index.init(SpaceType::L2, 2).unwrap();
        let err = index.add_batch(&[vec![1.0]]).unwrap_err();
        assert!(matches!(err, PerfError::Adapter { .. }));
    }

    #[test]
    fn test_add_after_build_requires_rebuild() {
        let mut index = built(SpaceType::L2, &[vec![1.0]]);
        index.add_batch(&[vec![2.0]]).unwrap();
        assert!(index.query(&[0.0], 1).is_err());
        index.build().unwrap();
        assert_eq!(index.query(&[0.0], 5).unwrap().len(), 2);
    }

    #[test]
    fn test_clear_releases_vectors() {
        let mut index = built(SpaceType::L2, &[vec![1.0], vec![2.0]]);
        index.clear();
        assert!(index.is_empty());
        assert!(index.query(&[0.0], 1).is_err());
    }

    #[test]
    fn test_space_type_names() {
        let parsed: SpaceType = serde_yaml::from_str("cosinesimil").unwrap();
        assert_eq!(parsed, SpaceType::CosineSimil);
        assert_eq!(SpaceType::InnerProduct.to_string(), "innerproduct");
        assert_eq!(SpaceType::default(), SpaceType::L2);
    }
}
