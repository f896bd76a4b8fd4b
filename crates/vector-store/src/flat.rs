use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Position of a stored vector (insertion order) and its similarity to the query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub score: f32,
}

/// Storage and nearest-neighbor lookup for the vectors of one index.
///
/// Positions are assigned in insertion order starting at zero. Callers validate
/// dimensions before pushing.
pub trait NeighborSearch: Send + Sync {
    fn dimension(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, vector: &[f32]);

    fn vector(&self, position: usize) -> &[f32];

    /// Up to `k` neighbors ranked by descending score, ties by ascending position
    fn nearest(&self, query: &[f32], k: usize) -> Vec<Neighbor>;
}

/// Exhaustive cosine scan over a contiguous buffer with cached norms
#[derive(Debug, Clone)]
pub struct FlatScan {
    dimension: usize,
    data: Vec<f32>,
    norms: Vec<f32>,
}

impl FlatScan {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
            norms: Vec::new(),
        }
    }
}

impl NeighborSearch for FlatScan {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.norms.len()
    }

    fn push(&mut self, vector: &[f32]) {
        debug_assert_eq!(vector.len(), self.dimension);
        self.data.extend_from_slice(vector);
        self.norms.push(norm(vector));
    }

    fn vector(&self, position: usize) -> &[f32] {
        let start = position * self.dimension;
        &self.data[start..start + self.dimension]
    }

    fn nearest(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        if k == 0 || self.is_empty() {
            return Vec::new();
        }

        let query_norm = norm(query);
        let mut heap: BinaryHeap<Reverse<Candidate>> = BinaryHeap::with_capacity(k + 1);

        for (position, stored_norm) in self.norms.iter().enumerate() {
            let denom = query_norm * stored_norm;
            let score = if denom == 0.0 {
                0.0
            } else {
                dot(query, self.vector(position)) / denom
            };
            let candidate = Candidate { score, position };

            if heap.len() < k {
                heap.push(Reverse(candidate));
            } else if heap
                .peek()
                .is_some_and(|Reverse(worst)| candidate > *worst)
            {
                heap.pop();
                heap.push(Reverse(candidate));
            }
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|Reverse(c)| Neighbor {
                position: c.position,
                score: c.score,
            })
            .collect()
    }
}

/// Ordered so that "greater" means "ranks higher"
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f32,
    position: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.position.cmp(&self.position))
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}
