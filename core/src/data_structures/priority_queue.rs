//! Active-vertex queue for push-relabel vertex selection
//!
//! This module implements the working set of active vertices (vertices other
//! than source and target holding positive excess). Two selection rules are
//! supported:
//!
//! - [`SelectionRule::HighestLabel`]: a bucket queue indexed by height. The
//!   head is always a vertex of maximum height; within one height, vertices
//!   are served in insertion order.
//! - [`SelectionRule::Fifo`]: a single insertion-ordered list whose head is
//!   processed until its excess is drained.
//!
//! # Complexity
//! Insertion and head removal are O(1); locating the next non-empty bucket
//! after a removal is amortized against the height increases that filled the
//! higher buckets, so the total scan cost is O(|V|²) over a run.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::NodeId;
use crate::data_structures::residual::DistanceLabel;

/// Active vertex selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRule {
    /// Always process a vertex of maximum height
    #[default]
    HighestLabel,
    /// Process vertices in the order they became active
    Fifo,
}

#[derive(Debug, Clone)]
enum Storage {
    Buckets {
        buckets: Vec<VecDeque<NodeId>>,
        highest: DistanceLabel,
    },
    Fifo(VecDeque<NodeId>),
}

/// Ordered set of active vertices owned by one engine
#[derive(Debug, Clone)]
pub struct ActiveVertexQueue {
    storage: Storage,
    queued: Vec<bool>,
    len: usize,
}

impl ActiveVertexQueue {
    pub fn new(rule: SelectionRule, vertex_count: usize) -> Self {
        let storage = match rule {
            SelectionRule::HighestLabel => Storage::Buckets {
                buckets: vec![VecDeque::new(); vertex_count.max(1) * 2],
                highest: 0,
            },
            SelectionRule::Fifo => Storage::Fifo(VecDeque::with_capacity(vertex_count)),
        };
        Self {
            storage,
            queued: vec![false; vertex_count],
            len: 0,
        }
    }

    pub fn rule(&self) -> SelectionRule {
        match self.storage {
            Storage::Buckets { .. } => SelectionRule::HighestLabel,
            Storage::Fifo(_) => SelectionRule::Fifo,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, v: NodeId) -> bool {
        self.queued.get(v.0).copied().unwrap_or(false)
    }

    /// Inserts `v` at height `height`; returns `false` if it was already queued
    pub fn insert(&mut self, v: NodeId, height: DistanceLabel) -> bool {
        if v.0 >= self.queued.len() {
            self.queued.resize(v.0 + 1, false);
        }
        if self.queued[v.0] {
            return false;
        }
        match &mut self.storage {
            Storage::Buckets { buckets, highest } => {
                Self::bucket_at(buckets, height).push_back(v);
                if self.len == 0 || height > *highest {
                    *highest = height;
                }
            }
            Storage::Fifo(list) => list.push_back(v),
        }
        self.queued[v.0] = true;
        self.len += 1;
        true
    }

    /// The vertex the engine must process next
    pub fn head(&self) -> Option<NodeId> {
        match &self.storage {
            Storage::Buckets { buckets, highest } => buckets.get(*highest).and_then(|b| b.front().copied()),
            Storage::Fifo(list) => list.front().copied(),
        }
    }

    /// Removes and returns the head
    pub fn pop_head(&mut self) -> Option<NodeId> {
        let v = match &mut self.storage {
            Storage::Buckets { buckets, highest } => {
                let v = buckets.get_mut(*highest)?.pop_front()?;
                while *highest > 0 && buckets[*highest].is_empty() {
                    *highest -= 1;
                }
                v
            }
            Storage::Fifo(list) => list.pop_front()?,
        };
        self.queued[v.0] = false;
        self.len -= 1;
        Some(v)
    }

    /// Re-keys the head after its height changed, keeping it at the front of its new bucket
    pub fn relabel_head(&mut self, height: DistanceLabel) {
        if let Storage::Buckets { buckets, highest } = &mut self.storage {
            let Some(v) = buckets.get_mut(*highest).and_then(VecDeque::pop_front) else {
                return;
            };
            Self::bucket_at(buckets, height).push_front(v);
            if height > *highest {
                *highest = height;
            } else {
                while *highest > 0 && buckets[*highest].is_empty() {
                    *highest -= 1;
                }
            }
        }
    }

    pub fn clear(&mut self) {
        match &mut self.storage {
            Storage::Buckets { buckets, highest } => {
                buckets.iter_mut().for_each(VecDeque::clear);
                *highest = 0;
            }
            Storage::Fifo(list) => list.clear(),
        }
        self.queued.iter_mut().for_each(|q| *q = false);
        self.len = 0;
    }

    fn bucket_at(buckets: &mut Vec<VecDeque<NodeId>>, height: DistanceLabel) -> &mut VecDeque<NodeId> {
        if height >= buckets.len() {
            buckets.resize(height + 1, VecDeque::new());
        }
        &mut buckets[height]
    }
}
