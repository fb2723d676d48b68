// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use petgraph::algo::dominators;
use petgraph::graph::{DiGraph, NodeIndex};

/// Per-object results of the dominator pass.
///
/// Indices refer to objects in insertion order; the synthetic super-root
/// never appears.
#[derive(Clone, Debug)]
pub struct DominatorAnalysis {
    /// Immediate dominator of each object. `None` for objects dominated
    /// only by the super-root and for objects unreachable from it.
    pub idom: Vec<Option<usize>>,

    /// Retained size of each object: shallow size plus the retained
    /// sizes of its dominator-tree children. An unreachable object
    /// retains only itself.
    pub retained: Vec<u64>,
}

/// Compute immediate dominators for `graph` rooted at `super_root`, then
/// fold shallow sizes up the dominator tree into retained sizes.
///
/// Object nodes must be the first `shallow.len()` node indices of
/// `graph`, in insertion order; `super_root` comes after them.
pub fn analyze(graph: &DiGraph<(), ()>, super_root: NodeIndex, shallow: &[u64]) -> DominatorAnalysis {
    let object_count = shallow.len();
    let super_ix = object_count;

    let doms = dominators::simple_fast(graph, super_root);

    let mut idom = vec![None; object_count];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); object_count + 1];

    for ix in 0..object_count {
        match doms.immediate_dominator(NodeIndex::new(ix)) {
            Some(parent) if parent == super_root => {
                children[super_ix].push(ix);
            }
            Some(parent) => {
                idom[ix] = Some(parent.index());
                children[parent.index()].push(ix);
            }
            None => {
                // Unreachable from the root set; nothing retains it.
            }
        }
    }

    // Reverse preorder visits every node after all of its descendants,
    // so each subtree total is complete before it flows into a parent.
    let mut order = Vec::with_capacity(object_count);
    let mut stack = children[super_ix].clone();
    while let Some(ix) = stack.pop() {
        order.push(ix);
        stack.extend_from_slice(&children[ix]);
    }

    let mut retained: Vec<u64> = shallow.to_vec();
    for &ix in order.iter().rev() {
        if let Some(parent) = idom[ix] {
            retained[parent] = retained[parent].saturating_add(retained[ix]);
        }
    }

    DominatorAnalysis { idom, retained }
}

#[cfg(test)]
mod tests;
