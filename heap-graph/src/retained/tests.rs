// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use pretty_assertions::assert_eq;

use super::*;

fn analyzed(shallow: &[u64], roots: &[usize], refs: &[(usize, usize)]) -> DominatorAnalysis {
    let mut graph = DiGraph::<(), ()>::new();

    let nodes: Vec<NodeIndex> = (0..shallow.len()).map(|_| graph.add_node(())).collect();
    let super_root = graph.add_node(());

    for &root in roots {
        graph.add_edge(super_root, nodes[root], ());
    }

    for &(from, to) in refs {
        graph.add_edge(nodes[from], nodes[to], ());
    }

    analyze(&graph, super_root, shallow)
}

#[test]
fn chain_accumulates_into_head() {
    // 0 -> 1 -> 2, rooted at 0.
    let analysis = analyzed(&[8, 16, 24], &[0], &[(0, 1), (1, 2)]);

    assert_eq!(analysis.idom, vec![None, Some(0), Some(1)]);
    assert_eq!(analysis.retained, vec![48, 40, 24]);
}

#[test]
fn diamond_joins_under_fork() {
    // 0 -> {1, 2} -> 3: neither branch owns the join point.
    let analysis = analyzed(&[10, 20, 30, 40], &[0], &[(0, 1), (0, 2), (1, 3), (2, 3)]);

    assert_eq!(analysis.idom, vec![None, Some(0), Some(0), Some(0)]);
    assert_eq!(analysis.retained, vec![100, 20, 30, 40]);
}

#[test]
fn exclusive_branch_keeps_its_subtree() {
    // 0 -> 1 -> 3 and 0 -> 2: only 1 reaches 3.
    let analysis = analyzed(&[10, 20, 30, 40], &[0], &[(0, 1), (0, 2), (1, 3)]);

    assert_eq!(analysis.idom, vec![None, Some(0), Some(0), Some(1)]);
    assert_eq!(analysis.retained, vec![100, 60, 30, 40]);
}

#[test]
fn unreachable_object_retains_itself() {
    // 2 has no path from the root set.
    let analysis = analyzed(&[8, 16, 99], &[0], &[(0, 1)]);

    assert_eq!(analysis.idom, vec![None, Some(0), None]);
    assert_eq!(analysis.retained, vec![24, 16, 99]);
}

#[test]
fn object_reached_from_two_roots_has_no_object_dominator() {
    // Both 0 and 1 are gc roots and both reference 2.
    let analysis = analyzed(&[10, 10, 50], &[0, 1], &[(0, 2), (1, 2)]);

    assert_eq!(analysis.idom, vec![None, None, None]);
    assert_eq!(analysis.retained, vec![10, 10, 50]);
}

#[test]
fn cycle_is_owned_by_its_entry() {
    // 0 -> 1 <-> 2, rooted at 0.
    let analysis = analyzed(&[4, 8, 16], &[0], &[(0, 1), (1, 2), (2, 1)]);

    assert_eq!(analysis.idom, vec![None, Some(0), Some(1)]);
    assert_eq!(analysis.retained, vec![28, 24, 16]);
}

#[test]
fn empty_graph() {
    let analysis = analyzed(&[], &[], &[]);

    assert_eq!(analysis.idom, Vec::<Option<usize>>::new());
    assert_eq!(analysis.retained, Vec::<u64>::new());
}
