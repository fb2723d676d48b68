// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeSet;

use heap_graph::{HeapQuery, ObjectHandle, ObjectId};

use crate::predicate::TypePredicate;
use crate::SummaryError;

/// Default width of the candidate window handed to the dominance
/// computation.
///
/// Dominance queries are far more expensive than the ranked retrieval, so
/// the window stays bounded even on heaps with millions of objects.
pub const DEFAULT_MAX_SEARCH_INSTANCES: usize = 10_000;

/// A dominator root picked for display.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DominatorRoot {
    pub handle: ObjectHandle,
}

impl DominatorRoot {
    pub fn id(&self) -> ObjectId {
        self.handle.id
    }

    pub fn retained_size(&self) -> u64 {
        self.handle.retained_size
    }
}

/// Find the top-level retainers of one runtime's objects: the members of
/// the capped retained-size ranking that match `predicate` and are not
/// transitively retained by another matching member.
///
/// The returned roots are ordered by descending retained size (ties by
/// ascending id). Callers comparing results should treat them as a set.
///
/// The ranking is windowed *before* the type filter and the dominance
/// reduction: a matching object ranked below `max_search_instances` is
/// never discovered, and dropped non-matching candidates are not replaced
/// from deeper in the ranking. The result is therefore not a complete
/// per-runtime ranking on heaps where matches are sparse among the
/// biggest objects.
///
/// # Errors
///
/// [`SummaryError::InvalidSearchCap`] for a zero cap;
/// [`SummaryError::DataUnavailable`] if the heap cannot answer, in which
/// case no partial result is returned.
pub fn find_dominator_roots(
    heap: &dyn HeapQuery,
    max_search_instances: usize,
    predicate: &dyn TypePredicate,
) -> Result<Vec<DominatorRoot>, SummaryError> {
    if max_search_instances == 0 {
        return Err(SummaryError::InvalidSearchCap);
    }

    let candidates = ranked_candidates(heap, max_search_instances)?;
    let subset = typed_subset(candidates, predicate);

    reduce_to_roots(heap, subset)
}

/// Stage 1: the capped retained-size ranking.
fn ranked_candidates(
    heap: &dyn HeapQuery,
    max_search_instances: usize,
) -> Result<Vec<ObjectHandle>, SummaryError> {
    let candidates = heap
        .ranked_by_retained_size(max_search_instances)
        .map_err(SummaryError::DataUnavailable)?;

    debug!("{} candidates in the search window", candidates.len());

    Ok(candidates)
}

/// Stage 2: order-preserving filter to the target runtime.
fn typed_subset(candidates: Vec<ObjectHandle>, predicate: &dyn TypePredicate) -> Vec<ObjectHandle> {
    candidates
        .into_iter()
        .filter(|handle| predicate.matches(handle))
        .collect()
}

/// Stage 3: drop members retained by another member; wrap the survivors.
fn reduce_to_roots(
    heap: &dyn HeapQuery,
    subset: Vec<ObjectHandle>,
) -> Result<Vec<DominatorRoot>, SummaryError> {
    if subset.is_empty() {
        return Ok(Vec::new());
    }

    let ids: BTreeSet<ObjectId> = subset.iter().map(|handle| handle.id).collect();
    let roots = heap
        .dominator_roots_of(&ids)
        .map_err(SummaryError::DataUnavailable)?;

    debug!("{} dominator roots among {} typed candidates", roots.len(), ids.len());

    // The subset is already in ranking order; keeping it preserves the
    // descending-retained-size presentation.
    Ok(subset
        .into_iter()
        .filter(|handle| roots.contains(&handle.id))
        .map(|handle| DominatorRoot { handle })
        .collect())
}
