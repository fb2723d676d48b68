// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! # heap-summary
//!
//! Summary analyses for guest-runtime heap fragments: given a heap
//! snapshot holding objects from one or more embedded-language runtimes
//! (R, JS, ...), compute the bounded lists a summary view presents,
//! including the dominator roots of a runtime's object set.
//!
//! The dominator search is a three-stage reduction over the
//! [`HeapQuery`](heap_graph::HeapQuery) boundary:
//!
//! ```text
//!  ranked_by_retained_size(cap)      TypePredicate          dominator_roots_of
//! ┌───────────────┐           ┌───────────────┐           ┌───────────────────┐
//! │ CandidateSet  │ ────────► │ TypedSubset   │ ────────► │ DominatorRootSet  │
//! │ top-K, ranked │  filter   │ one runtime   │  reduce   │ no member retains │
//! └───────────────┘           └───────────────┘           │ another member    │
//!                                                         └───────────────────┘
//! ```
//!
//! The candidate window is capped *before* the dominance computation, so
//! matching objects ranked below the cap are never discovered. That is a
//! deliberate trade of completeness for interactive responsiveness, not a
//! defect; see [`find_dominator_roots`] for the fine print.

#[macro_use]
extern crate log;

use thiserror::Error;

pub mod dominators;
pub mod predicate;
pub mod summary;

pub use crate::dominators::{find_dominator_roots, DominatorRoot, DEFAULT_MAX_SEARCH_INSTANCES};
pub use crate::predicate::{NameMask, TagPredicate, TypePredicate};
pub use crate::summary::ObjectsSummary;

#[derive(Debug, Error)]
pub enum SummaryError {
    /// The candidate search cap must be positive; callers may not rely on
    /// a silent default.
    #[error("search cap must be positive")]
    InvalidSearchCap,

    /// The heap could not answer a query. No partial results are kept.
    #[error("heap query failed: {0}")]
    DataUnavailable(anyhow::Error),
}
