// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[macro_use]
extern crate log;

use std::collections::BTreeSet;
use std::fmt;

use anyhow::Result;

pub mod graph;
pub mod retained;
pub mod text;

pub use crate::graph::{GraphBuilder, HeapGraph, HeapObject};

/// Snapshot-assigned identifier of a heap instance.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectId(pub u64);

impl fmt::LowerHex for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// Interned identifier of the guest runtime an instance belongs to.
///
/// Tags are interned per graph; comparing tags from different graphs is
/// meaningless.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TypeTag(pub u32);

/// Read-only view of one ranked heap instance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ObjectHandle {
    pub id: ObjectId,

    /// Memory the instance keeps alive, in bytes.
    pub retained_size: u64,

    /// Guest runtime the instance belongs to.
    pub tag: TypeTag,
}

pub trait HeapQuery {
    /// The `limit` instances with the greatest retained size, in
    /// descending order.
    ///
    /// Ties are broken by ascending object id, so repeated calls against
    /// an unchanged heap return identical sequences.
    fn ranked_by_retained_size(&self, limit: usize) -> Result<Vec<ObjectHandle>>;

    /// Reduce `set` to the members not transitively retained by another
    /// member of `set`.
    ///
    /// The result is a subset of the input and is empty only for an empty
    /// input. An id unknown to the heap is an error.
    fn dominator_roots_of(&self, set: &BTreeSet<ObjectId>) -> Result<BTreeSet<ObjectId>>;
}
