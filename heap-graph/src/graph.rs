// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Result};
use fixedbitset::FixedBitSet;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::retained;
use crate::{HeapQuery, ObjectHandle, ObjectId, TypeTag};

/// One heap instance, sizes included.
#[derive(Clone, Debug)]
pub struct HeapObject {
    pub id: ObjectId,
    pub tag: TypeTag,
    pub type_name: String,
    pub shallow_size: u64,
    pub retained_size: u64,
}

impl HeapObject {
    pub fn handle(&self) -> ObjectHandle {
        ObjectHandle {
            id: self.id,
            retained_size: self.retained_size,
            tag: self.tag,
        }
    }
}

/// Accumulates objects, references and GC roots, then freezes them into a
/// queryable [`HeapGraph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    objects: Vec<PendingObject>,
    references: Vec<(ObjectId, ObjectId)>,
    gc_roots: BTreeSet<ObjectId>,
}

#[derive(Debug)]
struct PendingObject {
    id: ObjectId,
    tag: String,
    type_name: String,
    shallow_size: u64,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance. Ids must be unique across the snapshot.
    pub fn object(&mut self, id: ObjectId, tag: &str, type_name: &str, shallow_size: u64) {
        self.objects.push(PendingObject {
            id,
            tag: tag.to_owned(),
            type_name: type_name.to_owned(),
            shallow_size,
        });
    }

    /// Record that `from` holds a reference to `to`.
    pub fn reference(&mut self, from: ObjectId, to: ObjectId) {
        self.references.push((from, to));
    }

    /// Mark `id` as referenced directly from the collector's root set.
    pub fn gc_root(&mut self, id: ObjectId) {
        self.gc_roots.insert(id);
    }

    /// Validate the recorded snapshot and compute the dominator relation
    /// and retained sizes.
    ///
    /// Fails on duplicate object ids and on references or roots naming
    /// unknown ids. Duplicate edges and repeated root declarations are
    /// tolerated.
    pub fn build(self) -> Result<HeapGraph> {
        let mut index = BTreeMap::new();
        for (ix, object) in self.objects.iter().enumerate() {
            if index.insert(object.id, ix).is_some() {
                bail!("duplicate object id: {:x}", object.id);
            }
        }

        let edge_bound = self.references.len() + self.gc_roots.len();
        let mut graph = DiGraph::<(), ()>::with_capacity(self.objects.len() + 1, edge_bound);

        let nodes: Vec<NodeIndex> = (0..self.objects.len()).map(|_| graph.add_node(())).collect();
        let super_root = graph.add_node(());

        for &id in &self.gc_roots {
            let Some(&ix) = index.get(&id) else {
                bail!("gc root names an unknown object id: {:x}", id);
            };
            graph.add_edge(super_root, nodes[ix], ());
        }

        for &(from, to) in &self.references {
            let (Some(&from_ix), Some(&to_ix)) = (index.get(&from), index.get(&to)) else {
                bail!("reference names an unknown object id: {:x} -> {:x}", from, to);
            };
            graph.add_edge(nodes[from_ix], nodes[to_ix], ());
        }

        let shallow: Vec<u64> = self.objects.iter().map(|o| o.shallow_size).collect();
        let analysis = retained::analyze(&graph, super_root, &shallow);

        let mut tags: Vec<String> = Vec::new();
        let mut objects = Vec::with_capacity(self.objects.len());
        for (ix, pending) in self.objects.into_iter().enumerate() {
            let tag = intern_tag(&mut tags, &pending.tag);
            objects.push(HeapObject {
                id: pending.id,
                tag,
                type_name: pending.type_name,
                shallow_size: pending.shallow_size,
                retained_size: analysis.retained[ix],
            });
        }

        debug!("built heap graph: {} objects, {} runtimes", objects.len(), tags.len());

        Ok(HeapGraph {
            objects,
            index,
            tags,
            idom: analysis.idom,
        })
    }
}

fn intern_tag(tags: &mut Vec<String>, name: &str) -> TypeTag {
    if let Some(pos) = tags.iter().position(|t| t == name) {
        return TypeTag(pos as u32);
    }

    tags.push(name.to_owned());
    TypeTag((tags.len() - 1) as u32)
}

/// Immutable object graph for one heap snapshot.
///
/// The dominator relation and retained sizes are fixed at build time;
/// every query is read-only.
#[derive(Clone, Debug)]
pub struct HeapGraph {
    objects: Vec<HeapObject>,
    index: BTreeMap<ObjectId, usize>,
    tags: Vec<String>,
    idom: Vec<Option<usize>>,
}

impl HeapGraph {
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn object(&self, id: ObjectId) -> Option<&HeapObject> {
        self.index.get(&id).map(|&ix| &self.objects[ix])
    }

    pub fn objects(&self) -> impl Iterator<Item = &HeapObject> {
        self.objects.iter()
    }

    /// Instances of one guest runtime, in registration order.
    pub fn objects_with_tag(&self, tag: TypeTag) -> impl Iterator<Item = &HeapObject> {
        self.objects.iter().filter(move |o| o.tag == tag)
    }

    /// Interned tag for a runtime name, if any object carries it.
    pub fn tag(&self, name: &str) -> Option<TypeTag> {
        self.tags.iter().position(|t| t == name).map(|ix| TypeTag(ix as u32))
    }

    pub fn tag_name(&self, tag: TypeTag) -> Option<&str> {
        self.tags.get(tag.0 as usize).map(String::as_str)
    }

    pub fn retained_size(&self, id: ObjectId) -> Option<u64> {
        self.object(id).map(|o| o.retained_size)
    }

    /// The object that immediately dominates `id`, if any.
    ///
    /// Objects owned straight from the root set, and objects unreachable
    /// from it, have none.
    pub fn immediate_dominator(&self, id: ObjectId) -> Option<ObjectId> {
        let ix = *self.index.get(&id)?;
        self.idom[ix].map(|parent| self.objects[parent].id)
    }

    /// Whether `a` transitively retains `b`.
    pub fn retains(&self, a: ObjectId, b: ObjectId) -> bool {
        let (Some(&a_ix), Some(&b_ix)) = (self.index.get(&a), self.index.get(&b)) else {
            return false;
        };

        let mut current = b_ix;
        while let Some(parent) = self.idom[current] {
            if parent == a_ix {
                return true;
            }
            current = parent;
        }

        false
    }

    fn index_of(&self, id: ObjectId) -> Result<usize> {
        match self.index.get(&id) {
            Some(&ix) => Ok(ix),
            None => bail!("unknown object id: {:x}", id),
        }
    }
}

impl HeapQuery for HeapGraph {
    fn ranked_by_retained_size(&self, limit: usize) -> Result<Vec<ObjectHandle>> {
        let mut order: Vec<usize> = (0..self.objects.len()).collect();
        order.sort_by(|&a, &b| {
            let (a, b) = (&self.objects[a], &self.objects[b]);
            b.retained_size.cmp(&a.retained_size).then(a.id.cmp(&b.id))
        });
        order.truncate(limit);

        Ok(order.into_iter().map(|ix| self.objects[ix].handle()).collect())
    }

    fn dominator_roots_of(&self, set: &BTreeSet<ObjectId>) -> Result<BTreeSet<ObjectId>> {
        let mut members = FixedBitSet::with_capacity(self.objects.len());
        for &id in set {
            members.insert(self.index_of(id)?);
        }

        let mut roots = BTreeSet::new();
        for &id in set {
            let mut ix = self.index_of(id)?;

            let mut dominated = false;
            while let Some(parent) = self.idom[ix] {
                if members.contains(parent) {
                    dominated = true;
                    break;
                }
                ix = parent;
            }

            if !dominated {
                roots.insert(id);
            }
        }

        Ok(roots)
    }
}
