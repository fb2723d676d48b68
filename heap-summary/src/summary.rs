// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Ranked object lists for one runtime's heap fragment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use heap_graph::HeapGraph;

use crate::dominators::{find_dominator_roots, DEFAULT_MAX_SEARCH_INSTANCES};
use crate::predicate::TagPredicate;
use crate::SummaryError;

/// Ranked entry for one guest type.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TypeEntry {
    pub type_name: String,
    pub instances: u64,
    pub shallow_size: u64,
}

/// Ranked entry for one instance.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ObjectEntry {
    pub id: u64,
    pub type_name: String,
    pub retained_size: u64,
}

/// The object lists a summary view presents for one heap fragment.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ObjectsSummary {
    pub runtime: String,
    pub total_instances: u64,
    pub total_shallow_size: u64,
    pub types_by_count: Vec<TypeEntry>,
    pub types_by_size: Vec<TypeEntry>,
    pub objects_by_size: Vec<ObjectEntry>,
    pub dominators_by_retained_size: Vec<ObjectEntry>,
}

impl ObjectsSummary {
    /// Compute the summary for the `runtime` fragment of `graph`, with
    /// each list truncated to `top` entries.
    ///
    /// A runtime the graph has never seen yields an empty summary, not an
    /// error: the fragment simply holds no objects.
    pub fn compute(graph: &HeapGraph, runtime: &str, top: usize) -> Result<Self, SummaryError> {
        let Some(tag) = graph.tag(runtime) else {
            return Ok(Self {
                runtime: runtime.to_owned(),
                ..Self::default()
            });
        };

        let mut total_instances = 0;
        let mut total_shallow_size = 0;
        let mut types: BTreeMap<&str, TypeEntry> = BTreeMap::new();

        for object in graph.objects_with_tag(tag) {
            total_instances += 1;
            total_shallow_size += object.shallow_size;

            let entry = types
                .entry(object.type_name.as_str())
                .or_insert_with(|| TypeEntry {
                    type_name: object.type_name.clone(),
                    ..TypeEntry::default()
                });
            entry.instances += 1;
            entry.shallow_size += object.shallow_size;
        }

        let mut types_by_count: Vec<TypeEntry> = types.values().cloned().collect();
        types_by_count.sort_by(|a, b| {
            b.instances
                .cmp(&a.instances)
                .then_with(|| a.type_name.cmp(&b.type_name))
        });
        types_by_count.truncate(top);

        let mut types_by_size: Vec<TypeEntry> = types.into_values().collect();
        types_by_size.sort_by(|a, b| {
            b.shallow_size
                .cmp(&a.shallow_size)
                .then_with(|| a.type_name.cmp(&b.type_name))
        });
        types_by_size.truncate(top);

        let mut fragment: Vec<_> = graph.objects_with_tag(tag).collect();
        fragment.sort_by(|a, b| b.retained_size.cmp(&a.retained_size).then(a.id.cmp(&b.id)));
        fragment.truncate(top);
        let objects_by_size = fragment
            .into_iter()
            .map(|object| ObjectEntry {
                id: object.id.0,
                type_name: object.type_name.clone(),
                retained_size: object.retained_size,
            })
            .collect();

        let roots = find_dominator_roots(graph, DEFAULT_MAX_SEARCH_INSTANCES, &TagPredicate::new(tag))?;
        let dominators_by_retained_size = roots
            .iter()
            .take(top)
            .map(|root| ObjectEntry {
                id: root.id().0,
                type_name: graph
                    .object(root.id())
                    .map(|object| object.type_name.clone())
                    .unwrap_or_default(),
                retained_size: root.retained_size(),
            })
            .collect();

        Ok(Self {
            runtime: runtime.to_owned(),
            total_instances,
            total_shallow_size,
            types_by_count,
            types_by_size,
            objects_by_size,
            dominators_by_retained_size,
        })
    }
}
