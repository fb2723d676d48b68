// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;
use regex::RegexSet;

use heap_graph::{HeapGraph, ObjectHandle, TypeTag};

/// Capability deciding whether a ranked instance belongs to the target
/// runtime.
///
/// One implementation per supported runtime selection; the dominator
/// reduction itself never inspects instances directly.
pub trait TypePredicate {
    fn matches(&self, handle: &ObjectHandle) -> bool;
}

/// Selects the instances of a single guest runtime.
#[derive(Clone, Copy, Debug)]
pub struct TagPredicate {
    tag: TypeTag,
}

impl TagPredicate {
    pub fn new(tag: TypeTag) -> Self {
        Self { tag }
    }
}

impl TypePredicate for TagPredicate {
    fn matches(&self, handle: &ObjectHandle) -> bool {
        handle.tag == self.tag
    }
}

/// Glob-style allow/deny mask over guest type names.
///
/// One pattern per line; `*` matches any run of characters. Lines
/// prefixed with `! ` are deny rules and win over allow rules. Blank
/// lines and `# ` comments are ignored.
#[derive(Clone, Debug)]
pub struct NameMask {
    allow: RegexSet,
    deny: RegexSet,
}

impl NameMask {
    pub fn parse(text: &str) -> Result<Self> {
        let mut allow = vec![];
        let mut deny = vec![];

        for line in text.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with("# ") {
                continue;
            }

            if let Some(expr) = line.strip_prefix("! ") {
                deny.push(glob_to_regex(expr));
            } else {
                allow.push(glob_to_regex(line));
            }
        }

        Ok(Self {
            allow: RegexSet::new(allow)?,
            deny: RegexSet::new(deny)?,
        })
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        self.allow.is_match(name) && !self.deny.is_match(name)
    }

    /// A predicate matching instances whose type name passes the mask,
    /// resolved against `graph`.
    pub fn over<'g>(&'g self, graph: &'g HeapGraph) -> NamePredicate<'g> {
        NamePredicate { mask: self, graph }
    }
}

fn glob_to_regex(expr: &str) -> String {
    // Translate escaped glob wildcards into quantified regexes, anchored
    // to the whole name.
    let expr = regex::escape(expr).replace(r"\*", ".*");

    format!("^{expr}$")
}

/// [`NameMask`] applied to the type names of one graph's instances.
///
/// Instances the graph does not know are never matched.
#[derive(Clone, Copy, Debug)]
pub struct NamePredicate<'g> {
    mask: &'g NameMask,
    graph: &'g HeapGraph,
}

impl TypePredicate for NamePredicate<'_> {
    fn matches(&self, handle: &ObjectHandle) -> bool {
        match self.graph.object(handle.id) {
            Some(object) => self.mask.is_allowed(&object.type_name),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests;
