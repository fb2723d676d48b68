// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;
use pretty_assertions::assert_eq;

use heap_graph::{GraphBuilder, ObjectHandle, ObjectId};

use super::*;

fn handle(id: u64, tag: TypeTag) -> ObjectHandle {
    ObjectHandle {
        id: ObjectId(id),
        retained_size: 0,
        tag,
    }
}

#[test]
fn tag_predicate_matches_only_its_runtime() {
    let predicate = TagPredicate::new(TypeTag(0));

    assert!(predicate.matches(&handle(1, TypeTag(0))));
    assert!(!predicate.matches(&handle(1, TypeTag(1))));
}

#[test]
fn name_mask_globs() -> Result<()> {
    let mask = NameMask::parse("vector\npair*\n")?;

    assert!(mask.is_allowed("vector"));
    assert!(mask.is_allowed("pairlist"));
    assert!(!mask.is_allowed("environment"));
    // Anchored: "vector" must be the whole name.
    assert!(!mask.is_allowed("vector3"));

    Ok(())
}

#[test]
fn name_mask_deny_wins() -> Result<()> {
    let mask = NameMask::parse("*\n! internal*\n")?;

    assert!(mask.is_allowed("vector"));
    assert!(!mask.is_allowed("internal_frame"));

    Ok(())
}

#[test]
fn name_mask_skips_blanks_and_comments() -> Result<()> {
    let mask = NameMask::parse("# guest collections\n\nvector\n")?;

    assert!(mask.is_allowed("vector"));
    assert!(!mask.is_allowed("guest"));

    Ok(())
}

#[test]
fn empty_mask_allows_nothing() -> Result<()> {
    let mask = NameMask::parse("")?;

    assert!(!mask.is_allowed("vector"));

    Ok(())
}

#[test]
fn name_predicate_resolves_against_the_graph() -> Result<()> {
    let mut builder = GraphBuilder::new();
    builder.object(ObjectId(1), "r", "vector", 8);
    builder.object(ObjectId(2), "r", "environment", 8);
    builder.gc_root(ObjectId(1));
    builder.gc_root(ObjectId(2));
    let graph = builder.build()?;

    let mask = NameMask::parse("vector\n")?;
    let predicate = mask.over(&graph);

    let r = graph.tag("r").expect("r tag");
    assert!(predicate.matches(&handle(1, r)));
    assert!(!predicate.matches(&handle(2, r)));
    // Unknown to the graph: never matched.
    assert!(!predicate.matches(&handle(99, r)));

    assert_eq!(graph.object_count(), 2);

    Ok(())
}
