// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fs;
use std::io::stdout;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser};

use heap_graph::{text, HeapGraph};
use heap_summary::{find_dominator_roots, ObjectsSummary, TagPredicate, DEFAULT_MAX_SEARCH_INSTANCES};

#[derive(Debug, Parser)]
enum Opt {
    /// Print a JSON summary of one runtime's heap fragment.
    DumpSummary(SummaryOpt),

    /// Print the dominator roots of one runtime's heap fragment, one
    /// `id retained-size type` line per root.
    DumpDominators(DominatorsOpt),
}

#[derive(Args, Debug)]
struct SummaryOpt {
    /// Text graph description to load.
    graph_path: PathBuf,

    /// Runtime tag to summarize, e.g. `r`.
    runtime: String,

    /// Entries to keep per ranked list.
    #[arg(long, default_value_t = 5)]
    top: usize,
}

#[derive(Args, Debug)]
struct DominatorsOpt {
    /// Text graph description to load.
    graph_path: PathBuf,

    /// Runtime tag to reduce, e.g. `r`.
    runtime: String,

    /// Width of the ranked candidate window.
    #[arg(long, default_value_t = DEFAULT_MAX_SEARCH_INSTANCES)]
    max_search: usize,
}

fn main() -> Result<()> {
    env_logger::init();

    let opt = Opt::parse();

    match opt {
        Opt::DumpSummary(opts) => dump_summary(opts)?,
        Opt::DumpDominators(opts) => dump_dominators(opts)?,
    };

    Ok(())
}

fn load_graph(path: &Path) -> Result<HeapGraph> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("unable to read graph_path: {}", path.display()))?;

    text::parse(&data)
}

fn dump_summary(opts: SummaryOpt) -> Result<()> {
    let graph = load_graph(&opts.graph_path)?;
    let summary = ObjectsSummary::compute(&graph, &opts.runtime, opts.top)?;

    serde_json::to_writer_pretty(stdout(), &summary)?;
    println!();

    Ok(())
}

fn dump_dominators(opts: DominatorsOpt) -> Result<()> {
    let graph = load_graph(&opts.graph_path)?;

    let Some(tag) = graph.tag(&opts.runtime) else {
        // Nothing from this runtime in the snapshot; print nothing.
        return Ok(());
    };

    let predicate = TagPredicate::new(tag);
    let roots = find_dominator_roots(&graph, opts.max_search, &predicate)?;

    for root in roots {
        let type_name = graph
            .object(root.id())
            .map(|object| object.type_name.as_str())
            .unwrap_or("?");

        println!("{:x} {} {}", root.id(), root.retained_size(), type_name);
    }

    Ok(())
}
