//! `civic timeline`: reconstructed history of one request.

use crate::output::{OutputMode, coded, pretty_kv, pretty_section, render_mode};
use clap::Args;
use civic_core::EngineConfig;
use civic_core::timeline::TimelineStep;
use civic_core::views::{RequestListView, request_list_spec};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// Snapshot JSON file.
    pub snapshot: PathBuf,

    /// Request id.
    pub id: u64,
}

#[derive(Debug, Serialize)]
struct TimelineOutput {
    request_id: u64,
    document_type: String,
    status: String,
    steps: Vec<TimelineStep>,
}

pub fn run_timeline(
    args: &TimelineArgs,
    output: OutputMode,
    config: &EngineConfig,
) -> anyhow::Result<()> {
    let snapshot = super::read_snapshot(&args.snapshot)?;
    let mut view = RequestListView::new(request_list_spec());
    view.load(snapshot.document_requests());

    let steps = view
        .view_timeline(args.id, &config.timeline)
        .map_err(|err| coded(err.code(), err))?;
    let request = view
        .find(args.id)
        .ok_or_else(|| anyhow::anyhow!("request {} vanished from the list", args.id))?;

    let result = TimelineOutput {
        request_id: request.id,
        document_type: request.document_type_name.clone(),
        status: request.status.to_string(),
        steps,
    };
    render_mode(output, &result, render_text, render_pretty)
}

fn render_text(result: &TimelineOutput, w: &mut dyn Write) -> io::Result<()> {
    for step in &result.steps {
        writeln!(
            w,
            "{}\t{}\t{}",
            step.status,
            step.timestamp.format("%Y-%m-%dT%H:%M:%S"),
            if step.is_synthesized { "approx" } else { "exact" }
        )?;
    }
    Ok(())
}

fn render_pretty(result: &TimelineOutput, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(
        w,
        &format!("Request #{} · {}", result.request_id, result.document_type),
    )?;
    for step in &result.steps {
        writeln!(w, "● {:<18} {}", step.label, step.display_time())?;
        if let Some(reason) = &step.reason {
            pretty_kv(w, "  Reason", reason)?;
        }
        for entry in step.detail_panel.iter().flatten() {
            pretty_kv(w, &format!("  {}", entry.key), &entry.value)?;
        }
    }
    Ok(())
}
