//! `civic groups`: a resident's requests grouped by document type.

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use clap::Args;
use civic_core::EngineConfig;
use civic_core::grouping::{group_for_resident, group_requests};
use civic_core::timeline::{RequestTimeline, reconstruct_history};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct GroupsArgs {
    /// Snapshot JSON file.
    pub snapshot: PathBuf,

    /// Only requests filed by this resident.
    #[arg(long)]
    pub resident: Option<u64>,

    /// Only this document type ("all" for every type).
    #[arg(long = "type", value_name = "DOCUMENT_TYPE")]
    pub document_type: Option<String>,

    /// Include the reconstructed timeline of every request in each group.
    #[arg(long)]
    pub history: bool,
}

#[derive(Debug, Serialize)]
struct GroupOutput {
    document_type: String,
    active_id: u64,
    active_status: String,
    active_label: &'static str,
    settled: bool,
    request_ids: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    history: Option<Vec<RequestTimeline>>,
}

pub fn run_groups(args: &GroupsArgs, output: OutputMode, config: &EngineConfig) -> anyhow::Result<()> {
    let snapshot = super::read_snapshot(&args.snapshot)?;
    let requests = snapshot.document_requests();
    let filter = args.document_type.as_deref();
    let groups = match args.resident {
        Some(resident) => group_for_resident(&requests, resident, filter),
        None => group_requests(&requests, filter),
    };

    let result: Vec<GroupOutput> = groups
        .iter()
        .map(|group| {
            let active = group.active();
            GroupOutput {
                document_type: group.document_type_name.clone(),
                active_id: active.id,
                active_status: active.status.to_string(),
                active_label: active.status.label(),
                settled: group.is_settled(),
                request_ids: group.history.iter().map(|r| r.id).collect(),
                history: args
                    .history
                    .then(|| reconstruct_history(group, &config.timeline)),
            }
        })
        .collect();

    render_mode(output, result.as_slice(), render_text, render_pretty)
}

fn render_text(groups: &[GroupOutput], w: &mut dyn Write) -> io::Result<()> {
    for group in groups {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            group.document_type,
            group.active_id,
            group.active_status,
            group.request_ids.len()
        )?;
    }
    Ok(())
}

fn render_pretty(groups: &[GroupOutput], w: &mut dyn Write) -> io::Result<()> {
    if groups.is_empty() {
        return writeln!(w, "No requests found.");
    }
    for group in groups {
        pretty_section(w, &group.document_type)?;
        pretty_kv(w, "Status", group.active_label)?;
        pretty_kv(w, "Latest request", format!("#{}", group.active_id))?;
        pretty_kv(w, "Requests", group.request_ids.len().to_string())?;
        for timeline in group.history.iter().flatten() {
            writeln!(w, "  #{} {}", timeline.request_id, timeline.status)?;
            for step in &timeline.steps {
                writeln!(w, "    ● {:<18} {}", step.label, step.display_time())?;
            }
        }
        writeln!(w)?;
    }
    Ok(())
}
