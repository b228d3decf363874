//! `civic status`: how a status string is understood and presented.

use crate::output::{OutputMode, coded, pretty_kv, pretty_section, render_mode};
use clap::Args;
use civic_core::Status;
use civic_core::model::status::presentation_for;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Status text as stored by the portal (e.g. "claimed", "for review").
    pub text: String,

    /// Fail instead of falling back to the pending presentation.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    input: String,
    status: Option<Status>,
    label: &'static str,
    icon: &'static str,
    color_class: &'static str,
    terminal: bool,
    next: Vec<Status>,
}

pub fn run_status(args: &StatusArgs, output: OutputMode) -> anyhow::Result<()> {
    let parsed = match args.text.parse::<Status>() {
        Ok(status) => Some(status),
        Err(err) if args.strict => return Err(coded(err.code(), err)),
        Err(_) => None,
    };
    let meta = presentation_for(&args.text);
    let effective = parsed.unwrap_or_else(|| Status::parse_lenient(&args.text));

    let result = StatusOutput {
        input: args.text.clone(),
        status: parsed,
        label: meta.label,
        icon: meta.icon,
        color_class: meta.color_class,
        terminal: effective.is_terminal(),
        next: Status::ALL
            .into_iter()
            .filter(|target| effective.can_transition_to(*target).is_ok())
            .collect(),
    };
    render_mode(output, &result, render_text, render_pretty)
}

fn render_text(result: &StatusOutput, w: &mut dyn Write) -> io::Result<()> {
    let status = result.status.map_or("unknown", Status::as_str);
    let next: Vec<&str> = result.next.iter().map(|s| s.as_str()).collect();
    writeln!(w, "{status}\t{}\t{}", result.label, next.join(","))
}

fn render_pretty(result: &StatusOutput, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("\"{}\"", result.input))?;
    pretty_kv(
        w,
        "Status",
        result
            .status
            .map_or_else(|| "unknown (shown as pending)".to_string(), |s| s.to_string()),
    )?;
    pretty_kv(w, "Label", result.label)?;
    pretty_kv(w, "Icon", result.icon)?;
    pretty_kv(w, "Class", result.color_class)?;
    let next = if result.next.is_empty() {
        "none (terminal)".to_string()
    } else {
        result
            .next
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    pretty_kv(w, "Next", next)
}
