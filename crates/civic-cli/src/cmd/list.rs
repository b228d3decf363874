//! `civic list`: query an administrative list over a snapshot.

use crate::output::{OutputMode, coded, pretty_rule, render_mode};
use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use civic_core::EngineConfig;
use civic_core::model::{DocumentRequest, Resident, UserAccount};
use civic_core::query::{Record, SortDirection};
use civic_core::views::{
    Keyed, ListView, request_list_spec, resident_list_spec, user_access_list_spec,
};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListKind {
    Requests,
    Residents,
    Users,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Which list to query.
    #[arg(value_enum)]
    pub kind: ListKind,

    /// Snapshot JSON file.
    pub snapshot: PathBuf,

    /// Free-text search.
    #[arg(short, long)]
    pub search: Option<String>,

    /// Categorical filter as KEY=VALUE (repeatable; VALUE "all" clears it).
    #[arg(short, long = "filter", value_name = "KEY=VALUE")]
    pub filters: Vec<String>,

    /// Sort column.
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort direction: asc or desc.
    #[arg(long)]
    pub direction: Option<SortDirection>,

    /// Page to show (1-based; clamped to the last page).
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    /// Rows per page; must be one of `query.page_size_options`.
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Reference date for resident ages (defaults to today).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub as_of: Option<NaiveDate>,
}

/// Column layout of a listed record.
trait Row {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

impl Row for DocumentRequest {
    fn headers() -> &'static [&'static str] {
        &["ID", "RESIDENT", "DOCUMENT", "STATUS", "FEE", "SUBMITTED"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.requester_name.clone().unwrap_or_default(),
            self.document_type_name.clone(),
            self.status.label().to_string(),
            self.fee.to_string(),
            self.submitted_at.format("%Y-%m-%d %H:%M").to_string(),
        ]
    }
}

impl Row for Resident {
    fn headers() -> &'static [&'static str] {
        &["ID", "NAME", "GENDER", "PUROK", "BIRTH DATE", "STATUS"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.full_name(),
            self.gender.clone().unwrap_or_default(),
            self.purok.clone().unwrap_or_default(),
            self.birth_date.map(|d| d.to_string()).unwrap_or_default(),
            if self.is_active { "active" } else { "inactive" }.to_string(),
        ]
    }
}

impl Row for UserAccount {
    fn headers() -> &'static [&'static str] {
        &["ID", "USERNAME", "NAME", "ROLE", "STATUS", "LAST LOGIN"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.username.clone(),
            self.full_name.clone(),
            self.role.clone(),
            if self.is_active { "active" } else { "inactive" }.to_string(),
            self.last_login
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        ]
    }
}

#[derive(Debug, Serialize)]
struct ListPage<R> {
    list: &'static str,
    total_count: usize,
    total_pages: usize,
    current_page: usize,
    page_size: usize,
    items: Vec<R>,
}

pub fn run_list(args: &ListArgs, output: OutputMode, config: &EngineConfig) -> anyhow::Result<()> {
    let snapshot = super::read_snapshot(&args.snapshot)?;
    match args.kind {
        ListKind::Requests => {
            let view = ListView::new(request_list_spec());
            let page = query(view, snapshot.document_requests(), args, config, config.query.default_page_size)?;
            render_page(output, &page)
        }
        ListKind::Residents => {
            let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
            let view = ListView::new(resident_list_spec(as_of));
            let page = query(
                view,
                snapshot.residents,
                args,
                config,
                config.query.resident_page_size,
            )?;
            render_page(output, &page)
        }
        ListKind::Users => {
            let view = ListView::new(user_access_list_spec());
            let page = query(view, snapshot.users, args, config, config.query.default_page_size)?;
            render_page(output, &page)
        }
    }
}

fn query<R: Record + Keyed + Clone>(
    mut view: ListView<R>,
    records: Vec<R>,
    args: &ListArgs,
    config: &EngineConfig,
    default_page_size: usize,
) -> anyhow::Result<ListPage<R>> {
    view.load(records);
    let state = view.state_mut();
    state.set_page_size(default_page_size.max(1));
    if let Some(search) = &args.search {
        state.set_search(search.as_str());
    }
    for raw in &args.filters {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("filter '{raw}' must look like KEY=VALUE"))?;
        state.set_filter(key.trim(), value);
    }
    if let Some(field) = &args.sort {
        state.set_sort(field.as_str(), args.direction.unwrap_or(SortDirection::Asc));
    } else if let Some(direction) = args.direction {
        let field = state.sort_field().to_string();
        state.set_sort(field, direction);
    }
    if let Some(size) = args.page_size {
        view.choose_page_size(size, &config.query)
            .map_err(|err| coded(err.code(), err))?;
    }
    view.state_mut().set_page(args.page);
    view.spec()
        .validate(view.state())
        .map_err(|err| coded(err.code(), err))?;

    let name = view.spec().name();
    let result = view.page();
    Ok(ListPage {
        list: name,
        total_count: result.total_count,
        total_pages: result.total_pages,
        current_page: result.current_page,
        page_size: result.page_size,
        items: result.items.into_iter().cloned().collect(),
    })
}

fn render_page<R: Row + Serialize>(output: OutputMode, page: &ListPage<R>) -> anyhow::Result<()> {
    render_mode(output, page, render_text::<R>, render_pretty::<R>)
}

fn render_text<R: Row>(page: &ListPage<R>, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{}", R::headers().join("\t"))?;
    for item in &page.items {
        writeln!(w, "{}", item.cells().join("\t"))?;
    }
    Ok(())
}

fn render_pretty<R: Row>(page: &ListPage<R>, w: &mut dyn Write) -> io::Result<()> {
    if page.items.is_empty() {
        writeln!(w, "No {} match the current search and filters.", page.list)?;
        return Ok(());
    }

    let rows: Vec<Vec<String>> = page.items.iter().map(Row::cells).collect();
    let widths: Vec<usize> = R::headers()
        .iter()
        .enumerate()
        .map(|(col, header)| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let headers: Vec<String> = R::headers().iter().map(ToString::to_string).collect();
    writeln!(w, "{}", line(headers.as_slice()))?;
    pretty_rule(w)?;
    for row in &rows {
        writeln!(w, "{}", line(row.as_slice()))?;
    }
    pretty_rule(w)?;
    writeln!(
        w,
        "Page {} of {} · {} {}",
        page.current_page,
        page.total_pages.max(1),
        page.total_count,
        page.list
    )
}
