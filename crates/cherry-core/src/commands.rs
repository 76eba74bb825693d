use chrono::{DateTime, Timelike, Utc};
use clap::ValueEnum;
use tracing::{info, instrument, warn};

use crate::activity::{ActivityDraft, Hour};
use crate::analytics::compute_analytics;
use crate::cli::{ActivityCommand, Command};
use crate::config::Config;
use crate::datetime::{day_key, format_day_key, parse_day_key, project_timezone, to_project_date};
use crate::render::Renderer;
use crate::snapshot::SnapshotStore;
use crate::view::{ListFilter, SortKey, SortOrder, View, counts_by_view, filter_tasks, sort_tasks};

#[instrument(skip(store, cfg, renderer, command, now))]
pub fn dispatch(
    store: &SnapshotStore,
    cfg: &Config,
    renderer: &mut Renderer,
    command: Command,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    match command {
        Command::List {
            view,
            status,
            priority,
            sort,
            order,
            json,
        } => {
            let filter = ListFilter { status, priority };
            cmd_list(store, cfg, renderer, view, filter, sort, order, json, now)
        }
        Command::Counts { json } => cmd_counts(store, renderer, json, now),
        Command::Analytics { json } => cmd_analytics(store, renderer, json, now),
        Command::Export { view } => cmd_export(store, view, now),
        Command::Activity { command } => match command {
            ActivityCommand::Show { date } => cmd_activity_show(store, renderer, date, now),
            ActivityCommand::Set {
                date,
                hour,
                activity,
                category,
                mood,
                productivity,
                notes,
            } => {
                let draft = ActivityDraft {
                    activity,
                    category,
                    mood,
                    productivity,
                    notes,
                };
                cmd_activity_set(store, date, hour, draft, now)
            }
            ActivityCommand::Remove { date, hour } => cmd_activity_remove(store, date, hour, now),
        },
    }
}

/// Picks the view for a bare `list`: the CLI flag wins, then the
/// configured default, then today.
fn effective_view(requested: Option<View>, cfg: &Config) -> View {
    if let Some(view) = requested {
        return view;
    }

    if let Some(raw) = cfg.default_view.as_deref() {
        match View::from_str(raw, true) {
            Ok(view) => return view,
            Err(_) => {
                warn!(default_view = raw, "ignoring unknown default_view from config");
            }
        }
    }

    View::Today
}

#[allow(clippy::too_many_arguments)]
#[instrument(skip(store, cfg, renderer, now))]
fn cmd_list(
    store: &SnapshotStore,
    cfg: &Config,
    renderer: &mut Renderer,
    view: Option<View>,
    filter: ListFilter,
    sort: SortKey,
    order: SortOrder,
    json: bool,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command list");

    let tasks = store.load_tasks()?;
    let view = effective_view(view, cfg);

    let mut selected = filter_tasks(&tasks, view, now);
    selected.retain(|task| filter.matches(task));
    sort_tasks(&mut selected, sort, order);

    if json {
        println!("{}", serde_json::to_string_pretty(&selected)?);
        return Ok(());
    }

    renderer.print_task_list(view, &selected, now)
}

#[instrument(skip(store, renderer, now))]
fn cmd_counts(
    store: &SnapshotStore,
    renderer: &mut Renderer,
    json: bool,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command counts");

    let tasks = store.load_tasks()?;
    let counts = counts_by_view(&tasks, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
        return Ok(());
    }

    renderer.print_counts(&counts)
}

#[instrument(skip(store, renderer, now))]
fn cmd_analytics(
    store: &SnapshotStore,
    renderer: &mut Renderer,
    json: bool,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command analytics");

    let tasks = store.load_tasks()?;
    let snapshot = compute_analytics(&tasks, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    renderer.print_analytics(&snapshot)
}

#[instrument(skip(store, now))]
fn cmd_export(
    store: &SnapshotStore,
    view: Option<View>,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command export");

    let tasks = store.load_tasks()?;
    let view = view.unwrap_or(View::All);
    let selected = filter_tasks(&tasks, view, now);

    println!("{}", serde_json::to_string_pretty(&selected)?);
    Ok(())
}

fn resolve_date_key(date: Option<&str>, now: DateTime<Utc>) -> anyhow::Result<String> {
    match date {
        Some(raw) => Ok(format_day_key(parse_day_key(raw, now)?)),
        None => Ok(format_day_key(to_project_date(now))),
    }
}

#[instrument(skip(store, renderer, now))]
fn cmd_activity_show(
    store: &SnapshotStore,
    renderer: &mut Renderer,
    date: Option<String>,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command activity show");

    let key = resolve_date_key(date.as_deref(), now)?;
    let log = store.load_activity_log(&key)?;

    // Mark the in-progress hour only when looking at today's grid.
    let current_hour = if key == day_key(now) {
        u8::try_from(now.with_timezone(project_timezone()).hour()).ok()
    } else {
        None
    };

    renderer.print_activity_grid(&log, current_hour)
}

#[instrument(skip(store, draft, now))]
fn cmd_activity_set(
    store: &SnapshotStore,
    date: Option<String>,
    hour: u8,
    draft: ActivityDraft,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!(hour, "command activity set");

    let key = resolve_date_key(date.as_deref(), now)?;
    let hour = Hour::new(hour)?;

    let log = store.load_activity_log(&key)?;
    let next = log.upsert(hour, draft)?;
    store.save_activity_log(&next)?;

    println!("Recorded {} for {key}", crate::render::format_hour(hour.get()));
    Ok(())
}

#[instrument(skip(store, now))]
fn cmd_activity_remove(
    store: &SnapshotStore,
    date: Option<String>,
    hour: u8,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!(hour, "command activity remove");

    let key = resolve_date_key(date.as_deref(), now)?;
    let hour = Hour::new(hour)?;

    let log = store.load_activity_log(&key)?;
    let next = log.remove(hour)?;
    store.save_activity_log(&next)?;

    println!("Cleared {} for {key}", crate::render::format_hour(hour.get()));
    Ok(())
}
