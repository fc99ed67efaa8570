use anyhow::{Context, anyhow, bail};
use tracing::{debug, info, instrument};

use crate::cli::Command;
use crate::dialog::{NameDialog, Response};
use crate::persistence::{ListStore, TaskStore};
use crate::render::Renderer;
use crate::sidebar::{ListSidebar, RowId};

/// Runs one command against a loaded sidebar, the way the host window
/// would feed it clicks and dialog answers.
#[instrument(skip(sidebar, renderer))]
pub fn dispatch<S: ListStore + TaskStore>(
    sidebar: &mut ListSidebar<S>,
    renderer: &Renderer,
    command: Command,
) -> anyhow::Result<()> {
    debug!(rows = sidebar.len(), "dispatching command");

    match command {
        Command::Lists => cmd_lists(sidebar, renderer),
        Command::Add { name } => cmd_add(sidebar, &name),
        Command::Rename { list, new_name } => cmd_rename(sidebar, &list, &new_name),
        Command::Delete { list } => cmd_delete(sidebar, &list),
        Command::Show { list } => cmd_show(sidebar, renderer, list.as_deref()),
        Command::Task { list, text } => cmd_task(sidebar, &list, &text),
        Command::Done { list, index } => cmd_done(sidebar, &list, index),
        Command::Menu => renderer.print_menu(),
    }
}

fn cmd_lists<S: ListStore + TaskStore>(
    sidebar: &mut ListSidebar<S>,
    renderer: &Renderer,
) -> anyhow::Result<()> {
    sidebar.reload_views().context("failed to load tasks")?;
    renderer.print_sidebar(sidebar)
}

fn cmd_add<S: ListStore>(sidebar: &mut ListSidebar<S>, name: &str) -> anyhow::Result<()> {
    let mut dialog = sidebar.add_list_dialog();
    let response = answer(&mut dialog, name)?;
    let row = sidebar
        .respond_add_list(dialog, response)?
        .ok_or_else(|| anyhow!("list was not added"))?;

    let label = label_of(sidebar, row);
    info!(row = %row, name = %label, "command add");
    println!("Added list '{label}'.");
    Ok(())
}

fn cmd_rename<S: ListStore>(
    sidebar: &mut ListSidebar<S>,
    list: &str,
    new_name: &str,
) -> anyhow::Result<()> {
    let row = find_row(sidebar, list)?;
    let mut dialog = sidebar.rename_list_dialog(row)?;
    let response = answer(&mut dialog, new_name)?;
    sidebar
        .respond_rename_list(row, dialog, response)
        .with_context(|| format!("failed to rename '{list}'"))?;

    println!("Renamed list '{list}' to '{}'.", label_of(sidebar, row));
    Ok(())
}

fn cmd_delete<S: ListStore>(sidebar: &mut ListSidebar<S>, list: &str) -> anyhow::Result<()> {
    let row = find_row(sidebar, list)?;
    // Deleting goes through the selected row, as clicking the list first would.
    sidebar.select_row(row)?;
    sidebar
        .delete_list(row)
        .with_context(|| format!("failed to delete '{list}'"))?;

    println!("Deleted list '{list}'.");
    if let Some(entry) = sidebar.selected_entry() {
        println!("Now showing '{}'.", entry.display_name());
    }
    Ok(())
}

fn cmd_show<S: ListStore + TaskStore>(
    sidebar: &mut ListSidebar<S>,
    renderer: &Renderer,
    list: Option<&str>,
) -> anyhow::Result<()> {
    if let Some(list) = list {
        let row = find_row(sidebar, list)?;
        sidebar.select_row(row)?;
    }

    let Some(page) = sidebar.reload_visible()? else {
        println!("No lists yet.");
        return Ok(());
    };
    renderer.print_page(page)
}

fn cmd_task<S: ListStore + TaskStore>(
    sidebar: &mut ListSidebar<S>,
    list: &str,
    text: &str,
) -> anyhow::Result<()> {
    let text = text.trim();
    if text.is_empty() {
        bail!("task text cannot be empty");
    }

    let row = find_row(sidebar, list)?;
    sidebar.select_row(row)?;
    let uid = list_uid(sidebar, row)?;
    sidebar.store_mut().add_task(uid, text)?;

    info!(list = %list, "command task");
    println!("Added task to '{list}'.");
    Ok(())
}

fn cmd_done<S: ListStore + TaskStore>(
    sidebar: &mut ListSidebar<S>,
    list: &str,
    index: usize,
) -> anyhow::Result<()> {
    let row = find_row(sidebar, list)?;
    sidebar.select_row(row)?;
    let uid = list_uid(sidebar, row)?;

    let tasks = sidebar.store().tasks_for(uid)?;
    let task = index
        .checked_sub(1)
        .and_then(|idx| tasks.get(idx))
        .ok_or_else(|| anyhow!("'{list}' has no task {index}"))?;
    sidebar.store_mut().set_task_completed(task.uid, true)?;

    println!("Completed '{}'.", task.text);
    Ok(())
}

/// Types `text` into the dialog and presses confirm, which only counts
/// when the dialog enables it.
fn answer(dialog: &mut NameDialog, text: &str) -> anyhow::Result<Response> {
    dialog.set_text(text);
    if !dialog.is_confirm_enabled() {
        bail!("list name cannot be empty");
    }
    Ok(Response::Confirm)
}

fn find_row<S: ListStore>(sidebar: &ListSidebar<S>, name: &str) -> anyhow::Result<RowId> {
    sidebar
        .row_by_name(name.trim())
        .ok_or_else(|| anyhow!("no list named '{}'", name.trim()))
}

fn list_uid<S: ListStore>(sidebar: &ListSidebar<S>, row: RowId) -> anyhow::Result<uuid::Uuid> {
    sidebar
        .entry(row)
        .map(|entry| entry.identifier())
        .ok_or_else(|| anyhow!("row {row} vanished"))
}

fn label_of<S: ListStore>(sidebar: &ListSidebar<S>, row: RowId) -> String {
    sidebar
        .entry(row)
        .map(|entry| entry.display_name().to_string())
        .unwrap_or_default()
}
