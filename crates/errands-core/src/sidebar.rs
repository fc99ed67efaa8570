//! Sidebar listing every task-list, kept in lockstep with the detail stack.
//!
//! Rows are `RowId` handles into an entry map; the `rows` vector holds
//! display order. Every handler checks with the store first and only then
//! touches rows, pages or selection, so a storage failure leaves the
//! sidebar exactly as it was.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dialog::{NameDialog, Response, normalize_name};
use crate::list::ListRecord;
use crate::persistence::{ListStore, PersistenceError, TaskStore};
use crate::stack::{DetailViewStack, StackPage, TasksView};

pub const TITLE: &str = "Errands";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub action: &'static str,
}

pub const MAIN_MENU: [MenuItem; 3] = [
    MenuItem {
        label: "Preferences",
        action: "app.preferences",
    },
    MenuItem {
        label: "Keyboard Shortcuts",
        action: "app.shortcuts",
    },
    MenuItem {
        label: "About Errands",
        action: "app.about",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    identifier: Uuid,
    display_name: String,
}

impl ListEntry {
    pub fn identifier(&self) -> Uuid {
        self.identifier
    }

    /// Also the row label and the key of the matching stack page.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SidebarError {
    #[error("list name cannot be empty")]
    EmptyName,

    #[error("no row {0} in the sidebar")]
    UnknownRow(RowId),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug)]
pub struct ListSidebar<S> {
    store: S,
    rows: Vec<RowId>,
    entries: BTreeMap<RowId, ListEntry>,
    next_row: u64,
    selected: Option<RowId>,
    stack: DetailViewStack,
}

impl<S: ListStore> ListSidebar<S> {
    /// Reads every stored list and builds rows and pages from them.
    #[tracing::instrument(skip(store))]
    pub fn load(store: S) -> Result<Self, SidebarError> {
        let lists = store.get_lists()?;
        Ok(Self::initialize(store, lists))
    }

    /// Appends one row and page per record, selecting each in turn; the
    /// last record is left selected. Task views start unloaded.
    pub fn initialize(store: S, lists: Vec<ListRecord>) -> Self {
        let mut sidebar = Self {
            store,
            rows: vec![],
            entries: BTreeMap::new(),
            next_row: 0,
            selected: None,
            stack: DetailViewStack::new(),
        };

        for record in lists {
            let row = sidebar.append_entry(record.uid, record.name);
            sidebar.apply_selection(row);
        }

        info!(
            rows = sidebar.rows.len(),
            selected = ?sidebar.selected_entry().map(ListEntry::display_name),
            "initialized list sidebar"
        );
        sidebar
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn stack(&self) -> &DetailViewStack {
        &self.stack
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in display order.
    pub fn rows(&self) -> impl Iterator<Item = (RowId, &ListEntry)> {
        self.rows
            .iter()
            .filter_map(|row| self.entries.get(row).map(|entry| (*row, entry)))
    }

    pub fn entry(&self, row: RowId) -> Option<&ListEntry> {
        self.entries.get(&row)
    }

    pub fn row_at(&self, index: usize) -> Option<RowId> {
        self.rows.get(index).copied()
    }

    /// First row whose label matches `name`.
    pub fn row_by_name(&self, name: &str) -> Option<RowId> {
        self.rows().find(|(_, entry)| entry.display_name == name).map(|(row, _)| row)
    }

    pub fn selected_row(&self) -> Option<RowId> {
        self.selected
    }

    pub fn selected_entry(&self) -> Option<&ListEntry> {
        self.selected.and_then(|row| self.entries.get(&row))
    }

    /// Selects `row` and brings its page to the front.
    pub fn select_row(&mut self, row: RowId) -> Result<(), SidebarError> {
        if !self.entries.contains_key(&row) {
            return Err(SidebarError::UnknownRow(row));
        }
        self.apply_selection(row);
        Ok(())
    }

    /// Shows the page keyed by the row's current name.
    pub fn switch_list(&mut self, row: RowId) -> Result<(), SidebarError> {
        let entry = self.entries.get(&row).ok_or(SidebarError::UnknownRow(row))?;
        debug!(row = %row, name = %entry.display_name, "switching list");
        self.stack.set_visible_child_name(&entry.display_name);
        Ok(())
    }

    pub fn add_list_dialog(&self) -> NameDialog {
        NameDialog::add_list()
    }

    /// Applies the host's answer to an add dialog. Cancel changes nothing.
    pub fn respond_add_list(
        &mut self,
        dialog: NameDialog,
        response: Response,
    ) -> Result<Option<RowId>, SidebarError> {
        if response == Response::Cancel {
            debug!("adding new list is cancelled");
            return Ok(None);
        }
        match dialog.finish(response) {
            Some(name) => self.add_list(&name).map(Some),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn add_list(&mut self, name: &str) -> Result<RowId, SidebarError> {
        let Some(name) = normalize_name(name) else {
            warn!("rejected empty list name");
            return Err(SidebarError::EmptyName);
        };

        let uid = self
            .store
            .add_list(&name)
            .inspect_err(|err| warn!(error = %err, "add list failed; sidebar unchanged"))?;
        let row = self.append_entry(uid, name);
        self.apply_selection(row);
        info!(row = %row, %uid, "added list");
        self.debug_check();
        Ok(row)
    }

    pub fn rename_list_dialog(&self, row: RowId) -> Result<NameDialog, SidebarError> {
        let entry = self.entries.get(&row).ok_or(SidebarError::UnknownRow(row))?;
        Ok(NameDialog::rename_list(&entry.display_name))
    }

    pub fn respond_rename_list(
        &mut self,
        row: RowId,
        dialog: NameDialog,
        response: Response,
    ) -> Result<bool, SidebarError> {
        if response == Response::Cancel {
            debug!(row = %row, "renaming list is cancelled");
            return Ok(false);
        }
        match dialog.finish(response) {
            Some(name) => self.rename_list(row, &name).map(|()| true),
            None => Ok(false),
        }
    }

    #[tracing::instrument(skip(self), fields(row = %row))]
    pub fn rename_list(&mut self, row: RowId, new_name: &str) -> Result<(), SidebarError> {
        let Some(new_name) = normalize_name(new_name) else {
            warn!("rejected empty list name");
            return Err(SidebarError::EmptyName);
        };
        let uid = self
            .entries
            .get(&row)
            .map(ListEntry::identifier)
            .ok_or(SidebarError::UnknownRow(row))?;

        info!(%uid, name = %new_name, "rename list");
        self.store
            .rename_list(uid, &new_name)
            .inspect_err(|err| warn!(error = %err, "rename list failed; sidebar unchanged"))?;

        self.stack.rename_page(uid, &new_name);
        if let Some(entry) = self.entries.get_mut(&row) {
            entry.display_name = new_name;
        }
        self.debug_check();
        Ok(())
    }

    /// Deletes the list behind `row`. When that row was selected the one
    /// above it takes over; the first row hands over to the last.
    #[tracing::instrument(skip(self), fields(row = %row))]
    pub fn delete_list(&mut self, row: RowId) -> Result<(), SidebarError> {
        let idx = self
            .rows
            .iter()
            .position(|candidate| *candidate == row)
            .ok_or(SidebarError::UnknownRow(row))?;
        let uid = self
            .entries
            .get(&row)
            .map(ListEntry::identifier)
            .ok_or(SidebarError::UnknownRow(row))?;

        info!(%uid, "delete list");
        self.store
            .delete_list(uid)
            .inspect_err(|err| warn!(error = %err, "delete list failed; sidebar unchanged"))?;

        self.stack.remove(uid);

        match self.selected {
            Some(selected) if selected == row => {
                match replacement_index(idx, self.rows.len()) {
                    Some(next) => {
                        let next = self.rows[next];
                        self.apply_selection(next);
                    }
                    None => self.selected = None,
                }
            }
            // A same-named page was in front; show the selection's page again.
            Some(selected) if self.stack.visible_child().is_none() => {
                self.apply_selection(selected);
            }
            _ => {}
        }

        self.rows.remove(idx);
        self.entries.remove(&row);
        debug!(
            rows = self.rows.len(),
            selected = ?self.selected,
            "removed list row"
        );
        self.debug_check();
        Ok(())
    }

    /// Row labels and page keys match one-to-one, and a non-empty sidebar
    /// shows the page named after its selected row.
    pub fn is_synchronized(&self) -> bool {
        if self.rows.len() != self.entries.len() || self.stack.len() != self.rows.len() {
            return false;
        }

        let all_paged = self.rows().all(|(_, entry)| {
            self.stack
                .page(entry.identifier)
                .is_some_and(|page| page.name() == entry.display_name)
        });
        if !all_paged {
            return false;
        }

        match self.selected_entry() {
            None => self.rows.is_empty(),
            Some(entry) => self.stack.visible_child_name() == Some(entry.display_name.as_str()),
        }
    }

    fn append_entry(&mut self, identifier: Uuid, display_name: String) -> RowId {
        let row = RowId(self.next_row);
        self.next_row += 1;

        self.stack
            .add_titled(TasksView::new(identifier), &display_name, &display_name);
        self.rows.push(row);
        self.entries.insert(
            row,
            ListEntry {
                identifier,
                display_name,
            },
        );
        row
    }

    fn apply_selection(&mut self, row: RowId) {
        self.selected = Some(row);
        if let Some(entry) = self.entries.get(&row) {
            self.stack.set_visible_child_name(&entry.display_name);
        }
    }

    fn debug_check(&self) {
        debug_assert!(
            self.is_synchronized(),
            "sidebar rows and stack pages diverged"
        );
    }
}

impl<S: ListStore + TaskStore> ListSidebar<S> {
    /// Like [`ListSidebar::load`], with every task view filled in.
    pub fn load_with_tasks(store: S) -> Result<Self, SidebarError> {
        let mut sidebar = Self::load(store)?;
        sidebar.reload_views()?;
        Ok(sidebar)
    }

    #[tracing::instrument(skip(self))]
    pub fn reload_views(&mut self) -> Result<(), SidebarError> {
        for page in self.stack.pages_mut() {
            page.view_mut().reload(&self.store)?;
        }
        Ok(())
    }

    /// Refreshes the page in front and returns it.
    pub fn reload_visible(&mut self) -> Result<Option<&StackPage>, SidebarError> {
        if let Some(page) = self.stack.visible_child_mut() {
            page.view_mut().reload(&self.store)?;
        }
        Ok(self.stack.visible_child())
    }
}

/// Row to select after removing the selected row at `idx` from `len` rows.
/// Steps up one row, wrapping from the top to the bottom.
fn replacement_index(idx: usize, len: usize) -> Option<usize> {
    if len <= 1 {
        return None;
    }
    Some(if idx == 0 { len - 1 } else { idx - 1 })
}
