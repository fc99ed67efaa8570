//! Paged detail area next to the sidebar. One page per list, keyed by the
//! list's display name.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::list::TaskRecord;
use crate::persistence::{PersistenceError, TaskStore};

/// Task page for a single list.
#[derive(Debug, Clone, PartialEq)]
pub struct TasksView {
    list_uid: Uuid,
    tasks: Vec<TaskRecord>,
}

impl TasksView {
    pub fn new(list_uid: Uuid) -> Self {
        Self {
            list_uid,
            tasks: vec![],
        }
    }

    pub fn list_uid(&self) -> Uuid {
        self.list_uid
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.completed).count()
    }

    #[tracing::instrument(skip(self, store), fields(list_uid = %self.list_uid))]
    pub fn reload<S: TaskStore + ?Sized>(&mut self, store: &S) -> Result<(), PersistenceError> {
        self.tasks = store.tasks_for(self.list_uid)?;
        debug!(count = self.tasks.len(), "reloaded tasks view");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackPage {
    name: String,
    title: String,
    view: TasksView,
}

impl StackPage {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn view(&self) -> &TasksView {
        &self.view
    }

    pub(crate) fn view_mut(&mut self) -> &mut TasksView {
        &mut self.view
    }
}

#[derive(Debug, Clone, Default)]
pub struct DetailViewStack {
    pages: Vec<StackPage>,
    // Tracked by list identity so a rename keeps the same page visible.
    visible: Option<Uuid>,
}

impl DetailViewStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> impl Iterator<Item = &StackPage> {
        self.pages.iter()
    }

    pub(crate) fn pages_mut(&mut self) -> impl Iterator<Item = &mut StackPage> {
        self.pages.iter_mut()
    }

    pub(crate) fn add_titled(&mut self, view: TasksView, name: &str, title: &str) {
        if self.page_by_name(name).is_some() {
            warn!(name, "stack already has a page with this name");
        }
        debug!(name, list_uid = %view.list_uid(), "adding stack page");
        self.pages.push(StackPage {
            name: name.to_string(),
            title: title.to_string(),
            view,
        });
    }

    /// Drops the page bound to `list_uid`. A removed visible page leaves
    /// nothing visible until the next switch.
    pub(crate) fn remove(&mut self, list_uid: Uuid) -> Option<StackPage> {
        let idx = self
            .pages
            .iter()
            .position(|page| page.view.list_uid == list_uid)?;
        if self.visible == Some(list_uid) {
            self.visible = None;
        }
        Some(self.pages.remove(idx))
    }

    pub fn page(&self, list_uid: Uuid) -> Option<&StackPage> {
        self.pages.iter().find(|page| page.view.list_uid == list_uid)
    }

    pub(crate) fn page_mut(&mut self, list_uid: Uuid) -> Option<&mut StackPage> {
        self.pages
            .iter_mut()
            .find(|page| page.view.list_uid == list_uid)
    }

    pub fn page_by_name(&self, name: &str) -> Option<&StackPage> {
        self.pages.iter().find(|page| page.name == name)
    }

    /// Sets both key and title, as a single step.
    pub(crate) fn rename_page(&mut self, list_uid: Uuid, name: &str) -> bool {
        let Some(page) = self.page_mut(list_uid) else {
            warn!(%list_uid, "no stack page to rename");
            return false;
        };
        page.name = name.to_string();
        page.title = name.to_string();
        true
    }

    pub(crate) fn set_visible_child_name(&mut self, name: &str) -> bool {
        match self.page_by_name(name) {
            Some(page) => {
                self.visible = Some(page.view.list_uid);
                true
            }
            None => {
                warn!(name, "no stack page with this name");
                false
            }
        }
    }

    pub fn visible_child(&self) -> Option<&StackPage> {
        self.visible.and_then(|uid| self.page(uid))
    }

    pub(crate) fn visible_child_mut(&mut self) -> Option<&mut StackPage> {
        let uid = self.visible?;
        self.page_mut(uid)
    }

    pub fn visible_child_name(&self) -> Option<&str> {
        self.visible_child().map(StackPage::name)
    }
}
