use std::fs;

use errands_core::datastore::DataStore;
use errands_core::dialog::Response;
use errands_core::persistence::{ListStore, TaskStore};
use errands_core::sidebar::{ListSidebar, SidebarError};
use tempfile::tempdir;

fn labels(sidebar: &ListSidebar<DataStore>) -> Vec<String> {
    sidebar
        .rows()
        .map(|(_, entry)| entry.display_name().to_string())
        .collect()
}

#[test]
fn sidebar_survives_reopen() {
    let temp = tempdir().expect("tempdir");

    {
        let store = DataStore::open(temp.path()).expect("open datastore");
        let mut sidebar = ListSidebar::load(store).expect("load");
        assert!(sidebar.is_empty());

        let mut dialog = sidebar.add_list_dialog();
        dialog.set_text("Groceries");
        sidebar
            .respond_add_list(dialog, Response::Confirm)
            .expect("add groceries");
        let work = sidebar.add_list("Work").expect("add work");
        sidebar.add_list("Home").expect("add home");

        sidebar.rename_list(work, "Work Tasks").expect("rename");
        assert!(sidebar.is_synchronized());
    }

    let store = DataStore::open(temp.path()).expect("reopen datastore");
    let sidebar = ListSidebar::load(store).expect("reload");
    assert_eq!(labels(&sidebar), ["Groceries", "Work Tasks", "Home"]);
    assert_eq!(
        sidebar.selected_entry().map(|e| e.display_name()),
        Some("Home")
    );
    assert_eq!(sidebar.stack().len(), 3);
    assert!(sidebar.stack().page_by_name("Work Tasks").is_some());
}

#[test]
fn delete_cascades_on_disk_and_repairs_selection() {
    let temp = tempdir().expect("tempdir");
    let mut store = DataStore::open(temp.path()).expect("open datastore");
    let a = store.add_list("A").expect("add");
    let b = store.add_list("B").expect("add");
    store.add_list("C").expect("add");
    store.add_task(b, "one").expect("task");
    store.add_task(b, "two").expect("task");
    store.add_task(a, "keep").expect("task");

    let mut sidebar = ListSidebar::load(store).expect("load");
    let row_b = sidebar.row_by_name("B").expect("row B");
    sidebar.select_row(row_b).expect("select");
    sidebar.delete_list(row_b).expect("delete");

    assert_eq!(labels(&sidebar), ["A", "C"]);
    assert_eq!(
        sidebar.selected_entry().map(|e| e.display_name()),
        Some("A")
    );
    assert!(sidebar.store().tasks_for(b).expect("tasks").is_empty());
    assert_eq!(sidebar.store().tasks_for(a).expect("tasks").len(), 1);
    assert_eq!(sidebar.store().get_lists().expect("lists").len(), 2);
}

#[test]
fn storage_failure_leaves_sidebar_untouched() {
    let temp = tempdir().expect("tempdir");
    let mut store = DataStore::open(temp.path()).expect("open datastore");
    store.add_list("Work").expect("add");
    store.add_list("Home").expect("add");

    let mut sidebar = ListSidebar::load(store).expect("load");
    let work = sidebar.row_by_name("Work").expect("row");

    fs::write(&sidebar.store().data_path, "garbage\n").expect("corrupt file");

    let err = sidebar.rename_list(work, "Work Tasks").expect_err("rename fails");
    assert!(matches!(err, SidebarError::Persistence(_)));
    let err = sidebar.delete_list(work).expect_err("delete fails");
    assert!(matches!(err, SidebarError::Persistence(_)));
    let err = sidebar.add_list("Groceries").expect_err("add fails");
    assert!(matches!(err, SidebarError::Persistence(_)));

    assert_eq!(labels(&sidebar), ["Work", "Home"]);
    assert_eq!(sidebar.stack().len(), 2);
    assert!(sidebar.stack().page_by_name("Work").is_some());
    assert_eq!(
        sidebar.selected_entry().map(|e| e.display_name()),
        Some("Home")
    );
}
