use std::io::{self, IsTerminal, Write};

use chrono::Local;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::persistence::ListStore;
use crate::sidebar::{ListSidebar, MAIN_MENU, TITLE};
use crate::stack::StackPage;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true) && io::stdout().is_terminal();
        Ok(Self { color })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip_all)]
    pub fn print_sidebar<S: ListStore>(&self, sidebar: &ListSidebar<S>) -> anyhow::Result<()> {
        self.write_sidebar(io::stdout().lock(), sidebar)
    }

    #[tracing::instrument(skip_all, fields(page = %page.name()))]
    pub fn print_page(&self, page: &StackPage) -> anyhow::Result<()> {
        self.write_page(io::stdout().lock(), page)
    }

    pub fn print_menu(&self) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        for item in MAIN_MENU {
            writeln!(out, "{:<20} {}", item.label, self.paint(item.action, "2"))?;
        }
        Ok(())
    }

    pub fn write_sidebar<W: Write, S: ListStore>(
        &self,
        mut out: W,
        sidebar: &ListSidebar<S>,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(TITLE, "1"))?;
        if sidebar.is_empty() {
            writeln!(out, "No lists yet.")?;
            return Ok(());
        }

        let selected = sidebar.selected_row();
        let rows = sidebar
            .rows()
            .map(|(row, entry)| {
                let marker = if Some(row) == selected { "*" } else { "" };
                let pending = sidebar
                    .stack()
                    .page(entry.identifier())
                    .map(|page| page.view().pending_count().to_string())
                    .unwrap_or_default();
                let name = if Some(row) == selected {
                    self.paint(entry.display_name(), "36")
                } else {
                    entry.display_name().to_string()
                };
                vec![marker.to_string(), name, pending]
            })
            .collect();

        write_table(
            &mut out,
            vec![String::new(), "List".to_string(), "Pending".to_string()],
            rows,
        )
    }

    pub fn write_page<W: Write>(&self, mut out: W, page: &StackPage) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(page.title(), "1"))?;
        let tasks = page.view().tasks();
        if tasks.is_empty() {
            writeln!(out, "No tasks.")?;
            return Ok(());
        }

        let rows = tasks
            .iter()
            .enumerate()
            .map(|(idx, task)| {
                let done = if task.completed {
                    self.paint("x", "32")
                } else {
                    String::new()
                };
                let created = task
                    .created
                    .with_timezone(&Local)
                    .format("%Y-%m-%d")
                    .to_string();
                vec![
                    self.paint(&(idx + 1).to_string(), "33"),
                    done,
                    task.text.clone(),
                    created,
                ]
            })
            .collect();

        write_table(
            &mut out,
            vec![
                "#".to_string(),
                "Done".to_string(),
                "Task".to_string(),
                "Created".to_string(),
            ],
            rows,
        )
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(header.as_str()))
        .collect();

    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(visible_width(cell));
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| pad(header, *width))
        .collect();
    writeln!(writer, "{}", header_line.join(" ").trim_end())?;

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    writeln!(writer, "{}", rule.join(" ").trim_end())?;

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad(cell, *width))
            .collect();
        writeln!(writer, "{}", line.join(" ").trim_end())?;
    }

    Ok(())
}

fn pad(cell: &str, width: usize) -> String {
    let padding = width.saturating_sub(visible_width(cell));
    format!("{cell}{}", " ".repeat(padding))
}

fn visible_width(s: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(s).as_str())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, TaskStore};

    fn render_sidebar(sidebar: &ListSidebar<MemoryStore>) -> String {
        let mut buf = Vec::new();
        Renderer::plain()
            .write_sidebar(&mut buf, sidebar)
            .expect("render");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn sidebar_marks_selected_row() {
        let sidebar = ListSidebar::load(MemoryStore::with_lists(["Work", "Home"])).expect("load");
        let text = render_sidebar(&sidebar);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Errands");
        assert!(lines[3].starts_with("  Work"));
        assert!(lines[4].starts_with("* Home"));
    }

    #[test]
    fn empty_sidebar_says_so() {
        let sidebar = ListSidebar::load(MemoryStore::new()).expect("load");
        assert!(render_sidebar(&sidebar).contains("No lists yet."));
    }

    #[test]
    fn page_lists_tasks_in_order() {
        let mut sidebar = ListSidebar::load(MemoryStore::with_lists(["Chores"])).expect("load");
        let uid = sidebar.selected_entry().expect("selected").identifier();
        let sweep = sidebar.store_mut().add_task(uid, "sweep").expect("task");
        sidebar.store_mut().add_task(uid, "mop").expect("task");
        sidebar
            .store_mut()
            .set_task_completed(sweep, true)
            .expect("complete");

        let page = sidebar.reload_visible().expect("reload").expect("page");

        let mut buf = Vec::new();
        Renderer::plain().write_page(&mut buf, page).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Chores");
        assert!(lines[3].starts_with("1 x"));
        assert!(lines[3].contains("sweep"));
        assert!(lines[4].contains("mop"));
    }

    #[test]
    fn padding_ignores_escape_codes() {
        assert_eq!(visible_width("\x1b[36mWork\x1b[0m"), 4);
        assert_eq!(pad("日本", 5), "日本 ");
    }
}
