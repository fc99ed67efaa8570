use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Cancel,
    Confirm,
}

/// Modal name prompt the sidebar hands to its host window. The confirm
/// response stays disabled while the entered text is blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameDialog {
    heading: &'static str,
    placeholder: &'static str,
    confirm_label: &'static str,
    text: String,
    confirm_enabled: bool,
}

impl NameDialog {
    pub fn add_list() -> Self {
        Self {
            heading: "Add List",
            placeholder: "New List Name",
            confirm_label: "Add",
            text: String::new(),
            confirm_enabled: false,
        }
    }

    pub fn rename_list(current: &str) -> Self {
        let mut dialog = Self {
            heading: "Rename List",
            placeholder: "List Name",
            confirm_label: "Rename",
            text: String::new(),
            confirm_enabled: false,
        };
        dialog.set_text(current);
        dialog
    }

    pub fn heading(&self) -> &'static str {
        self.heading
    }

    pub fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn confirm_label(&self) -> &'static str {
        self.confirm_label
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.confirm_enabled = normalize_name(&self.text).is_some();
    }

    pub fn is_confirm_enabled(&self) -> bool {
        self.confirm_enabled
    }

    /// Consumes the dialog. Yields the trimmed name only for an enabled
    /// confirm.
    pub fn finish(self, response: Response) -> Option<String> {
        match response {
            Response::Cancel => None,
            Response::Confirm if !self.confirm_enabled => {
                warn!(heading = self.heading, "confirm ignored while disabled");
                None
            }
            Response::Confirm => normalize_name(&self.text),
        }
    }
}

/// Trims surrounding whitespace; blank names yield `None`.
pub fn normalize_name(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_dialog_starts_disabled() {
        let dialog = NameDialog::add_list();
        assert!(!dialog.is_confirm_enabled());
        assert_eq!(dialog.heading(), "Add List");
        assert_eq!(dialog.placeholder(), "New List Name");
    }

    #[test]
    fn whitespace_keeps_confirm_disabled() {
        let mut dialog = NameDialog::add_list();
        dialog.set_text("  \n\t ");
        assert!(!dialog.is_confirm_enabled());
        assert_eq!(dialog.finish(Response::Confirm), None);
    }

    #[test]
    fn confirm_yields_trimmed_text() {
        let mut dialog = NameDialog::add_list();
        dialog.set_text("  Groceries ");
        assert!(dialog.is_confirm_enabled());
        assert_eq!(
            dialog.finish(Response::Confirm).as_deref(),
            Some("Groceries")
        );
    }

    #[test]
    fn cancel_yields_nothing() {
        let mut dialog = NameDialog::rename_list("Work");
        assert!(dialog.is_confirm_enabled());
        dialog.set_text("Work Tasks");
        assert_eq!(dialog.finish(Response::Cancel), None);
    }
}
