//! Native dialogs behind a trait, so everything that asks the user a
//! question is testable without a desktop session.
//!
//! Calls are synchronous: the editor blocks on the dialog and resumes with
//! the answer.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;

/// Synchronous platform dialogs.
pub trait Platform {
    fn pick_folder(&self, title: &str) -> Option<PathBuf>;
    fn save_file(&self, title: &str, default_name: &str, extension: &str) -> Option<PathBuf>;
    fn confirm(&self, title: &str, message: &str) -> bool;
    fn alert(&self, title: &str, message: &str);
}

/// The real implementation over rfd.
pub struct NativePlatform;

impl Platform for NativePlatform {
    fn pick_folder(&self, title: &str) -> Option<PathBuf> {
        rfd::FileDialog::new().set_title(title).pick_folder()
    }

    fn save_file(&self, title: &str, default_name: &str, extension: &str) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title(title)
            .set_file_name(default_name)
            .add_filter(extension, &[extension])
            .save_file()
    }

    fn confirm(&self, title: &str, message: &str) -> bool {
        rfd::MessageDialog::new()
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::YesNo)
            .show()
    }

    fn alert(&self, title: &str, message: &str) {
        rfd::MessageDialog::new()
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

/// Scripted answers for tests: queued responses are handed out in order,
/// and an empty queue means "cancel" / "no".
#[derive(Default)]
pub struct ScriptedPlatform {
    pub folders: RefCell<VecDeque<Option<PathBuf>>>,
    pub files: RefCell<VecDeque<Option<PathBuf>>>,
    pub confirms: RefCell<VecDeque<bool>>,
    pub alerts: RefCell<Vec<String>>,
}

impl Platform for ScriptedPlatform {
    fn pick_folder(&self, _title: &str) -> Option<PathBuf> {
        self.folders.borrow_mut().pop_front().flatten()
    }

    fn save_file(&self, _title: &str, _default_name: &str, _extension: &str) -> Option<PathBuf> {
        self.files.borrow_mut().pop_front().flatten()
    }

    fn confirm(&self, _title: &str, _message: &str) -> bool {
        self.confirms.borrow_mut().pop_front().unwrap_or(false)
    }

    fn alert(&self, _title: &str, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }
}
