use gloo::console;

/// Leveled, component-tagged console logger used by hooks and services.
pub struct Logger;

impl Logger {
    pub fn debug(component: &str, message: &str) {
        console::debug!(format!("[{}] {}", component, message));
    }

    pub fn info(component: &str, message: &str) {
        console::info!(format!("[{}] {}", component, message));
    }

    pub fn warn(component: &str, message: &str) {
        console::warn!(format!("[{}] {}", component, message));
    }

    pub fn error(component: &str, message: &str) {
        console::error!(format!("[{}] {}", component, message));
    }
}
