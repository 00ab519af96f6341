//! `[[plugins]]` entries: external commands bound to hook events.
//!
//! ```toml
//! [[plugins]]
//! name = "reading-time"
//! command = ["python3", "plugins/reading_time.py", "$VELLUM_PAGE"]
//! events = ["after-parse"]
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::hooks::HookEvent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Name used in logs and failure reports. Defaults to the program name.
    pub name: Option<String>,
    /// Program and arguments. `$VELLUM_*` variables are substituted.
    pub command: Vec<String>,
    /// Events this plugin subscribes to, in registration order.
    pub events: Vec<HookEvent>,
    pub enable: bool,
    /// Drop the plugin's stderr instead of forwarding it to the log.
    pub quiet: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            name: None,
            command: Vec::new(),
            events: Vec::new(),
            enable: true,
            quiet: false,
        }
    }
}

impl PluginConfig {
    const COMMAND: FieldPath = FieldPath::new("plugins.command");
    const EVENTS: FieldPath = FieldPath::new("plugins.events");

    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.command
            .first()
            .map(|program| {
                std::path::Path::new(program)
                    .file_name()
                    .map_or_else(|| program.clone(), |n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "plugin".to_string())
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.enable {
            return;
        }
        let Some(program) = self.command.first() else {
            diag.error(
                Self::COMMAND,
                format!("plugin `{}` has an empty command", self.display_name()),
            );
            return;
        };
        if self.events.is_empty() {
            diag.hint(
                Self::EVENTS,
                format!("plugin `{}` subscribes to no events", self.display_name()),
            );
        }
        if which::which(program).is_err() && !std::path::Path::new(program).exists() {
            diag.hint(
                Self::COMMAND,
                format!("`{program}` not found in PATH"),
            );
        }
    }
}
