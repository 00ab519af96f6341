//! Plugin loading: turns configuration into hook registrations.

use super::pipeline::Registration;
use super::runner::CommandHook;
use crate::config::SiteConfig;
use crate::debug;
use anyhow::Result;
use std::sync::Arc;

/// Supplies the handlers a build registers, in order.
pub trait PluginLoader: Send + Sync {
    fn load(&self, config: &SiteConfig) -> Result<Vec<Registration>>;
}

/// Loads the `[[plugins]]` entries of the site config as command hooks.
///
/// Registration order is config order, then the order of each entry's
/// `events` list.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigPluginLoader;

impl PluginLoader for ConfigPluginLoader {
    fn load(&self, config: &SiteConfig) -> Result<Vec<Registration>> {
        let mut registrations = Vec::new();
        for plugin in config.plugins.iter().filter(|p| p.enable) {
            let hook = Arc::new(CommandHook::from_config(plugin, config.root.clone()));
            for event in &plugin.events {
                debug!("plugin"; "`{}` registered for {}", plugin.display_name(), event);
                registrations.push(Registration::new(*event, hook.clone()));
            }
        }
        Ok(registrations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use crate::hooks::HookEvent;

    #[test]
    fn loads_enabled_plugins_in_order() {
        let config = test_parse_config(
            r#"
[[plugins]]
name = "first"
command = ["true"]
events = ["after-render", "before-parse"]

[[plugins]]
name = "off"
command = ["true"]
events = ["after-render"]
enable = false

[[plugins]]
name = "second"
command = ["true"]
events = ["after-render"]
"#,
        );

        let registrations = ConfigPluginLoader.load(&config).unwrap();
        let summary: Vec<_> = registrations
            .iter()
            .map(|r| (r.event, r.handler.name().to_string()))
            .collect();
        assert_eq!(
            summary,
            [
                (HookEvent::AfterRender, "first".to_string()),
                (HookEvent::BeforeParse, "first".to_string()),
                (HookEvent::AfterRender, "second".to_string()),
            ]
        );
    }
}
