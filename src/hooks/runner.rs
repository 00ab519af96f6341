//! External command hooks.
//!
//! A command hook runs once per event invocation. The request goes to stdin
//! as JSON, the optional reply comes back on stdout:
//!
//! ```text
//! stdin:  {"event": "after-render", "payload": {"kind": "html", "value": "..."}, "data": {}}
//! stdout: {"payload": {"kind": "html", "value": "..."}, "data": {"words": 120}}
//! ```
//!
//! Empty stdout leaves the payload unchanged. A non-zero exit is a failure.

use super::event::{HookEvent, HookPayload};
use super::pipeline::{HookContext, HookHandler};
use crate::config::PluginConfig;
use crate::render::JsonMap;
use anyhow::{Context, Result, bail};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Build `$VELLUM_*` environment variables for a hook invocation.
pub fn build_vellum_vars(ctx: &HookContext, event: HookEvent) -> FxHashMap<String, String> {
    let mut vars = FxHashMap::default();

    vars.insert("VELLUM_EVENT".into(), event.name().into());
    vars.insert(
        "VELLUM_ROOT".into(),
        ctx.config.root.display().to_string(),
    );
    vars.insert(
        "VELLUM_OUTPUT_DIR".into(),
        ctx.output_dir.display().to_string(),
    );
    vars.insert("VELLUM_MODE".into(), ctx.mode.label().into());

    if event.is_page_event()
        && let Some(page) = &ctx.page
    {
        vars.insert("VELLUM_PAGE".into(), page.source.display().to_string());
        vars.insert("VELLUM_LOCALE".into(), page.locale.clone());
    }

    vars
}

/// Replace `$VELLUM_XXX` occurrences with values from `vars`.
///
/// Longer names are substituted first so `$VELLUM_PAGE` never clobbers a
/// longer variable sharing its prefix.
pub fn resolve_args(args: &[String], vars: &FxHashMap<String, String>) -> Vec<String> {
    let mut keys: Vec<_> = vars.keys().collect();
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));

    args.iter()
        .map(|arg| {
            let mut result = arg.clone();
            for key in &keys {
                result = result.replace(&format!("${key}"), &vars[*key]);
            }
            result
        })
        .collect()
}

#[derive(Serialize)]
struct Request<'a> {
    event: HookEvent,
    payload: &'a HookPayload,
    data: &'a JsonMap,
}

#[derive(Deserialize)]
struct Reply {
    #[serde(default)]
    payload: Option<HookPayload>,
    #[serde(default)]
    data: Option<JsonMap>,
}

/// Handler that runs an external program.
#[derive(Debug, Clone)]
pub struct CommandHook {
    name: String,
    command: Vec<String>,
    quiet: bool,
    cwd: PathBuf,
}

impl CommandHook {
    pub fn new(name: impl Into<String>, command: Vec<String>, cwd: PathBuf) -> Self {
        Self {
            name: name.into(),
            command,
            quiet: false,
            cwd,
        }
    }

    pub fn from_config(plugin: &PluginConfig, cwd: PathBuf) -> Self {
        Self {
            name: plugin.display_name(),
            command: plugin.command.clone(),
            quiet: plugin.quiet,
            cwd,
        }
    }
}

#[async_trait::async_trait]
impl HookHandler for CommandHook {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(
        &self,
        event: HookEvent,
        payload: &HookPayload,
        ctx: &mut HookContext,
    ) -> Result<Option<HookPayload>> {
        let vars = build_vellum_vars(ctx, event);
        let resolved = resolve_args(&self.command, &vars);
        let Some((program, args)) = resolved.split_first() else {
            bail!("empty command");
        };

        let request = serde_json::to_vec(&Request {
            event,
            payload,
            data: &ctx.data,
        })?;

        let mut child = Command::new(program)
            .args(args)
            .current_dir(&self.cwd)
            .envs(&vars)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(if self.quiet {
                Stdio::null()
            } else {
                Stdio::piped()
            })
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start `{program}`"))?;

        let stdin = child.stdin.take();
        let write = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(&request).await {
                // a plugin that ignores its input may close stdin early
                Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());
        written.context("failed to write hook request")?;
        let output = output?;

        if !self.quiet {
            let stderr = String::from_utf8_lossy(&output.stderr);
            for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
                crate::log!("plugin"; "{}: {}", self.name, line);
            }
        }

        if !output.status.success() {
            bail!("exited with {}", output.status);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return Ok(None);
        }

        let reply: Reply = serde_json::from_str(stdout).context("invalid JSON reply")?;
        if let Some(data) = reply.data {
            ctx.data.extend(data);
        }
        Ok(reply.payload)
    }
}
