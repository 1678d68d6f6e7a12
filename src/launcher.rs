//! Plugin process launcher
//!
//! Plugins are shell command lines started with `WAYLAND_DISPLAY` pointing
//! at the embedded display. A plugin that fails to start is logged and
//! skipped.

use std::process::{Child, Command, Stdio};

use anyhow::{Context, Result};
use log::{debug, info, warn};

pub const SHELL: &str = "/bin/sh";

#[derive(Debug)]
pub struct PluginLauncher {
    shell: String,
    socket_name: String,
    children: Vec<(String, Child)>,
}

impl PluginLauncher {
    pub fn new(socket_name: &str) -> Self {
        Self::with_shell(SHELL, socket_name)
    }

    pub fn with_shell(shell: &str, socket_name: &str) -> Self {
        Self {
            shell: shell.to_string(),
            socket_name: socket_name.to_string(),
            children: Vec::new(),
        }
    }

    /// Starts `command` through `sh -c`. Returns the child's pid.
    pub fn spawn(&mut self, command: &str) -> Result<u32> {
        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .env("WAYLAND_DISPLAY", &self.socket_name)
            .stdin(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn plugin `{}`", command))?;

        let pid = child.id();
        info!("🧩 Plugin started (pid {}): {}", pid, command);
        self.children.push((command.to_string(), child));
        Ok(pid)
    }

    /// Starts every command, logging the ones that fail. Returns how many started.
    pub fn spawn_all<S: AsRef<str>>(&mut self, commands: &[S]) -> usize {
        commands
            .iter()
            .filter(|command| match self.spawn(command.as_ref()) {
                Ok(_) => true,
                Err(e) => {
                    warn!("{:#}", e);
                    false
                }
            })
            .count()
    }

    /// Collects plugins that have exited. Returns how many were reaped.
    pub fn reap(&mut self) -> usize {
        let before = self.children.len();
        self.children.retain_mut(|(command, child)| match child.try_wait() {
            Ok(Some(status)) => {
                debug!("Plugin `{}` exited with {}", command, status);
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!("Failed to poll plugin `{}`: {}", command, e);
                true
            }
        });
        before - self.children.len()
    }

    pub fn running(&self) -> usize {
        self.children.len()
    }
}
