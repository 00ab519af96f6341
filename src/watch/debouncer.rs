//! Debounce state machine.
//!
//! ```text
//!            event                 deadline passed
//!   Idle ─────────────▶ Pending ─────────────────▶ Flushing
//!    ▲                   │  ▲ event: deadline = now + window
//!    │                   └──┘                        │
//!    │   finish, nothing queued                      │ event: queued
//!    └───────────────────────────────────────────────┤
//!                        Pending ◀───────────────────┘
//!                                finish, queued events
//! ```
//!
//! Time is always passed in, so tests drive it with a virtual clock.

use std::collections::BTreeSet;
use std::mem;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::EventKind;
use notify::event::ModifyKind;

use crate::debug;
use crate::utils::path::normalize_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Pending { deadline: Instant },
    /// A batch was handed out and its build has not finished yet.
    Flushing,
}

pub struct Debouncer {
    window: Duration,
    state: DebounceState,
    /// Paths of the batch being collected.
    pending: BTreeSet<PathBuf>,
    /// Paths that arrived while `Flushing`.
    queued: BTreeSet<PathBuf>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: DebounceState::Idle,
            pending: BTreeSet::new(),
            queued: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Feed a notify event. Create, modify and remove count the same;
    /// metadata-only modifies and access events are dropped.
    pub fn observe(&mut self, event: &notify::Event, now: Instant) {
        match event.kind {
            EventKind::Create(_) | EventKind::Remove(_) => {}
            // mtime/chmod noise would otherwise trigger endless rebuild loops
            EventKind::Modify(ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => {}
            _ => return,
        }
        debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);
        for path in &event.paths {
            self.push(path, now);
        }
    }

    /// Record one changed path.
    pub fn push(&mut self, path: &Path, now: Instant) {
        if is_temp_file(path) {
            return;
        }
        let path = normalize_path(path);
        match self.state {
            DebounceState::Flushing => {
                self.queued.insert(path);
            }
            DebounceState::Idle | DebounceState::Pending { .. } => {
                self.pending.insert(path);
                self.state = DebounceState::Pending {
                    deadline: now + self.window,
                };
            }
        }
    }

    /// Hand out the batch once its deadline has passed, entering `Flushing`.
    pub fn poll(&mut self, now: Instant) -> Option<Vec<PathBuf>> {
        let DebounceState::Pending { deadline } = self.state else {
            return None;
        };
        if now < deadline {
            return None;
        }
        self.state = DebounceState::Flushing;
        Some(mem::take(&mut self.pending).into_iter().collect())
    }

    /// The build of the last batch is done. Events queued meanwhile start
    /// a fresh window from `now`.
    pub fn finish(&mut self, now: Instant) {
        if self.state != DebounceState::Flushing {
            return;
        }
        if self.queued.is_empty() {
            self.state = DebounceState::Idle;
            return;
        }
        self.pending = mem::take(&mut self.queued);
        self.state = DebounceState::Pending {
            deadline: now + self.window,
        };
    }

    /// Time left until [`poll`](Self::poll) can return a batch, `None` when
    /// nothing is pending.
    pub fn sleep_duration(&self, now: Instant) -> Option<Duration> {
        match self.state {
            DebounceState::Pending { deadline } => Some(deadline.saturating_duration_since(now)),
            _ => None,
        }
    }
}

/// Editor artifacts: swap, backup and hidden files.
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "swx" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
        || name.starts_with('#')
        || name == "4913"
}
