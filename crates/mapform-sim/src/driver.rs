//! Scripted editing sessions with an oracle.
//!
//! A session seeds a real store in a temp directory, then drives a
//! [`ProjectEditor`] through a deterministic mix of reorders, renames,
//! creates, and deletes over the fault-injecting transport. At the end the
//! editor's visible page order is compared with the store's.
//!
//! Oracle: with nothing dropped and nothing rejected, the two must agree —
//! settlements and store execution are the same event in this transport, so
//! whatever order the network scrambled them into, both sides saw it
//! identically. Dropped requests are the one legitimate source of lasting
//! divergence: the optimistic patch stays visible, the store never heard
//! about it, and only a rebase would reconcile them.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use mapform_core::db::{self, query, store};
use mapform_core::gesture::ReorderIntent;
use mapform_core::paths;
use mapform_core::session::ProjectEditor;

use crate::rng::DeterministicRng;
use crate::transport::{FaultConfig, FaultStats, SimTransport};

/// Debounce window used by simulated sessions.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Simulated time advanced per round.
const ROUND_STEP: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimConfig {
    pub seed: u64,
    pub rounds: u32,
    /// Pages seeded before the session starts (minimum 2).
    pub pages: u32,
    pub fault: FaultConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            rounds: 50,
            pages: 5,
            fault: FaultConfig::default(),
        }
    }
}

/// Outcome of one simulated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimReport {
    pub rounds: u32,
    pub reorders: u32,
    pub renames: u32,
    pub creates: u32,
    pub deletes: u32,
    pub stats: FaultStats,
    /// Mutations that never settled (dropped requests).
    pub unsettled: usize,
    pub editor_order: Vec<i64>,
    pub store_order: Vec<i64>,
    /// Whether the editor's visible order matches the store.
    pub converged: bool,
}

/// Run one scripted session and report what happened.
pub fn run_session(config: &SimConfig) -> Result<SimReport> {
    let dir = tempfile::tempdir().context("create sim directory")?;
    let store_path = paths::store_path(dir.path());

    // seed the store
    let conn = db::open_store(&store_path)?;
    store::init_workspace(&conn, "sim").context("init sim workspace")?;
    let project = store::create_project(&conn, "sim project")?;
    for index in 0..config.pages.max(2) {
        store::create_page(&conn, project.id, &format!("Page {index}"), 0.0, 0.0, 2.0)?;
    }
    let snapshot = query::project_snapshot(&conn, project.id, None)?;

    let transport = SimTransport::new(db::open_store(&store_path)?, config.fault, config.seed);
    let mut editor = ProjectEditor::new(snapshot, transport, DEBOUNCE_WINDOW);

    // action choices come from a separate stream so the same seed produces
    // the same script regardless of how many random draws the network makes
    let mut script = DeterministicRng::new(config.seed ^ 0x5157_ED0F_F1CE_5EED);

    let mut report = SimReport {
        rounds: config.rounds,
        reorders: 0,
        renames: 0,
        creates: 0,
        deletes: 0,
        stats: FaultStats::default(),
        unsettled: 0,
        editor_order: Vec::new(),
        store_order: Vec::new(),
        converged: false,
    };

    let start = Instant::now();
    let mut now = start;

    for round in 0..config.rounds {
        now += ROUND_STEP;
        let pages = editor.current().pages;

        match script.next_bounded(10) {
            0..=5 => {
                if pages.len() >= 2 {
                    let active = pages[script.pick_index(pages.len())].id;
                    let over = pages[script.pick_index(pages.len())].id;
                    editor.reorder_pages(ReorderIntent {
                        active_id: active,
                        over_id: over,
                    });
                    report.reorders += 1;
                }
            }
            6 | 7 => {
                if !pages.is_empty() {
                    let target = pages[script.pick_index(pages.len())].id;
                    editor.rename_page(target, format!("Renamed {round}"), now);
                    report.renames += 1;
                }
            }
            8 => {
                if !editor.is_last_page() {
                    let target = pages[script.pick_index(pages.len())].id;
                    if editor.delete_page(target) {
                        report.deletes += 1;
                    }
                }
            }
            _ => {
                if editor.create_page(format!("Extra {round}")).is_ok() {
                    report.creates += 1;
                }
            }
        }

        editor.transport_mut().advance();
        editor.tick(now);
    }

    // let coalescing edits fire, then drain the network
    now += DEBOUNCE_WINDOW;
    editor.tick(now);
    editor.flush_edits();
    let drain_ticks = u32::from(config.fault.max_delay_ticks) + 4;
    for _ in 0..drain_ticks {
        now += Duration::from_millis(50);
        editor.transport_mut().advance();
        editor.tick(now);
    }

    report.unsettled = editor.in_flight();
    report.stats = editor.transport_mut().stats();
    report.editor_order = editor.current().pages.iter().map(|p| p.id.as_i64()).collect();
    report.store_order = query::list_pages(&conn, project.id)?
        .iter()
        .map(|p| p.id.as_i64())
        .collect();
    report.converged = report.editor_order == report.store_order;

    info!(
        reorders = report.reorders,
        dropped = report.stats.dropped,
        converged = report.converged,
        "sim session finished"
    );
    Ok(report)
}

/// Run a batch of sessions over consecutive seeds; returns the reports.
pub fn run_campaign(base: &SimConfig, sessions: u32) -> Result<Vec<SimReport>> {
    (0..sessions)
        .map(|offset| {
            let config = SimConfig {
                seed: base.seed + u64::from(offset),
                ..*base
            };
            run_session(&config)
        })
        .collect()
}
