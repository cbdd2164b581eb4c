//! Terminal rendering: a [`Callbacks`] implementor built on `crossterm` for
//! styling and `comfy-table` for the tabular commands (`list`, `locks`,
//! `info`, `search`). Kept to a single flat module since this binary has
//! one rendering surface, not a live-updating progress table.

use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use crossterm::style::Stylize;
use mport_engine::{Answer, Callbacks};
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// A `Callbacks` implementation that writes styled status lines and a
/// progress counter to stderr, and resolves confirmations either by
/// prompting on stdin or by auto-answering when `assume_yes` is set
/// (`--force`, `ASSUME_ALWAYS_YES`, `MAGUS`).
pub struct TermCallbacks {
    assume_yes: bool,
    quiet: bool,
    progress_label: Mutex<String>,
    progress_total: AtomicU64,
    progress_done: AtomicU64,
}

impl TermCallbacks {
    /// Build a renderer. `assume_yes` short-circuits every `confirm` to Yes
    /// without prompting, matching `--force`/`ASSUME_ALWAYS_YES`/`MAGUS`.
    pub fn new(assume_yes: bool, quiet: bool) -> Self {
        Self {
            assume_yes,
            quiet,
            progress_label: Mutex::new(String::new()),
            progress_total: AtomicU64::new(0),
            progress_done: AtomicU64::new(0),
        }
    }
}

impl Callbacks for TermCallbacks {
    fn message(&self, text: &str) {
        if !self.quiet {
            eprintln!("{} {text}", "==>".blue().bold());
        }
    }

    fn progress_init(&self, label: &str, total: u64) {
        *self.progress_label.lock().unwrap() = label.to_string();
        self.progress_total.store(total, Ordering::Relaxed);
        self.progress_done.store(0, Ordering::Relaxed);
    }

    fn progress_step(&self) {
        let done = self.progress_done.fetch_add(1, Ordering::Relaxed) + 1;
        if self.quiet {
            return;
        }
        let total = self.progress_total.load(Ordering::Relaxed);
        let label = self.progress_label.lock().unwrap();
        eprint!("\r{} {label} ({done}/{total})", "...".dark_grey());
        let _ = io::stderr().flush();
    }

    fn progress_done(&self) {
        if !self.quiet {
            eprintln!();
        }
    }

    fn confirm(&self, prompt: &str) -> Answer {
        if self.assume_yes {
            return Answer::Yes;
        }
        eprint!("{} {prompt} [y/N] ", "?".yellow().bold());
        let _ = io::stderr().flush();
        let mut line = String::new();
        if io::stdin().read_line(&mut line).is_err() {
            return Answer::No;
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Answer::Yes,
            _ => Answer::No,
        }
    }
}

/// Render a standard installed-package listing.
pub fn render_package_table(rows: &[(String, String, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["name", "version", "status"]);
    for (name, version, status) in rows {
        table.add_row(vec![name, version, status]);
    }
    println!("{table}");
}

/// Render a free-form key/value table (`info`, `config list`).
pub fn render_kv_table(title: &str, rows: &[(String, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![title, "value"]);
    for (k, v) in rows {
        table.add_row(vec![k, v]);
    }
    println!("{table}");
}
