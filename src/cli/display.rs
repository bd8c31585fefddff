//! Plain-text rendering of tracker results
//!
//! Render functions return strings so they can be tested directly;
//! [`ConsoleDisplay`] adds colour and decides between stdout and stderr.
//! Diagnostics go to stderr so stdout stays clean for piping.

use chrono::{Duration, NaiveDateTime};
use colored::Colorize;

use crate::cli::command::Reply;
use crate::error::ResetError;
use crate::tracker::category::Category;
use crate::tracker::engine::{CycleInfo, Phase};
use crate::tracker::service::{ScopeView, Submission};
use crate::tracker::store::{ActiveReset, Provenance};

const CLOCK_FORMAT: &str = "%H:%M";

/// Describe where a cycle stands for one category.
#[must_use]
pub fn render_cycle(category: &Category, cycle: &CycleInfo) -> String {
    match cycle.phase {
        Phase::Pending => format!(
            "The next price reset window for {category} starts at {}.",
            cycle.safe_end.format(CLOCK_FORMAT)
        ),
        Phase::Active => format!(
            "The reset window for {category} is active.\nStarted at {} and ends at {}.",
            cycle.safe_end.format(CLOCK_FORMAT),
            cycle.window_end.format(CLOCK_FORMAT)
        ),
    }
}

/// Render one visible entry. Local entries credit the submitter.
#[must_use]
pub fn render_entry(entry: &ActiveReset, now: NaiveDateTime) -> String {
    let text = render_cycle(&entry.record.category, &entry.cycle);
    match entry.provenance {
        Provenance::Global => text,
        Provenance::Local => format!(
            "{text}\nReported by {}, {}",
            entry.record.submitted_by.label,
            format_ago(now - entry.record.recorded_at)
        ),
    }
}

/// Render every entry of a view, separated by blank lines.
#[must_use]
pub fn render_view(view: &ScopeView) -> String {
    view.entries
        .values()
        .map(|entry| render_entry(entry, view.now))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Confirm a stored submission.
#[must_use]
pub fn render_submission(submission: &Submission) -> String {
    let mut text = format!(
        "Recorded {} reset at {}.\n{}",
        submission.record.category,
        submission.record.anchor.format(CLOCK_FORMAT),
        render_cycle(&submission.record.category, &submission.cycle)
    );
    if submission.mirrored {
        text.push_str("\nShared with all servers.");
    }
    text
}

/// Render a reply as user-facing text.
#[must_use]
pub fn render_reply(reply: &Reply) -> String {
    match reply {
        Reply::Submitted(submission) => render_submission(submission),
        Reply::Checked(report) => render_cycle(&report.category, &report.cycle),
        Reply::View(view) => render_view(view),
        Reply::Entry { entry, now } => render_entry(entry, *now),
    }
}

/// Render an error. Both empty-result conditions read the same.
#[must_use]
pub fn render_error(err: &ResetError) -> String {
    if err.is_empty_result() {
        "No active resets right now. Record one with `reset`.".to_string()
    } else {
        err.to_string()
    }
}

/// Human "time ago" for a non-negative duration.
#[must_use]
pub fn format_ago(elapsed: Duration) -> String {
    let minutes = elapsed.num_minutes().max(0);
    if minutes == 0 {
        return "just now".to_string();
    }
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours == 0 {
        format!("{mins}m ago")
    } else {
        format!("{hours}h {mins}m ago")
    }
}

/// Writes replies to stdout (text or JSON) and errors to stderr.
pub struct ConsoleDisplay {
    json: bool,
}

impl ConsoleDisplay {
    /// Create a display; `json` switches replies to one JSON object per line.
    #[must_use]
    pub const fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print a successful reply.
    pub fn print_reply(&self, reply: &Reply) {
        if self.json {
            match serde_json::to_string(reply) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("{} {e}", "error:".red().bold()),
            }
            return;
        }

        let badge = match reply {
            Reply::Submitted(_) => "RECORDED".green().bold(),
            Reply::Checked(report) => phase_badge(report.cycle.phase),
            Reply::View(_) | Reply::Entry { .. } => "RESETS".cyan().bold(),
        };
        println!("{badge}");
        println!("{}", render_reply(reply));
    }

    /// Print a tracker error.
    pub fn print_error(&self, err: &ResetError) {
        if self.json {
            println!("{}", serde_json::json!({ "kind": "error", "message": err.to_string() }));
        } else {
            eprintln!("{} {}", "✗".red().bold(), render_error(err).red());
        }
    }
}

fn phase_badge(phase: Phase) -> colored::ColoredString {
    match phase {
        Phase::Pending => "PENDING".yellow().bold(),
        Phase::Active => "ACTIVE".green().bold(),
    }
}
