//! Console command parsing and dispatch
//!
//! Each input line is parsed with clap into a structured [`Command`], so the
//! tracker never sees raw argument strings. Dispatch returns a serializable
//! [`Reply`] that the display layer turns into text or JSON.

use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;

use crate::error::ResetError;
use crate::tracker::engine::TimeInput;
use crate::tracker::service::{CycleReport, ResetTracker, ScopeView, Submission};
use crate::tracker::store::{ActiveReset, ScopeId, UserRef};

/// One console line
#[derive(Parser, Debug, PartialEq, Eq)]
#[command(name = "resets", no_binary_name = true, disable_version_flag = true)]
pub struct CommandLine {
    /// Scope to act in (overrides the session default)
    #[arg(long, global = true)]
    pub scope: Option<String>,

    /// User to act as (overrides the session default)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

impl CommandLine {
    /// Parse a whitespace-separated console line.
    pub fn parse_line(line: &str) -> Result<Self, clap::Error> {
        Self::try_parse_from(line.split_whitespace())
    }
}

/// Console commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Record a reset from minutes past the current or previous hour
    Reset {
        /// Minutes of the last reset (00-59)
        #[arg(long, allow_negative_numbers = true)]
        minutes: i64,
        /// true if the reset happened in the current hour, false for the previous hour
        #[arg(long, action = ArgAction::Set, default_value_t = true)]
        current_hour: bool,
        /// Ammo type
        #[arg(long)]
        ammo: String,
    },
    /// Record a reset from a time of day (HH:MM)
    ResetAt {
        /// Time of the last reset
        #[arg(long)]
        time: String,
        /// Ammo type
        #[arg(long)]
        ammo: String,
    },
    /// Check a reset window without recording it
    Lastreset {
        /// Minutes of the last reset (00-59)
        #[arg(long, allow_negative_numbers = true)]
        minutes: i64,
        /// true if the reset happened in the current hour, false for the previous hour
        #[arg(long, action = ArgAction::Set, default_value_t = true)]
        current_hour: bool,
        /// Ammo type
        #[arg(long)]
        ammo: String,
    },
    /// Show live resets, or one ammo type
    Resets {
        /// Only this ammo type (not rate limited)
        #[arg(long)]
        ammo: Option<String>,
    },
    /// Leave the console
    Quit,
}

/// Default scope and user for a console session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Scope used when a line does not name one
    pub scope: ScopeId,
    /// User used when a line does not name one
    pub user: UserRef,
}

impl Session {
    /// Resolve per-line overrides against the session defaults.
    #[must_use]
    pub fn resolve(&self, line: &CommandLine) -> (ScopeId, UserRef) {
        let scope = line
            .scope
            .as_deref()
            .map_or_else(|| self.scope.clone(), ScopeId::new);
        let user = line
            .user
            .as_deref()
            .map_or_else(|| self.user.clone(), |id| UserRef::new(id, id));
        (scope, user)
    }
}

/// Structured result of a dispatched command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    /// A reset was stored
    Submitted(Submission),
    /// A reset was checked but not stored
    Checked(CycleReport),
    /// All live resets for the scope
    View(ScopeView),
    /// A single live reset
    Entry {
        /// The entry
        entry: ActiveReset,
        /// Time the entry was read at
        now: chrono::NaiveDateTime,
    },
}

/// Run one parsed line against the tracker.
///
/// Returns `Ok(None)` for [`Command::Quit`].
pub fn dispatch(
    tracker: &ResetTracker,
    session: &Session,
    line: &CommandLine,
) -> Result<Option<Reply>, ResetError> {
    let (scope, user) = session.resolve(line);

    let reply = match &line.command {
        Command::Reset {
            minutes,
            current_hour,
            ammo,
        } => {
            let input = TimeInput::MinuteOfHour {
                minutes: *minutes,
                current_hour: *current_hour,
            };
            Reply::Submitted(tracker.submit(&scope, &user, ammo, &input)?)
        }
        Command::ResetAt { time, ammo } => {
            let input = TimeInput::TimeOfDay(time.clone());
            Reply::Submitted(tracker.submit(&scope, &user, ammo, &input)?)
        }
        Command::Lastreset {
            minutes,
            current_hour,
            ammo,
        } => {
            let input = TimeInput::MinuteOfHour {
                minutes: *minutes,
                current_hour: *current_hour,
            };
            Reply::Checked(tracker.check(ammo, &input)?)
        }
        Command::Resets { ammo: None } => Reply::View(tracker.view(&scope, &user)?),
        Command::Resets { ammo: Some(ammo) } => Reply::Entry {
            now: tracker.now(),
            entry: tracker.view_category(&scope, ammo)?,
        },
        Command::Quit => return Ok(None),
    };

    Ok(Some(reply))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{user, TestTracker};
    use crate::tracker::engine::Phase;
    use crate::tracker::store::Provenance;

    fn session() -> Session {
        Session {
            scope: ScopeId::new("g1"),
            user: user("u1"),
        }
    }

    #[test]
    fn test_parse_reset_defaults_to_current_hour() {
        let line = CommandLine::parse_line("reset --minutes 5 --ammo m995").unwrap();
        assert_eq!(
            line.command,
            Command::Reset {
                minutes: 5,
                current_hour: true,
                ammo: "m995".to_string(),
            }
        );
        assert_eq!(line.scope, None);
    }

    #[test]
    fn test_parse_previous_hour_and_overrides() {
        let line = CommandLine::parse_line(
            "reset --minutes 45 --current-hour false --ammo BS --scope src --user u9",
        )
        .unwrap();
        assert_eq!(
            line.command,
            Command::Reset {
                minutes: 45,
                current_hour: false,
                ammo: "BS".to_string(),
            }
        );
        assert_eq!(line.scope.as_deref(), Some("src"));
        assert_eq!(line.user.as_deref(), Some("u9"));
    }

    #[test]
    fn test_parse_negative_minutes_reaches_validation() {
        let line = CommandLine::parse_line("lastreset --minutes -3 --ammo BS").unwrap();
        assert!(matches!(line.command, Command::Lastreset { minutes: -3, .. }));
    }

    #[test]
    fn test_parse_rejects_missing_ammo() {
        assert!(CommandLine::parse_line("reset --minutes 5").is_err());
        assert!(CommandLine::parse_line("bogus").is_err());
    }

    #[test]
    fn test_session_resolve_overrides() {
        let line = CommandLine::parse_line("resets --scope g2 --user u7").unwrap();
        let (scope, who) = session().resolve(&line);
        assert_eq!(scope, ScopeId::new("g2"));
        assert_eq!(who, UserRef::new("u7", "u7"));

        let line = CommandLine::parse_line("resets").unwrap();
        assert_eq!(session().resolve(&line), (ScopeId::new("g1"), user("u1")));
    }

    #[test]
    fn test_dispatch_reset_then_resets() {
        let t = TestTracker::new("2024-05-10 14:20:30", Some("src"));
        let session = session();

        let reset = CommandLine::parse_line("reset --minutes 5 --ammo m995 --scope src").unwrap();
        let reply = dispatch(&t.tracker, &session, &reset).unwrap().unwrap();
        assert!(matches!(reply, Reply::Submitted(ref s) if s.mirrored));

        let view = CommandLine::parse_line("resets").unwrap();
        let Some(Reply::View(view)) = dispatch(&t.tracker, &session, &view).unwrap() else {
            panic!("expected a view");
        };
        let entry = view.entries.values().next().unwrap();
        assert_eq!(entry.provenance, Provenance::Global);
        assert_eq!(entry.cycle.phase, Phase::Pending);
    }

    #[test]
    fn test_dispatch_single_ammo() {
        let t = TestTracker::new("2024-05-10 14:20:30", None);
        let session = session();
        let reset = CommandLine::parse_line("reset-at --time 13:30 --ammo ap").unwrap();
        dispatch(&t.tracker, &session, &reset).unwrap();

        let line = CommandLine::parse_line("resets --ammo AP").unwrap();
        let Some(Reply::Entry { entry, .. }) = dispatch(&t.tracker, &session, &line).unwrap() else {
            panic!("expected an entry");
        };
        assert_eq!(entry.cycle.phase, Phase::Active);
    }

    #[test]
    fn test_dispatch_quit() {
        let t = TestTracker::new("2024-05-10 14:20:30", None);
        let line = CommandLine::parse_line("quit").unwrap();
        assert_eq!(dispatch(&t.tracker, &session(), &line), Ok(None));
    }

    #[test]
    fn test_dispatch_propagates_validation_errors() {
        let t = TestTracker::new("2024-05-10 14:20:30", None);
        let line = CommandLine::parse_line("lastreset --minutes 75 --ammo BS").unwrap();
        assert_eq!(
            dispatch(&t.tracker, &session(), &line),
            Err(ResetError::InvalidMinutes(75))
        );
    }
}
