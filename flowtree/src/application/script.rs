//! Event scripts: one event per line, `#` starts a comment line.
//!
//! ```text
//! # two buttons under the root
//! add root
//! add root
//! edit n1
//! type n1 Appro
//! commit n1 Approve
//! ```

use tracing::{instrument, warn};

use crate::application::session::{IgnoreReason, Outcome, Session};
use crate::application::ApplicationResult;
use crate::domain::{DomainError, Event};

/// An event together with the script line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEvent {
    pub line: usize,
    pub event: Event,
}

/// Per-line result of [`replay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayStep {
    pub line: usize,
    pub event: Event,
    pub outcome: Outcome,
}

/// Parses a whole script; the first malformed line aborts with its number.
#[instrument(level = "debug", skip_all)]
pub fn parse_script(input: &str) -> ApplicationResult<Vec<ScriptEvent>> {
    let mut events = Vec::new();
    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        if raw.trim().is_empty() || raw.trim_start().starts_with('#') {
            continue;
        }
        let event = Event::parse_line(raw, line)?;
        events.push(ScriptEvent { line, event });
    }
    Ok(events)
}

/// Applies `events` in order.
///
/// Events on unknown nodes or past the depth limit are reported and
/// skipped, like any other ignored event; they never abort the replay.
#[instrument(level = "debug", skip_all, fields(events = events.len()))]
pub fn replay(session: &mut Session, events: Vec<ScriptEvent>) -> Vec<ReplayStep> {
    events
        .into_iter()
        .map(|ScriptEvent { line, event }| {
            let outcome = session.apply(event.clone());
            match outcome {
                Outcome::Ignored(IgnoreReason::UnknownNode) => {
                    warn!(line, %event, "event targets an unknown node")
                }
                Outcome::Ignored(IgnoreReason::TooDeep) => {
                    let max_depth = session.max_depth();
                    warn!(line, %event, max_depth, "tree depth limit reached")
                }
                _ => {}
            }
            ReplayStep {
                line,
                event,
                outcome,
            }
        })
        .collect()
}

/// Like [`replay`], but an event on an unknown node aborts with an error.
///
/// Events before the offending line stay applied.
#[instrument(level = "debug", skip_all, fields(events = events.len()))]
pub fn replay_strict(
    session: &mut Session,
    events: Vec<ScriptEvent>,
) -> ApplicationResult<Vec<ReplayStep>> {
    let mut steps = Vec::with_capacity(events.len());
    for ScriptEvent { line, event } in events {
        let outcome = session.apply(event.clone());
        if outcome == Outcome::Ignored(IgnoreReason::UnknownNode) {
            let target = event.target().map(|id| id.to_string()).unwrap_or_default();
            return Err(DomainError::UnknownNode(format!("{target} (line {line})")).into());
        }
        steps.push(ReplayStep {
            line,
            event,
            outcome,
        });
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApplicationError;
    use crate::domain::NodeId;

    #[test]
    fn given_comments_and_blanks_when_parsing_then_keeps_line_numbers() {
        let script = "# header\n\nadd root\n   # indented comment\nedit n1\n";
        let events = parse_script(script).unwrap();
        assert_eq!(
            events,
            vec![
                ScriptEvent {
                    line: 3,
                    event: Event::AddChild(NodeId::ROOT)
                },
                ScriptEvent {
                    line: 5,
                    event: Event::BeginEdit("n1".parse().unwrap())
                },
            ]
        );
    }

    #[test]
    fn given_bad_line_when_parsing_then_errors_with_line() {
        let err = parse_script("add root\nfly n1\n").unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::InvalidEvent { line: 2, .. })
        ));
    }

    #[test]
    fn given_unknown_target_when_replaying_strict_then_stops_at_line() {
        let mut session = Session::default();
        let events = parse_script("add root\nadd n7\nadd root\n").unwrap();

        let err = replay_strict(&mut session, events).unwrap_err();

        assert_eq!(err.to_string(), "unknown node: n7 (line 2)");
        assert_eq!(session.tree().root().child_count(), 1);
    }

    #[test]
    fn given_unknown_target_when_replaying_then_skips_and_continues() {
        let mut session = Session::default();
        let events = parse_script("add root\nadd n7\nadd root\n").unwrap();

        let steps = replay(&mut session, events);

        assert_eq!(steps[1].outcome, Outcome::Ignored(IgnoreReason::UnknownNode));
        assert_eq!(session.tree().root().child_count(), 2);
    }
}
