//! Input events consumed by the session.

use std::fmt;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::tree::NodeId;

/// A discrete user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Double-activate on a node: enter edit mode.
    BeginEdit(NodeId),
    /// Live typing into the edit box.
    EditBuffer(NodeId, String),
    /// Finalize the edit with this text.
    CommitEdit(NodeId, String),
    /// Abandon the edit.
    CancelEdit(NodeId),
    /// Append a child to the node.
    AddChild(NodeId),
    /// Collapse or expand the node's subtree.
    ToggleVisibility(NodeId),
    /// Switch long-label elision on or off.
    SetTruncateMode(bool),
}

impl Event {
    /// Node the event targets, if any.
    pub fn target(&self) -> Option<NodeId> {
        match self {
            Event::BeginEdit(id)
            | Event::EditBuffer(id, _)
            | Event::CommitEdit(id, _)
            | Event::CancelEdit(id)
            | Event::AddChild(id)
            | Event::ToggleVisibility(id) => Some(*id),
            Event::SetTruncateMode(_) => None,
        }
    }

    /// Parses one script line, e.g. `commit n3 Approve order`.
    ///
    /// Words are separated by any whitespace; text arguments start after
    /// a single separator and run to the end of the line, inner
    /// whitespace kept.
    /// `line` is only used for error reporting.
    pub fn parse_line(input: &str, line: usize) -> DomainResult<Self> {
        let invalid = |message: String| DomainError::InvalidEvent { line, message };

        let input = input.trim_start();
        let (verb, rest) = split_word(input);
        // any run of whitespace may separate the verb from its node id
        let (arg, text) = split_word(rest.trim_start());
        let node = || -> DomainResult<NodeId> {
            if arg.is_empty() {
                return Err(invalid(format!("`{verb}` needs a node id")));
            }
            arg.parse().map_err(|e: DomainError| invalid(e.to_string()))
        };

        match verb {
            "add" => Ok(Event::AddChild(node()?)),
            "edit" => Ok(Event::BeginEdit(node()?)),
            "type" => Ok(Event::EditBuffer(node()?, text.to_string())),
            "commit" => Ok(Event::CommitEdit(node()?, text.to_string())),
            "cancel" => Ok(Event::CancelEdit(node()?)),
            "toggle" => Ok(Event::ToggleVisibility(node()?)),
            "truncate" => match arg {
                "on" => Ok(Event::SetTruncateMode(true)),
                "off" => Ok(Event::SetTruncateMode(false)),
                other => Err(invalid(format!("expected `on` or `off`, got {other:?}"))),
            },
            other => Err(invalid(format!("unknown event {other:?}"))),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::BeginEdit(id) => write!(f, "edit {id}"),
            Event::EditBuffer(id, text) => write!(f, "type {id} {text}"),
            Event::CommitEdit(id, text) => write!(f, "commit {id} {text}"),
            Event::CancelEdit(id) => write!(f, "cancel {id}"),
            Event::AddChild(id) => write!(f, "add {id}"),
            Event::ToggleVisibility(id) => write!(f, "toggle {id}"),
            Event::SetTruncateMode(on) => write!(f, "truncate {}", if *on { "on" } else { "off" }),
        }
    }
}

/// Splits off the first whitespace-delimited word; the remainder keeps
/// its inner spacing but loses the single separator.
fn split_word(input: &str) -> (&str, &str) {
    match input.find(char::is_whitespace) {
        Some(pos) => {
            let rest = &input[pos..];
            let sep = rest.chars().next().map_or(0, char::len_utf8);
            (&input[..pos], &rest[sep..])
        }
        None => (input, ""),
    }
}
