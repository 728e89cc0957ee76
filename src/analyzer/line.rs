//! Classification of a single logical dump line.
//!
//! Classification is pure: it never looks at the thread under
//! construction. The caller decides what to do with the returned
//! [`LineKind`], the classifier only answers "what is this line".

use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

use crate::analyzer::error::ParseError;

/// Verb phrase of a `- <verb> <id> (a <class>)` synchronization status
/// line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum SyncVerb {
    #[strum(serialize = "waiting on")]
    WaitingOn,
    #[strum(serialize = "parking to wait for")]
    ParkingToWaitFor,
    #[strum(serialize = "waiting to lock")]
    WaitingToLock,
    #[strum(serialize = "locked")]
    Locked,
}

/// One recognized logical line of a thread dump body.
#[derive(Debug, PartialEq, Eq)]
pub enum LineKind {
    /// `at <method>` stack frame.
    Frame(String),
    /// `java.lang.Thread.State: <state>` report.
    ThreadState(String),
    /// Synchronization status with a verb phrase.
    SyncStatus {
        verb: SyncVerb,
        id: String,
        class_name: String,
    },
    /// Held lock in the older format without a verb phrase:
    /// `- <id> (a <class>)`.
    HeldLock { id: String, class_name: String },
    /// `Locked ownable synchronizers:` list header, recognized and
    /// discarded.
    OwnableHeader,
    /// `- None` marker, recognized and discarded.
    NoneMarker,
    /// Empty or whitespace-only line.
    Blank,
}

static FRAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s+at (.*)").expect("must compile"));
static THREAD_STATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*java\.lang\.Thread\.State: (.*)").expect("must compile"));
static SYNC_STATUS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s+- (.*?) +<([x0-9a-fA-F]+)> \(a (.*)\)").expect("must compile")
});
static HELD_LOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s+- <([x0-9a-fA-F]+)> \(a (.*)\)").expect("must compile"));
static OWNABLE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s+Locked ownable synchronizers:").expect("must compile"));
static NONE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s+- None").expect("must compile"));
static BLANK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*$").expect("must compile"));

/// Classify one logical line, first matching rule wins.
///
/// A synchronization status line with an unknown verb phrase is
/// unrecognized as a whole: the legacy held-lock rule below it only
/// applies when no verb phrase precedes the monitor id at all.
pub fn classify(line: &str) -> Result<LineKind, ParseError> {
    if let Some(cap) = FRAME.captures(line) {
        return Ok(LineKind::Frame(cap[1].to_string()));
    }

    if let Some(cap) = THREAD_STATE.captures(line) {
        return Ok(LineKind::ThreadState(cap[1].to_string()));
    }

    if let Some(cap) = SYNC_STATUS.captures(line) {
        let verb = SyncVerb::from_str(&cap[1]).map_err(|_| ParseError::UnrecognizedLine)?;
        return Ok(LineKind::SyncStatus {
            verb,
            id: cap[2].to_string(),
            class_name: cap[3].to_string(),
        });
    }

    if let Some(cap) = HELD_LOCK.captures(line) {
        return Ok(LineKind::HeldLock {
            id: cap[1].to_string(),
            class_name: cap[2].to_string(),
        });
    }

    if OWNABLE_HEADER.is_match(line) {
        return Ok(LineKind::OwnableHeader);
    }

    if NONE_MARKER.is_match(line) {
        return Ok(LineKind::NoneMarker);
    }

    if BLANK.is_match(line) {
        return Ok(LineKind::Blank);
    }

    Err(ParseError::UnrecognizedLine)
}
