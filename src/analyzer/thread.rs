use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

use crate::analyzer::error::ParseError;
use crate::analyzer::line::{LineKind, SyncVerb};

/// Position of a thread in the analyzer's thread list.
///
/// Every cross-reference in the computed model (synchronizer holders and
/// waiters, running-method attributions) is such an index; the analyzer
/// is the sole owner of the [`Thread`] values themselves. Resolve through
/// [`crate::analyzer::Analyzer::thread`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(pub(crate) usize);

/// Stack rendering of a thread with no captured frames.
pub const EMPTY_STACK: &str = "\t<empty stack>";

/// One parsed thread record.
///
/// All header fields except `daemon` are opaque display strings taken
/// verbatim from the dump, never interpreted further.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Thread {
    /// Thread name, the only mandatory header field.
    pub name: String,
    pub group: Option<String>,
    pub daemon: bool,
    /// Descriptive state text remaining after all recognized header
    /// fields are stripped; may be empty.
    pub state: String,
    /// State reported by a following `java.lang.Thread.State:` line.
    pub thread_state: Option<String>,
    pub number: Option<String>,
    pub prio: Option<String>,
    pub os_prio: Option<String>,
    pub tid: Option<String>,
    pub nid: Option<String>,
    /// Trailing bracketed header token; meaning unknown, kept verbatim.
    pub extra: Option<String>,
    /// True when both the descriptive state and the reported thread
    /// state say the thread executes at snapshot time.
    pub running: bool,
    /// Stack frames, most recent call first.
    pub frames: Vec<String>,
    /// Ids of monitors held, in dump order, duplicates kept.
    pub locks_held: Vec<String>,
    /// The single monitor this thread blocks trying to take, if any.
    pub want_to_acquire: Option<String>,
    /// The monitor this thread awaits notification on, if any.
    pub want_notification_on: Option<String>,
    /// Class name observed for each monitor id this thread referenced.
    pub synchronizer_classes: HashMap<String, String>,
}

static EXTRA: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([0-9a-fx,]+)\]$").expect("must compile"));
static NID: Lazy<Regex> = Lazy::new(|| Regex::new(r" nid=([0-9a-fx,]+)").expect("must compile"));
static TID: Lazy<Regex> = Lazy::new(|| Regex::new(r" tid=([0-9a-fx,]+)").expect("must compile"));
static PRIO: Lazy<Regex> = Lazy::new(|| Regex::new(r" prio=([0-9]+)").expect("must compile"));
static OS_PRIO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" os_prio=([0-9a-fx,]+)").expect("must compile"));
static DAEMON: Lazy<Regex> = Lazy::new(|| Regex::new(r" (daemon)").expect("must compile"));
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r" #([0-9]+)").expect("must compile"));
static GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r#" group="(.*)""#).expect("must compile"));
static NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^"(.*)" "#).expect("must compile"));

/// Find `re` in `line`; on a match return the first capture and cut the
/// whole match out of the line.
fn extract(re: &Regex, line: &mut String) -> Option<String> {
    let cap = re.captures(line)?;
    let value = cap[1].to_string();
    let range = cap.get(0).expect("group 0 always present").range();
    line.replace_range(range, "");
    Some(value)
}

impl Thread {
    /// Parse a thread header line.
    ///
    /// Recognized fields are stripped off the line one by one, rightmost
    /// structural fields first; whatever remains, trimmed, becomes the
    /// descriptive state. A line without a quoted thread name is not a
    /// header at all.
    pub fn from_header(header: &str) -> Result<Thread, ParseError> {
        let mut line = header.to_string();

        let extra = extract(&EXTRA, &mut line);
        let nid = extract(&NID, &mut line);
        let tid = extract(&TID, &mut line);
        let prio = extract(&PRIO, &mut line);
        let os_prio = extract(&OS_PRIO, &mut line);
        let daemon = extract(&DAEMON, &mut line).is_some();
        let number = extract(&NUMBER, &mut line);
        let group = extract(&GROUP, &mut line);
        let name = extract(&NAME, &mut line).ok_or(ParseError::NameMissing)?;

        Ok(Thread {
            name,
            group,
            daemon,
            state: line.trim().to_string(),
            number,
            prio,
            os_prio,
            tid,
            nid,
            extra,
            ..Default::default()
        })
    }

    /// Apply one classified body line to this thread.
    pub fn apply(&mut self, kind: LineKind) {
        match kind {
            LineKind::Frame(frame) => self.frames.push(frame),
            LineKind::ThreadState(state) => {
                self.running = state == "RUNNABLE" && self.state == "runnable";
                self.thread_state = Some(state);
            }
            LineKind::SyncStatus {
                verb,
                id,
                class_name,
            } => {
                self.synchronizer_classes.insert(id.clone(), class_name);
                match verb {
                    SyncVerb::WaitingOn => self.want_notification_on = Some(id),
                    SyncVerb::ParkingToWaitFor | SyncVerb::WaitingToLock => {
                        self.want_to_acquire = Some(id)
                    }
                    SyncVerb::Locked => {
                        // the monitor is released again while this thread
                        // waits for a notification on it
                        if self.want_notification_on.as_deref() != Some(id.as_str()) {
                            self.locks_held.push(id);
                        }
                    }
                }
            }
            LineKind::HeldLock { id, class_name } => {
                self.synchronizer_classes.insert(id.clone(), class_name);
                self.locks_held.push(id);
            }
            LineKind::OwnableHeader | LineKind::NoneMarker | LineKind::Blank => {}
        }
    }

    /// Header rendering, also the ordering key for threads inside a
    /// stack group: `"<group>"/"<name>": [daemon, ]<state>`.
    pub fn header_string(&self) -> String {
        let mut header = String::new();
        if let Some(group) = &self.group {
            header.push_str(&format!("\"{group}\"/"));
        }
        header.push_str(&format!("\"{}\": ", self.name));
        if self.daemon {
            header.push_str("daemon, ");
        }
        header.push_str(&self.state);
        header
    }

    /// Stack rendering, also the grouping key: frames decorated with a
    /// tab and `at`, or [`EMPTY_STACK`] when nothing was captured.
    pub fn stack_string(&self) -> String {
        if self.frames.is_empty() {
            return EMPTY_STACK.to_string();
        }
        self.frames.iter().map(|frame| format!("\tat {frame}")).join("\n")
    }
}

impl fmt::Display for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.header_string(), self.stack_string())
    }
}
