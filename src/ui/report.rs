//! Plain-text reports over an analysis result.
//!
//! Each section renders to an empty string when its view is empty, so a
//! caller can skip sections without probing the model first.

use itertools::Itertools;

use crate::analyzer::{Analyzer, Counted, EMPTY_STACK};

/// Group size above which the group gets an explicit member-count line.
const GROUP_COUNT_THRESHOLD: usize = 4;

/// Render all threads grouped by identical stack.
pub fn threads(analyzer: &Analyzer) -> String {
    if analyzer.thread_count() == 0 {
        return String::new();
    }

    let mut out = format!("{} threads found\n", analyzer.thread_count());
    for group in analyzer.stack_groups() {
        out.push('\n');
        if group.threads.len() > GROUP_COUNT_THRESHOLD {
            out.push_str(&format!("{} threads with this stack:\n", group.threads.len()));
        }
        for &id in &group.threads {
            out.push_str(&analyzer.thread(id).header_string());
            out.push('\n');
        }
        if group.frames.is_empty() {
            out.push_str(EMPTY_STACK);
            out.push('\n');
        } else {
            for frame in &group.frames {
                out.push_str(&format!("\tat {frame}\n"));
            }
        }
    }
    out
}

/// Render unrecognized input lines as `<count> <line>` rows.
pub fn ignored(analyzer: &Analyzer) -> String {
    let lines = analyzer.ignored_lines();
    if lines.is_empty() {
        return String::new();
    }

    let mut out = "Unrecognized lines:\n".to_string();
    out.push_str(&counted_rows(&lines));
    out
}

/// Render the running-method tally.
pub fn running(analyzer: &Analyzer) -> String {
    let methods = analyzer.running_methods();
    if methods.is_empty() {
        return String::new();
    }

    let mut out = format!(
        "Top methods from {} running threads:\n",
        analyzer.running_thread_count()
    );
    out.push_str(&counted_rows(&methods));
    out
}

fn counted_rows<S>(counted: &[Counted<'_, S>]) -> String {
    let mut rows = counted
        .iter()
        .map(|c| format!("{} {}", c.count, c.key))
        .join("\n");
    rows.push('\n');
    rows
}

/// Render every synchronizer with its holder and waiters.
pub fn synchronizers(analyzer: &Analyzer) -> String {
    let blocks = analyzer
        .synchronizers()
        .iter()
        .map(|synchronizer| {
            let mut block = synchronizer.id.clone();
            if let Some(class_name) = &synchronizer.class_name {
                block.push_str(&format!(" (a {class_name})"));
            }
            block.push('\n');

            if let Some(holder) = synchronizer.lock_holder {
                block.push_str(&format!("Held by:\n  {}\n", analyzer.thread(holder).name));
            }
            if !synchronizer.lock_waiters.is_empty() {
                block.push_str("Threads waiting to take lock:\n");
                for &id in &synchronizer.lock_waiters {
                    block.push_str(&format!("  {}\n", analyzer.thread(id).name));
                }
            }
            if !synchronizer.notification_waiters.is_empty() {
                block.push_str("Threads waiting for notification on lock:\n");
                for &id in &synchronizer.notification_waiters {
                    block.push_str(&format!("  {}\n", analyzer.thread(id).name));
                }
            }
            block
        })
        .collect_vec();

    blocks.join("\n")
}
