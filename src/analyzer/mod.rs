//! Thread dump analysis core.
//!
//! Consumes the text of a JVM thread dump (`jstack`-style output) in one
//! pass and derives three views over it: threads grouped by identical
//! call stack, a frequency tally of the method each running thread
//! executes, and a cross-referenced list of synchronizers with their
//! holders and waiters. Input acquisition and rendering live outside this
//! module; unparseable input never aborts an analysis, it is collected in
//! the ignored-lines counter instead.

pub mod counter;
pub mod error;
pub mod line;
pub mod sync;
pub mod thread;

pub use counter::{Counted, StringCounter};
pub use error::ParseError;
pub use sync::Synchronizer;
pub use thread::{Thread, ThreadId, EMPTY_STACK};

use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::analyzer::line::LineKind;

/// Threads sharing one identical stack.
#[derive(Debug)]
pub struct StackGroup {
    /// Members ordered by their rendered header string.
    pub threads: Vec<ThreadId>,
    /// The shared frame sequence; empty when no frames were captured.
    pub frames: Vec<String>,
}

/// Analysis result of one thread dump.
///
/// Construction consumes the whole input; afterwards the model is
/// immutable and every accessor is read-only, so a result can be shared
/// with any number of readers.
pub struct Analyzer {
    threads: Vec<Thread>,
    groups: Vec<StackGroup>,
    ignores: StringCounter<String>,
    running_methods: StringCounter<ThreadId>,
    synchronizers: Vec<Synchronizer>,
}

impl Analyzer {
    /// Analyze a thread dump.
    pub fn analyze(text: &str) -> Analyzer {
        let DumpParser {
            threads, ignores, ..
        } = DumpParser::parse(text);

        let groups = group_by_stack(&threads);
        let running_methods = count_running_methods(&threads);
        let synchronizers = sync::build(&threads);

        debug!(
            target: "analyzer",
            "{} threads in {} groups, {} synchronizers, {} ignored lines",
            threads.len(),
            groups.len(),
            synchronizers.len(),
            ignores.total()
        );

        Analyzer {
            threads,
            groups,
            ignores,
            running_methods,
            synchronizers,
        }
    }

    /// All valid threads, in dump order.
    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Resolve a thread back-reference.
    pub fn thread(&self, id: ThreadId) -> &Thread {
        &self.threads[id.0]
    }

    /// Stack groups in display order: biggest first, equal sizes ordered
    /// by stack contents, the empty-stack group always last.
    pub fn stack_groups(&self) -> &[StackGroup] {
        &self.groups
    }

    /// Input lines nothing recognized, most frequent first; sources are
    /// the raw line texts.
    pub fn ignored_lines(&self) -> Vec<Counted<'_, String>> {
        self.ignores.counted()
    }

    /// Methods on top of running threads' stacks, most frequent first;
    /// sources are the executing threads.
    pub fn running_methods(&self) -> Vec<Counted<'_, ThreadId>> {
        self.running_methods.counted()
    }

    /// Number of threads that contributed to the running-method tally.
    pub fn running_thread_count(&self) -> usize {
        self.running_methods.total()
    }

    /// Synchronizers in registration order (first id seen, first listed).
    pub fn synchronizers(&self) -> &[Synchronizer] {
        &self.synchronizers
    }
}

/// Single-pass dump parser: owns the thread list under construction and
/// the "current thread" context that body lines attach to.
struct DumpParser {
    threads: Vec<Thread>,
    current: Option<usize>,
    ignores: StringCounter<String>,
}

impl DumpParser {
    fn parse(text: &str) -> DumpParser {
        let mut parser = DumpParser {
            threads: vec![],
            current: None,
            ignores: StringCounter::new(),
        };

        let lines = text.split('\n').collect_vec();
        let mut i = 0;
        while i < lines.len() {
            let mut logical = lines[i].to_string();
            // a quoted thread name may span several raw lines; absorb
            // until the header fields show up
            while logical.starts_with('"') && !logical.contains("prio=") {
                i += 1;
                if i >= lines.len() {
                    break;
                }
                logical.push_str(", ");
                logical.push_str(lines[i]);
            }
            parser.handle_line(&logical);
            i += 1;
        }

        parser
    }

    fn handle_line(&mut self, line: &str) {
        if let Ok(thread) = Thread::from_header(line) {
            self.threads.push(thread);
            self.current = Some(self.threads.len() - 1);
            return;
        }

        // not a header; the line gets its chance as a body line
        match line::classify(line) {
            // blank lines are consumed whether or not a thread is current
            Ok(LineKind::Blank) => {}
            Ok(kind) => match self.current {
                Some(idx) => self.threads[idx].apply(kind),
                None => self.ignore(line),
            },
            Err(_) => self.ignore(line),
        }
    }

    fn ignore(&mut self, line: &str) {
        debug!(target: "analyzer", "ignored line: {line}");
        self.ignores.add(line, line.to_string());
    }
}

fn group_by_stack(threads: &[Thread]) -> Vec<StackGroup> {
    let mut by_stack: IndexMap<String, Vec<ThreadId>> = IndexMap::new();
    for (idx, thread) in threads.iter().enumerate() {
        by_stack
            .entry(thread.stack_string())
            .or_default()
            .push(ThreadId(idx));
    }

    let mut stacks = by_stack.into_iter().collect_vec();
    stacks.sort_by(|(stack_a, members_a), (stack_b, members_b)| {
        let empty_a = stack_a == EMPTY_STACK;
        let empty_b = stack_b == EMPTY_STACK;
        empty_a
            .cmp(&empty_b)
            .then_with(|| members_b.len().cmp(&members_a.len()))
            .then_with(|| stack_a.cmp(stack_b))
    });

    stacks
        .into_iter()
        .map(|(_, mut members)| {
            members.sort_by_cached_key(|id| threads[id.0].header_string());
            let frames = threads[members[0].0].frames.clone();
            StackGroup {
                threads: members,
                frames,
            }
        })
        .collect()
}

static AT_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s+at\s+").expect("must compile"));

fn count_running_methods(threads: &[Thread]) -> StringCounter<ThreadId> {
    let mut counter = StringCounter::new();
    for (idx, thread) in threads.iter().enumerate() {
        if !thread.running {
            continue;
        }
        let Some(top_frame) = thread.frames.first() else {
            continue;
        };
        let method = AT_PREFIX.replace(top_frame, "");
        counter.add(&method, ThreadId(idx));
    }
    counter
}
