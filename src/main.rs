//! DumpStalker CLI: read a JVM thread dump, print the derived reports.

use anyhow::Context;
use clap::Parser;
use dumpstalker::analyzer::Analyzer;
use dumpstalker::ui::report;
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Thread dump file; stdin is consumed when omitted.
    file: Option<PathBuf>,

    /// Print the thread groups section only.
    #[clap(long)]
    groups: bool,

    /// Print the running-method tally only.
    #[clap(long)]
    running: bool,

    /// Print the synchronizer section only.
    #[clap(long)]
    synchronizers: bool,

    /// Print the unrecognized input lines only.
    #[clap(long)]
    ignored: bool,
}

impl Args {
    /// Selected sections as (groups, running, synchronizers, ignored);
    /// no section flag at all selects everything.
    fn sections(&self) -> (bool, bool, bool, bool) {
        if !(self.groups || self.running || self.synchronizers || self.ignored) {
            return (true, true, true, true);
        }
        (self.groups, self.running, self.synchronizers, self.ignored)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let text = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("read dump file {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read dump from stdin")?;
            buf
        }
    };

    let analyzer = Analyzer::analyze(&text);
    let (groups, running, synchronizers, ignored) = args.sections();

    let mut sections = vec![];
    if groups {
        sections.push(report::threads(&analyzer));
    }
    if running {
        sections.push(report::running(&analyzer));
    }
    if synchronizers {
        sections.push(report::synchronizers(&analyzer));
    }
    if ignored {
        sections.push(report::ignored(&analyzer));
    }

    sections.retain(|section| !section.is_empty());
    print!("{}", sections.join("\n"));

    Ok(())
}
