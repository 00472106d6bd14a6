use std::io::{self, BufRead, Write};

use colored::Colorize;
use tracing::warn;

use recon_merge::{Conflict, ConflictResolver, Resolution};
use recon_record::ContourSummary;

/// Asks a person about each conflict.
///
/// End of input or an explicit skip leaves the conflict unresolved.
pub struct PromptResolver<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, conflict: &Conflict) -> io::Result<Option<Resolution>> {
        writeln!(self.output, "{} {}", "conflict:".red().bold(), conflict)?;
        write_candidate(&mut self.output, "A", conflict.a.as_ref())?;
        write_candidate(&mut self.output, "B", conflict.b.as_ref())?;
        if let Some(o) = &conflict.ancestor {
            writeln!(self.output, "  base: {o}")?;
        }

        loop {
            write!(self.output, "keep [a], [b], [k]eep both, or [s]kip? ")?;
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "a" => return Ok(Some(Resolution::TakeA)),
                "b" => return Ok(Some(Resolution::TakeB)),
                "k" | "both" => return Ok(Some(Resolution::KeepBoth)),
                "s" | "skip" => return Ok(None),
                other => writeln!(self.output, "unrecognized answer {other:?}")?,
            }
        }
    }
}

fn write_candidate(out: &mut impl Write, side: &str, summary: Option<&ContourSummary>) -> io::Result<()> {
    match summary {
        Some(s) => writeln!(out, "  {}: {s}", side.yellow()),
        None => writeln!(out, "  {}: {}", side.yellow(), "deleted".dimmed()),
    }
}

impl<R: BufRead, W: Write> ConflictResolver for PromptResolver<R, W> {
    fn resolve(&mut self, conflict: &Conflict) -> Option<Resolution> {
        match self.ask(conflict) {
            Ok(answer) => answer,
            Err(e) => {
                warn!(name = %conflict.name, error = %e, "prompt failed");
                None
            }
        }
    }
}
