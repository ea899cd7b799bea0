//! Per-row outcome accounting for batch jobs.
use colored::Colorize;
use std::fmt::Display;
use std::fmt::Formatter;

/// What a pipeline does when one row fails. The batch jobs default to
/// counting the failure and moving on; a corrupt image should not abort a
/// whole migration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RowPolicy {
    #[default]
    SkipAndCount,
    Abort,
}

/// Running success/skipped/failed counters for one pipeline pass.
/// Row-level failures land here and never change the process exit status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Tally {
    pub fn ok(&mut self) {
        self.success += 1;
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn fail(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> usize {
        self.success + self.skipped + self.failed
    }

    /// True when nothing failed.
    pub fn clean(&self) -> bool {
        self.failed == 0
    }
}

impl Display for Tally {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}   {} {}   {} {}",
            "ok".green(),
            self.success,
            "skipped".yellow(),
            self.skipped,
            "failed".red(),
            self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let mut tally = Tally::default();
        tally.ok();
        tally.ok();
        tally.skip();
        tally.fail();
        assert_eq!(tally.success, 2);
        assert_eq!(tally.skipped, 1);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.total(), 4);
        assert!(!tally.clean());
    }
}
