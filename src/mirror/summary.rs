// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Transfer summary parsing.
//!
//! At the end of every run rclone prints a block of statistics. The lines of
//! interest look like this:
//!
//! ```text
//! Transferred:        1.204 KiB / 1.204 KiB, 100%, 0 B/s, ETA -
//! Transferred:            3 / 5, 60%
//! ```
//!
//! The first reports bytes, the second reports files. Either one being
//! non-zero means the dry run found something to pull.

/// Prefix of every transfer statistics line.
pub const TRANSFERRED_LABEL: &str = "Transferred:";

/// Classification of a dry-run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Summary {
    /// Every transfer line reported zero.
    Unchanged,

    /// Some transfer line reported work, could not be read, or no transfer
    /// line was printed at all.
    ChangeFound,
}

/// Classify dry-run output by its transfer counts.
///
/// Unchanged only when at least one transfer line exists and every one of
/// them parses to zero. Anything else counts as a change, since pulling
/// needlessly is cheaper than missing an update.
pub fn classify(output: &str) -> Summary {
    let mut counts = output
        .lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with(TRANSFERRED_LABEL))
        .map(transfer_count)
        .peekable();

    if counts.peek().is_none() {
        return Summary::ChangeFound;
    }

    if counts.all(|count| count == Some(0.0)) {
        Summary::Unchanged
    } else {
        Summary::ChangeFound
    }
}

/// Extract the leading count of a transfer line.
///
/// Strips the label, keeps whatever sits before the first `/`, then parses
/// its first token. Units that follow the number (`B`, `KiB`, ...) are
/// ignored.
pub fn transfer_count(line: &str) -> Option<f64> {
    let rest = line.trim_start().strip_prefix(TRANSFERRED_LABEL)?;
    let before_slash = rest.split('/').next()?;
    let token = before_slash.split_whitespace().next()?;
    token.parse::<f64>().ok().filter(|count| count.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use simple_test_case::test_case;

    #[test_case("Transferred: 0 / 0, -", Some(0.0); "zero files")]
    #[test_case("Transferred: 3 / 5, 60%", Some(3.0); "some files")]
    #[test_case("Transferred:   1.204 KiB / 1.204 KiB, 100%", Some(1.204); "bytes with unit")]
    #[test_case("   Transferred:  0 B / 0 B, -, 0 B/s, ETA -", Some(0.0); "indented bytes")]
    #[test_case("Transferred: many / 5", None; "not a number")]
    #[test_case("Transferred:", None; "empty")]
    #[test_case("Checks: 4 / 4, 100%", None; "other statistic")]
    #[test]
    fn parse_transfer_count(line: &str, expect: Option<f64>) {
        assert_eq!(transfer_count(line), expect);
    }

    #[test]
    fn zero_transfers_is_unchanged() {
        let output = indoc! {"
            2025/01/01 10:00:00 NOTICE:
            Transferred:              0 B / 0 B, -, 0 B/s, ETA -
            Checks:                12 / 12, 100%
            Transferred:            0 / 0, -
            Elapsed time:         1.2s
        "};
        assert_eq!(classify(output), Summary::Unchanged);
    }

    #[test]
    fn non_zero_transfers_is_change_found() {
        let output = indoc! {"
            Transferred:        1.204 KiB / 1.204 KiB, 100%, 0 B/s, ETA -
            Transferred:            3 / 5, 60%
        "};
        assert_eq!(classify(output), Summary::ChangeFound);
    }

    #[test]
    fn short_summary_lines() {
        assert_eq!(classify("Transferred: 0 / 0, ..."), Summary::Unchanged);
        assert_eq!(classify("Transferred: 3 / 5, ..."), Summary::ChangeFound);
    }

    #[test]
    fn malformed_count_is_change_found() {
        let output = indoc! {"
            Transferred:            0 / 0, -
            Transferred:            ?? / 5
        "};
        assert_eq!(classify(output), Summary::ChangeFound);
    }

    #[test]
    fn missing_summary_is_change_found() {
        assert_eq!(classify("nothing useful here\n"), Summary::ChangeFound);
        assert_eq!(classify(""), Summary::ChangeFound);
    }
}
