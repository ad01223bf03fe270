use crate::model::SeverityTag;
use crate::policy::{Policy, PolicyError};
use crate::predicates::{LineKind, LineMatcher};

/// Counters gathered during one scan. Reporting them is up to the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub lines_scanned: usize,
    pub headers_seen: usize,
    pub relevant_blocks: usize,
    pub blocks_kept: usize,
    /// Header carried a tag from `drop_severities`.
    pub blocks_dropped: usize,
    pub blocks_discarded_empty: usize,
    pub lines_stripped: usize,
}

#[derive(Clone, Debug)]
pub struct FilterOutcome<'a> {
    pub lines: Vec<&'a str>,
    pub stats: FilterStats,
}

struct Block<'a> {
    header: &'a str,
    header_tag: SeverityTag,
    body: Vec<&'a str>,
}

/// Single-pass block scanner for lint reports.
///
/// A block opens on a relevant header and closes on a blank line, on any
/// other header, or at end of input. Headers are never severity-filtered;
/// body lines are kept or stripped per the policy, and the whole block is
/// emitted or discarded when it closes.
pub struct FindingFilter<'p> {
    policy: &'p Policy,
    matcher: LineMatcher,
}

impl<'p> FindingFilter<'p> {
    pub fn new(policy: &'p Policy) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self {
            policy,
            matcher: LineMatcher::new(policy),
        })
    }

    pub fn run<'a, S: AsRef<str>>(&self, lines: &'a [S]) -> FilterOutcome<'a> {
        let mut out = Vec::new();
        let mut stats = FilterStats::default();
        let mut current: Option<Block<'a>> = None;

        for line in lines {
            let line = line.as_ref();
            stats.lines_scanned += 1;
            let kind = self.matcher.inspect(line);

            if matches!(kind, LineKind::RelevantHeader(_) | LineKind::OtherHeader) {
                stats.headers_seen += 1;
            }

            if let LineKind::RelevantHeader(tag) = kind {
                if let Some(block) = current.take() {
                    self.close(block, &mut out, &mut stats);
                }
                stats.relevant_blocks += 1;
                current = Some(Block {
                    header: line,
                    header_tag: tag,
                    body: Vec::new(),
                });
                continue;
            }

            if current.is_none() {
                continue;
            }

            if kind.terminates() {
                if let Some(block) = current.take() {
                    self.close(block, &mut out, &mut stats);
                }
                continue;
            }

            if let (LineKind::Body(tags), Some(block)) = (kind, current.as_mut()) {
                if self.policy.removes_body_line(&tags) {
                    stats.lines_stripped += 1;
                } else {
                    block.body.push(line);
                }
            }
        }

        // end of input closes like a terminator
        if let Some(block) = current.take() {
            self.close(block, &mut out, &mut stats);
        }

        FilterOutcome { lines: out, stats }
    }

    fn close<'a>(&self, block: Block<'a>, out: &mut Vec<&'a str>, stats: &mut FilterStats) {
        if self.policy.drop_severities.contains(block.header_tag) {
            stats.blocks_dropped += 1;
            return;
        }
        if self.policy.discard_empty_blocks && block.body.is_empty() {
            stats.blocks_discarded_empty += 1;
            return;
        }
        stats.blocks_kept += 1;
        out.push(block.header);
        out.extend(block.body);
    }
}

/// Keep the lines of relevant findings, as borrowed slices of `lines`.
pub fn filter<'a, S: AsRef<str>>(lines: &'a [S], policy: &Policy) -> Result<Vec<&'a str>, PolicyError> {
    Ok(filter_with_stats(lines, policy)?.lines)
}

pub fn filter_with_stats<'a, S: AsRef<str>>(
    lines: &'a [S],
    policy: &Policy,
) -> Result<FilterOutcome<'a>, PolicyError> {
    Ok(FindingFilter::new(policy)?.run(lines))
}
