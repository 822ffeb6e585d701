use nom::IResult;
use nom::Parser;
use nom::bytes::complete::tag;
use nom::character::complete::{char, u32 as line_number};
use nom::combinator::{map, opt};
use nom::sequence::preceded;

/// Start and length of one side of a hunk header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRange {
    pub start: u32,
    pub count: u32,
}

/// One hunk of a zero-context diff, reduced to what it adds.
#[derive(Debug, PartialEq, Eq)]
pub struct Hunk {
    /// Range occupied in the new version
    pub added: HunkRange,
    /// Text of the `+` lines, marker stripped
    pub lines: Vec<String>,
}

impl Hunk {
    /// Parse a header line and its body.
    ///
    /// Returns `None` when the header is malformed or the number of `+` lines
    /// disagrees with it.
    pub fn parse(text: &str) -> Option<Self> {
        let mut rows = text.lines();
        let (_, (_, added)) = hunk_header(rows.next()?).ok()?;

        // `-` rows and "\ No newline at end of file" markers carry nothing new
        let lines: Vec<String> = rows
            .filter_map(|row| row.strip_prefix('+'))
            .map(str::to_string)
            .collect();

        (lines.len() == added.count as usize).then_some(Hunk { added, lines })
    }

    /// Added lines paired with their 1-based number in the new version
    pub fn numbered(&self) -> impl Iterator<Item = (u32, &str)> {
        (self.added.start..).zip(self.lines.iter().map(String::as_str))
    }
}

/// Parse `start[,count]`; a missing count means one line
fn hunk_range(input: &str) -> IResult<&str, HunkRange> {
    map(
        (line_number, opt(preceded(char(','), line_number))),
        |(start, count)| HunkRange {
            start,
            count: count.unwrap_or(1),
        },
    )
    .parse(input)
}

/// Parse `@@ -old[,count] +new[,count] @@`, leaving any section heading unconsumed
pub fn hunk_header(input: &str) -> IResult<&str, (HunkRange, HunkRange)> {
    map(
        (
            preceded(tag("@@ -"), hunk_range),
            preceded(tag(" +"), hunk_range),
            tag(" @@"),
        ),
        |(old, new, _)| (old, new),
    )
    .parse(input)
}
