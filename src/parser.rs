use crate::lyric::{LyricLine, Lyrics, Metadata, TimedFragment};

use std::sync::LazyLock;
use std::time::Duration;

use log::debug;
use nom::bytes::complete::take_while_m_n;
use nom::character::complete::{char, digit1, one_of};
use nom::combinator::{map_res, opt};
use nom::error::{Error, ErrorKind};
use nom::sequence::{delimited, preceded};
use nom::{Err, IResult};
use regex::Regex;

static METADATA_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([A-Za-z_][A-Za-z0-9_]*):([^\]]*)\]$").expect("metadata pattern is valid")
});

pub struct Parser;
impl Parser {
    pub fn new() -> Self {
        Self {}
    }

    /// Parses a whole LRC document. Lines without a usable timestamp are
    /// skipped, so this never fails.
    pub fn parse(&self, input: &str) -> Lyrics {
        let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
        let mut lyrics = Lyrics::default();

        for (index, raw) in input.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some((key, value)) = metadata_tag(line) {
                store_metadata(&mut lyrics.metadata, key, value);
                continue;
            }
            let fragments = parse_line(line);
            if fragments.is_empty() {
                debug!("Skipping line {}, no timestamp: '{}'", index + 1, line);
                continue;
            }
            lyrics.lines.push(LyricLine { fragments });
        }

        lyrics
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notation {
    /// `[mm:ss.cc]text`
    Bracket,
    /// `<mm:ss.cc>text`
    Angle,
}

impl Notation {
    fn delimiters(self) -> (char, char) {
        match self {
            Notation::Bracket => ('[', ']'),
            Notation::Angle => ('<', '>'),
        }
    }
}

/// Splits one raw line into timed fragments. Angle-bracket (word-timed) notation
/// wins when the line contains a `<` and at least one valid angle tag.
pub fn parse_line(line: &str) -> Vec<TimedFragment> {
    if line.contains('<') {
        let fragments = angle_fragments(line);
        if !fragments.is_empty() {
            return fragments;
        }
    }
    bracket_fragments(line)
}

fn bracket_fragments(line: &str) -> Vec<TimedFragment> {
    let tags = find_tags(line, Notation::Bracket);
    tags.iter()
        .enumerate()
        .map(|(i, &(_, end, start))| {
            let run_end = tags.get(i + 1).map_or(line.len(), |next| next.0);
            TimedFragment::from_run(start, &line[end..run_end])
        })
        .collect()
}

fn angle_fragments(line: &str) -> Vec<TimedFragment> {
    find_tags(line, Notation::Angle)
        .into_iter()
        .map(|(_, end, start)| {
            let rest = &line[end..];
            let run = rest.find('<').map_or(rest, |i| &rest[..i]);
            // Word-timed lines often keep the line timestamp inline.
            TimedFragment::from_run(start, &strip_tags(run, Notation::Bracket))
        })
        .collect()
}

fn strip_tags(text: &str, notation: Notation) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut last = 0;
    for (start, end, _) in find_tags(text, notation) {
        stripped.push_str(&text[last..start]);
        last = end;
    }
    stripped.push_str(&text[last..]);
    stripped
}

/// Every valid tag in `line` as `(tag start, tag end, timestamp)` byte offsets.
fn find_tags(line: &str, notation: Notation) -> Vec<(usize, usize, Duration)> {
    let (open, _) = notation.delimiters();
    let mut tags = Vec::new();
    let mut pos = 0;
    while let Some(found) = line[pos..].find(open) {
        let at = pos + found;
        match time_tag(&line[at..], notation) {
            Ok((rest, start)) => {
                let end = line.len() - rest.len();
                tags.push((at, end, start));
                pos = end;
            }
            Err(_) => pos = at + open.len_utf8(),
        }
    }
    tags
}

fn time_tag(input: &str, notation: Notation) -> IResult<&str, Duration> {
    let (open, close) = notation.delimiters();
    delimited(char(open), timestamp, char(close))(input)
}

/// `minutes:seconds[.fraction]`, shared by both notations.
fn timestamp(input: &str) -> IResult<&str, Duration> {
    let (input, minutes): (_, u64) = map_res(digit1, |s: &str| s.parse())(input)?;
    let (input, _) = char(':')(input)?;
    let (input, seconds): (_, u64) = map_res(
        take_while_m_n(1, 2, |c: char| c.is_ascii_digit()),
        |s: &str| s.parse(),
    )(input)?;
    let (input, millis) = opt(preceded(one_of(".:"), fraction))(input)?;

    let total = minutes
        .checked_mul(60)
        .and_then(|secs| secs.checked_add(seconds))
        .and_then(|secs| secs.checked_mul(1000))
        .and_then(|ms| ms.checked_add(millis.unwrap_or(0)));
    match total {
        Some(ms) => Ok((input, Duration::from_millis(ms))),
        None => Err(Err::Error(Error::new(input, ErrorKind::TooLarge))),
    }
}

fn fraction(input: &str) -> IResult<&str, u64> {
    map_res(
        take_while_m_n(1, 3, |c: char| c.is_ascii_digit()),
        // `.5` is half a second, not five milliseconds.
        |s: &str| format!("{:0<3}", s).parse(),
    )(input)
}

fn metadata_tag(line: &str) -> Option<(&str, &str)> {
    let caps = METADATA_TAG.captures(line)?;
    let key = caps.get(1)?.as_str();
    let value = caps.get(2)?.as_str().trim();
    Some((key, value))
}

fn store_metadata(metadata: &mut Metadata, key: &str, value: &str) {
    match key.to_ascii_lowercase().as_str() {
        "ti" if !value.is_empty() => metadata.title = Some(value.to_string()),
        "ar" if !value.is_empty() => metadata.artist = Some(value.to_string()),
        "offset" => match value.parse() {
            Ok(offset) => metadata.offset = offset,
            Err(_) => debug!("Ignoring invalid offset tag: '{}'", value),
        },
        _ => debug!("Ignoring metadata tag '{}'", key),
    }
}
