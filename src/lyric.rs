use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct TimedFragment {
    pub(crate) start: Duration,
    pub(crate) text: String,
    /// Whether the raw run was followed by whitespace before the next tag.
    pub(crate) ends_with_space: bool,
}

impl TimedFragment {
    /// Builds a fragment from an untrimmed text run.
    pub fn from_run(start: Duration, run: &str) -> Self {
        let text = run.trim();
        Self {
            start,
            text: text.to_string(),
            ends_with_space: !text.is_empty() && run.ends_with(char::is_whitespace),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One physical lyric line. Never empty: the parser only builds a line
/// once it has found at least one timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    pub(crate) fragments: Vec<TimedFragment>,
}

impl LyricLine {
    pub fn start(&self) -> Duration {
        self.fragments
            .first()
            .map_or(Duration::from_secs(0), |f| f.start)
    }

    pub fn last_start(&self) -> Duration {
        self.fragments
            .last()
            .map_or(Duration::from_secs(0), |f| f.start)
    }

    /// A line without any text only marks a point in time, usually the end
    /// of the line before it.
    pub fn is_anchor(&self) -> bool {
        self.fragments.iter().all(TimedFragment::is_empty)
    }

    pub fn plain_text(&self) -> String {
        let mut text = String::new();
        for fragment in self.fragments.iter().filter(|f| !f.is_empty()) {
            text.push_str(&fragment.text);
            if fragment.ends_with_space {
                text.push(' ');
            }
        }
        text.truncate(text.trim_end().len());
        text
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Metadata {
    pub(crate) title: Option<String>,
    pub(crate) artist: Option<String>,
    /// Milliseconds; positive values shift the lyrics earlier.
    pub(crate) offset: i64,
}

#[derive(Debug, Default)]
pub struct Lyrics {
    pub(crate) lines: Vec<LyricLine>,
    pub(crate) metadata: Metadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Default,
    NextLine,
}

impl Style {
    pub fn name(self) -> &'static str {
        match self {
            Style::Default => "Default",
            Style::NextLine => "NextLine",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dialogue {
    pub(crate) start: Duration,
    pub(crate) end: Duration,
    pub(crate) style: Style,
    pub(crate) text: String,
}
