use crate::config::Granularity;
use crate::lyric::TimedFragment;

use std::time::Duration;

use unicode_segmentation::UnicodeSegmentation;

/// Shortest highlight a `\k` tag may carry, in centiseconds.
const MIN_UNIT: i64 = 1;

/// Rounds to the nearest centisecond.
pub fn centis(time: Duration) -> i64 {
    ((time.as_millis() + 5) / 10) as i64
}

/// Builds `{\kN}text` markup for one line.
///
/// Each fragment lasts until the next fragment starts. The last one lasts
/// until `successor`, or for `syllable_tail` when there is none. Fragments
/// without text become bare pauses so later syllables stay in sync, except
/// at the end of the line where they would only pad the markup.
pub fn render(
    fragments: &[TimedFragment],
    successor: Option<Duration>,
    granularity: Granularity,
    syllable_tail: Duration,
) -> String {
    let per_character = match granularity {
        Granularity::Syllable => false,
        Granularity::Character => true,
        Granularity::Auto => fragments.iter().filter(|f| !f.is_empty()).count() == 1,
    };
    let last_visible = match fragments.iter().rposition(|f| !f.is_empty()) {
        Some(i) => i,
        None => return String::new(),
    };

    let mut markup = String::new();
    for (i, fragment) in fragments[..=last_visible].iter().enumerate() {
        let next = fragments.get(i + 1).map(|f| f.start).or(successor);
        let duration = match next {
            Some(next) => centis(next) - centis(fragment.start),
            None => centis(syllable_tail),
        };
        let duration = duration.max(MIN_UNIT);

        if per_character && !fragment.is_empty() {
            push_characters(&mut markup, duration, &fragment.text);
        } else {
            push_unit(&mut markup, duration, &fragment.text);
        }
    }
    markup
}

fn push_characters(markup: &mut String, total: i64, text: &str) {
    let units = characters(text);
    let each = (total / units.len() as i64).max(MIN_UNIT);
    for unit in units {
        push_unit(markup, each, unit);
    }
}

fn push_unit(markup: &mut String, centis: i64, text: &str) {
    markup.push_str("{\\k");
    markup.push_str(&centis.to_string());
    markup.push('}');
    markup.push_str(text);
}

/// Splits text into grapheme clusters, keeping ASS escapes (`\N`, `\n`, `\h`)
/// together.
fn characters(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut graphemes = text.grapheme_indices(true).peekable();
    while let Some((at, grapheme)) = graphemes.next() {
        if grapheme == "\\" {
            if let Some(&(_, escape)) = graphemes.peek() {
                if escape == "N" || escape == "n" || escape == "h" {
                    graphemes.next();
                    units.push(&text[at..at + 2]);
                    continue;
                }
            }
        }
        units.push(grapheme);
    }
    units
}
