use crate::config::Config;
use crate::karaoke;
use crate::lyric::{Dialogue, LyricLine, Lyrics, Style};

use std::time::Duration;

use log::debug;

/// Shortest event we will emit, one centisecond.
const MIN_EVENT: Duration = Duration::from_millis(10);

pub fn process(lyrics: Lyrics, config: &Config) -> Vec<Dialogue> {
    let lines = apply_offset(lyrics.lines, lyrics.metadata.offset);
    let lines = sort_lines(lines);
    build_dialogues(&lines, config)
}

fn apply_offset(mut lines: Vec<LyricLine>, offset_ms: i64) -> Vec<LyricLine> {
    if offset_ms == 0 {
        return lines;
    }
    debug!("Applying offset of {} ms", offset_ms);
    let delta = Duration::from_millis(offset_ms.unsigned_abs());
    for fragment in lines.iter_mut().flat_map(|l| l.fragments.iter_mut()) {
        fragment.start = if offset_ms > 0 {
            fragment.start.saturating_sub(delta)
        } else {
            fragment.start.saturating_add(delta)
        };
    }
    lines
}

/// End times are derived from the following line, so this has to happen first.
/// The sort is stable: lines sharing a timestamp keep their file order.
fn sort_lines(mut lines: Vec<LyricLine>) -> Vec<LyricLine> {
    lines.sort_by_key(LyricLine::start);
    lines
}

fn build_dialogues(lines: &[LyricLine], config: &Config) -> Vec<Dialogue> {
    let mut dialogues = Vec::with_capacity(lines.len() * 2);

    for (i, line) in lines.iter().enumerate() {
        if line.is_anchor() {
            continue;
        }
        let successor = lines.get(i + 1).map(LyricLine::start);
        let start = line.start();
        let end = successor
            .unwrap_or_else(|| line.last_start() + config.final_line_hold())
            .max(start + MIN_EVENT);

        let text = karaoke::render(
            &line.fragments,
            successor,
            config.granularity,
            config.syllable_tail(),
        );
        dialogues.push(Dialogue {
            start,
            end,
            style: Style::Default,
            text,
        });

        if config.next_line_preview {
            if let Some(next) = lines[i + 1..].iter().find(|l| !l.is_anchor()) {
                dialogues.push(Dialogue {
                    start,
                    end,
                    style: Style::NextLine,
                    text: next.plain_text(),
                });
            }
        }
    }

    dialogues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Granularity;
    use crate::parser::Parser;

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    fn syllable_config() -> Config {
        Config {
            granularity: Granularity::Syllable,
            next_line_preview: false,
            ..Config::default()
        }
    }

    fn convert(input: &str, config: &Config) -> Vec<Dialogue> {
        process(Parser::new().parse(input), config)
    }

    #[test]
    fn line_ends_where_next_line_begins() {
        let dialogues = convert(
            "[00:01.00]Hello[00:02.50]World\n[00:05.00]Bye\n",
            &syllable_config(),
        );

        assert_eq!(dialogues.len(), 2);
        assert_eq!(dialogues[0].start, ms(1000));
        assert_eq!(dialogues[0].end, ms(5000));
        assert_eq!(dialogues[0].text, "{\\k150}Hello{\\k250}World");
        assert_eq!(dialogues[1].start, ms(5000));
        assert_eq!(dialogues[1].end, ms(10_000));
        assert_eq!(dialogues[1].text, "{\\k100}Bye");
    }

    #[test]
    fn final_line_uses_configured_fallbacks() {
        let config = Config {
            syllable_tail: 0.5,
            final_line_hold: 3.0,
            ..syllable_config()
        };
        let dialogues = convert("[00:10.00]Last", &config);

        assert_eq!(dialogues[0].end, ms(13_000));
        assert_eq!(dialogues[0].text, "{\\k50}Last");
    }

    #[test]
    fn lines_are_sorted_before_timing() {
        let dialogues = convert(
            "[00:05.00]Second\n[00:01.00]First\n[00:09.00]Third\n",
            &syllable_config(),
        );

        let starts: Vec<Duration> = dialogues.iter().map(|d| d.start).collect();
        assert_eq!(starts, vec![ms(1000), ms(5000), ms(9000)]);
        assert_eq!(dialogues[0].text, "{\\k400}First");
        assert_eq!(dialogues[1].text, "{\\k400}Second");
        assert!(starts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn anchor_line_ends_previous_line_silently() {
        let dialogues = convert("[00:01.00]Hello\n[00:03.00]\n[00:10.00]Again\n", &syllable_config());

        assert_eq!(dialogues.len(), 2);
        assert_eq!(dialogues[0].end, ms(3000));
        assert_eq!(dialogues[0].text, "{\\k200}Hello");
        assert_eq!(dialogues[1].start, ms(10_000));
    }

    #[test]
    fn untimed_lines_produce_no_events() {
        let dialogues = convert("Intro\n\n[00:01.00]Sing\nOutro\n", &syllable_config());
        assert_eq!(dialogues.len(), 1);
    }

    #[test]
    fn preview_shows_next_visible_line() {
        let config = Config {
            next_line_preview: true,
            ..syllable_config()
        };
        let dialogues = convert(
            "[00:01.00]One\n[00:02.00]\n[00:03.00]<00:03.00>Two <00:03.50>words\n",
            &config,
        );

        assert_eq!(dialogues.len(), 3);
        assert_eq!(dialogues[1].style, Style::NextLine);
        assert_eq!(dialogues[1].text, "Two words");
        assert_eq!(dialogues[1].start, dialogues[0].start);
        assert_eq!(dialogues[1].end, dialogues[0].end);
        assert_eq!(dialogues[0].end, ms(2000));
        assert_eq!(dialogues[2].style, Style::Default);
    }

    #[test]
    fn preview_does_not_change_primary_timing() {
        let input = "[00:01.00]A[00:01.40]B\n[00:04.00]C\n";
        let without = convert(input, &syllable_config());
        let with = convert(
            input,
            &Config {
                next_line_preview: true,
                ..syllable_config()
            },
        );

        let primary: Vec<&Dialogue> = with.iter().filter(|d| d.style == Style::Default).collect();
        assert_eq!(primary.len(), without.len());
        for (a, b) in primary.iter().zip(without.iter()) {
            assert_eq!(*a, b);
        }
    }

    #[test]
    fn duplicate_timestamps_get_minimal_events() {
        let dialogues = convert("[00:02.00]A\n[00:02.00]B\n", &syllable_config());

        assert_eq!(dialogues[0].start, ms(2000));
        assert_eq!(dialogues[0].end, ms(2010));
        assert_eq!(dialogues[0].text, "{\\k1}A");
    }

    #[test]
    fn positive_offset_shifts_lyrics_earlier() {
        let dialogues = convert("[offset:500]\n[00:00.20]A\n[00:02.00]B\n", &syllable_config());

        assert_eq!(dialogues[0].start, ms(0));
        assert_eq!(dialogues[0].end, ms(1500));
        assert_eq!(dialogues[1].start, ms(1500));
    }

    #[test]
    fn negative_offset_shifts_lyrics_later() {
        let dialogues = convert("[offset:-250]\n[00:01.00]A\n", &syllable_config());
        assert_eq!(dialogues[0].start, ms(1250));
    }

    #[test]
    fn every_unit_is_at_least_one_centisecond() {
        let dialogues = convert(
            "[00:03.00]x[00:02.00]y[00:02.00]z\n[00:01.00]early\n",
            &syllable_config(),
        );
        for dialogue in &dialogues {
            for unit in dialogue.text.split("{\\k").skip(1) {
                let n: i64 = unit[..unit.find('}').unwrap()].parse().unwrap();
                assert!(n >= 1, "{} in {}", n, dialogue.text);
            }
        }
    }
}
