use crate::config::Config;
use crate::karaoke::centis;
use crate::lyric::{Dialogue, Style};

use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";
const EVENT_FORMAT: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

pub struct AssDocument<'a> {
    pub config: &'a Config,
    pub title: &'a str,
    pub artist: Option<&'a str>,
    pub dialogues: &'a [Dialogue],
}

/// Writes the document next to `output` first and renames it into place, so a
/// failed run leaves no partial file behind.
pub fn serialise<P: AsRef<Path>>(doc: &AssDocument, output: P) -> Result<()> {
    let output = output.as_ref();
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create output file: '{}'", output.display()))?;
    let mut writer = BufWriter::new(file);
    write_document(&mut writer, doc).context("Failed to write to output file.")?;
    let file = writer
        .into_inner()
        .map_err(|err| err.into_error())
        .context("Failed to write to output file.")?;
    file.persist(output)
        .with_context(|| format!("Failed to create output file: '{}'", output.display()))?;
    Ok(())
}

pub fn serialise_to<W: Write>(doc: &AssDocument, dst: W) -> Result<()> {
    let mut writer = BufWriter::new(dst);
    write_document(&mut writer, doc).context("Failed to write output.")?;
    writer.flush().context("Failed to write output.")?;
    Ok(())
}

fn write_document<W: Write>(buf: &mut W, doc: &AssDocument) -> Result<()> {
    write_script_info(buf, doc)?;
    writeln!(buf)?;
    write_styles(buf, doc.config)?;
    writeln!(buf)?;
    writeln!(buf, "[Events]")?;
    writeln!(buf, "{}", EVENT_FORMAT)?;
    for dialogue in doc.dialogues {
        write_dialogue(buf, dialogue)?;
    }
    Ok(())
}

fn write_script_info<W: Write>(buf: &mut W, doc: &AssDocument) -> Result<()> {
    let info = &doc.config.script_info;
    writeln!(buf, "[Script Info]")?;
    writeln!(buf, "Title: {}", doc.title)?;
    if let Some(artist) = doc.artist {
        writeln!(buf, "Original Script: {}", artist)?;
    }
    writeln!(buf, "ScriptType: v4.00+")?;
    writeln!(buf, "PlayResX: {}", info.play_res_x)?;
    writeln!(buf, "PlayResY: {}", info.play_res_y)?;
    writeln!(buf, "Timer: 100.0000")?;
    Ok(())
}

fn write_styles<W: Write>(buf: &mut W, config: &Config) -> Result<()> {
    writeln!(buf, "[V4+ Styles]")?;
    writeln!(buf, "{}", STYLE_FORMAT)?;
    writeln!(
        buf,
        "Style: {},{}",
        Style::Default.name(),
        config.styles.default
    )?;
    if config.next_line_preview {
        writeln!(
            buf,
            "Style: {},{}",
            Style::NextLine.name(),
            config.styles.next_line
        )?;
    }
    Ok(())
}

fn write_dialogue<W: Write>(buf: &mut W, dialogue: &Dialogue) -> Result<()> {
    write!(buf, "Dialogue: 0,")?;
    write_ts(buf, dialogue.start)?;
    write!(buf, ",")?;
    write_ts(buf, dialogue.end)?;
    writeln!(buf, ",{},,0,0,0,,{}", dialogue.style.name(), dialogue.text)?;
    Ok(())
}

fn write_ts<W: Write>(buf: &mut W, timestamp: Duration) -> Result<()> {
    let total_centis = centis(timestamp);
    let centis = total_centis % 100;
    let total_secs = total_centis / 100;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    write!(buf, "{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)?;
    Ok(())
}
