//! A reader for the `[Events]` section of SubStation Alpha v4+ (.ass) subtitles.
//!
//! Only the timing and text of `Dialogue:` events are extracted. Styling is
//! dropped: override tags are removed and line breaks become spaces.
//!
//! A broken `Dialogue:` line is skipped with a [`Warning`] rather than failing
//! the whole file. A `Format:` line that lacks `Start`, `End` or `Text` is fatal
//! since no event after it can be interpreted.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::{
    cue::{Cue, Parsed, Warning},
    error::ParseError,
    timecode,
};

fn override_tag_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r#"\{.*?\}"#).unwrap())
}

/// Strips `{...}` override blocks and turns `\N` and `\n` into spaces.
fn clean_ass_text(s: &str) -> String {
    override_tag_regex()
        .replace_all(s, "")
        .replace("\\N", " ")
        .replace("\\n", " ")
}

/// Case insensitive version of [`str::strip_prefix`].
fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}

/// Field positions taken from the `Format:` line of the events section.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EventFormat {
    fields: HashMap<String, usize>,
    start: usize,
    end: usize,
    text: usize,
}

impl EventFormat {
    fn parse(value: &str, line: usize) -> Result<Self, ParseError> {
        let fields: HashMap<String, usize> = value
            .split(',')
            .enumerate()
            .map(|(i, name)| (name.trim().to_lowercase(), i))
            .collect();

        let position = |field: &'static str| {
            fields
                .get(field)
                .copied()
                .ok_or(ParseError::MissingFormatField { line, field })
        };

        Ok(Self {
            start: position("start")?,
            end: position("end")?,
            text: position("text")?,
            fields,
        })
    }

    /// The number of pieces a dialogue line is split into.
    ///
    /// Everything past the last separator belongs to the final field so commas
    /// inside the text survive.
    fn len(&self) -> usize {
        self.fields.len()
    }

    fn cue_from_dialogue(&self, index: u32, data: &str) -> Result<Cue, &'static str> {
        let parts: Vec<&str> = data.trim().splitn(self.len(), ',').collect();
        let start = parts.get(self.start).ok_or("missing start field")?;
        let end = parts.get(self.end).ok_or("missing end field")?;
        let text = parts.get(self.text).ok_or("missing text field")?;
        Ok(Cue::new(
            index,
            timecode::ass_to_srt(start),
            timecode::ass_to_srt(end),
            clean_ass_text(text),
        ))
    }
}

/// Where the reader currently is in the file.
#[derive(Debug)]
enum State {
    /// Before the `[Events]` header. Every line is ignored.
    OutsideEvents,
    /// Inside `[Events]`, with the field layout once a `Format:` line was seen.
    InEvents(Option<EventFormat>),
}

/// Builds cues out of an .ass file one line at a time.
#[derive(Debug)]
struct EventReader {
    state: State,
    next_index: u32,
    parsed: Parsed,
}

impl EventReader {
    fn new() -> Self {
        Self {
            state: State::OutsideEvents,
            next_index: 1,
            parsed: Parsed::default(),
        }
    }

    fn process_line(&mut self, line_number: usize, raw: &str) -> Result<(), ParseError> {
        let line = raw.trim();
        if line.eq_ignore_ascii_case("[Events]") {
            if let State::OutsideEvents = self.state {
                self.state = State::InEvents(None);
            }
            return Ok(());
        }

        let State::InEvents(format) = &mut self.state else {
            return Ok(());
        };

        if let Some(value) = strip_prefix_ignore_case(line, "Format:") {
            *format = Some(EventFormat::parse(value, line_number)?);
        } else if let Some(data) = strip_prefix_ignore_case(line, "Dialogue:") {
            let Some(format) = format else {
                return Ok(());
            };
            match format.cue_from_dialogue(self.next_index, data) {
                Ok(cue) => {
                    self.parsed.cues.push(cue);
                    self.next_index += 1;
                }
                Err(reason) => self
                    .parsed
                    .warnings
                    .push(Warning::new(line_number, line, reason)),
            }
        }
        Ok(())
    }

    fn finish(self) -> Parsed {
        self.parsed
    }
}

/// Parses the contents of an .ass file into cues numbered from 1.
pub fn parse(buffer: &str) -> Result<Parsed, ParseError> {
    let buffer = buffer.strip_prefix('\u{feff}').unwrap_or(buffer);
    let mut reader = EventReader::new();
    for (index, line) in buffer.lines().enumerate() {
        reader.process_line(index + 1, line)?;
    }
    Ok(reader.finish())
}

pub fn load(path: &Path) -> Result<Parsed, ParseError> {
    let buffer = crate::load_file(path)?;
    parse(&buffer)
}
