use std::{
    fmt::Display,
    io::{BufWriter, Write},
    path::Path,
    sync::OnceLock,
};

use regex::Regex;

use crate::{
    cue::{self, Cue, Parsed, Warning},
    error::{ParseError, WriteError},
};

fn block_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r#"(?xm)
        ^(?P<index>\d+)[\ \t]*\n
        (?P<start>\d{2}:\d{2}:\d{2},\d{3})
        [\ \t]*-->[\ \t]*
        (?P<end>\d{2}:\d{2}:\d{2},\d{3})[\ \t]*\n
        (?P<text>[^\n](?s:.*?))
        (?:\n\n|\n*\z)"#,
        )
        .unwrap()
    })
}

/// Parses the contents of an .srt file.
///
/// Anything that doesn't look like an `index`, `start --> end`, `text` block is
/// skipped silently. Multi-line text is joined with spaces and the index is kept
/// as written. A block numbered zero is skipped with a [`Warning`].
pub fn parse(buffer: &str) -> Parsed {
    let buffer = buffer.strip_prefix('\u{feff}').unwrap_or(buffer);
    let mut parsed = Parsed::default();
    for caps in block_regex().captures_iter(buffer) {
        let index = &caps["index"];
        if !cue::is_positive_index(index) {
            let start = caps.get(0).map_or(0, |m| m.start());
            let line = buffer[..start].matches('\n').count() + 1;
            parsed
                .warnings
                .push(Warning::new(line, index, "index is not a positive whole number"));
            continue;
        }
        parsed
            .cues
            .push(Cue::new(index, &caps["start"], &caps["end"], &caps["text"]));
    }
    parsed
}

pub fn load(path: &Path) -> Result<Parsed, ParseError> {
    let buffer = crate::load_file(path)?;
    Ok(parse(&buffer))
}

/// A cue rendered as an SRT block under the given position.
struct Block<'a>(usize, &'a Cue);

impl Display for Block<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Block(position, cue) = self;
        write!(
            f,
            "{position}\n{} --> {}\n{}\n\n",
            cue.start, cue.end, cue.text
        )
    }
}

/// Writes the cues as SRT, numbering them from 1 in order.
pub fn save_to_writer<W: Write>(cues: &[Cue], mut writer: W) -> std::io::Result<()> {
    for (i, cue) in cues.iter().enumerate() {
        write!(writer, "{}", Block(i + 1, cue))?;
    }
    writer.flush()
}

pub fn save_to_string(cues: &[Cue]) -> String {
    cues.iter()
        .enumerate()
        .map(|(i, cue)| Block(i + 1, cue).to_string())
        .collect()
}

pub fn save(path: &Path, cues: &[Cue]) -> Result<(), WriteError> {
    let to_error = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    let fp = std::fs::File::create(path).map_err(to_error)?;
    save_to_writer(cues, BufWriter::new(fp)).map_err(to_error)
}
