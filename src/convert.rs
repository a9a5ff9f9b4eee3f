//! Picks a parser and writer for a conversion request and runs them.

use std::{fmt::Display, path::Path, str::FromStr};

use crate::{
    ass,
    cue::{Parsed, Warning},
    error::ConversionError,
    srt, xlsx,
};

/// The conversions that are offered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, clap::ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum ConversionKind {
    /// .srt or .ass to .xlsx
    SubtitleToExcel,
    /// .ass to .srt
    AssToSrt,
    /// .xlsx to .srt
    XlsxToSrt,
}

impl ConversionKind {
    pub const ALL: [ConversionKind; 3] = [
        ConversionKind::SubtitleToExcel,
        ConversionKind::AssToSrt,
        ConversionKind::XlsxToSrt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionKind::SubtitleToExcel => "subtitle_to_excel",
            ConversionKind::AssToSrt => "ass_to_srt",
            ConversionKind::XlsxToSrt => "xlsx_to_srt",
        }
    }

    /// Returns `true` if files of this format can be the input of the conversion.
    pub fn accepts(&self, format: InputFormat) -> bool {
        match self {
            ConversionKind::SubtitleToExcel => {
                matches!(format, InputFormat::Srt | InputFormat::Ass)
            }
            ConversionKind::AssToSrt => format == InputFormat::Ass,
            ConversionKind::XlsxToSrt => format == InputFormat::Xlsx,
        }
    }

    pub(crate) fn accepted_extensions(&self) -> &'static str {
        match self {
            ConversionKind::SubtitleToExcel => ".srt or .ass",
            ConversionKind::AssToSrt => ".ass",
            ConversionKind::XlsxToSrt => ".xlsx",
        }
    }

    /// The extension of the produced file, without the dot.
    pub fn output_extension(&self) -> &'static str {
        match self {
            ConversionKind::SubtitleToExcel => "xlsx",
            ConversionKind::AssToSrt | ConversionKind::XlsxToSrt => "srt",
        }
    }

    pub fn output_file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.output_extension())
    }

    /// Checks that `path` has an extension this conversion accepts.
    pub fn input_format(&self, path: &Path) -> Result<InputFormat, ConversionError> {
        InputFormat::from_path(path)
            .filter(|format| self.accepts(*format))
            .ok_or_else(|| ConversionError::ExtensionMismatch {
                kind: *self,
                path: path.to_path_buf(),
            })
    }
}

impl Display for ConversionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ConversionError::UnsupportedType(s.to_owned()))
    }
}

/// The format of an input file, judged by its extension.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InputFormat {
    Srt,
    Ass,
    Xlsx,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "srt" => Some(Self::Srt),
            "ass" => Some(Self::Ass),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }

    fn load(&self, path: &Path) -> Result<Parsed, crate::ParseError> {
        match self {
            InputFormat::Srt => srt::load(path),
            InputFormat::Ass => ass::load(path),
            InputFormat::Xlsx => xlsx::load(path),
        }
    }
}

impl Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Srt => f.write_str("SRT"),
            InputFormat::Ass => f.write_str("ASS"),
            InputFormat::Xlsx => f.write_str("spreadsheet"),
        }
    }
}

/// What a successful conversion did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub kind: ConversionKind,
    pub input_format: InputFormat,
    /// Number of cues written.
    pub cues: usize,
    /// Lines or rows of the input that were skipped.
    pub warnings: Vec<Warning>,
}

/// Converts `input` into `output`.
///
/// `kind` is one of `subtitle_to_excel`, `ass_to_srt` or `xlsx_to_srt`. It is
/// validated before the filesystem is touched.
pub fn convert(input: &Path, output: &Path, kind: &str) -> Result<Report, ConversionError> {
    let kind: ConversionKind = kind.parse().inspect_err(|e| tracing::error!("{e}"))?;
    convert_with(input, output, kind)
}

/// Same as [`convert`] with an already validated conversion kind.
pub fn convert_with(
    input: &Path,
    output: &Path,
    kind: ConversionKind,
) -> Result<Report, ConversionError> {
    let span = tracing::info_span!("convert", %kind, input = %input.display());
    let _guard = span.enter();

    let result = run(input, output, kind);
    match &result {
        Ok(report) => tracing::info!(
            cues = report.cues,
            skipped = report.warnings.len(),
            "wrote {}",
            output.display()
        ),
        Err(e) => tracing::error!("conversion failed: {e}"),
    }
    result
}

fn run(input: &Path, output: &Path, kind: ConversionKind) -> Result<Report, ConversionError> {
    let input_format = kind.input_format(input)?;

    let Parsed { cues, warnings } = input_format.load(input)?;
    for warning in &warnings {
        tracing::warn!(line = warning.line, "{}: {}", warning.reason, warning.content);
    }
    if cues.is_empty() {
        return Err(ConversionError::Empty {
            format: input_format,
            path: input.to_path_buf(),
        });
    }

    let written = match kind {
        ConversionKind::SubtitleToExcel => xlsx::save(output, &cues),
        ConversionKind::AssToSrt | ConversionKind::XlsxToSrt => srt::save(output, &cues),
    };
    if let Err(e) = written {
        remove_partial_output(output);
        return Err(e.into());
    }

    Ok(Report {
        kind,
        input_format,
        cues: cues.len(),
        warnings,
    })
}

/// Removes whatever a failed writer left at `output`.
fn remove_partial_output(output: &Path) {
    match std::fs::remove_file(output) {
        Ok(()) => tracing::debug!("removed partial output {}", output.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("could not remove partial output {}: {e}", output.display()),
    }
}
