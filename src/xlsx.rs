//! Cue lists stored as a spreadsheet.
//!
//! The sheet has one header row followed by one row per cue with the index,
//! start time, end time and text in that order.

use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{Workbook, XlsxError};

use crate::{
    cue::{self, Cue, Parsed, Warning},
    error::{ParseError, WriteError},
};

/// Index, start time, end time, text.
pub const HEADERS: [&str; 4] = ["序号", "开始时间", "结束时间", "字幕内容"];
pub const SHEET_NAME: &str = "Sheet1";

const COLUMN_WIDTHS: [f64; 4] = [8.0, 16.0, 16.0, 60.0];

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // Numbers typed into a sheet come back as floats
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => (*f as i64).to_string(),
        other => other.to_string(),
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn cue_from_row(row: &[Data]) -> Result<Cue, &'static str> {
    let [index, start, end, text, ..] = row else {
        return Err("row has fewer than 4 cells");
    };
    let index = cell_to_string(index).trim().to_owned();
    if !cue::is_positive_index(&index) {
        return Err("index is not a positive whole number");
    }
    let start = cell_to_string(start);
    let end = cell_to_string(end);
    if start.trim().is_empty() || end.trim().is_empty() {
        return Err("missing start or end time");
    }
    Ok(Cue::new(index, start, end, cell_to_string(text)))
}

/// Reads cues out of a worksheet whose first row is [`HEADERS`].
///
/// The header has to start in cell A1. Leading empty rows or columns make it a
/// mismatch.
pub fn parse_range(range: &Range<Data>) -> Result<Parsed, ParseError> {
    let mut rows = range.rows();

    // the range only covers used cells, so rebuild sheet row 1 from column A
    let mut header: Vec<String> = Vec::new();
    if let Some((0, first_column)) = range.start() {
        header.resize(first_column as usize, String::new());
        header.extend(rows.next().into_iter().flatten().map(cell_to_string));
    }
    while header.last().is_some_and(|s| s.is_empty()) {
        header.pop();
    }
    if header != HEADERS {
        return Err(ParseError::HeaderMismatch {
            expected: HEADERS.iter().map(|s| s.to_string()).collect(),
            actual: header,
        });
    }

    let mut parsed = Parsed::default();
    for (offset, row) in rows.enumerate() {
        if row.iter().all(is_blank) {
            continue;
        }
        match cue_from_row(row) {
            Ok(cue) => parsed.cues.push(cue),
            Err(reason) => {
                let content = row.iter().map(cell_to_string).collect::<Vec<_>>().join(", ");
                parsed
                    .warnings
                    .push(Warning::new(offset + 2, content, reason));
            }
        }
    }
    Ok(parsed)
}

/// Reads cues from the first worksheet of an .xlsx file.
pub fn load(path: &Path) -> Result<Parsed, ParseError> {
    let to_error = |source| ParseError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(to_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ParseError::NoWorksheet {
            path: path.to_path_buf(),
        })?
        .map_err(to_error)?;
    parse_range(&range)
}

fn build_workbook(cues: &[Cue]) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, (header, width)) in (0..).zip(HEADERS.into_iter().zip(COLUMN_WIDTHS)) {
        worksheet.set_column_width(col, width)?;
        worksheet.write_string(0, col, header)?;
    }

    for (row, cue) in (1..).zip(cues) {
        // plain numbers go in as numbers, anything else like `007` as text
        match cue.index.parse::<u32>() {
            Ok(n) if n.to_string() == cue.index => worksheet.write_number(row, 0, n)?,
            _ => worksheet.write_string(row, 0, &cue.index)?,
        };
        worksheet.write_string(row, 1, &cue.start)?;
        worksheet.write_string(row, 2, &cue.end)?;
        worksheet.write_string(row, 3, &cue.text)?;
    }

    Ok(workbook)
}

/// Writes the cues to a new single-sheet .xlsx file, replacing any existing file.
pub fn save(path: &Path, cues: &[Cue]) -> Result<(), WriteError> {
    let to_error = |source| WriteError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = build_workbook(cues).map_err(to_error)?;
    workbook.save(path).map_err(to_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cues() -> Vec<Cue> {
        vec![
            Cue::new(1, "00:00:01,000", "00:00:02,500", "Hello, world"),
            Cue::new(2, "00:00:03,000", "00:00:04,000", ""),
            Cue::new(5, "01:02:03,050", "01:02:04,000", "字幕内容"),
            Cue::new("007", "01:02:05,000", "01:02:06,000", "leading zeros"),
            Cue::new("4294967296", "01:02:07,000", "01:02:08,000", "too big for a u32"),
        ]
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cues.xlsx");
        save(&path, &cues()).unwrap();

        let parsed = load(&path).unwrap();
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.cues, cues());
    }

    #[test]
    fn test_header_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wrong.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in (0..).zip(["A", "B", "C", "D"]) {
            sheet.write_string(0, col, header).unwrap();
        }
        sheet.write_number(1, 0, 1).unwrap();
        workbook.save(&path).unwrap();

        match load(&path) {
            Err(ParseError::HeaderMismatch { expected, actual }) => {
                assert_eq!(expected, HEADERS);
                assert_eq!(actual, ["A", "B", "C", "D"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_header_must_start_at_a1() {
        let dir = tempfile::tempdir().unwrap();

        // header on row 3, starting in column B
        let path = dir.path().join("low.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in (1..).zip(HEADERS) {
            sheet.write_string(2, col, header).unwrap();
        }
        sheet.write_number(3, 1, 1).unwrap();
        sheet.write_string(3, 2, "00:00:01,000").unwrap();
        sheet.write_string(3, 3, "00:00:02,000").unwrap();
        sheet.write_string(3, 4, "hi").unwrap();
        workbook.save(&path).unwrap();
        match load(&path) {
            Err(ParseError::HeaderMismatch { actual, .. }) => assert!(actual.is_empty()),
            other => panic!("unexpected result: {other:?}"),
        }

        // header on row 1, starting in column B
        let path = dir.path().join("shifted.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in (1..).zip(HEADERS) {
            sheet.write_string(0, col, header).unwrap();
        }
        workbook.save(&path).unwrap();
        match load(&path) {
            Err(ParseError::HeaderMismatch { actual, .. }) => {
                assert_eq!(actual, ["", "序号", "开始时间", "结束时间", "字幕内容"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_empty_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        workbook.save(&path).unwrap();
        match load(&path) {
            Err(ParseError::HeaderMismatch { actual, .. }) => assert!(actual.is_empty()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_index_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in (0..).zip(HEADERS) {
            sheet.write_string(0, col, header).unwrap();
        }
        let rows: [(&str, Option<f64>); 4] = [
            ("007", None),
            ("", Some(3.0)),
            ("0", None),
            ("", Some(2.5)),
        ];
        for (row, (text, number)) in (1..).zip(rows) {
            match number {
                Some(n) => sheet.write_number(row, 0, n).unwrap(),
                None => sheet.write_string(row, 0, text).unwrap(),
            };
            sheet.write_string(row, 1, "00:00:01,000").unwrap();
            sheet.write_string(row, 2, "00:00:02,000").unwrap();
        }
        workbook.save(&path).unwrap();

        let parsed = load(&path).unwrap();
        let indices: Vec<_> = parsed.cues.iter().map(|c| c.index.as_str()).collect();
        assert_eq!(indices, ["007", "3"]);
        let lines: Vec<_> = parsed.warnings.iter().map(|w| w.line).collect();
        assert_eq!(lines, [4, 5]);
        assert!(parsed
            .warnings
            .iter()
            .all(|w| w.reason == "index is not a positive whole number"));
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in (0..).zip(HEADERS) {
            sheet.write_string(0, col, header).unwrap();
        }
        // row 2: string index and multi-line text
        sheet.write_string(1, 0, "1").unwrap();
        sheet.write_string(1, 1, "00:00:01,000").unwrap();
        sheet.write_string(1, 2, "00:00:02,000").unwrap();
        sheet.write_string(1, 3, "two\nlines").unwrap();
        // row 3 is left empty
        // row 4: index is not a number
        sheet.write_string(3, 0, "abc").unwrap();
        sheet.write_string(3, 1, "00:00:03,000").unwrap();
        sheet.write_string(3, 2, "00:00:04,000").unwrap();
        // row 5: no end time
        sheet.write_number(4, 0, 3).unwrap();
        sheet.write_string(4, 1, "00:00:05,000").unwrap();
        // row 6: missing text cell
        sheet.write_number(5, 0, 4).unwrap();
        sheet.write_string(5, 1, "00:00:07,000").unwrap();
        sheet.write_string(5, 2, "00:00:08,000").unwrap();
        workbook.save(&path).unwrap();

        let parsed = load(&path).unwrap();
        assert_eq!(
            parsed.cues,
            vec![
                Cue::new(1, "00:00:01,000", "00:00:02,000", "two lines"),
                Cue::new(4, "00:00:07,000", "00:00:08,000", ""),
            ]
        );
        let lines: Vec<_> = parsed.warnings.iter().map(|w| w.line).collect();
        assert_eq!(lines, [4, 5]);
    }

    #[test]
    fn test_not_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.xlsx");
        std::fs::write(&path, "序号,开始时间\n").unwrap();
        assert!(matches!(load(&path), Err(ParseError::Spreadsheet { .. })));
    }

    #[test]
    fn test_save_to_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.xlsx");
        let err = save(&path, &cues()).unwrap_err();
        assert!(matches!(err, WriteError::Spreadsheet { .. }));
        assert!(err.to_string().contains("out.xlsx"));
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Float(3.0)), "3");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
