//! Spreadsheet export of match results.
//!
//! Produces an Office Open XML workbook (`Harmony.xlsx`) with up to two
//! sheets:
//!
//! - **Matches**: one row per accepted pair from
//!   [`filter_matches`](harmony_core::filter::filter_matches), in the
//!   engine's order.
//! - **Matrix**: the raw similarity matrix rendered as a triangle straight
//!   from each question's offset array, bypassing the filter.
//!
//! The archive is assembled by hand from `zip` + `quick-xml`. Strings are
//! written inline (no shared-string table) and every zip entry carries a
//! fixed timestamp, so identical inputs produce identical bytes.

use anyhow::{Context, Result};
use harmony_core::filter::MatchRow;
use harmony_core::models::{ApiData, QuestionNo};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;

pub const DEFAULT_FILE_NAME: &str = "Harmony.xlsx";
pub const MATCHES_SHEET: &str = "Matches";
pub const MATRIX_SHEET: &str = "Matrix";

/// Header row of the Matches sheet.
pub const MATCH_COLUMNS: [&str; 10] = [
    "instrument1",
    "question1_no",
    "question1_text",
    "question1_topics",
    "instrument2",
    "question2_no",
    "question2_text",
    "question2_topics",
    "match",
    "flagged_as_ignore",
];

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const CT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const CT_RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";

const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#,
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>"#,
    r#"</styleSheet>"#
);

/// A single worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Blank,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub matrix_sheet: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { matrix_sheet: true }
    }
}

/// Numeric question numbers stay numbers so spreadsheets sort them as such.
fn question_no_cell(no: &QuestionNo) -> Cell {
    match no {
        QuestionNo::Number(n) => Cell::Number(*n as f64),
        QuestionNo::Text(s) => Cell::Text(s.clone()),
    }
}

/// The Matches sheet: header plus one row per filtered pair.
pub fn matches_sheet(rows: &[MatchRow]) -> Sheet {
    let mut out = Vec::with_capacity(rows.len() + 1);
    out.push(MATCH_COLUMNS.iter().map(|&h| Cell::from(h)).collect());
    for r in rows {
        out.push(vec![
            Cell::from(r.instrument1.as_str()),
            question_no_cell(&r.question1_no),
            Cell::from(r.question1_text.as_str()),
            Cell::from(r.question1_topics.as_str()),
            Cell::from(r.instrument2.as_str()),
            question_no_cell(&r.question2_no),
            Cell::from(r.question2_text.as_str()),
            Cell::from(r.question2_topics.as_str()),
            Cell::Number(r.score),
            Cell::Bool(r.flagged_as_ignore),
        ]);
    }
    Sheet {
        name: MATCHES_SHEET.to_string(),
        rows: out,
    }
}

/// The Matrix sheet, rendered directly from storage.
///
/// Row 1 holds `"<instrument> <question_no>"` labels, row 2 the question
/// texts. Question `k` (global order) gets its label, `k` blank cells for the
/// columns before it, a blank diagonal cell, and then its offset array, so
/// every score sits under its partner's column.
pub fn matrix_sheet(data: &ApiData) -> Sheet {
    let labels: Vec<String> = data
        .questions()
        .map(|q| format!("{} {}", data.instrument_of(q).name, q.question_no))
        .collect();

    let mut rows = Vec::with_capacity(labels.len() + 2);
    rows.push(
        std::iter::once(Cell::Blank)
            .chain(labels.iter().map(|l| Cell::from(l.as_str())))
            .collect(),
    );
    rows.push(
        std::iter::once(Cell::Blank)
            .chain(data.questions().map(|q| Cell::from(q.question_text.as_str())))
            .collect(),
    );

    for (k, q) in data.questions().enumerate() {
        let mut row = Vec::with_capacity(k + 2 + q.matches.len());
        row.push(Cell::from(labels[k].as_str()));
        row.extend(std::iter::repeat(Cell::Blank).take(k + 1));
        row.extend(q.matches.iter().map(|&s| Cell::Number(s)));
        rows.push(row);
    }

    Sheet {
        name: MATRIX_SHEET.to_string(),
        rows,
    }
}

/// Assemble the sheets for an export.
pub fn build_sheets(data: &ApiData, rows: &[MatchRow], opts: ExportOptions) -> Vec<Sheet> {
    let mut sheets = vec![matches_sheet(rows)];
    if opts.matrix_sheet {
        sheets.push(matrix_sheet(data));
    }
    sheets
}

/// Serialize sheets into `.xlsx` bytes.
pub fn write_workbook(sheets: &[Sheet]) -> Result<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut entries: Vec<(String, Vec<u8>)> = vec![
        ("[Content_Types].xml".to_string(), content_types_xml(sheets.len())?),
        ("_rels/.rels".to_string(), root_rels_xml()?),
        ("xl/workbook.xml".to_string(), workbook_xml(sheets)?),
        ("xl/_rels/workbook.xml.rels".to_string(), workbook_rels_xml(sheets.len())?),
        ("xl/styles.xml".to_string(), STYLES_XML.as_bytes().to_vec()),
    ];
    for (i, sheet) in sheets.iter().enumerate() {
        entries.push((format!("xl/worksheets/sheet{}.xml", i + 1), sheet_xml(sheet)?));
    }

    for (name, bytes) in entries {
        zip.start_file(name.as_str(), options)
            .with_context(|| format!("Failed to add {} to workbook", name))?;
        zip.write_all(&bytes)?;
    }

    let cursor = zip.finish().context("Failed to finalize workbook")?;
    Ok(cursor.into_inner())
}

/// Filter output → workbook file on disk.
pub fn export_to_file(
    path: &Path,
    data: &ApiData,
    rows: &[MatchRow],
    opts: ExportOptions,
) -> Result<()> {
    let bytes = write_workbook(&build_sheets(data, rows, opts))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, &bytes)
        .with_context(|| format!("Failed to write workbook: {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        rows = rows.len(),
        bytes = bytes.len(),
        matrix = opts.matrix_sheet,
        "exported workbook"
    );
    Ok(())
}

/// Excel column name for a zero-based column index (`0 → A`, `26 → AA`).
pub fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

fn new_writer() -> Result<Writer<Vec<u8>>> {
    let mut w = Writer::new(Vec::new());
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(w)
}

fn sheet_xml(sheet: &Sheet) -> Result<Vec<u8>> {
    let mut w = new_writer()?;
    let mut root = BytesStart::new("worksheet");
    root.push_attribute(("xmlns", NS_MAIN));
    w.write_event(Event::Start(root))?;
    w.write_event(Event::Start(BytesStart::new("sheetData")))?;

    for (r, cells) in sheet.rows.iter().enumerate() {
        let row_no = (r + 1).to_string();
        let mut row = BytesStart::new("row");
        row.push_attribute(("r", row_no.as_str()));
        w.write_event(Event::Start(row))?;

        for (c, cell) in cells.iter().enumerate() {
            let reference = format!("{}{}", column_name(c), row_no);
            write_cell(&mut w, &reference, cell)?;
        }

        w.write_event(Event::End(BytesEnd::new("row")))?;
    }

    w.write_event(Event::End(BytesEnd::new("sheetData")))?;
    w.write_event(Event::End(BytesEnd::new("worksheet")))?;
    Ok(w.into_inner())
}

fn write_cell(w: &mut Writer<Vec<u8>>, reference: &str, cell: &Cell) -> Result<()> {
    let mut c = BytesStart::new("c");
    c.push_attribute(("r", reference));
    match cell {
        Cell::Blank => return Ok(()),
        Cell::Text(text) => {
            c.push_attribute(("t", "inlineStr"));
            w.write_event(Event::Start(c))?;
            w.write_event(Event::Start(BytesStart::new("is")))?;
            let mut t = BytesStart::new("t");
            t.push_attribute(("xml:space", "preserve"));
            w.write_event(Event::Start(t))?;
            let text = xml_safe(text);
            w.write_event(Event::Text(BytesText::new(&text)))?;
            w.write_event(Event::End(BytesEnd::new("t")))?;
            w.write_event(Event::End(BytesEnd::new("is")))?;
        }
        Cell::Number(n) => {
            w.write_event(Event::Start(c))?;
            write_value(w, &n.to_string())?;
        }
        Cell::Bool(b) => {
            c.push_attribute(("t", "b"));
            w.write_event(Event::Start(c))?;
            write_value(w, if *b { "1" } else { "0" })?;
        }
    }
    w.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

/// Encode characters XML 1.0 forbids as OOXML `_xHHHH_` escapes.
///
/// A literal `_xHHHH_` already in the text has its underscore escaped as
/// `_x005F_` so spreadsheet readers do not decode it.
fn xml_safe(text: &str) -> Cow<'_, str> {
    fn allowed(c: char) -> bool {
        matches!(c, '\t' | '\n' | '\r')
            || ('\u{20}'..='\u{D7FF}').contains(&c)
            || ('\u{E000}'..='\u{FFFD}').contains(&c)
            || c >= '\u{10000}'
    }
    fn looks_escaped(rest: &str) -> bool {
        let b = rest.as_bytes();
        b.len() >= 7
            && b[1] == b'x'
            && b[2..6].iter().all(u8::is_ascii_hexdigit)
            && b[6] == b'_'
    }

    let clean = text.chars().all(allowed)
        && !text
            .char_indices()
            .any(|(i, c)| c == '_' && looks_escaped(&text[i..]));
    if clean {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for (i, c) in text.char_indices() {
        if c == '_' && looks_escaped(&text[i..]) {
            out.push_str("_x005F_");
        } else if allowed(c) {
            out.push(c);
        } else {
            out.push_str(&format!("_x{:04X}_", c as u32));
        }
    }
    Cow::Owned(out)
}

fn write_value(w: &mut Writer<Vec<u8>>, value: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new("v")))?;
    w.write_event(Event::Text(BytesText::new(value)))?;
    w.write_event(Event::End(BytesEnd::new("v")))?;
    Ok(())
}

fn workbook_xml(sheets: &[Sheet]) -> Result<Vec<u8>> {
    let mut w = new_writer()?;
    let mut root = BytesStart::new("workbook");
    root.push_attribute(("xmlns", NS_MAIN));
    root.push_attribute(("xmlns:r", NS_REL));
    w.write_event(Event::Start(root))?;
    w.write_event(Event::Start(BytesStart::new("sheets")))?;
    for (i, sheet) in sheets.iter().enumerate() {
        let id = (i + 1).to_string();
        let rel = format!("rId{}", i + 1);
        let mut s = BytesStart::new("sheet");
        s.push_attribute(("name", sheet.name.as_str()));
        s.push_attribute(("sheetId", id.as_str()));
        s.push_attribute(("r:id", rel.as_str()));
        w.write_event(Event::Empty(s))?;
    }
    w.write_event(Event::End(BytesEnd::new("sheets")))?;
    w.write_event(Event::End(BytesEnd::new("workbook")))?;
    Ok(w.into_inner())
}

fn relationship(w: &mut Writer<Vec<u8>>, id: &str, kind: &str, target: &str) -> Result<()> {
    let mut r = BytesStart::new("Relationship");
    r.push_attribute(("Id", id));
    r.push_attribute(("Type", kind));
    r.push_attribute(("Target", target));
    w.write_event(Event::Empty(r))?;
    Ok(())
}

fn workbook_rels_xml(sheet_count: usize) -> Result<Vec<u8>> {
    let mut w = new_writer()?;
    let mut root = BytesStart::new("Relationships");
    root.push_attribute(("xmlns", NS_PKG_REL));
    w.write_event(Event::Start(root))?;
    for i in 1..=sheet_count {
        relationship(
            &mut w,
            &format!("rId{}", i),
            REL_WORKSHEET,
            &format!("worksheets/sheet{}.xml", i),
        )?;
    }
    relationship(
        &mut w,
        &format!("rId{}", sheet_count + 1),
        REL_STYLES,
        "styles.xml",
    )?;
    w.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(w.into_inner())
}

fn root_rels_xml() -> Result<Vec<u8>> {
    let mut w = new_writer()?;
    let mut root = BytesStart::new("Relationships");
    root.push_attribute(("xmlns", NS_PKG_REL));
    w.write_event(Event::Start(root))?;
    relationship(&mut w, "rId1", REL_OFFICE_DOCUMENT, "xl/workbook.xml")?;
    w.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(w.into_inner())
}

fn content_types_xml(sheet_count: usize) -> Result<Vec<u8>> {
    let mut w = new_writer()?;
    let mut root = BytesStart::new("Types");
    root.push_attribute(("xmlns", NS_CONTENT_TYPES));
    w.write_event(Event::Start(root))?;

    for (ext, ct) in [("rels", CT_RELS), ("xml", "application/xml")] {
        let mut d = BytesStart::new("Default");
        d.push_attribute(("Extension", ext));
        d.push_attribute(("ContentType", ct));
        w.write_event(Event::Empty(d))?;
    }

    let mut parts = vec![("/xl/workbook.xml".to_string(), CT_WORKBOOK)];
    for i in 1..=sheet_count {
        parts.push((format!("/xl/worksheets/sheet{}.xml", i), CT_WORKSHEET));
    }
    parts.push(("/xl/styles.xml".to_string(), CT_STYLES));
    for (part, ct) in parts {
        let mut o = BytesStart::new("Override");
        o.push_attribute(("PartName", part.as_str()));
        o.push_attribute(("ContentType", ct));
        w.write_event(Event::Empty(o))?;
    }

    w.write_event(Event::End(BytesEnd::new("Types")))?;
    Ok(w.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmony_core::filter::{filter_matches, MatchMarks};
    use harmony_core::models::{Instrument, Question, QuestionNo};
    use harmony_core::options::ResultsOptions;
    use std::io::Read;

    fn q(index: usize, text: &str, matches: Vec<f64>) -> Question {
        Question {
            question_index: index,
            question_no: QuestionNo::from(index + 1),
            question_text: text.to_string(),
            topics_auto: vec!["anxiety".to_string()],
            topics_strengths: Vec::new(),
            matches,
            instrument: 0,
        }
    }

    fn sample() -> ApiData {
        ApiData::new(
            vec![
                Instrument {
                    name: "GAD-7".to_string(),
                    questions: vec![q(0, "Nervous & on edge", vec![0.9, -0.8]), q(1, "Worry", vec![0.4])],
                    maxqidx: 0,
                },
                Instrument {
                    name: "RCADS".to_string(),
                    questions: vec![q(2, "I worry <a lot>", vec![])],
                    maxqidx: 0,
                },
            ],
            Vec::new(),
        )
    }

    fn entry(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut out = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(9), "J");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_matches_sheet_layout() {
        let data = sample();
        let rows = filter_matches(&data, &ResultsOptions::default(), &MatchMarks::default()).unwrap();
        let sheet = matches_sheet(&rows);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][8], Cell::from("match"));
        assert_eq!(sheet.rows[1][0], Cell::from("GAD-7"));
        assert_eq!(sheet.rows[1][4], Cell::from("RCADS"));
        assert_eq!(sheet.rows[1][8], Cell::Number(-0.8));
        assert_eq!(sheet.rows[1][9], Cell::Bool(false));
    }

    #[test]
    fn test_matrix_sheet_is_triangular_from_storage() {
        let sheet = matrix_sheet(&sample());
        assert_eq!(sheet.rows.len(), 5);
        assert_eq!(sheet.rows[0][1], Cell::from("GAD-7 1"));
        assert_eq!(sheet.rows[0][3], Cell::from("RCADS 3"));
        assert_eq!(sheet.rows[1][3], Cell::from("I worry <a lot>"));
        // question 0: label, diagonal blank, then scores against 1 and 2
        assert_eq!(
            sheet.rows[2],
            vec![Cell::from("GAD-7 1"), Cell::Blank, Cell::Number(0.9), Cell::Number(-0.8)]
        );
        // question 1: score against 2 sits in column 3 (question 2's column)
        assert_eq!(sheet.rows[3][3], Cell::Number(0.4));
        assert_eq!(sheet.rows[4].len(), 4);
    }

    #[test]
    fn test_workbook_parts_and_escaping() {
        let data = sample();
        let rows = filter_matches(&data, &ResultsOptions::default(), &MatchMarks::default()).unwrap();
        let bytes = write_workbook(&build_sheets(&data, &rows, ExportOptions::default())).unwrap();

        let workbook = entry(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"name="Matches""#));
        assert!(workbook.contains(r#"name="Matrix""#));

        let matches = entry(&bytes, "xl/worksheets/sheet1.xml");
        assert!(matches.contains("Nervous &amp; on edge"));
        assert!(matches.contains(r#"<c r="I2"><v>-0.8</v></c>"#));
        assert!(matches.contains(r#"<c r="J2" t="b"><v>0</v></c>"#));

        let matrix = entry(&bytes, "xl/worksheets/sheet2.xml");
        assert!(matrix.contains("I worry &lt;a lot&gt;"));
        assert!(!matrix.contains(r#"r="B3""#));

        let types = entry(&bytes, "[Content_Types].xml");
        assert!(types.contains("/xl/worksheets/sheet2.xml"));
    }

    #[test]
    fn test_control_characters_encoded_in_cells() {
        let data = ApiData::new(
            vec![
                Instrument {
                    name: "Word".to_string(),
                    questions: vec![q(0, "Line one\u{000B}Line two", vec![0.9])],
                    maxqidx: 0,
                },
                Instrument {
                    name: "Other".to_string(),
                    questions: vec![q(1, "Tab\tkept \u{0001}_x0041_", vec![])],
                    maxqidx: 0,
                },
            ],
            Vec::new(),
        );
        let rows = filter_matches(&data, &ResultsOptions::default(), &MatchMarks::default()).unwrap();
        let bytes = write_workbook(&build_sheets(&data, &rows, ExportOptions::default())).unwrap();

        for part in ["xl/worksheets/sheet1.xml", "xl/worksheets/sheet2.xml"] {
            let xml = entry(&bytes, part);
            assert!(!xml.contains('\u{000B}'));
            assert!(!xml.contains('\u{0001}'));
            assert!(xml.contains("Line one_x000B_Line two"));
            assert!(xml.contains("Tab\tkept _x0001__x005F_x0041_"));
        }
        assert!(matches!(xml_safe("plain_x"), Cow::Borrowed("plain_x")));
    }

    #[test]
    fn test_numeric_question_numbers_written_as_numbers() {
        let mut lettered = q(2, "I worry <a lot>", vec![]);
        lettered.question_no = QuestionNo::Text("Q3a".to_string());
        let data = ApiData::new(
            vec![
                Instrument {
                    name: "GAD-7".to_string(),
                    questions: vec![q(0, "Nervous", vec![0.9, -0.8]), q(1, "Worry", vec![0.4])],
                    maxqidx: 0,
                },
                Instrument {
                    name: "RCADS".to_string(),
                    questions: vec![lettered],
                    maxqidx: 0,
                },
            ],
            Vec::new(),
        );
        let rows = filter_matches(&data, &ResultsOptions::default(), &MatchMarks::default()).unwrap();
        let sheet = matches_sheet(&rows);
        assert_eq!(sheet.rows[1][1], Cell::Number(1.0));
        assert_eq!(sheet.rows[1][5], Cell::from("Q3a"));

        let bytes = write_workbook(&[sheet]).unwrap();
        let xml = entry(&bytes, "xl/worksheets/sheet1.xml");
        assert!(xml.contains(r#"<c r="B2"><v>1</v></c>"#));
        assert!(xml.contains(r#"<c r="F2" t="inlineStr">"#));
    }

    #[test]
    fn test_single_sheet_variant() {
        let data = sample();
        let bytes = write_workbook(&build_sheets(&data, &[], ExportOptions { matrix_sheet: false })).unwrap();
        let workbook = entry(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"name="Matches""#));
        assert!(!workbook.contains("Matrix"));
        let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.as_slice())).unwrap();
        assert!(archive.file_names().all(|n| n != "xl/worksheets/sheet2.xml"));
    }

    #[test]
    fn test_byte_identical_output() {
        let data = sample();
        let rows = filter_matches(&data, &ResultsOptions::default(), &MatchMarks::default()).unwrap();
        let sheets = build_sheets(&data, &rows, ExportOptions::default());
        assert_eq!(write_workbook(&sheets).unwrap(), write_workbook(&sheets).unwrap());
    }
}
