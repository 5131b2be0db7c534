//! End-to-end conversion of in-memory workbooks.

use std::io::{Cursor, Write};

use xlcsv::csv::{CsvOptions, LineTerminator, QuoteStyle};
use xlcsv::{Error, SheetSelector, XlsxConverter};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const SPREADSHEET_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";

/// Assembles a workbook package entry by entry.
struct WorkbookBuilder {
    main_content_type: &'static str,
    sheets: Vec<(String, String)>,
    shared_strings: Option<Vec<u8>>,
    extra: Vec<(String, Vec<u8>)>,
}

impl WorkbookBuilder {
    fn new() -> Self {
        Self {
            main_content_type: SPREADSHEET_TYPE,
            sheets: Vec::new(),
            shared_strings: None,
            extra: Vec::new(),
        }
    }

    fn sheet(mut self, name: &str, xml: &str) -> Self {
        self.sheets.push((name.to_string(), xml.to_string()));
        self
    }

    fn shared_strings(mut self, xml: &str) -> Self {
        self.shared_strings = Some(xml.as_bytes().to_vec());
        self
    }

    fn shared_strings_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.shared_strings = Some(bytes);
        self
    }

    fn content_type(mut self, content_type: &'static str) -> Self {
        self.main_content_type = content_type;
        self
    }

    fn entry(mut self, name: &str, data: &[u8]) -> Self {
        self.extra.push((name.to_string(), data.to_vec()));
        self
    }

    fn build(self) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = SimpleFileOptions::default();

        zip.start_file("[Content_Types].xml", options).unwrap();
        write!(
            zip,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="{}"/>
</Types>"#,
            self.main_content_type
        )
        .unwrap();

        let mut workbook = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
        );
        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (i, (name, _)) in self.sheets.iter().enumerate() {
            let n = i + 1;
            workbook.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                name, n, n
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                n, n
            ));
        }
        workbook.push_str("</sheets></workbook>");
        rels.push_str("</Relationships>");

        zip.start_file("xl/workbook.xml", options).unwrap();
        zip.write_all(workbook.as_bytes()).unwrap();
        zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
        zip.write_all(rels.as_bytes()).unwrap();

        if let Some(shared) = &self.shared_strings {
            zip.start_file("xl/sharedStrings.xml", options).unwrap();
            zip.write_all(shared).unwrap();
        }
        for (i, (_, xml)) in self.sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)
                .unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        for (name, data) in &self.extra {
            zip.start_file(name.as_str(), options).unwrap();
            zip.write_all(data).unwrap();
        }

        zip.finish().unwrap();
        buffer
    }
}

const TABLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="5" uniqueCount="4">
  <si><t>Col1</t></si>
  <si><t>Col2</t></si>
  <si><t>Col3</t></si>
  <si><t>a</t></si>
</sst>"#;

const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <dimension ref="A1:C3"/>
  <sheetData>
    <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c></row>
    <row r="2"><c r="A2" t="s"><v>3</v></c><c r="C2" t="s"><v>3</v></c></row>
  </sheetData>
</worksheet>"#;

fn convert(data: &[u8], selector: &SheetSelector, options: CsvOptions) -> xlcsv::Result<String> {
    XlsxConverter::from_bytes(data.to_vec())?
        .with_options(options)
        .convert_to_string(selector)
}

#[test]
fn test_end_to_end_quoted() {
    let data = WorkbookBuilder::new()
        .shared_strings(TABLE)
        .sheet("Sheet1", SHEET)
        .build();

    let options = CsvOptions::new().with_quote_style(QuoteStyle::Always);
    let csv = convert(&data, &SheetSelector::Number(1), options).unwrap();
    assert_eq!(csv, "\"Col1\",\"Col2\",\"Col3\"\r\n\"a\",,\"a\"\r\n");
}

#[test]
fn test_end_to_end_minimal_quoting() {
    let data = WorkbookBuilder::new()
        .shared_strings(TABLE)
        .sheet("Sheet1", SHEET)
        .build();

    let mut out = Vec::new();
    let summary = xlcsv::convert_bytes(&data, &SheetSelector::default(), &mut out).unwrap();
    assert_eq!(out, b"Col1,Col2,Col3\r\na,,a\r\n");
    assert_eq!(summary.rows, 2);
    assert_eq!(summary.columns, 3);
    assert_eq!(summary.shared_strings, 4);
}

#[test]
fn test_rich_text_entry_is_concatenated() {
    let table = r#"<sst count="1" uniqueCount="1"><si><r><rPr><b/></rPr><t>Hello</t></r><r><t xml:space="preserve"> World</t></r></si></sst>"#;
    let sheet = r#"<worksheet><dimension ref="A1"/><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c></row></sheetData></worksheet>"#;
    let data = WorkbookBuilder::new()
        .shared_strings(table)
        .sheet("Sheet1", sheet)
        .build();

    let csv = convert(&data, &SheetSelector::Number(1), CsvOptions::default()).unwrap();
    assert_eq!(csv, "Hello World\r\n");
}

#[test]
fn test_select_sheet_by_name() {
    let second = r#"<worksheet><dimension ref="A1:B1"/><sheetData><row r="1"><c r="B1"><v>42</v></c></row></sheetData></worksheet>"#;
    let data = WorkbookBuilder::new()
        .shared_strings(TABLE)
        .sheet("Overview", SHEET)
        .sheet("Totals &amp; Tax", second)
        .build();

    let converter = XlsxConverter::from_bytes(data).unwrap();
    let sheets = converter.sheets().unwrap();
    assert_eq!(sheets.len(), 2);
    assert_eq!(sheets[1].name, "Totals & Tax");
    assert_eq!(sheets[1].path.as_deref(), Some("xl/worksheets/sheet2.xml"));

    let by_name = converter
        .convert_to_string(&"Totals & Tax".parse::<SheetSelector>().unwrap())
        .unwrap();
    let by_number = converter
        .convert_to_string(&SheetSelector::Number(2))
        .unwrap();
    assert_eq!(by_name, ",42\r\n");
    assert_eq!(by_name, by_number);
}

#[test]
fn test_unknown_sheet_name() {
    let data = WorkbookBuilder::new()
        .shared_strings(TABLE)
        .sheet("Sheet1", SHEET)
        .build();

    let err = convert(
        &data,
        &SheetSelector::Name("Nope".to_string()),
        CsvOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::SheetNotFound(name) if name == "Nope"));
}

#[test]
fn test_missing_sheet_number() {
    let data = WorkbookBuilder::new()
        .shared_strings(TABLE)
        .sheet("Sheet1", SHEET)
        .build();

    let err = convert(&data, &SheetSelector::Number(7), CsvOptions::default()).unwrap_err();
    assert!(matches!(err, Error::MissingComponent(part) if part == "xl/worksheets/sheet7.xml"));
}

#[test]
fn test_numeric_sheet_without_shared_strings() {
    let sheet = r#"<worksheet><dimension ref="A1:C2"/><sheetData>
<row r="1"><c r="A1"><v>1</v></c><c r="C1"><v>3.5</v></c></row>
<row r="2"><c r="B2" t="b"><v>1</v></c></row>
</sheetData></worksheet>"#;
    let data = WorkbookBuilder::new().sheet("Numbers", sheet).build();

    let converter = XlsxConverter::from_bytes(data).unwrap();
    assert!(converter.shared_strings().unwrap().is_none());
    assert_eq!(
        converter.convert_to_string(&SheetSelector::Number(1)).unwrap(),
        "1,,3.5\r\n,1,\r\n"
    );
}

#[test]
fn test_shared_reference_without_table_fails() {
    let data = WorkbookBuilder::new().sheet("Sheet1", SHEET).build();

    let err = convert(&data, &SheetSelector::Number(1), CsvOptions::default()).unwrap_err();
    assert!(matches!(err, Error::MissingSharedStrings { cell } if cell == "A1"));
}

#[test]
fn test_shared_index_out_of_range() {
    let sheet = r#"<worksheet><dimension ref="A1"/><sheetData><row r="1"><c r="A1" t="s"><v>4</v></c></row></sheetData></worksheet>"#;
    let data = WorkbookBuilder::new()
        .shared_strings(TABLE)
        .sheet("Sheet1", sheet)
        .build();

    let err = convert(&data, &SheetSelector::Number(1), CsvOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::SharedStringIndexOutOfRange { index: 4, len: 4 }
    ));
}

#[test]
fn test_macro_enabled_workbook() {
    let data = WorkbookBuilder::new()
        .content_type("application/vnd.ms-excel.sheet.macroEnabled.main+xml")
        .shared_strings(TABLE)
        .sheet("Sheet1", SHEET)
        .entry("xl/vbaProject.bin", &[0xD0, 0xCF, 0x11, 0xE0])
        .build();

    let csv = convert(&data, &SheetSelector::Number(1), CsvOptions::default()).unwrap();
    assert_eq!(csv, "Col1,Col2,Col3\r\na,,a\r\n");
}

#[test]
fn test_word_document_is_rejected() {
    let data = WorkbookBuilder::new()
        .content_type(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
        )
        .build();

    assert!(matches!(
        XlsxConverter::from_bytes(data),
        Err(Error::UnsupportedFormat(_))
    ));
}

#[test]
fn test_utf16_shared_strings() {
    let text = r#"<?xml version="1.0" encoding="UTF-16"?><sst count="4"><si><t>Col1</t></si><si><t>Col2</t></si><si><t>Col3</t></si><si><t>Größe</t></si></sst>"#;
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let data = WorkbookBuilder::new()
        .shared_strings_bytes(bytes)
        .sheet("Sheet1", SHEET)
        .build();

    let csv = convert(&data, &SheetSelector::Number(1), CsvOptions::default()).unwrap();
    assert_eq!(csv, "Col1,Col2,Col3\r\nGröße,,Größe\r\n");
}

#[test]
fn test_latin1_shared_strings_are_rejected() {
    let mut table = b"<sst count=\"4\"><si><t>Col1</t></si><si><t>Col2</t></si><si><t>Col3</t></si><si><t>caf".to_vec();
    table.push(0xE9);
    table.extend_from_slice(b"</t></si></sst>");
    let data = WorkbookBuilder::new()
        .shared_strings_bytes(table)
        .sheet("Sheet1", SHEET)
        .build();

    let err = convert(&data, &SheetSelector::Number(1), CsvOptions::default()).unwrap_err();
    match err {
        Error::MalformedDocument { part, line, .. } => {
            assert_eq!(part, "xl/sharedStrings.xml");
            assert_eq!(line, 1);
        }
        other => panic!("expected malformed document, got {:?}", other),
    }
}

#[test]
fn test_prefixed_worksheet() {
    let sheet = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<x:worksheet xmlns:x="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <x:dimension ref="A1:B1"/>
  <x:sheetData><x:row r="1"><x:c r="A1" t="s"><x:v>3</x:v></x:c><x:c r="B1"><x:v>7</x:v></x:c></x:row></x:sheetData>
</x:worksheet>"#;
    let data = WorkbookBuilder::new()
        .shared_strings(TABLE)
        .sheet("Sheet1", sheet)
        .build();

    let csv = convert(&data, &SheetSelector::Number(1), CsvOptions::default()).unwrap();
    assert_eq!(csv, "a,7\r\n");
}

#[test]
fn test_every_row_has_declared_width() {
    let mut sheet = String::from(r#"<worksheet><dimension ref="A1:J200"/><sheetData>"#);
    for r in 1..=200u32 {
        sheet.push_str(&format!(r#"<row r="{}">"#, r));
        for (i, col) in "ABCDEFGHIJ".chars().enumerate() {
            if (r as usize + i) % 4 == 0 {
                sheet.push_str(&format!(r#"<c r="{}{}"><v>{}</v></c>"#, col, r, r));
            }
        }
        sheet.push_str("</row>");
    }
    sheet.push_str("</sheetData></worksheet>");
    let data = WorkbookBuilder::new().sheet("Sparse", &sheet).build();

    let options = CsvOptions::new()
        .with_delimiter(b';')
        .with_line_terminator(LineTerminator::Lf);
    let csv = convert(&data, &SheetSelector::Number(1), options).unwrap();

    let lines: Vec<&str> = csv.split_terminator('\n').collect();
    assert_eq!(lines.len(), 200);
    for line in lines {
        assert_eq!(line.matches(';').count(), 9, "line {:?}", line);
    }
}

#[test]
fn test_malformed_worksheet_reports_part() {
    let sheet = "<worksheet>\n<sheetData>\n<row r=\"1\"><c r=\"A1\"><v>1</c></row>\n</sheetData>\n</worksheet>";
    let data = WorkbookBuilder::new().sheet("Sheet1", sheet).build();

    let err = convert(&data, &SheetSelector::Number(1), CsvOptions::default()).unwrap_err();
    match err {
        Error::MalformedDocument { part, line, .. } => {
            assert_eq!(part, "xl/worksheets/sheet1.xml");
            assert_eq!(line, 3);
        }
        other => panic!("expected malformed document, got {:?}", other),
    }
}

#[test]
fn test_file_entry_points() {
    let data = WorkbookBuilder::new()
        .shared_strings(TABLE)
        .sheet("First", SHEET)
        .sheet("Second", SHEET)
        .build();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.xlsx");
    std::fs::write(&path, &data).unwrap();

    assert_eq!(
        xlcsv::to_csv_string(&path).unwrap(),
        "Col1,Col2,Col3\r\na,,a\r\n"
    );

    let names: Vec<String> = xlcsv::list_sheets(&path)
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["First", "Second"]);

    let out_path = dir.path().join("second.csv");
    let file = std::fs::File::create(&out_path).unwrap();
    let summary = xlcsv::convert_file(
        &path,
        &SheetSelector::Name("Second".to_string()),
        std::io::BufWriter::new(file),
    )
    .unwrap();
    assert_eq!(summary.rows, 2);
    assert_eq!(
        std::fs::read_to_string(&out_path).unwrap(),
        "Col1,Col2,Col3\r\na,,a\r\n"
    );
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = xlcsv::to_csv_string(dir.path().join("absent.xlsx")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_plain_csv_is_not_a_workbook() {
    let err = xlcsv::convert_bytes(b"a,b\r\n", &SheetSelector::default(), Vec::new()).unwrap_err();
    assert!(matches!(err, Error::UnknownFormat));
}
