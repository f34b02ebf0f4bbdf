mod common;

use csv_reconcile::{
    ParseOptions, ReconcileError, ValidationError,
    ingest::{self, parse, read_csv_file},
};
use encoding_rs::WINDOWS_1252;
use proptest::prelude::*;

use common::{BANK_EXPORT, TestWorkspace, strings};

fn parse_str(input: &str) -> Result<csv_reconcile::ParsedTable, ReconcileError> {
    parse(input.as_bytes(), &ParseOptions::default())
}

#[test]
fn parse_keeps_header_order_and_row_count() {
    let table = parse_str(BANK_EXPORT).expect("parse bank export");
    assert_eq!(
        table.columns,
        strings(&[
            "reference",
            "date",
            "amount",
            "description",
            "contact name",
            "account code"
        ])
    );
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.rows[1].get("contact name"), Some("Bob's Bikes"));
    assert_eq!(table.rows[1].get("amount"), Some("-45.50"));
}

#[test]
fn parse_skips_blank_lines() {
    let table = parse_str("\nDate,Amount\n\n2024-01-01,10\n\n\n2024-01-02,20\n\n")
        .expect("parse with blank lines");
    assert_eq!(table.columns, strings(&["Date", "Amount"]));
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.rows[1].get("Date"), Some("2024-01-02"));
}

#[test]
fn single_column_quoted_empty_value_is_a_row() {
    let table = parse_str("Reference\nINV-1\n\"\"\nINV-3\n").expect("parse");
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.rows[1].get("Reference"), Some(""));
    assert_eq!(table.rows[2].get("Reference"), Some("INV-3"));
}

#[test]
fn single_column_quoted_whitespace_is_a_row() {
    let table = parse_str("Description\nCoffee\n\" \"\nLunch\n").expect("parse");
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.rows[1].get("Description"), Some(" "));
}

#[test]
fn whitespace_only_lines_are_skipped() {
    let table = parse_str("Reference\nINV-1\n   \n\r\nINV-3\n").expect("parse");
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.rows[1].get("Reference"), Some("INV-3"));
}

#[test]
fn parse_honours_standard_quoting() {
    let input = "Description,Amount\n\"Desk, oak\",\"1,200.00\"\n\"He said \"\"ok\"\"\",5\n\"two\nlines\",7\n";
    let table = parse_str(input).expect("parse quoted");
    assert_eq!(table.rows[0].get("Description"), Some("Desk, oak"));
    assert_eq!(table.rows[0].get("Amount"), Some("1,200.00"));
    assert_eq!(table.rows[1].get("Description"), Some("He said \"ok\""));
    assert_eq!(table.rows[2].get("Description"), Some("two\nlines"));
}

#[test]
fn parse_leaves_values_uncoerced() {
    let table = parse_str("Amount,Date\n 007.50 ,01/02/2024\n").expect("parse");
    assert_eq!(table.rows[0].get("Amount"), Some(" 007.50 "));
    assert_eq!(table.rows[0].get("Date"), Some("01/02/2024"));
}

#[test]
fn short_records_leave_trailing_columns_absent() {
    let table = parse_str("Date,Amount,Reference\n2024-01-01,10\n").expect("parse short row");
    let row = &table.rows[0];
    assert_eq!(row.get("Amount"), Some("10"));
    assert_eq!(row.get("Reference"), None);
    assert_eq!(row.len(), 2);
}

#[test]
fn long_records_fail_the_whole_file() {
    let err = parse_str("Date,Amount\n2024-01-01,10\n2024-01-02,20,extra\n")
        .expect_err("too many fields");
    match err {
        ReconcileError::Parse { line, message } => {
            assert_eq!(line, Some(3));
            assert!(message.contains("3 field(s)"), "{message}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn unterminated_quote_is_a_parse_error() {
    let err = parse_str("Date,Description\n2024-01-01,\"never closed\n2024-01-02,ok\n")
        .expect_err("unterminated quote");
    assert_eq!(
        err,
        ReconcileError::Parse {
            line: Some(2),
            message: "unterminated quoted field".to_string(),
        }
    );
}

#[test]
fn empty_input_has_no_header() {
    for input in ["", "\n\n", "\r\n"] {
        let err = parse_str(input).expect_err("no header");
        assert!(err.to_string().contains("no header line"), "{err}");
    }
}

#[test]
fn header_only_input_yields_no_rows() {
    let table = parse_str("Date,Amount\n").expect("header only");
    assert_eq!(table.columns, strings(&["Date", "Amount"]));
    assert!(table.rows.is_empty());
}

#[test]
fn duplicate_headers_take_the_first_value() {
    let table = parse_str("Date,date,Date\na,b,c\n").expect("parse duplicates");
    assert_eq!(table.columns, strings(&["Date", "date", "Date"]));
    assert_eq!(table.rows[0].get("Date"), Some("a"));
    assert_eq!(table.rows[0].get("date"), Some("b"));
}

#[test]
fn custom_delimiter_and_encoding_are_respected() {
    let options = ParseOptions {
        delimiter: b';',
        encoding: WINDOWS_1252,
    };
    let table = parse(b"Description;Amount\nCaf\xE9;3,50\n", &options).expect("parse 1252");
    assert_eq!(table.rows[0].get("Description"), Some("Café"));
    assert_eq!(table.rows[0].get("Amount"), Some("3,50"));
}

#[test]
fn invalid_utf8_is_a_parse_error() {
    let err = parse(b"Date\n\xFF\xFE\xFD\n", &ParseOptions::default()).expect_err("bad utf-8");
    assert!(matches!(err, ReconcileError::Parse { line: None, .. }));
}

#[test]
fn utf8_bom_is_not_part_of_the_first_column() {
    let table = parse(b"\xEF\xBB\xBFDate,Amount\n2024-01-01,1\n", &ParseOptions::default())
        .expect("parse with bom");
    assert_eq!(table.columns[0], "Date");
}

#[test]
fn text_file_is_rejected_before_reading() {
    let workspace = TestWorkspace::new();
    // Unterminated quote: would be a parse error if the parser ever ran.
    let path = workspace.write("data.txt", "Date\n\"broken\n");
    let err = read_csv_file(&path, &ParseOptions::default(), u64::MAX).expect_err("txt rejected");
    assert_eq!(
        err.downcast_ref::<ReconcileError>(),
        Some(&ReconcileError::InvalidFileType {
            name: "data.txt".to_string()
        })
    );
}

#[test]
fn oversized_file_is_rejected() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("big.csv", BANK_EXPORT);
    let err = read_csv_file(&path, &ParseOptions::default(), 16).expect_err("too large");
    match err.downcast_ref::<ReconcileError>() {
        Some(ReconcileError::Validation(ValidationError::FileTooLarge { limit, .. })) => {
            assert_eq!(*limit, 16)
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn read_csv_file_parses_from_disk() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("Statement.CSV", BANK_EXPORT);
    let table = read_csv_file(&path, &ParseOptions::default(), ingest::DEFAULT_MAX_FILE_BYTES)
        .expect("read csv file");
    assert_eq!(table.row_count(), 2);
}

fn cell() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 .,\"-]{0,12}"
}

fn table_rows() -> impl Strategy<Value = Vec<Vec<String>>> {
    (1usize..=3).prop_flat_map(|width| {
        proptest::collection::vec(proptest::collection::vec(cell(), width), 0..20)
    })
}

proptest! {
    #[test]
    fn header_plus_n_records_parse_to_n_rows(rows in table_rows()) {
        let header = ["Date", "Amount", "Description"];
        let width = rows.first().map(Vec::len).unwrap_or(header.len());
        let header = &header[..width];
        // A lone unquoted whitespace cell is indistinguishable from a blank
        // line, so single-column files quote every value.
        let quote_style = if width == 1 {
            csv::QuoteStyle::Always
        } else {
            csv::QuoteStyle::Necessary
        };
        let mut writer = csv::WriterBuilder::new()
            .quote_style(quote_style)
            .from_writer(Vec::new());
        writer.write_record(header).unwrap();
        for row in &rows {
            writer.write_record(row).unwrap();
        }
        let bytes = writer.into_inner().unwrap();
        let table = parse(&bytes, &ParseOptions::default()).unwrap();
        prop_assert_eq!(table.columns, strings(header));
        prop_assert_eq!(table.rows.len(), rows.len());
        let last = header[width - 1];
        for (parsed, row) in table.rows.iter().zip(&rows) {
            prop_assert_eq!(parsed.get(last), Some(row[width - 1].as_str()));
        }
    }
}
