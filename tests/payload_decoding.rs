use festival_loader::LoaderError;
use festival_loader::normalize::normalize_rows;
use festival_loader::payload::csv::{decode_csv_from_reader, decode_csv_str};
use festival_loader::payload::json::decode_json_str;
use festival_loader::payload::{PayloadFormat, decode_payload};

fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(format!("tests/fixtures/{name}")).unwrap()
}

#[test]
fn csv_by_suffix_keeps_file_order() {
    let rows = decode_payload("uploads/lineup.csv", &fixture("lineup.csv"), None).unwrap();
    assert_eq!(rows.len(), 4);
    let performers: Vec<_> = rows.iter().map(|r| r.get("Performer")).collect();
    assert_eq!(
        performers,
        vec![Some("The Midnight"), Some("Khruangbin"), Some(""), Some("Men I Trust")]
    );
    assert_eq!(rows[1].get("Popularity"), Some(""));
}

#[test]
fn suffix_match_is_case_insensitive() {
    let rows = decode_payload("LINEUP.CSV", &fixture("lineup.csv"), None).unwrap();
    assert_eq!(rows.len(), 4);
    let rows = decode_payload("Lineup.Json", &fixture("lineup.json"), None).unwrap();
    assert_eq!(rows.len(), 4);
}

#[test]
fn json_list_and_items_wrapper() {
    let rows = decode_payload("lineup.json", &fixture("lineup.json"), None).unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].get("Popularity"), Some("87"));
    assert!(!rows[1].contains("Popularity"));

    let rows = decode_payload("lineup_items.json", &fixture("lineup_items.json"), None).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[1].contains("Popularity"));
    assert_eq!(rows[1].get("Popularity"), None);
}

#[test]
fn json_object_without_items_is_empty() {
    let rows = decode_json_str(r#"{"festival": "Riverside"}"#).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn json_scalar_document_is_unsupported_shape() {
    for input in ["42", r#""lineup""#, r#"{"items": {"Performer": "A"}}"#, "[1, 2]"] {
        let err = decode_payload("x.json", input.as_bytes(), None).unwrap_err();
        assert!(
            matches!(err, LoaderError::UnsupportedPayloadShape { .. }),
            "input {input}: {err}"
        );
    }
}

#[test]
fn bom_is_stripped() {
    let rows = decode_payload("lineup_bom.csv", &fixture("lineup_bom.csv"), None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("Performer"), Some("Bonobo"));
    assert_eq!(rows[0].get("End"), Some("12:30am"));

    let with_bom = [b"\xef\xbb\xbf".as_slice(), br#"[{"Performer":"A"}]"#.as_slice()].concat();
    let rows = decode_payload("a.json", &with_bom, None).unwrap();
    assert_eq!(rows[0].get("Performer"), Some("A"));
}

#[test]
fn unknown_suffix_probes_json_then_csv() {
    let rows = decode_payload("exports/lineup_feed", &fixture("lineup_feed"), None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("Performer"), Some("Four Tet"));

    let rows = decode_payload("exports/lineup_export", &fixture("lineup_export"), None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("Performer"), Some("Floating Points"));
}

#[test]
fn unknown_suffix_with_nothing_decodable_fails() {
    for input in ["", "just a header line", "{}", "[]"] {
        let err = decode_payload("upload.bin", input.as_bytes(), None).unwrap_err();
        assert!(
            matches!(err, LoaderError::UnsupportedFileFormat { .. }),
            "input {input:?}: {err}"
        );
    }
}

#[test]
fn forced_format_overrides_suffix() {
    let rows = decode_payload(
        "lineup.txt",
        &fixture("lineup.csv"),
        Some(PayloadFormat::Csv),
    )
    .unwrap();
    assert_eq!(rows.len(), 4);
}

#[test]
fn invalid_utf8_is_rejected() {
    let err = decode_payload("x.csv", b"Performer\n\xff\xfe\n", None).unwrap_err();
    assert!(matches!(err, LoaderError::InvalidEncoding { .. }));
}

#[test]
fn csv_short_rows_leave_fields_null_and_blank_lines_are_skipped() {
    let rows = decode_csv_str("Performer,Stage,Date\nA,Main\n\nB,Side,2025-07-12,extra\n").unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].contains("Date"));
    assert_eq!(rows[0].get("Date"), None);
    assert_eq!(rows[1].get("Date"), Some("2025-07-12"));
    assert_eq!(rows[1].len(), 3);
}

#[test]
fn csv_from_reader_handles_quoted_fields() {
    let input = "Performer,Stage\n\"Crosby, Stills & Nash\",Main\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input.as_bytes());
    let rows = decode_csv_from_reader(&mut rdr).unwrap();
    assert_eq!(rows[0].get("Performer"), Some("Crosby, Stills & Nash"));
}

#[test]
fn csv_and_json_rows_normalize_to_identical_records() {
    let csv_rows = decode_payload("lineup.csv", &fixture("lineup.csv"), None).unwrap();
    let json_rows = decode_payload("lineup.json", &fixture("lineup.json"), None).unwrap();

    let from_csv = normalize_rows(&csv_rows);
    let from_json = normalize_rows(&json_rows);

    assert_eq!(from_csv.records.len(), 3);
    assert_eq!(from_csv.rejected.len(), 1);
    assert_eq!(from_json.rejected.len(), 1);

    let csv_bytes: Vec<Vec<u8>> = from_csv
        .records
        .iter()
        .map(|r| serde_json::to_vec(r).unwrap())
        .collect();
    let json_bytes: Vec<Vec<u8>> = from_json
        .records
        .iter()
        .map(|r| serde_json::to_vec(r).unwrap())
        .collect();
    assert_eq!(csv_bytes, json_bytes);
}
