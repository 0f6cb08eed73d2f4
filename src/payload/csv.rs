//! CSV decoding.

use crate::error::LoaderResult;
use crate::types::RawRow;

/// Decode CSV text into raw rows.
///
/// Rules:
///
/// - The first line holds the field names.
/// - Each following line becomes one [`RawRow`] keyed by those names.
/// - Short lines leave their trailing fields null; extra trailing values are ignored.
/// - Blank lines are skipped. Values are kept verbatim (no trimming).
pub fn decode_csv_str(text: &str) -> LoaderResult<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    decode_csv_from_reader(&mut rdr)
}

/// Decode CSV data from an existing CSV reader.
pub fn decode_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
) -> LoaderResult<Vec<RawRow>> {
    let headers = rdr.headers()?.clone();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.len() == 1 && record.get(0).is_some_and(str::is_empty) {
            continue;
        }

        let row: RawRow = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.to_owned(), record.get(idx).map(str::to_owned)))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}
