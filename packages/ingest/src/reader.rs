//! CSV bytes to [`RawTable`].

use emigrant_stats_transform::RawTable;

use crate::IngestError;

/// Reads a CSV document with a header row.
///
/// Headers are trimmed; cells are kept as written. Rows may have fewer or
/// more cells than the header. Rows whose cells are all blank are dropped.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] if the document is not valid CSV.
pub fn read_csv(bytes: &[u8]) -> Result<RawTable, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(strip_bom(bytes));

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(ToOwned::to_owned).collect());
    }

    log::debug!("Read {} CSV row(s) with {} column(s)", rows.len(), headers.len());

    Ok(RawTable::new(headers, rows))
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_headers_and_skips_blank_rows() {
        let table = read_csv(b" AGE_GROUP ,1981, 1982\n15 - 19,1,2\n,,\n20 - 24,3,4\n").unwrap();
        assert_eq!(table.headers, ["AGE_GROUP", "1981", "1982"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], ["20 - 24", "3", "4"]);
    }

    #[test]
    fn accepts_ragged_rows() {
        let table = read_csv(b"YEAR,MALE,FEMALE\n1981,10\n").unwrap();
        assert_eq!(table.rows[0].len(), 2);
    }

    #[test]
    fn handles_quoted_cells_and_bom() {
        let table = read_csv("\u{feff}COUNTRY,1981\n\"KOREA, SOUTH\",\"1,234\"\n".as_bytes()).unwrap();
        assert_eq!(table.headers[0], "COUNTRY");
        assert_eq!(table.rows[0][0], "KOREA, SOUTH");
        assert_eq!(table.rows[0][1], "1,234");
    }

    #[test]
    fn empty_document_has_no_rows() {
        let table = read_csv(b"").unwrap();
        assert!(table.headers.is_empty());
        assert!(table.is_empty());
    }
}
