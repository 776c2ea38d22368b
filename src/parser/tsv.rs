//! Tab-delimited meta file parser and writer.
//!
//! One header row; the sample key column is `SampleName`; the packed
//! exception sets live in `okexcept`. The writer always materializes the
//! `okexcept` column, so a table loaded from a file without it round-trips
//! to one with it.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{MetadiffError, Result};
use crate::model::{KindRegistry, Table, KEY_COLUMN, OKEXCEPT_COLUMN};

/// Read a meta file with the default column-kind registry.
pub fn read_meta(path: &Path) -> Result<Table> {
    read_meta_with(path, &KindRegistry::default())
}

/// Read a meta file, typing columns per the given registry.
pub fn read_meta_with(path: &Path, registry: &KindRegistry) -> Result<Table> {
    let file = File::open(path).map_err(|source| MetadiffError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_reader(BufReader::new(file), registry)
}

/// Parse tab-delimited content from any reader.
pub fn from_reader<R: Read>(reader: R, registry: &KindRegistry) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Table::load(&header, rows, registry)
}

/// Write a table back to a meta file.
pub fn write_meta(table: &Table, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|source| MetadiffError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    to_writer(BufWriter::new(file), table)
}

/// Serialize a table as tab-delimited text: `SampleName` first, data
/// columns in declaration order, `okexcept` last. Floats carry up to 8
/// significant digits.
pub fn to_writer<W: Write>(writer: W, table: &Table) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);

    let mut header = vec![KEY_COLUMN.to_string()];
    header.extend(table.column_names().map(str::to_string));
    header.push(OKEXCEPT_COLUMN.to_string());
    csv_writer.write_record(&header)?;

    for record in table.records() {
        let mut row = vec![record.key.clone()];
        row.extend(record.cells.iter().map(|cell| cell.display().into_owned()));
        row.push(record.accepted.pack());
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    fn parse(content: &str) -> Result<Table> {
        from_reader(content.as_bytes(), &KindRegistry::default())
    }

    fn serialize(table: &Table) -> String {
        let mut buffer = Vec::new();
        to_writer(&mut buffer, table).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn parses_typed_columns() {
        let table = parse(
            "SampleName\tCountry\tLatitude\tokexcept\n\
             s1\tGermany\t47.5\t\n\
             s2\tFrance\t\tCountry,\n",
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.cell("s1", "Latitude"),
            Some(&CellValue::Number(47.5))
        );
        assert_eq!(table.cell("s2", "Latitude"), Some(&CellValue::Missing));
        assert!(table.get("s2").unwrap().accepted.contains("Country"));
    }

    #[test]
    fn round_trip_preserves_the_table() {
        let content = "SampleName\tCountry\tLatitude\tokexcept\n\
                       s1\tGermany\t47.5\t\n\
                       s2\tFrance\t43.25\tCountry,Latitude,\n";
        let table = parse(content).unwrap();
        let written = serialize(&table);
        let reloaded = parse(&written).unwrap();
        assert_eq!(table, reloaded);
        assert_eq!(written, content);
    }

    #[test]
    fn okexcept_is_materialized_on_write() {
        let table = parse("SampleName\tCountry\ns1\tGermany\n").unwrap();
        let written = serialize(&table);
        assert!(written.starts_with("SampleName\tCountry\tokexcept\n"));
    }

    #[test]
    fn floats_serialize_with_8_significant_digits() {
        let table = parse("SampleName\tLatitude\ns1\t47.123456789\n").unwrap();
        let written = serialize(&table);
        assert!(written.contains("47.123457"));
    }

    #[test]
    fn duplicate_sample_names_fail_the_load() {
        let err = parse("SampleName\tCountry\ns1\ta\ns1\tb\n").unwrap_err();
        assert!(matches!(err, MetadiffError::Schema(_)));
    }

    #[test]
    fn short_rows_pad_with_missing() {
        let table = parse("SampleName\tCountry\tLatitude\ns1\tGermany\n").unwrap();
        assert_eq!(table.cell("s1", "Latitude"), Some(&CellValue::Missing));
    }
}
