//! CSV import reader
//!
//! Decodes an uploaded blob, spools it to a temporary file and hands out the
//! header row and then one data line at a time. The spool is removed by
//! `cleanup` or, failing that, when the reader is dropped.

use std::fs::File;
use std::io::Write;

use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::Encoding;
use tempfile::NamedTempFile;

use crate::core::field::FieldValue;
use crate::upload::error::UploadError;
use crate::upload::value::infer;

/// Line iterator over an uploaded CSV file
pub struct CsvImportReader {
    spool: Option<NamedTempFile>,
    reader: Option<csv::Reader<File>>,
    columns: Vec<String>,
    delimiter: u8,
    infer_types: bool,
}

impl CsvImportReader {
    /// Decode `content` with the given encoding label and prepare it for reading
    ///
    /// A byte order mark is honoured and stripped. Undecodable bytes are
    /// replaced rather than rejected.
    pub fn load_content(content: &[u8], encoding: &str, delimiter: u8) -> Result<Self, UploadError> {
        let encoding = Encoding::for_label(encoding.trim().as_bytes())
            .ok_or_else(|| UploadError::UnknownEncoding(encoding.to_string()))?;

        let (text, used, had_errors) = encoding.decode(content);
        if had_errors {
            tracing::warn!(encoding = used.name(), "upload contains undecodable bytes");
        }

        let mut spool = tempfile::Builder::new()
            .prefix("cupload-")
            .suffix(".csv")
            .tempfile()
            .map_err(|e| UploadError::CannotReadFile(e.to_string()))?;
        spool
            .write_all(text.as_bytes())
            .and_then(|_| spool.flush())
            .map_err(|e| UploadError::CannotReadFile(e.to_string()))?;

        let mut reader = Self {
            spool: Some(spool),
            reader: None,
            columns: Vec::new(),
            delimiter,
            infer_types: false,
        };

        let mut csv = reader.open()?;
        reader.columns = match next_record(&mut csv)? {
            Some(record) => record.iter().map(String::from).collect(),
            None => Vec::new(),
        };

        tracing::debug!(
            encoding = used.name(),
            delimiter = %char::from(delimiter).escape_default(),
            columns = reader.columns.len(),
            "loaded upload content"
        );
        Ok(reader)
    }

    /// Hand integer, float and boolean looking cells out pre-typed
    pub fn with_type_inference(mut self, infer_types: bool) -> Self {
        self.infer_types = infer_types;
        self
    }

    /// The header row as read from the file
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position the reader on the first data line
    pub fn init(&mut self) -> Result<(), UploadError> {
        let mut csv = self.open()?;
        next_record(&mut csv)?;
        self.reader = Some(csv);
        Ok(())
    }

    /// Read the next data line; `None` at end of file or when not initialized
    pub fn next_line(&mut self) -> Result<Option<Vec<FieldValue>>, UploadError> {
        let Some(csv) = self.reader.as_mut() else {
            return Ok(None);
        };

        let Some(record) = next_record(csv)? else {
            return Ok(None);
        };

        let infer_types = self.infer_types;
        Ok(Some(
            record
                .iter()
                .map(|cell| {
                    if infer_types {
                        infer(cell.to_string())
                    } else {
                        FieldValue::from(cell)
                    }
                })
                .collect(),
        ))
    }

    /// Stop reading; further `next_line` calls return `None`
    pub fn close(&mut self) {
        self.reader = None;
    }

    /// Remove the spooled content
    pub fn cleanup(&mut self) {
        if let Some(spool) = self.spool.take() {
            if let Err(e) = spool.close() {
                tracing::warn!(error = %e, "could not remove upload spool file");
            }
        }
    }

    /// Whether the spool file is still held
    pub fn is_loaded(&self) -> bool {
        self.spool.is_some()
    }

    fn open(&self) -> Result<csv::Reader<File>, UploadError> {
        let spool = self
            .spool
            .as_ref()
            .ok_or_else(|| UploadError::CannotReadFile("upload content was cleaned up".to_string()))?;
        let file = spool
            .reopen()
            .map_err(|e| UploadError::CannotReadFile(e.to_string()))?;

        Ok(ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .from_reader(file))
    }
}

impl Drop for CsvImportReader {
    fn drop(&mut self) {
        self.close();
        self.cleanup();
    }
}

/// Next non-blank record
fn next_record(csv: &mut csv::Reader<File>) -> Result<Option<StringRecord>, UploadError> {
    let mut record = StringRecord::new();
    loop {
        let more = csv.read_record(&mut record).map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            UploadError::Csv(format!("line {}: {}", line, e))
        })?;
        if !more {
            return Ok(None);
        }
        let blank = record.len() == 1 && record.get(0).is_some_and(str::is_empty);
        if !blank {
            return Ok(Some(record));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(reader: &mut CsvImportReader) -> Vec<Vec<FieldValue>> {
        reader.init().unwrap();
        let mut out = Vec::new();
        while let Some(line) = reader.next_line().unwrap() {
            out.push(line);
        }
        out
    }

    #[test]
    fn test_reads_header_then_lines() {
        let content = b"shortname, fullname\nCS101, Intro CS\n\n\"CS,102\",\"Data \"\"Science\"\"\"\n";
        let mut reader = CsvImportReader::load_content(content, "UTF-8", b',').unwrap();
        assert_eq!(reader.columns(), &["shortname".to_string(), "fullname".to_string()]);

        let rows = lines(&mut reader);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![FieldValue::from("CS101"), FieldValue::from("Intro CS")]);
        assert_eq!(
            rows[1],
            vec![FieldValue::from("CS,102"), FieldValue::from("Data \"Science\"")]
        );
    }

    #[test]
    fn test_other_delimiters_and_crlf() {
        let content = b"shortname;fullname\r\nA1;Alpha\r\n";
        let mut reader = CsvImportReader::load_content(content, "utf-8", b';').unwrap();
        let rows = lines(&mut reader);
        assert_eq!(rows, vec![vec![FieldValue::from("A1"), FieldValue::from("Alpha")]]);

        let content = b"shortname\tfullname\nT1\tTab course\n";
        let mut reader = CsvImportReader::load_content(content, "UTF-8", b'\t').unwrap();
        assert_eq!(lines(&mut reader).len(), 1);
    }

    #[test]
    fn test_decodes_latin1_and_strips_bom() {
        let content = b"shortname,fullname\nFR1,Fran\xe7ais\n";
        let mut reader = CsvImportReader::load_content(content, "ISO-8859-1", b',').unwrap();
        assert_eq!(lines(&mut reader)[0][1], FieldValue::from("Français"));

        let content = b"\xef\xbb\xbfshortname,fullname\nB1,Bom\n";
        let reader = CsvImportReader::load_content(content, "UTF-8", b',').unwrap();
        assert_eq!(reader.columns()[0], "shortname");
    }

    #[test]
    fn test_unknown_encoding_fails() {
        let err = CsvImportReader::load_content(b"a,b\n", "klingon", b',').err().unwrap();
        assert!(matches!(err, UploadError::UnknownEncoding(_)));
    }

    #[test]
    fn test_empty_content_has_no_columns() {
        let mut reader = CsvImportReader::load_content(b"", "UTF-8", b',').unwrap();
        assert!(reader.columns().is_empty());
        assert!(lines(&mut reader).is_empty());
    }

    #[test]
    fn test_type_inference() {
        let content = b"shortname,category,visible\nM1,3,true\n";
        let mut reader = CsvImportReader::load_content(content, "UTF-8", b',')
            .unwrap()
            .with_type_inference(true);
        assert_eq!(
            lines(&mut reader)[0],
            vec![FieldValue::from("M1"), FieldValue::Int(3), FieldValue::Bool(true)]
        );
    }

    #[test]
    fn test_close_and_cleanup_release_spool() {
        let mut reader = CsvImportReader::load_content(b"a,b\n1,2\n", "UTF-8", b',').unwrap();
        let path = reader.spool.as_ref().unwrap().path().to_path_buf();
        reader.init().unwrap();
        reader.close();
        assert_eq!(reader.next_line().unwrap(), None);

        reader.cleanup();
        assert!(!reader.is_loaded());
        assert!(!path.exists());
        assert!(matches!(reader.init(), Err(UploadError::CannotReadFile(_))));
    }

    #[test]
    fn test_drop_removes_spool() {
        let reader = CsvImportReader::load_content(b"a,b\n", "UTF-8", b',').unwrap();
        let path = reader.spool.as_ref().unwrap().path().to_path_buf();
        assert!(path.exists());
        drop(reader);
        assert!(!path.exists());
    }
}
