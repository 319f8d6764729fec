//! Streaming chunked CSV reader

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::error::{LoaderError, LoaderResult};
use super::value::Record;

/// Literal field values read as null
pub const NULL_TOKENS: [&str; 4] = ["NA", "", "NULL", "null"];

/// A bounded group of rows read from one source file
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Header row of the source file
    pub headers: Vec<String>,
    /// Raw field values, `None` for null tokens
    pub rows: Vec<Vec<Option<String>>>,
    /// 1-based data row number of the first row in this chunk
    pub first_row: usize,
}

impl Chunk {
    /// Rebuild a raw chunk from cleaned records
    pub fn from_records(headers: &[String], records: &[Record]) -> Self {
        let rows = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|h| record.get(h).and_then(|v| v.to_text()))
                    .collect()
            })
            .collect();

        Self {
            headers: headers.to_vec(),
            rows,
            first_row: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a header, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Reads a CSV source in chunks of at most `chunk_size` rows
pub struct ChunkReader<R: Read> {
    reader: csv::Reader<R>,
    path: PathBuf,
    headers: Vec<String>,
    chunk_size: usize,
    rows_read: usize,
    finished: bool,
}

impl ChunkReader<File> {
    /// Open a file for chunked reading
    pub fn open(path: &Path, chunk_size: usize) -> LoaderResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, path, chunk_size)
    }
}

impl<R: Read> ChunkReader<R> {
    /// Wrap any reader; `path` is used for diagnostics only
    pub fn from_reader(inner: R, path: &Path, chunk_size: usize) -> LoaderResult<Self> {
        if chunk_size == 0 {
            return Err(LoaderError::InvalidSetting(
                "chunk size must be greater than zero".to_string(),
            ));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(inner);

        let headers = reader
            .headers()
            .map_err(|e| csv_error(path, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        Ok(Self {
            reader,
            path: path.to_path_buf(),
            headers,
            chunk_size,
            rows_read: 0,
            finished: false,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows read so far
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Read the next chunk, `None` once the file is exhausted
    pub fn next_chunk(&mut self) -> LoaderResult<Option<Chunk>> {
        if self.finished {
            return Ok(None);
        }

        let first_row = self.rows_read + 1;
        let mut rows = Vec::with_capacity(self.chunk_size);
        let mut record = csv::StringRecord::new();

        while rows.len() < self.chunk_size {
            let more = self
                .reader
                .read_record(&mut record)
                .map_err(|e| csv_error(&self.path, e))?;
            if !more {
                self.finished = true;
                break;
            }

            self.rows_read += 1;
            if record.len() > self.headers.len() {
                return Err(LoaderError::MalformedRow {
                    path: self.path.clone(),
                    row: self.rows_read,
                    expected: self.headers.len(),
                    found: record.len(),
                });
            }

            // Short rows are padded with nulls
            let mut row: Vec<Option<String>> = record.iter().map(null_token).collect();
            row.resize(self.headers.len(), None);
            rows.push(row);
        }

        if rows.is_empty() {
            return Ok(None);
        }

        Ok(Some(Chunk {
            headers: self.headers.clone(),
            rows,
            first_row,
        }))
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = LoaderResult<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

fn null_token(field: &str) -> Option<String> {
    if NULL_TOKENS.contains(&field) {
        None
    } else {
        Some(field.to_string())
    }
}

fn csv_error(path: &Path, error: csv::Error) -> LoaderError {
    LoaderError::Csv {
        path: path.to_path_buf(),
        error: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn reader_for(content: &str, chunk_size: usize) -> ChunkReader<&[u8]> {
        ChunkReader::from_reader(content.as_bytes(), Path::new("test.csv"), chunk_size).unwrap()
    }

    #[test]
    fn test_reads_in_chunks() {
        let content = "id,name\n1,a\n2,b\n3,c\n4,d\n5,e\n";
        let mut reader = reader_for(content, 2);

        let sizes: Vec<usize> = reader.by_ref().map(|c| c.unwrap().len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(reader.rows_read(), 5);
    }

    #[test]
    fn test_chunk_first_row_numbers() {
        let content = "id\n1\n2\n3\n";
        let chunks: Vec<Chunk> = reader_for(content, 2).map(|c| c.unwrap()).collect();
        assert_eq!(chunks[0].first_row, 1);
        assert_eq!(chunks[1].first_row, 3);
    }

    #[test]
    fn test_null_tokens() {
        let content = "a,b,c,d,e\nNA,,NULL,null,value\n";
        let chunk = reader_for(content, 10).next_chunk().unwrap().unwrap();
        assert_eq!(
            chunk.rows[0],
            vec![None, None, None, None, Some("value".to_string())]
        );
    }

    #[test]
    fn test_short_rows_are_padded() {
        let content = "a,b,c\n1,2\n";
        let chunk = reader_for(content, 10).next_chunk().unwrap().unwrap();
        assert_eq!(
            chunk.rows[0],
            vec![Some("1".to_string()), Some("2".to_string()), None]
        );
    }

    #[test]
    fn test_long_rows_are_rejected() {
        let content = "a,b\n1,2\n1,2,3\n";
        let result = reader_for(content, 10).next_chunk();
        assert!(matches!(
            result,
            Err(LoaderError::MalformedRow { row: 2, expected: 2, found: 3, .. })
        ));
    }

    #[test]
    fn test_header_only_file_has_no_chunks() {
        let mut reader = reader_for("a,b\n", 10);
        assert!(reader.next_chunk().unwrap().is_none());
        assert_eq!(reader.rows_read(), 0);
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let result = ChunkReader::from_reader("a\n".as_bytes(), Path::new("x.csv"), 0);
        assert!(matches!(result, Err(LoaderError::InvalidSetting(_))));
    }

    #[test]
    fn test_open_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("teams.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "teamID,name").unwrap();
        writeln!(file, "71,Aston Villa").unwrap();

        let mut reader = ChunkReader::open(&path, 100).unwrap();
        assert_eq!(reader.headers(), &["teamID".to_string(), "name".to_string()]);
        let chunk = reader.next_chunk().unwrap().unwrap();
        assert_eq!(chunk.rows[0][1].as_deref(), Some("Aston Villa"));
    }
}
