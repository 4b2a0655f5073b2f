//! Dialect-aware CSV row reader
//!
//! Rows are streamed straight from the file. UTF-8 input goes to the `csv`
//! parser as is; UTF-16 and UTF-32 input passes through a [`Transcoder`]
//! that re-encodes it to UTF-8 chunk by chunk. A leading byte order mark is
//! dropped in every encoding. Header handling is left to the caller: the
//! first row comes back like any other.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use csv::{ErrorKind, Reader, ReaderBuilder, StringRecord};
use encoding_rs::{DecoderResult, UTF_16BE, UTF_16LE};

use super::errors::{ValidateError, ValidateResult};
use crate::schema::{CsvDialect, Encoding};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];
const UTF32_LE_BOM: &[u8] = &[0xFF, 0xFE, 0x00, 0x00];
const UTF32_BE_BOM: &[u8] = &[0x00, 0x00, 0xFE, 0xFF];

type Source = Box<dyn Read + Send>;

/// One parsed CSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line the row starts on.
    pub line: u64,
    pub fields: Vec<String>,
}

impl Row {
    /// Field at `offset`; missing cells of short rows read as empty.
    pub fn field(&self, offset: usize) -> &str {
        self.fields.get(offset).map_or("", String::as_str)
    }
}

/// Streams rows of one CSV file.
pub struct RowReader {
    reader: Reader<Source>,
    record: StringRecord,
    path: String,
    encoding: Encoding,
}

impl RowReader {
    /// Opens a CSV file for reading in its declared encoding.
    ///
    /// Only the byte order mark is inspected here. Bytes that are invalid in
    /// the encoding surface from [`next_row`](Self::next_row) when reached.
    pub fn open(path: &Path, dialect: &CsvDialect) -> ValidateResult<Self> {
        let display = path.display().to_string();
        let io_error = |source| ValidateError::Io {
            path: display.clone(),
            source,
        };

        let file = File::open(path).map_err(io_error)?;
        let mut input = BufReader::new(file);
        let source: Source = match dialect.encoding {
            Encoding::Utf8 => {
                skip_bom(&mut input, UTF8_BOM).map_err(io_error)?;
                Box::new(input)
            }
            Encoding::Utf16 => Box::new(Transcoder::utf16(input).map_err(io_error)?),
            Encoding::Utf32 => Box::new(Transcoder::utf32(input).map_err(io_error)?),
        };
        Ok(Self::with_source(source, dialect, display))
    }

    /// Reads rows from already decoded text.
    #[cfg(test)]
    pub(crate) fn from_text(text: String, dialect: &CsvDialect) -> Self {
        let source: Source = Box::new(io::Cursor::new(text.into_bytes()));
        Self::with_source(source, dialect, "<text>".to_string())
    }

    fn with_source(source: Source, dialect: &CsvDialect, path: String) -> Self {
        let escape = (dialect.quote_char != dialect.enclosure).then_some(dialect.quote_char);
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(dialect.delimiter)
            .quote(dialect.enclosure)
            .escape(escape)
            .from_reader(source);
        Self {
            reader,
            record: StringRecord::new(),
            path,
            encoding: dialect.encoding,
        }
    }

    /// Returns the next row, or `None` at end of file.
    pub fn next_row(&mut self) -> ValidateResult<Option<Row>> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {}
            Ok(false) => return Ok(None),
            Err(e) => return Err(self.read_error(e)),
        }
        let line = self.record.position().map_or(0, |p| p.line());
        Ok(Some(Row {
            line,
            fields: self.record.iter().map(str::to_string).collect(),
        }))
    }

    fn read_error(&self, error: csv::Error) -> ValidateError {
        let invalid = match error.kind() {
            ErrorKind::Utf8 { .. } => true,
            ErrorKind::Io(e) => e.kind() == io::ErrorKind::InvalidData,
            _ => false,
        };
        if invalid {
            return ValidateError::Encoding {
                path: self.path.clone(),
                encoding: self.encoding.to_string(),
            };
        }
        if let ErrorKind::Io(e) = error.kind() {
            return ValidateError::Io {
                path: self.path.clone(),
                source: io::Error::new(e.kind(), e.to_string()),
            };
        }
        ValidateError::Csv(error)
    }
}

/// Consumes `bom` if the stream starts with it.
fn skip_bom<R: BufRead>(input: &mut R, bom: &[u8]) -> io::Result<bool> {
    let found = input.fill_buf()?.starts_with(bom);
    if found {
        input.consume(bom.len());
    }
    Ok(found)
}

fn invalid_data(encoding: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("stream is not valid {}", encoding),
    )
}

enum Codec {
    Utf16(encoding_rs::Decoder),
    Utf32 { big_endian: bool, carry: Vec<u8> },
}

impl Codec {
    fn name(&self) -> &'static str {
        match self {
            Codec::Utf16(_) => "utf-16",
            Codec::Utf32 { .. } => "utf-32",
        }
    }
}

/// Re-encodes a UTF-16 or UTF-32 stream to UTF-8.
///
/// Text decoded before an invalid unit is still handed out. The read after
/// it fails with [`io::ErrorKind::InvalidData`].
pub struct Transcoder<R> {
    input: R,
    codec: Codec,
    output: Vec<u8>,
    pos: usize,
    finished: bool,
    malformed: bool,
}

impl<R: BufRead> Transcoder<R> {
    /// Little-endian unless the stream starts with a big-endian BOM.
    pub fn utf16(mut input: R) -> io::Result<Self> {
        let codec = if skip_bom(&mut input, UTF16_BE_BOM)? {
            UTF_16BE
        } else {
            skip_bom(&mut input, UTF16_LE_BOM)?;
            UTF_16LE
        };
        Ok(Self::new(input, Codec::Utf16(codec.new_decoder_without_bom_handling())))
    }

    /// Little-endian unless the stream starts with a big-endian BOM.
    pub fn utf32(mut input: R) -> io::Result<Self> {
        let big_endian = skip_bom(&mut input, UTF32_BE_BOM)?;
        if !big_endian {
            skip_bom(&mut input, UTF32_LE_BOM)?;
        }
        let codec = Codec::Utf32 {
            big_endian,
            carry: Vec::with_capacity(4),
        };
        Ok(Self::new(input, codec))
    }

    fn new(input: R, codec: Codec) -> Self {
        Self {
            input,
            codec,
            output: Vec::new(),
            pos: 0,
            finished: false,
            malformed: false,
        }
    }

    /// Decodes the next input chunk into `output`.
    fn refill(&mut self) -> io::Result<()> {
        self.output.clear();
        self.pos = 0;

        let chunk = self.input.fill_buf()?;
        let last = chunk.is_empty();
        let (consumed, valid) = match &mut self.codec {
            Codec::Utf16(decoder) => {
                let capacity = decoder
                    .max_utf8_buffer_length_without_replacement(chunk.len())
                    .ok_or_else(|| invalid_data("utf-16"))?;
                self.output.resize(capacity, 0);
                let (result, read, written) =
                    decoder.decode_to_utf8_without_replacement(chunk, &mut self.output, last);
                self.output.truncate(written);
                (read, !matches!(result, DecoderResult::Malformed(..)))
            }
            Codec::Utf32 { big_endian, carry } => {
                carry.extend_from_slice(chunk);
                let whole = carry.len() - carry.len() % 4;
                let mut valid = true;
                for unit in carry[..whole].chunks_exact(4) {
                    let unit = [unit[0], unit[1], unit[2], unit[3]];
                    let code = if *big_endian {
                        u32::from_be_bytes(unit)
                    } else {
                        u32::from_le_bytes(unit)
                    };
                    let Some(c) = char::from_u32(code) else {
                        valid = false;
                        break;
                    };
                    let mut buf = [0; 4];
                    self.output.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
                carry.drain(..whole);
                // A trailing partial unit
                if last && !carry.is_empty() {
                    valid = false;
                }
                (chunk.len(), valid)
            }
        };
        self.input.consume(consumed);
        self.finished = last;
        self.malformed = !valid;
        Ok(())
    }
}

impl<R: BufRead> Read for Transcoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos == self.output.len() {
            if self.malformed {
                return Err(invalid_data(self.codec.name()));
            }
            if self.finished {
                return Ok(0);
            }
            self.refill()?;
        }
        let n = buf.len().min(self.output.len() - self.pos);
        buf[..n].copy_from_slice(&self.output[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn rows(text: &str, dialect: &CsvDialect) -> Vec<Row> {
        let mut reader = RowReader::from_text(text.to_string(), dialect);
        let mut out = Vec::new();
        while let Some(row) = reader.next_row().unwrap() {
            out.push(row);
        }
        out
    }

    /// Transcodes through a tiny buffer so units straddle chunk borders.
    fn transcode(bytes: &[u8], encoding: Encoding) -> io::Result<String> {
        let input = BufReader::with_capacity(5, Cursor::new(bytes.to_vec()));
        let mut reader = match encoding {
            Encoding::Utf16 => Transcoder::utf16(input)?,
            Encoding::Utf32 => Transcoder::utf32(input)?,
            Encoding::Utf8 => unreachable!(),
        };
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(text)
    }

    fn open_with(bytes: &[u8], encoding: Encoding) -> (NamedTempFile, RowReader) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        let dialect = CsvDialect {
            encoding,
            ..CsvDialect::default()
        };
        let reader = RowReader::open(file.path(), &dialect).unwrap();
        (file, reader)
    }

    #[test]
    fn test_lines_and_fields() {
        let rows = rows("a,b\n1,2\n3\n", &CsvDialect::default());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].fields, ["a", "b"]);
        assert_eq!(rows[1].line, 2);
        assert_eq!(rows[2].line, 3);
        assert_eq!(rows[2].field(1), "");
    }

    #[test]
    fn test_multiline_field_keeps_line_numbers() {
        let rows = rows("h\n\"x\ny\"\nz\n", &CsvDialect::default());
        assert_eq!(rows[1].fields, ["x\ny"]);
        assert_eq!(rows[1].line, 2);
        assert_eq!(rows[2].line, 4);
    }

    #[test]
    fn test_custom_dialect() {
        let dialect = CsvDialect {
            delimiter: b';',
            enclosure: b'\'',
            ..CsvDialect::default()
        };
        let rows = rows("'a;b';c\n", &dialect);
        assert_eq!(rows[0].fields, ["a;b", "c"]);
    }

    #[test]
    fn test_skip_bom() {
        let mut input = Cursor::new([UTF8_BOM, &b"id"[..]].concat());
        assert!(skip_bom(&mut input, UTF8_BOM).unwrap());
        assert!(!skip_bom(&mut input, UTF8_BOM).unwrap());
        let mut rest = String::new();
        input.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "id");
    }

    #[test]
    fn test_transcode_utf16() {
        let le: Vec<u8> = "id,é".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        let with_bom = [UTF16_LE_BOM, &le[..]].concat();
        assert_eq!(transcode(&with_bom, Encoding::Utf16).unwrap(), "id,é");
        assert_eq!(transcode(&le, Encoding::Utf16).unwrap(), "id,é");

        let be: Vec<u8> = "id".encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
        let with_bom = [UTF16_BE_BOM, &be[..]].concat();
        assert_eq!(transcode(&with_bom, Encoding::Utf16).unwrap(), "id");

        // Lone high surrogate
        let err = transcode(&[0x00, 0xD8, 0x41, 0x00], Encoding::Utf16).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_transcode_utf32() {
        let be: Vec<u8> = "é,1".chars().flat_map(|c| (c as u32).to_be_bytes()).collect();
        let with_bom = [UTF32_BE_BOM, &be[..]].concat();
        assert_eq!(transcode(&with_bom, Encoding::Utf32).unwrap(), "é,1");

        let le: Vec<u8> = "ab".chars().flat_map(|c| (c as u32).to_le_bytes()).collect();
        let with_bom = [UTF32_LE_BOM, &le[..]].concat();
        assert_eq!(transcode(&with_bom, Encoding::Utf32).unwrap(), "ab");

        let err = transcode(&[0x41, 0x00, 0x00], Encoding::Utf32).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let err = transcode(&0x11_0000u32.to_le_bytes(), Encoding::Utf32).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_open_missing_file() {
        let err = RowReader::open(Path::new("/nonexistent/x.csv"), &CsvDialect::default())
            .err()
            .unwrap();
        assert_eq!(err.code(), "CSV_VALIDATE_IO");
    }

    #[test]
    fn test_rows_before_invalid_bytes_are_returned() {
        let (_file, mut reader) = open_with(b"\xEF\xBB\xBFid\n1\n\xC3\x28\n", Encoding::Utf8);
        assert_eq!(reader.next_row().unwrap().unwrap().fields, ["id"]);
        assert_eq!(reader.next_row().unwrap().unwrap().fields, ["1"]);
        let err = reader.next_row().unwrap_err();
        assert_eq!(err.code(), "CSV_VALIDATE_ENCODING");
    }

    #[test]
    fn test_invalid_utf16_row() {
        let mut bytes: Vec<u8> = "id\n".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        bytes.extend_from_slice(&[0x00, 0xDC]);
        let (_file, mut reader) = open_with(&bytes, Encoding::Utf16);
        assert_eq!(reader.next_row().unwrap().unwrap().fields, ["id"]);
        let err = reader.next_row().unwrap_err();
        assert_eq!(err.code(), "CSV_VALIDATE_ENCODING");
        assert!(err.to_string().contains("utf-16"));
    }
}
