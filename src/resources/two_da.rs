//! Row/column data tables (2DA) and the registry that caches them.
//!
//! Two encodings exist in the wild: the whitespace separated text format
//! (`2DA V2.0`) and a packed binary format (`2DA V2.b`). Both parse into the
//! same [`TwoDaTable`].

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    error::LoadError,
    resources::{ResourceProvider, ResourceType, load_resource},
};

const TEXT_MAGIC: &[u8] = b"2DA V2.0";
const BINARY_MAGIC: &[u8] = b"2DA V2.b";
/// Marker for an empty cell.
const EMPTY_CELL: &str = "****";

#[derive(Clone, Debug)]
pub struct TwoDaTable {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TwoDaTable {
    /// Parse either 2DA encoding. `name` is used for error messages.
    pub fn parse(name: &str, bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.starts_with(TEXT_MAGIC) {
            Self::parse_text(name, bytes)
        } else if bytes.starts_with(BINARY_MAGIC) {
            Self::parse_binary(name, bytes)
        } else {
            let found = bytes.get(..TEXT_MAGIC.len()).unwrap_or(bytes);
            Err(LoadError::FormatMismatch {
                name: name.to_string(),
                expected: "2DA V2.0 or 2DA V2.b".to_string(),
                found: String::from_utf8_lossy(found).into_owned(),
            })
        }
    }

    /// Build a table directly from headers and rows.
    pub fn from_rows(name: &str, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut table = Self {
            name: name.to_string(),
            headers,
            rows,
        };
        table.normalize();
        table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Index of the column whose header matches `name`, ignoring case.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    /// The cell at `row` / `column`, or `None` if either does not exist.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column(column)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    /// Like [`cell`](Self::cell), but reports which lookup failed.
    pub fn cell_str(&self, row: usize, column: &str) -> Result<&str, LoadError> {
        let col = self.column(column).ok_or_else(|| LoadError::MissingColumn {
            table: self.name.clone(),
            column: column.to_string(),
        })?;
        let cells = self.rows.get(row).ok_or_else(|| LoadError::RowOutOfRange {
            table: self.name.clone(),
            row,
            rows: self.rows.len(),
        })?;
        Ok(cells[col].as_str())
    }

    // Every row gets exactly one cell per column, `****` becomes empty.
    fn normalize(&mut self) {
        let width = self.headers.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
            for cell in row.iter_mut() {
                if cell == EMPTY_CELL {
                    cell.clear();
                }
            }
        }
    }

    fn parse_text(name: &str, bytes: &[u8]) -> Result<Self, LoadError> {
        let text = String::from_utf8_lossy(bytes);
        let mut lines = text
            .lines()
            .skip(1)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .peekable();

        if lines
            .peek()
            .is_some_and(|line| line.to_ascii_uppercase().starts_with("DEFAULT:"))
        {
            lines.next();
        }

        let headers = lines
            .next()
            .map(tokenize)
            .ok_or_else(|| LoadError::malformed(name, "missing column headers"))?;

        // The first token of every row is its label, rows are addressed by position.
        let rows = lines
            .map(|line| tokenize(line).into_iter().skip(1).collect())
            .collect();

        Ok(Self::from_rows(name, headers, rows))
    }

    fn parse_binary(name: &str, bytes: &[u8]) -> Result<Self, LoadError> {
        let mut cursor = BinaryCursor {
            name,
            bytes,
            pos: BINARY_MAGIC.len(),
        };
        cursor.expect_byte(b'\n')?;

        let mut headers = Vec::new();
        while cursor.peek()? != 0 {
            headers.push(cursor.read_until(b'\t')?);
        }
        cursor.pos += 1;

        let row_count = cursor.read_u32()? as usize;
        for _ in 0..row_count {
            cursor.read_until(b'\t')?;
        }

        let cell_count = row_count * headers.len();
        let offsets = (0..cell_count)
            .map(|_| cursor.read_u16())
            .collect::<Result<Vec<_>, _>>()?;
        let data_size = cursor.read_u16()? as usize;
        let data = cursor.take(data_size)?;

        let cells = offsets
            .into_iter()
            .map(|offset| -> Result<String, LoadError> {
                let start = offset as usize;
                let tail = data.get(start..).ok_or_else(|| {
                    LoadError::malformed(name, format!("cell offset {start} exceeds data"))
                })?;
                let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
                Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rows = if headers.is_empty() {
            vec![Vec::new(); row_count]
        } else {
            cells.chunks(headers.len()).map(<[String]>::to_vec).collect()
        };
        Ok(Self::from_rows(name, headers, rows))
    }
}

/// Split a text 2DA line on whitespace, keeping double-quoted tokens together.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '"' {
            chars.next();
            tokens.push(chars.by_ref().take_while(|&c| c != '"').collect());
        } else {
            let mut token = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
            tokens.push(token);
        }
    }
    tokens
}

struct BinaryCursor<'a> {
    name: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BinaryCursor<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], LoadError> {
        let out = self
            .bytes
            .get(self.pos..self.pos + len)
            .ok_or_else(|| LoadError::malformed(self.name, format!("truncated at byte {}", self.pos)))?;
        self.pos += len;
        Ok(out)
    }

    fn peek(&self) -> Result<u8, LoadError> {
        self.bytes
            .get(self.pos)
            .copied()
            .ok_or_else(|| LoadError::malformed(self.name, format!("truncated at byte {}", self.pos)))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<(), LoadError> {
        let found = self.take(1)?[0];
        if found != expected {
            return Err(LoadError::malformed(
                self.name,
                format!("expected byte {expected:#04x} at {}, found {found:#04x}", self.pos - 1),
            ));
        }
        Ok(())
    }

    fn read_until(&mut self, delimiter: u8) -> Result<String, LoadError> {
        let rest = &self.bytes[self.pos.min(self.bytes.len())..];
        let len = rest.iter().position(|&b| b == delimiter).ok_or_else(|| {
            LoadError::malformed(self.name, format!("unterminated string at byte {}", self.pos))
        })?;
        let out = String::from_utf8_lossy(&rest[..len]).into_owned();
        self.pos += len + 1;
        Ok(out)
    }

    fn read_u16(&mut self) -> Result<u16, LoadError> {
        let raw = self.take(2)?;
        Ok(u16::from_le_bytes([raw[0], raw[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, LoadError> {
        let raw = self.take(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}

/// Process-wide cache of 2DA tables, populated on first use of each name.
///
/// Lookups are serialized on an internal lock, so a table is only ever
/// loaded once even when several callers ask for it at the same time.
pub struct TwoDaRegistry {
    resources: Arc<dyn ResourceProvider>,
    tables: Mutex<HashMap<String, Arc<TwoDaTable>>>,
}

impl TwoDaRegistry {
    pub fn new(resources: Arc<dyn ResourceProvider>) -> Self {
        Self {
            resources,
            tables: Mutex::new(HashMap::new()),
        }
    }

    /// Return the table `name`, loading and caching it if necessary.
    pub fn get(&self, name: &str) -> Result<Arc<TwoDaTable>, LoadError> {
        let key = name.to_ascii_lowercase();
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(table) = tables.get(&key) {
            return Ok(table.clone());
        }

        let data = load_resource(self.resources.as_ref(), name, ResourceType::TwoDa)?;
        let table = Arc::new(TwoDaTable::parse(name, &data)?);
        log::info!(
            "loaded 2DA {} ({} rows, {} columns)",
            name,
            table.row_count(),
            table.column_count()
        );
        tables.insert(key, table.clone());
        Ok(table)
    }

    /// Register an already parsed table, replacing any cached one.
    pub fn add(&self, name: &str, table: TwoDaTable) {
        self.tables
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_ascii_lowercase(), Arc::new(table));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&name.to_ascii_lowercase())
    }

    /// Drop every cached table. Tables still held elsewhere stay alive.
    pub fn clear(&self) {
        self.tables.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
