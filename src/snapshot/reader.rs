use std::path::Path;

/// A snapshot file read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Values of `column`, one per row; short rows yield `""`.
    pub fn column<'a>(&'a self, column: &str) -> Option<impl Iterator<Item = &'a str> + 'a> {
        let index = self.column_index(column)?;
        Some(
            self.rows
                .iter()
                .map(move |row| row.get(index).map(String::as_str).unwrap_or_default()),
        )
    }
}

/// Reads a snapshot CSV. Rows may be ragged; nothing is padded here.
pub fn read_table(path: &Path) -> Result<Table, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<Result<_, _>>()?;
    Ok(Table { headers, rows })
}
