//! In-memory CSV frames.
//!
//! Every cell is kept as text; empty cells are absent. Typing happens later,
//! either here for relationship ids or in the store for satellite attributes.

use std::{
  collections::{HashMap, HashSet},
  io::Read,
  path::Path,
};

use vault_core::{Value, value::parse_integer};

use crate::{Error, Result};

/// A whole CSV file with a header row.
#[derive(Debug, Clone)]
pub struct Frame {
  name:    String,
  headers: Vec<String>,
  index:   HashMap<String, usize>,
  records: Vec<Vec<Option<String>>>,
}

impl Frame {
  /// Read the CSV file at `path`.
  pub fn read(path: &Path) -> Result<Self> {
    if !path.is_file() {
      return Err(Error::MissingFile(path.to_path_buf()));
    }
    let csv_err = |source| Error::Csv { path: path.to_path_buf(), source };
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    let reader = csv::ReaderBuilder::new()
      .flexible(true)
      .from_path(path)
      .map_err(csv_err)?;
    Self::from_csv(name, reader).map_err(csv_err)
  }

  /// Parse CSV text from any reader; `name` labels errors.
  pub fn from_reader(name: impl Into<String>, reader: impl Read) -> csv::Result<Self> {
    let reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    Self::from_csv(name.into(), reader)
  }

  fn from_csv<R: Read>(name: String, mut reader: csv::Reader<R>) -> csv::Result<Self> {
    let headers: Vec<String> = reader
      .headers()?
      .iter()
      .map(|h| h.trim_start_matches('\u{feff}').trim().to_owned())
      .collect();

    let mut records = Vec::new();
    for record in reader.records() {
      let record = record?;
      records.push(
        record
          .iter()
          .map(|cell| (!cell.trim().is_empty()).then(|| cell.to_owned()))
          .collect(),
      );
    }

    let mut frame = Self { name, headers, index: HashMap::new(), records };
    frame.reindex();
    Ok(frame)
  }

  fn reindex(&mut self) {
    self.index = self
      .headers
      .iter()
      .enumerate()
      .map(|(i, h)| (h.clone(), i))
      .collect();
  }

  pub fn name(&self) -> &str { &self.name }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  pub fn headers(&self) -> &[String] { &self.headers }

  pub fn has_column(&self, name: &str) -> bool { self.index.contains_key(name) }

  /// Fail naming every column in `columns` the header row lacks.
  pub fn require(&self, columns: &[&str]) -> Result<()> {
    let missing: Vec<String> = columns
      .iter()
      .filter(|c| !self.has_column(c))
      .map(|c| (*c).to_owned())
      .collect();
    if missing.is_empty() {
      Ok(())
    } else {
      Err(Error::MissingColumns { file: self.name.clone(), columns: missing })
    }
  }

  /// Rename header `from` to `to` unless `to` is already present.
  pub fn rename_columns(&mut self, renames: &[(&str, &str)]) {
    for (from, to) in renames {
      if self.has_column(to) {
        continue;
      }
      if let Some(&i) = self.index.get(*from) {
        self.headers[i] = (*to).to_owned();
      }
    }
    self.reindex();
  }

  pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
    (0..self.records.len()).map(move |index| Record { frame: self, index })
  }

  /// Every non-empty `Id`, for referential filtering.
  pub fn ids(&self) -> Result<HashSet<i64>> {
    self.require(&["Id"])?;
    let mut ids = HashSet::with_capacity(self.len());
    for record in self.records() {
      if let Some(id) = record.integer("Id")? {
        ids.insert(id);
      }
    }
    Ok(ids)
  }
}

/// One row of a [`Frame`].
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
  frame: &'a Frame,
  index: usize,
}

impl<'a> Record<'a> {
  pub fn get(&self, column: &str) -> Option<&'a str> {
    let col = *self.frame.index.get(column)?;
    self.frame.records[self.index].get(col)?.as_deref()
  }

  /// The cell as a loader value; absent cells are `Null`.
  pub fn value(&self, column: &str) -> Value {
    self.get(column).map_or(Value::Null, Value::from)
  }

  /// Integer cell. Blank is `None`; unparseable text is an error naming the
  /// file, row, and column.
  pub fn integer(&self, column: &str) -> Result<Option<i64>> {
    let Some(cell) = self.get(column) else { return Ok(None) };
    parse_integer(cell).map_err(|source| Error::Value {
      file: self.frame.name.clone(),
      row: self.index,
      column: column.to_owned(),
      source,
    })
  }
}
