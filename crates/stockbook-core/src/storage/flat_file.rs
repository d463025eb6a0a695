//! Flat-file storage backend.
//!
//! Each source is a comma-separated text file whose first line names the
//! columns. The whole directory is parsed into an in-memory cache when the
//! store is opened, and the cache for a source is rebuilt from disk after
//! every write to it.
//!
//! New rows are appended in place. Updates and deletes stream the items file
//! into a sibling temp file and rename it over the original, so a reader of
//! the items file sees either the old contents or the new, never a mix.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::fs::{create_temp, rename_into_place, temp_path_for};
use crate::record::{Field, Record, Value};

use super::ensure_updatable;
use super::traits::{Source, Store};
use super::transaction::{self, TransactionKind};

/// Largest id a five digit identifier can hold.
const MAX_ID: u32 = 99_999;

/// Reject values that would split a row or a line; there is no escaping.
fn ensure_single_cell(value: &str) -> Result<()> {
    if value.contains([',', '\n', '\r']) {
        return Err(StoreError::InvalidInput(format!(
            "Value {:?} contains a comma or line break",
            value
        )));
    }
    Ok(())
}

/// Parsed contents of one source file.
#[derive(Debug, Clone)]
struct CachedSource {
    headers: Vec<Field>,
    records: Vec<Record>,
}

/// Change applied to the matching row during a rewrite.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RowEdit<'a> {
    Delete,
    Update { field: Field, value: &'a str },
}

/// A fully written and synced replacement of a source file, not yet renamed
/// into place.
///
/// Dropping it without calling [`StagedRewrite::commit`] removes the temp
/// file and leaves the source untouched.
#[derive(Debug)]
pub(crate) struct StagedRewrite {
    temp_path: PathBuf,
    target: PathBuf,
    captured: Option<Record>,
    committed: bool,
}

impl StagedRewrite {
    /// Whether a row matched the requested id.
    pub(crate) fn matched(&self) -> bool {
        self.captured.is_some()
    }

    #[cfg(test)]
    pub(crate) fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Rename the temp file over the source and hand back the captured row.
    pub(crate) fn commit(mut self) -> Result<Option<Record>> {
        rename_into_place(&self.temp_path, &self.target)?;
        self.committed = true;
        Ok(self.captured.take())
    }
}

impl Drop for StagedRewrite {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

/// Store backed by `items.txt` and `transactions.txt` in one directory.
#[derive(Debug)]
pub struct FlatFileStore {
    directory: PathBuf,
    cache: HashMap<Source, CachedSource>,
}

impl FlatFileStore {
    /// Create the source files with their header rows if missing, then open.
    ///
    /// Existing files are left as they are.
    pub fn create(directory: &Path) -> Result<Self> {
        fs::create_dir_all(directory).map_err(|e| {
            StoreError::Persistence(format!(
                "Failed to create data directory {}: {}",
                directory.display(),
                e
            ))
        })?;

        for source in Source::ALL {
            let path = Self::source_path(directory, source);
            if path.exists() {
                continue;
            }
            let header = source
                .schema()
                .iter()
                .map(|field| field.name())
                .collect::<Vec<_>>()
                .join(",");
            crate::fs::write_atomic(&path, format!("{}\n", header).as_bytes())?;
            info!(source = %source, path = %path.display(), "created source file");
        }

        Self::open(directory)
    }

    /// Open an existing store, parsing every source file into the cache.
    ///
    /// # Errors
    ///
    /// - `Persistence` if a source file is missing or unreadable
    /// - `UnknownField` if a header names an unknown column
    /// - `MalformedValue` if any row fails to parse
    pub fn open(directory: &Path) -> Result<Self> {
        let mut store = Self {
            directory: directory.to_path_buf(),
            cache: HashMap::new(),
        };
        for source in Source::ALL {
            store.reload(source)?;
        }
        Ok(store)
    }

    fn source_path(directory: &Path, source: Source) -> PathBuf {
        directory.join(format!("{}.txt", source.name()))
    }

    /// Path of the file backing `source`.
    pub fn path(&self, source: Source) -> PathBuf {
        Self::source_path(&self.directory, source)
    }

    fn load(path: &Path) -> Result<CachedSource> {
        let file = File::open(path).map_err(|e| {
            StoreError::Persistence(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let mut lines = BufReader::new(file).lines();

        let header_line = lines.next().transpose()?.ok_or_else(|| {
            StoreError::Persistence(format!("Missing header row in {}", path.display()))
        })?;
        let headers = Field::parse_headers(&header_line.split(',').collect::<Vec<_>>())?;

        let mut records = Vec::new();
        for (index, line) in lines.enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let record = Record::parse_line(&line, &headers).inspect_err(|err| {
                warn!(path = %path.display(), line = index + 2, error = %err, "unparseable row");
            })?;
            records.push(record);
        }

        Ok(CachedSource { headers, records })
    }

    /// Rebuild the cache for `source` from disk.
    fn reload(&mut self, source: Source) -> Result<()> {
        let path = self.path(source);
        let loaded = Self::load(&path)?;
        debug!(source = %source, records = loaded.records.len(), "reloaded cache");
        self.cache.insert(source, loaded);
        Ok(())
    }

    fn cached(&self, source: Source) -> Result<&CachedSource> {
        self.cache
            .get(&source)
            .ok_or_else(|| StoreError::Persistence(format!("Source not loaded: {}", source)))
    }

    /// Render `record` with one value per header column.
    fn header_complete_line(record: &Record, headers: &[Field]) -> Result<String> {
        let values = headers
            .iter()
            .map(|field| {
                record.get(*field).map(|value| value.to_string()).ok_or_else(|| {
                    StoreError::InvalidInput(format!("Missing value for {}", field))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(values.join(","))
    }

    /// Append one line to the end of `path`, newline-terminated.
    fn append_line(path: &Path, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                StoreError::Persistence(format!("Failed to open {}: {}", path.display(), e))
            })?;

        // Files written by other tools may lack a trailing newline.
        let mut prefix = "";
        if file.metadata()?.len() > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                prefix = "\n";
            }
        }

        file.write_all(format!("{}{}\n", prefix, line).as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| {
                StoreError::Persistence(format!("Append to {} failed: {}", path.display(), e))
            })
    }

    /// Append `record` to `source` and reload its cache.
    ///
    /// On failure the cache keeps its last loaded state.
    fn append(&mut self, source: Source, record: &Record) -> Result<()> {
        let line = Self::header_complete_line(record, &self.cached(source)?.headers)?;
        Self::append_line(&self.path(source), &line)?;
        self.reload(source)
    }

    fn record_transaction(&mut self, item: &Record, kind: TransactionKind) -> Result<()> {
        let txn = transaction::derive(item, kind, transaction::today())?;
        self.append(Source::Transactions, &txn)?;
        info!(id = item.id().unwrap_or_default(), kind = %kind, "recorded transaction");
        Ok(())
    }

    /// Stream the items file into a temp file, applying `edit` to the row
    /// whose id equals `id`.
    pub(crate) fn stage_rewrite(&self, id: &str, edit: RowEdit<'_>) -> Result<StagedRewrite> {
        let headers = &self.cached(Source::Items)?.headers;
        let id_column = headers
            .iter()
            .position(|field| *field == Field::Id)
            .ok_or_else(|| StoreError::InvalidInput("items has no id column".to_string()))?;
        let edit_column = match edit {
            RowEdit::Delete => None,
            RowEdit::Update { field, .. } => Some(
                headers
                    .iter()
                    .position(|column| *column == field)
                    .ok_or_else(|| {
                        StoreError::InvalidInput(format!("{} is not a column of items", field))
                    })?,
            ),
        };

        let target = self.path(Source::Items);
        let reader = BufReader::new(File::open(&target).map_err(|e| {
            StoreError::Persistence(format!("Failed to open {}: {}", target.display(), e))
        })?);
        let temp_path = temp_path_for(&target)?;
        let file = create_temp(&temp_path)?;
        let mut staged = StagedRewrite {
            temp_path,
            target,
            captured: None,
            committed: false,
        };
        let mut writer = BufWriter::new(file);

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let columns: Vec<&str> = line.split(',').collect();
            let is_target =
                index > 0 && !staged.matched() && columns.get(id_column) == Some(&id);
            if !is_target {
                writeln!(writer, "{}", line)?;
                continue;
            }

            match (edit, edit_column) {
                (RowEdit::Update { field, value }, Some(column)) => {
                    let mut columns = columns;
                    if column >= columns.len() {
                        columns.resize(column + 1, "");
                    }
                    columns[column] = value;
                    let mut updated = Record::from_row(&columns, headers)?;
                    if field.affects_total() {
                        updated = updated.with_recomputed_total();
                    }
                    writeln!(writer, "{}", Self::header_complete_line(&updated, headers)?)?;
                    staged.captured = Some(updated);
                }
                _ => {
                    staged.captured = Some(Record::from_row(&columns, headers)?);
                }
            }
        }

        let file = writer
            .into_inner()
            .map_err(|e| StoreError::Persistence(format!("Temp file write failed: {}", e)))?;
        file.sync_all()
            .map_err(|e| StoreError::Persistence(format!("Temp file sync failed: {}", e)))?;

        Ok(staged)
    }

    /// Stage, commit and reload; returns the captured row.
    fn rewrite_items(&mut self, id: &str, edit: RowEdit<'_>) -> Result<Record> {
        if id.is_empty() {
            return Err(StoreError::InvalidInput("Item id is empty".to_string()));
        }

        let staged = self.stage_rewrite(id, edit)?;
        if !staged.matched() {
            warn!(id, "no item matched; items file left unchanged");
            return Err(StoreError::NotFound(id.to_string()));
        }

        let captured = staged
            .commit()?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.reload(Source::Items)?;
        Ok(captured)
    }
}

impl Store for FlatFileStore {
    fn add_record(
        &mut self,
        values: &[String],
        source: Source,
        kind: TransactionKind,
    ) -> Result<bool> {
        if values.is_empty() {
            return Ok(false);
        }
        for value in values {
            ensure_single_cell(value)?;
        }

        match source {
            Source::Items => {
                let id = self.generate_id()?;
                let mut row = Vec::with_capacity(values.len() + 1);
                row.push(id);
                row.extend(values.iter().cloned());
                let record = Record::from_row(&row, &self.cached(Source::Items)?.headers)?;

                self.append(Source::Items, &record)?;
                info!(id = record.id().unwrap_or_default(), "added item");
                self.record_transaction(&record, kind)?;
            }
            Source::Transactions => {
                let record = Record::from_row(values, &self.cached(source)?.headers)?;
                self.append(source, &record)?;
            }
        }
        Ok(true)
    }

    fn update_record(&mut self, id: &str, field: Field, value: &str) -> Result<()> {
        ensure_updatable(field)?;
        ensure_single_cell(value)?;
        Value::parse(field, value)?;

        let updated = self.rewrite_items(id, RowEdit::Update { field, value })?;
        info!(id, field = %field, "updated item");
        self.record_transaction(&updated, TransactionKind::Updated)
    }

    fn delete_record(&mut self, id: &str) -> Result<()> {
        let deleted = self.rewrite_items(id, RowEdit::Delete)?;
        info!(id, "deleted item");
        self.record_transaction(&deleted, TransactionKind::Deleted)
    }

    fn read_all(&self, source: Source) -> Result<Vec<Record>> {
        Ok(self.cached(source)?.records.clone())
    }

    fn search(&self, source: Source, field: Field, needle: &str) -> Result<Vec<Record>> {
        let needle = needle.to_lowercase();
        Ok(self
            .cached(source)?
            .records
            .iter()
            .filter(|record| {
                record
                    .get(field)
                    .is_some_and(|value| value.to_string().to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    /// Successor of the last item's id; ids are never reclaimed.
    fn generate_id(&self) -> Result<String> {
        let last = match self.cached(Source::Items)?.records.last() {
            Some(record) => record.id().unwrap_or_default(),
            None => return Ok(format!("{:05}", 1)),
        };
        let current: u32 = last.parse().map_err(|_| StoreError::MalformedValue {
            field: Field::Id,
            value: last.to_string(),
        })?;
        let next = current
            .checked_add(1)
            .filter(|next| *next <= MAX_ID)
            .ok_or(StoreError::IdExhausted)?;
        Ok(format!("{:05}", next))
    }
}
