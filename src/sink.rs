//! Output files. One `TableSink` per table fans each batch out to every
//! configured format.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::config::{OutputFormat, StatusFormat};
use crate::table::Tabular;

pub trait BatchWriter: Send {
    fn write(&mut self, batch: &RecordBatch) -> anyhow::Result<()>;

    /// Flushes and closes the file. Must be called for the file to be complete.
    fn finish(self: Box<Self>) -> anyhow::Result<()>;
}

/// Comma separated with a header row; dictionary columns are written as their values.
pub struct CsvBatchWriter {
    path: PathBuf,
    writer: arrow::csv::Writer<BufWriter<File>>,
}

impl CsvBatchWriter {
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed creating {}", path.display()))?;
        let writer = arrow::csv::WriterBuilder::new()
            .with_header(true)
            .build(BufWriter::new(file));
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }
}

impl BatchWriter for CsvBatchWriter {
    fn write(&mut self, batch: &RecordBatch) -> anyhow::Result<()> {
        let flat = flatten_dictionaries(batch)?;
        self.writer
            .write(&flat)
            .with_context(|| format!("Failed writing {}", self.path.display()))
    }

    fn finish(self: Box<Self>) -> anyhow::Result<()> {
        let mut inner = self.writer.into_inner();
        inner
            .flush()
            .with_context(|| format!("Failed flushing {}", self.path.display()))
    }
}

/// Replaces every dictionary column by a plain column of its value type.
fn flatten_dictionaries(batch: &RecordBatch) -> anyhow::Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut columns = Vec::with_capacity(batch.num_columns());

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        match field.data_type() {
            DataType::Dictionary(_, value_type) => {
                columns.push(cast(column, value_type)?);
                fields.push(Field::new(
                    field.name(),
                    value_type.as_ref().clone(),
                    field.is_nullable(),
                ));
            }
            _ => {
                columns.push(column.clone());
                fields.push(field.as_ref().clone());
            }
        }
    }
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

pub struct ParquetBatchWriter {
    path: PathBuf,
    writer: ArrowWriter<File>,
}

impl ParquetBatchWriter {
    pub fn create(path: &Path, batch_schema: arrow::datatypes::SchemaRef) -> anyhow::Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed creating {}", path.display()))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let writer = ArrowWriter::try_new(file, batch_schema, Some(props))
            .with_context(|| format!("Failed opening parquet writer for {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }
}

impl BatchWriter for ParquetBatchWriter {
    fn write(&mut self, batch: &RecordBatch) -> anyhow::Result<()> {
        self.writer
            .write(batch)
            .with_context(|| format!("Failed writing {}", self.path.display()))
    }

    fn finish(self: Box<Self>) -> anyhow::Result<()> {
        let path = self.path;
        self.writer
            .close()
            .with_context(|| format!("Failed closing {}", path.display()))?;
        Ok(())
    }
}

pub fn table_path(output_dir: &Path, table: &str, format: OutputFormat) -> PathBuf {
    output_dir.join(format!("synthetic_{table}.{}", format.extension()))
}

/// What a finished table left on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenTable {
    pub name: &'static str,
    pub rows: usize,
    pub paths: Vec<PathBuf>,
}

pub struct TableSink<T: Tabular> {
    status: StatusFormat,
    writers: Vec<Box<dyn BatchWriter>>,
    paths: Vec<PathBuf>,
    rows: usize,
    _rows: PhantomData<fn(&[T])>,
}

impl<T: Tabular> TableSink<T> {
    pub fn create(
        output_dir: &Path,
        formats: &[OutputFormat],
        status: StatusFormat,
    ) -> anyhow::Result<Self> {
        let mut writers: Vec<Box<dyn BatchWriter>> = Vec::with_capacity(formats.len());
        let mut paths = Vec::with_capacity(formats.len());
        for &format in formats {
            let path = table_path(output_dir, T::TABLE, format);
            let writer: Box<dyn BatchWriter> = match format {
                OutputFormat::Csv => Box::new(CsvBatchWriter::create(&path)?),
                OutputFormat::Parquet => {
                    Box::new(ParquetBatchWriter::create(&path, T::schema(status))?)
                }
            };
            writers.push(writer);
            paths.push(path);
        }
        Ok(Self {
            status,
            writers,
            paths,
            rows: 0,
            _rows: PhantomData,
        })
    }

    pub fn append(&mut self, rows: &[T]) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let batch = T::to_batch(rows, self.status)?;
        for writer in &mut self.writers {
            writer.write(&batch)?;
        }
        self.rows += rows.len();
        Ok(())
    }

    pub fn finish(self) -> anyhow::Result<WrittenTable> {
        for writer in self.writers {
            writer.finish()?;
        }
        Ok(WrittenTable {
            name: T::TABLE,
            rows: self.rows,
            paths: self.paths,
        })
    }
}

/// Writes a table held fully in memory, `chunk_size` rows per batch.
pub fn write_table<T: Tabular>(
    rows: &[T],
    output_dir: &Path,
    formats: &[OutputFormat],
    status: StatusFormat,
    chunk_size: usize,
) -> anyhow::Result<WrittenTable> {
    let mut sink = TableSink::<T>::create(output_dir, formats, status)?;
    for chunk in rows.chunks(chunk_size.max(1)) {
        sink.append(chunk)?;
    }
    sink.finish()
}
