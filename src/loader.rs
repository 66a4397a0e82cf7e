use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::column::{ColumnKind, ColumnModel, validate_columns};
use crate::domain::{LeadTableError, ViewerConfig};
use crate::record::{Row, RowId, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
    file_type: FileType,
}

/// Rows and column models read from a file, ready for the pipeline.
#[derive(Debug)]
pub struct LoadedTable {
    pub name: String,
    pub columns: Vec<ColumnModel>,
    pub rows: Vec<Row>,
}

struct LoadedColumn {
    name: String,
    kind: ColumnKind,
    values: Vec<Value>,
}

pub fn load(config: &ViewerConfig) -> Result<LoadedTable, LeadTableError> {
    let file_info = get_file_info(config.path.clone())?;
    let frame = match file_info.file_type {
        FileType::CSV => load_csv(&file_info.path)?,
        FileType::PARQUET => load_parquet(&file_info.path)?,
        FileType::ARROW => load_arrow(&file_info.path)?,
    };

    // Every column is converted on its own rayon worker
    let start_time = Instant::now();
    let df = frame.collect()?;
    let loaded: Result<Vec<LoadedColumn>, PolarsError> = df
        .get_column_names()
        .par_iter()
        .map(|name| load_column(&df, name, &config.followup_columns))
        .collect();
    let loaded = loaded?;
    info!(
        "Loading {} ({} bytes) took {}ms ...",
        file_info.path.display(),
        file_info.file_size,
        start_time.elapsed().as_millis()
    );

    let columns: Vec<ColumnModel> = loaded
        .iter()
        .map(|c| {
            debug!("Column \"{}\" as {:?}", c.name, c.kind);
            ColumnModel::new(c.name.clone(), c.name.clone()).kind(c.kind)
        })
        .collect();
    validate_columns(&columns)?;

    let rows = build_rows(loaded, df.height(), &config.id_column);
    let name = file_info
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string();

    Ok(LoadedTable {
        name,
        columns,
        rows,
    })
}

fn build_rows(loaded: Vec<LoadedColumn>, height: usize, id_column: &str) -> Vec<Row> {
    let ids: Vec<Option<RowId>> = match loaded.iter().find(|c| c.name == id_column) {
        Some(column) => column.values.iter().map(row_id).collect(),
        None => {
            info!("No \"{id_column}\" column, using row numbers as ids");
            (1..=height as i64).map(|n| Some(RowId::Number(n))).collect()
        }
    };

    let mut rows: Vec<Row> = ids
        .into_iter()
        .map(|id| match id {
            Some(id) => Row::new(id),
            None => Row::without_id(),
        })
        .collect();

    for column in loaded {
        for (row, value) in rows.iter_mut().zip(column.values) {
            row.set(column.name.clone(), value);
        }
    }
    rows
}

fn row_id(value: &Value) -> Option<RowId> {
    match value {
        Value::Null => None,
        Value::Number(n) if n.fract() == 0.0 => Some(RowId::Number(*n as i64)),
        Value::Text(s) if s.trim().is_empty() => None,
        Value::Text(s) => Some(
            s.trim()
                .parse::<i64>()
                .map(RowId::Number)
                .unwrap_or_else(|_| RowId::Text(s.clone())),
        ),
        other => Some(RowId::Text(other.as_text())),
    }
}

fn load_column(
    df: &DataFrame,
    col_name: &str,
    followup_columns: &[String],
) -> Result<LoadedColumn, PolarsError> {
    let original_dtype = df.column(col_name)?.dtype().clone();
    let kind = column_kind(col_name, &original_dtype, followup_columns);

    let col = df.column(col_name)?.cast(&DataType::String)?;
    let series = col.str()?;
    let mut values = Vec::with_capacity(series.len());

    for value in series.into_iter() {
        let value = match value {
            None => Value::Null,
            Some(s) if original_dtype == DataType::Boolean => Value::Bool(s == "true"),
            Some(s) if is_numeric_type(&original_dtype) => {
                s.parse::<f64>().map(Value::Number).unwrap_or(Value::Null)
            }
            Some(s) => Value::Text(s.replace("\r\n", " ↵ ").replace('\n', " ↵ ")),
        };
        values.push(value);
    }

    Ok(LoadedColumn {
        name: col_name.to_string(),
        kind,
        values,
    })
}

fn column_kind(name: &str, dtype: &DataType, followup_columns: &[String]) -> ColumnKind {
    if followup_columns.iter().any(|f| f.eq_ignore_ascii_case(name))
        || matches!(dtype, DataType::Date | DataType::Datetime(_, _))
    {
        ColumnKind::FollowUp
    } else if is_numeric_type(dtype) {
        ColumnKind::Number
    } else {
        ColumnKind::Text
    }
}

fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn detect_file_type(path: &Path) -> Result<FileType, LeadTableError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::CSV),
        Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
        _ => Err(LeadTableError::UnknownFileType),
    }
}

pub fn get_file_info(path: PathBuf) -> Result<FileInfo, LeadTableError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LeadTableError::FileNotFound,
        ErrorKind::PermissionDenied => LeadTableError::PermissionDenied,
        _ => LeadTableError::Io(e),
    })?;
    if !metadata.is_file() {
        return Err(LeadTableError::LoadingFailed("Not a file!".into()));
    }

    let file_type = detect_file_type(&path)?;

    Ok(FileInfo {
        path,
        file_size: metadata.len(),
        file_type,
    })
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_types_by_extension() {
        assert_eq!(detect_file_type(Path::new("a/leads.csv")).unwrap(), FileType::CSV);
        assert_eq!(detect_file_type(Path::new("leads.PQ")).unwrap(), FileType::PARQUET);
        assert_eq!(detect_file_type(Path::new("leads.feather")).unwrap(), FileType::ARROW);
        assert!(matches!(
            detect_file_type(Path::new("leads.xlsx")),
            Err(LeadTableError::UnknownFileType)
        ));
        assert!(detect_file_type(Path::new("leads")).is_err());
    }

    #[test]
    fn missing_file() {
        let err = get_file_info(PathBuf::from("does/not/exist.csv")).unwrap_err();
        assert!(matches!(err, LeadTableError::FileNotFound));
    }

    #[test]
    fn directories_are_rejected() {
        let err = get_file_info(PathBuf::from(env!("CARGO_MANIFEST_DIR"))).unwrap_err();
        assert!(matches!(err, LeadTableError::LoadingFailed(_)));
    }

    #[test]
    fn ids_from_values() {
        assert_eq!(row_id(&Value::Number(12.0)), Some(RowId::Number(12)));
        assert_eq!(row_id(&Value::from(" 7 ")), Some(RowId::Number(7)));
        assert_eq!(row_id(&Value::from("L-7")), Some(RowId::Text("L-7".into())));
        assert_eq!(row_id(&Value::from("")), None);
        assert_eq!(row_id(&Value::Null), None);
    }

    #[test]
    fn kinds_from_dtype_and_name() {
        let followups = vec!["follow_up".to_string()];
        assert_eq!(column_kind("Follow_Up", &DataType::String, &followups), ColumnKind::FollowUp);
        assert_eq!(column_kind("created", &DataType::Date, &followups), ColumnKind::FollowUp);
        assert_eq!(column_kind("score", &DataType::Float64, &followups), ColumnKind::Number);
        assert_eq!(column_kind("city", &DataType::String, &followups), ColumnKind::Text);
    }

    #[test]
    fn rows_without_id_column_are_numbered() {
        let loaded = vec![LoadedColumn {
            name: "name".into(),
            kind: ColumnKind::Text,
            values: vec![Value::from("a"), Value::from("b")],
        }];
        let rows = build_rows(loaded, 2, "id");
        assert_eq!(rows[1].id, Some(RowId::Number(2)));
        assert_eq!(rows[1].get("name"), Some(&Value::from("b")));
    }
}
