use thiserror::Error;

#[derive(Error, Debug)]
pub enum OccupancyError {
    #[error("No source files given")]
    NoSources,

    #[error("None of the {0} source files could be loaded")]
    AllSourcesFailed(usize),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Unsupported source file: {0}")]
    UnsupportedSource(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Run file error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(feature = "python")]
impl From<OccupancyError> for pyo3::PyErr {
    fn from(err: OccupancyError) -> pyo3::PyErr {
        pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
    }
}
