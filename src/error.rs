use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("Missing required column(s): {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("No transactions found in {source_name}")]
    NoData { source_name: String },

    #[error("No data source given (use --data or set `data` in the config file)")]
    NoDataSource,

    #[error("No data files match \"{pattern}\"")]
    NoDataFiles { pattern: String },

    #[error("Invalid data pattern \"{pattern}\": {message}")]
    InvalidDataPattern { pattern: String, message: String },

    #[error("Invalid year \"{input}\"")]
    InvalidYear { input: String },

    #[error("Invalid month \"{input}\" (expected 1-12 or a month abbreviation)")]
    InvalidMonth { input: String },

    #[error("Unsupported locale: {input}")]
    UnsupportedLocale { input: String },

    #[error("Export failed: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl AppError {
    pub(crate) fn missing_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AppError::MissingColumns {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}
