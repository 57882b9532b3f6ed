//! Codec and container errors.

use thiserror::Error;

pub type TabularResult<T> = Result<T, TabularError>;

#[derive(Debug, Error)]
pub enum TabularError {
    /// A data row could not be turned into a record (e.g. missing section name).
    /// `row` is the 0-based sheet row.
    #[error("row {row}: {reason}")]
    RowParse { row: usize, reason: String },

    /// The bytes are not a readable workbook (bad signature, truncated records, ...).
    #[error("invalid workbook: {0}")]
    ContainerFormat(String),

    /// The grid does not fit the container (too many rows/columns, string too long).
    #[error("workbook limit exceeded: {0}")]
    Limit(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TabularError {
    pub fn container(msg: impl Into<String>) -> Self {
        Self::ContainerFormat(msg.into())
    }
}
