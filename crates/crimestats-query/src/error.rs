use crimestats_table::TableError;

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("filter references unknown column {table}[{column}]")]
    InvalidFilterColumn { table: String, column: String },

    #[error("aggregation references unknown column {table}[{column}]")]
    InvalidAggregationColumn { table: String, column: String },

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("aggregation needs at least one group-by column")]
    EmptyGrouping,

    #[error(transparent)]
    Table(#[from] TableError),
}
