//! The fixed query contract for the tariff dataset.
//!
//! Every request runs against one known table with a known column set; the
//! language model is only ever asked to produce a SELECT over these.

pub mod executor;
pub mod guard;

use serde_json::Value;

/// The one table the service answers questions about. The identifier keeps
/// its double quotes: the dataset predates this service and the name
/// contains a space.
pub const TARIFF_TABLE: &str = r#""ARANCELES EC-EEUU""#;

/// Columns the generated SQL may reference.
pub const TARIFF_COLUMNS: [&str; 7] = [
    "ReportingCo",
    "PartnerCountry",
    "Year",
    "Revision",
    "ProductCode",
    "ProductDescription",
    "AVE",
];

/// Column designated for case-insensitive text search (Spanish product
/// descriptions, matched with ILIKE).
pub const TEXT_SEARCH_COLUMN: &str = "ProductDescription";

/// One fetched row: column name to cell value, in column order.
pub type ResultRow = serde_json::Map<String, Value>;

/// Result of a successful query execution.
#[derive(Debug)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
    pub row_count: usize,
    pub execution_time_ms: u64,
}

/// Renders the table contract as the schema text handed to the LLM
/// providers.
pub fn prompt_context() -> String {
    let columns = TARIFF_COLUMNS
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "The table is named {}. Only these columns may be used: {}. \
         The \"{}\" column contains Spanish text; use the ILIKE operator for \
         case-insensitive searches on it.",
        TARIFF_TABLE, columns, TEXT_SEARCH_COLUMN
    )
}
