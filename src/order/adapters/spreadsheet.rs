//! CSV bulk-import reader with header alias resolution.

use std::collections::HashMap;
use std::io::Read;

use thiserror::Error;
use tracing::warn;

use crate::order::domain::{OrderSource, SourceRecord};

/// Canonical columns a spreadsheet may supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    ExternalId,
    CustomerName,
    Phone,
    Address,
    PostalCode,
    ProductName,
    Price,
    Quantity,
    Channel,
    Kind,
    OrderedAt,
}

const ALIASES: &[(Column, &[&str])] = &[
    (
        Column::ExternalId,
        &["order id", "order number", "order no", "order", "id", "cart id"],
    ),
    (Column::CustomerName, &["customer", "customer name", "name"]),
    (
        Column::Phone,
        &["phone", "mobile", "contact", "phone number", "mobile number"],
    ),
    (Column::Address, &["address", "shipping address"]),
    (
        Column::PostalCode,
        &["pincode", "pin code", "pin", "zip", "zip code", "postal code"],
    ),
    (Column::ProductName, &["product", "product name", "item"]),
    (Column::Price, &["price", "amount", "total", "total price"]),
    (Column::Quantity, &["qty", "quantity"]),
    (Column::Channel, &["store", "source", "channel", "store name"]),
    (Column::Kind, &["type", "order type"]),
    (
        Column::OrderedAt,
        &["order date", "date", "created at", "created"],
    ),
];

/// Failures that make a whole file unreadable.
#[derive(Debug, Error)]
pub enum SpreadsheetError {
    /// The header row could not be read.
    #[error("could not read spreadsheet: {0}")]
    Csv(#[from] csv::Error),

    /// No header matched a required column.
    #[error("spreadsheet has no {0} column")]
    MissingColumn(&'static str),
}

/// Rows read from one spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpreadsheetImport {
    /// Rows mapped onto source records, in file order.
    pub records: Vec<SourceRecord>,
    /// Rows the reader could not parse.
    pub unreadable: usize,
}

/// Reads a CSV payload into source records.
///
/// Headers are matched case-insensitively against known aliases, ignoring
/// underscores, hyphens, and repeated spaces. Unknown columns are ignored.
/// Malformed rows are counted in [`SpreadsheetImport::unreadable`] rather
/// than failing the file.
///
/// # Errors
///
/// Returns [`SpreadsheetError`] when the header row is unreadable or no
/// order identifier column is present.
pub fn read_spreadsheet(input: impl Read) -> Result<SpreadsheetImport, SpreadsheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    let columns = resolve_columns(reader.headers()?);
    if !columns.contains_key(&Column::ExternalId) {
        return Err(SpreadsheetError::MissingColumn("order id"));
    }

    let mut import = SpreadsheetImport::default();
    for (line, row) in reader.records().enumerate() {
        match row {
            Ok(record) => import.records.push(to_source_record(&columns, &record)),
            Err(err) => {
                warn!(row = line.saturating_add(1), error = %err, "skipping unreadable row");
                import.unreadable = import.unreadable.saturating_add(1);
            }
        }
    }
    Ok(import)
}

fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Maps each canonical column to the first header index that names it.
fn resolve_columns(headers: &csv::StringRecord) -> HashMap<Column, usize> {
    let mut columns = HashMap::new();
    for (index, header) in headers.iter().enumerate() {
        let normalized = normalize_header(header);
        let matched = ALIASES
            .iter()
            .find(|(_, aliases)| aliases.contains(&normalized.as_str()))
            .map(|(column, _)| *column);
        if let Some(column) = matched {
            columns.entry(column).or_insert(index);
        }
    }
    columns
}

fn to_source_record(columns: &HashMap<Column, usize>, row: &csv::StringRecord) -> SourceRecord {
    let field = |column: Column| -> String {
        columns
            .get(&column)
            .and_then(|index| row.get(*index))
            .unwrap_or_default()
            .to_owned()
    };
    let channel = field(Column::Channel);
    SourceRecord {
        external_id: field(Column::ExternalId),
        source: OrderSource::try_from(field(Column::Kind).as_str()).ok(),
        channel: (!channel.is_empty()).then_some(channel),
        customer_name: field(Column::CustomerName),
        phone: field(Column::Phone),
        address: field(Column::Address),
        postal_code: field(Column::PostalCode),
        product_name: field(Column::ProductName),
        price: field(Column::Price),
        quantity: field(Column::Quantity),
        ordered_at: field(Column::OrderedAt),
    }
}
