//! Detail page parser
//!
//! A detail page carries its listing data in two places:
//! - an embedded script assigning a JSON object to `window.classified`
//! - one or more `table.classified-table` tables of header/value rows
//!
//! The payload is read first; table values are applied afterwards and win
//! where both provide a field (the table is more precise, e.g. for surfaces).

use crate::crawler::labels::match_label;
use crate::record::{FieldError, FieldPath, FieldValue, Record};
use crate::ExtractionError;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::Value;

/// Identifier the embedded listing payload is assigned to
pub const PAYLOAD_MARKER: &str = "window.classified";

/// Attribute tables of a detail page
pub const TABLE_ROW_SELECTOR: &str = "table.classified-table tr";

/// What a successful extraction found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetailStats {
    /// Fields lifted from the embedded payload
    pub payload_fields: usize,

    /// Table rows whose header matched a known label
    pub matched_rows: usize,

    /// Table rows with an unknown header
    pub unmatched_rows: usize,

    /// Values that could not be stored in their field
    pub rejected_values: usize,
}

// Leaves are kept as raw JSON so that one oddly typed value is rejected on
// its own instead of failing the whole payload.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ClassifiedPayload {
    property: Option<PropertyPayload>,
    transaction: Option<TransactionPayload>,
    price: Option<PricePayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PropertyPayload {
    #[serde(rename = "type")]
    kind: Option<Value>,
    subtype: Option<Value>,
    location: Option<LocationPayload>,
    net_habitable_surface: Option<Value>,
    fireplace_exists: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LocationPayload {
    postal_code: Option<Value>,
    locality: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TransactionPayload {
    #[serde(rename = "type")]
    kind: Option<Value>,
    subtype: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PricePayload {
    main_value: Option<Value>,
}

impl ClassifiedPayload {
    /// Flattens the payload into raw `(path, value)` pairs, skipping nulls
    fn into_updates(self) -> Vec<(FieldPath, Value)> {
        let mut updates = Vec::new();
        let mut lift = |path, value: Option<Value>| {
            if let Some(value) = value.filter(|v| !v.is_null()) {
                updates.push((path, value));
            }
        };

        if let Some(property) = self.property {
            if let Some(location) = property.location {
                lift(FieldPath::ZipCode, location.postal_code);
                lift(FieldPath::Locality, location.locality);
            }
            lift(FieldPath::TypeOfProperty, property.kind);
            lift(FieldPath::SubtypeOfProperty, property.subtype);
            lift(FieldPath::SurfaceLivableSpace, property.net_habitable_surface);
            lift(FieldPath::OpenFire, property.fireplace_exists);
        }

        if let Some(transaction) = self.transaction {
            lift(FieldPath::TypeTransaction, transaction.kind);
            lift(FieldPath::SubtypeTransaction, transaction.subtype);
        }

        lift(FieldPath::Price, self.price.and_then(|p| p.main_value));

        updates
    }
}

/// Converts one raw payload leaf into a field value
///
/// Numbers are rounded to integers. Arrays and objects are rejected.
fn payload_value(path: FieldPath, value: Value) -> Result<FieldValue, FieldError> {
    match value {
        Value::String(text) => Ok(FieldValue::Text(text)),
        Value::Bool(flag) => Ok(FieldValue::Flag(flag)),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|n| n.round() as i64))
            .map(FieldValue::Integer)
            .ok_or_else(|| FieldError {
                path,
                value: number.to_string(),
                reason: "number out of range",
            }),
        other => Err(FieldError {
            path,
            value: other.to_string(),
            reason: "unexpected JSON type",
        }),
    }
}

/// Fills `record` from a detail page
///
/// Fails with [`ExtractionError`] when the page has no usable embedded
/// payload; the record is then left exactly as it was. Table rows with
/// unknown headers are ignored. On success the room count is recomputed.
pub fn extract_detail(html: &str, record: &mut Record) -> Result<DetailStats, ExtractionError> {
    let document = Html::parse_document(html);

    let payload = find_payload(&document, record.url())?;
    let mut stats = DetailStats::default();

    // Structured payload pass
    let mut rejected = Vec::new();
    let mut updates = Vec::new();
    for (path, value) in payload.into_updates() {
        match payload_value(path, value) {
            Ok(value) => updates.push((path, value)),
            Err(error) => rejected.push(error),
        }
    }
    stats.payload_fields = updates.len() + rejected.len();
    rejected.extend(record.apply_fields(updates));
    for error in &rejected {
        tracing::warn!("{}: {}", record.url(), error);
    }
    stats.rejected_values += rejected.len();

    // Table pass
    for (header, value) in table_rows(&document) {
        let Some(path) = match_label(&header) else {
            tracing::trace!("{}: ignoring table row {:?}", record.url(), header);
            stats.unmatched_rows += 1;
            continue;
        };

        stats.matched_rows += 1;
        if let Err(error) = record.apply(path, FieldValue::Text(value)) {
            tracing::warn!("{}: {}", record.url(), error);
            stats.rejected_values += 1;
        }
    }

    record.refresh_room_count();
    Ok(stats)
}

/// Finds and parses the embedded listing payload
fn find_payload(document: &Html, url: &str) -> Result<ClassifiedPayload, ExtractionError> {
    let missing = || ExtractionError::MissingPayload {
        url: url.to_string(),
    };

    let selector = Selector::parse("script").map_err(|_| missing())?;

    let assignment = document
        .select(&selector)
        .map(|script| script.text().collect::<String>())
        .find_map(|text| payload_assignment(&text).map(str::to_string))
        .ok_or_else(missing)?;

    parse_payload_object(&assignment).map_err(|message| ExtractionError::MalformedPayload {
        url: url.to_string(),
        message,
    })
}

/// Returns the text following `PAYLOAD_MARKER =`, if the script has one
fn payload_assignment(script: &str) -> Option<&str> {
    script.match_indices(PAYLOAD_MARKER).find_map(|(start, _)| {
        let rest = &script[start + PAYLOAD_MARKER.len()..];

        // `window.classifiedFoo` is a different identifier
        if rest.starts_with(|c: char| c.is_alphanumeric() || c == '_' || c == '$') {
            return None;
        }

        let rest = rest.trim_start().strip_prefix('=')?;
        if rest.starts_with('=') {
            return None;
        }
        Some(rest.trim_start())
    })
}

/// Parses the object literal at the start of `text`
///
/// Accepts `{...};` and the parenthesized `({...});` form. Anything after the
/// object is ignored.
fn parse_payload_object(text: &str) -> Result<ClassifiedPayload, String> {
    let text = text.strip_prefix('(').map(str::trim_start).unwrap_or(text);
    if !text.starts_with('{') {
        return Err("payload is not an object".to_string());
    }

    serde_json::Deserializer::from_str(text)
        .into_iter::<ClassifiedPayload>()
        .next()
        .ok_or_else(|| "empty payload".to_string())?
        .map_err(|e| e.to_string())
}

/// Header/value pairs of every attribute table, whitespace collapsed
fn table_rows(document: &Html) -> Vec<(String, String)> {
    let (Ok(row_selector), Ok(th), Ok(td)) = (
        Selector::parse(TABLE_ROW_SELECTOR),
        Selector::parse("th"),
        Selector::parse("td"),
    ) else {
        return Vec::new();
    };

    document
        .select(&row_selector)
        .filter_map(|row| {
            let header = cell_text(row.select(&th).next()?);
            let value = cell_text(row.select(&td).next()?);
            Some((header, value))
        })
        .collect()
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
