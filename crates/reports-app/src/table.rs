// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

pub const MISSING_CELL: &str = "-";
pub const TABLE_UNAVAILABLE_TITLE: &str = "Table data not available";
pub const TABLE_UNAVAILABLE_DETAIL: &str =
    "The AI provided a text response instead of structured table data";

/// One row of a parsed table, keyed by header.
pub type Row = BTreeMap<String, String>;

/// Structured payload attached to a table response.
///
/// The wire format has no explicit tag: which of the three shapes applies is
/// decided by [`classify`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TableData {
    #[serde(default, deserialize_with = "truthy")]
    pub error: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parsed_tables: Vec<Table>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub raw_content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Table {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: Vec<String>,
    #[serde(default, deserialize_with = "rows")]
    pub rows: Vec<Row>,
}

impl Table {
    pub fn label(&self) -> String {
        self.kind.to_uppercase()
    }

    /// Cell text for `header`, or the placeholder when the row has no value.
    pub fn cell<'a>(row: &'a Row, header: &str) -> &'a str {
        row.get(header)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
            .unwrap_or(MISSING_CELL)
    }

    /// Cells of `row` in header order.
    pub fn row_cells<'a>(&'a self, row: &'a Row) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .map(move |header| Self::cell(row, header))
    }

    pub fn summary(&self) -> String {
        format!(
            "{} • {}",
            plural(self.rows.len(), "row"),
            plural(self.headers.len(), "column")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPlan<'a> {
    ErrorNotice,
    ParsedTables(&'a [Table]),
    RawBlock(Option<&'a str>),
}

/// Resolves a payload to exactly one render plan.
///
/// The checks are ordered: an error flag wins over any tables that came with
/// it, and raw content is only shown when there are no parsed tables.
pub fn classify(data: &TableData) -> RenderPlan<'_> {
    if data.error {
        return RenderPlan::ErrorNotice;
    }
    if !data.parsed_tables.is_empty() {
        return RenderPlan::ParsedTables(&data.parsed_tables);
    }
    RenderPlan::RawBlock(data.raw_content.as_deref())
}

impl TableData {
    pub fn plan(&self) -> RenderPlan<'_> {
        classify(self)
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number
            .as_f64()
            .is_some_and(|float| float != 0.0 && !float.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_text(value))
}

fn rows<'de, D>(deserializer: D) -> Result<Vec<Row>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|row| match row {
            Value::Object(fields) => fields
                .into_iter()
                .filter_map(|(header, cell)| value_text(cell).map(|text| (header, text)))
                .collect(),
            _ => Row::new(),
        })
        .collect())
}
