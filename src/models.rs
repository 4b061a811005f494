use sea_orm::{DbErr, FromQueryResult, QueryResult};
use serde_json::Value as JsonValue;

/// One result row: columns in select order, each a nullable scalar.
/// Names are labels only, so repeated names keep every column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, JsonValue)>,
}

impl Row {
    pub fn new(columns: Vec<(String, JsonValue)>) -> Self {
        Self { columns }
    }

    #[cfg(test)]
    pub fn get_by_name(&self, name: &str) -> Option<&JsonValue> {
        self.columns.iter().find(|(col, _)| col == name).map(|(_, v)| v)
    }

    pub fn values(&self) -> impl Iterator<Item = &JsonValue> {
        self.columns.iter().map(|(_, v)| v)
    }
}

impl FromQueryResult for Row {
    fn from_query_result(res: &QueryResult, _pre: &str) -> Result<Self, DbErr> {
        let columns = res
            .column_names()
            .into_iter()
            .enumerate()
            .map(|(idx, name)| (name, cell(res, idx)))
            .collect();
        Ok(Self::new(columns))
    }
}

/// Reads the column at `idx` as the first scalar type it decodes to.
/// NULL, and types with no JSON scalar here (decimals, dates), become `Null`.
fn cell(res: &QueryResult, idx: usize) -> JsonValue {
    res.try_get_by_index::<i64>(idx)
        .map(JsonValue::from)
        .or_else(|_| res.try_get_by_index::<u64>(idx).map(JsonValue::from))
        .or_else(|_| res.try_get_by_index::<i32>(idx).map(JsonValue::from))
        .or_else(|_| res.try_get_by_index::<f64>(idx).map(JsonValue::from))
        .or_else(|_| res.try_get_by_index::<String>(idx).map(JsonValue::from))
        .or_else(|_| res.try_get_by_index::<bool>(idx).map(JsonValue::from))
        .unwrap_or(JsonValue::Null)
}

/// Renders a column the way it is printed: strings bare, NULL as empty.
pub fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
