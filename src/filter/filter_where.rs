use serde_json::Value;

use super::types::{FilterOp, FilterWhereInfo};
use super::error::FilterError;

/// Parses `{ field: value }` / `{ field: { "$op": value } }` conditions and renders
/// them as `column=op.value` query parameters.
pub struct FilterWhere {
    conditions: Vec<FilterWhereInfo>,
}

impl FilterWhere {
    pub fn parse(where_data: &Value) -> Result<Vec<FilterWhereInfo>, FilterError> {
        let mut filter_where = Self { conditions: vec![] };
        filter_where.parse_where_data(where_data)?;
        Ok(filter_where.conditions)
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn parse_where_data(&mut self, where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null => Ok(()),
            Value::Object(obj) => {
                for (key, value) in obj {
                    if key.starts_with('$') {
                        return Err(FilterError::UnsupportedOperator(key.clone()));
                    }
                    super::filter::Filter::validate_identifier(key)?;
                    self.parse_field_condition(key, value)?;
                }
                Ok(())
            }
            _ => Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<(), FilterError> {
        if let Value::Object(obj) = value {
            for (op_key, op_val) in obj {
                let operator = Self::map_operator(op_key)?;
                if operator == FilterOp::In && !op_val.is_array() {
                    return Err(FilterError::InvalidOperatorData("$in requires array".to_string()));
                }
                self.conditions.push(FilterWhereInfo { column: field.to_string(), operator, data: op_val.clone() });
            }
        } else {
            // Implicit equality: { field: value }
            self.conditions.push(FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() });
        }
        Ok(())
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Neq,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    /// Render one condition as a `(column, "op.value")` query pair
    pub fn to_query_pair(condition: &FilterWhereInfo) -> (String, String) {
        let rendered = match (condition.operator, &condition.data) {
            (FilterOp::Eq, Value::Null) => "is.null".to_string(),
            (FilterOp::Neq, Value::Null) => "not.is.null".to_string(),
            (FilterOp::In, Value::Array(values)) => {
                let items: Vec<String> = values.iter().map(Self::render_list_item).collect();
                format!("in.({})", items.join(","))
            }
            (op, data) => format!("{}.{}", op.keyword(), Self::render_scalar(data)),
        };
        (condition.column.clone(), rendered)
    }

    fn render_scalar(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => "null".to_string(),
            other => other.to_string(),
        }
    }

    fn render_list_item(value: &Value) -> String {
        let raw = Self::render_scalar(value);
        // Reserved characters inside in.(...) lists must be double-quoted
        if raw.contains([',', '(', ')', '"']) {
            format!("\"{}\"", raw.replace('"', "\\\""))
        } else {
            raw
        }
    }
}
