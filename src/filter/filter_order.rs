use serde_json::Value;

use super::types::{FilterOrderInfo, SortDirection};
use super::error::FilterError;

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        match order {
            Value::String(s) => Self::parse_order_string(s),
            Value::Array(arr) => {
                // Expect array of strings like ["display_order asc", "created_at desc"]
                let mut out = Vec::new();
                for v in arr {
                    match v {
                        Value::String(s) => out.extend(Self::parse_order_string(s)?),
                        other => {
                            return Err(FilterError::InvalidOperatorData(format!(
                                "order entries must be strings, got {}",
                                other
                            )))
                        }
                    }
                }
                Ok(out)
            }
            Value::Object(obj) => {
                // { "display_order": "asc", "created_at": "desc" }
                let mut out = Vec::new();
                for (k, v) in obj {
                    Self::validate_column(k)?;
                    let sort = Self::parse_direction(v.as_str().unwrap_or("asc"))?;
                    out.push(FilterOrderInfo { column: k.clone(), sort });
                }
                Ok(out)
            }
            Value::Null => Ok(vec![]),
            other => Err(FilterError::InvalidOperatorData(format!("unsupported order format: {}", other))),
        }
    }

    fn parse_order_string(s: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        // split on commas, then each token into column and direction
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() { continue; }
            let mut it = trimmed.split_whitespace();
            if let Some(col) = it.next() {
                Self::validate_column(col)?;
                let sort = Self::parse_direction(it.next().unwrap_or("asc"))?;
                out.push(FilterOrderInfo { column: col.to_string(), sort });
            }
        }
        Ok(out)
    }

    fn parse_direction(dir: &str) -> Result<SortDirection, FilterError> {
        if dir.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if dir.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(FilterError::InvalidOperatorData(format!("unknown sort direction '{}'", dir)))
        }
    }

    fn validate_column(column: &str) -> Result<(), FilterError> {
        super::filter::Filter::validate_identifier(column)
            .map_err(|_| FilterError::InvalidColumn(column.to_string()))
    }

    /// Render as the value of an `order=` query parameter, e.g. `display_order.asc,created_at.desc`
    pub fn generate(infos: &[FilterOrderInfo]) -> Option<String> {
        if infos.is_empty() { return None; }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("{}.{}", i.column, i.sort.as_str()))
            .collect();
        Some(parts.join(","))
    }
}
