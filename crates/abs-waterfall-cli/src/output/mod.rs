pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Union of object keys across `rows`, in first-seen order.
///
/// Call-month rows carry redemption columns the other months lack, so the
/// first row alone is not enough.
pub(crate) fn column_headers(rows: &[Value]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.clone());
                }
            }
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headers_union_keeps_first_seen_order() {
        let rows = vec![
            json!({"month": 1, "A_outstanding": "10"}),
            json!({"month": 2, "A_outstanding": "0", "A_call_redemption": "10", "called": true}),
        ];
        assert_eq!(
            column_headers(&rows),
            vec!["month", "A_outstanding", "A_call_redemption", "called"]
        );
    }

    #[test]
    fn test_headers_of_scalars_is_empty() {
        assert!(column_headers(&[json!(1), json!("x")]).is_empty());
    }
}
