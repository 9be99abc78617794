use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // The net payable is almost always the answer being asked for
    let priority_keys = [
        "net_amount",
        "amount_total",
        "total_gross",
        "gross_total",
        "withholding_amount",
        "cassa_amount",
        "amount_untaxed",
        "untaxed_base",
    ];

    if let Value::Object(map) = result_obj {
        for key in priority_keys {
            if let Some(val) = map.get(key) {
                println!("{}", format_minimal(val));
                return;
            }
        }
        if let Some((_, val)) = map.iter().next() {
            println!("{}", format_minimal(val));
            return;
        }
    }
    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
