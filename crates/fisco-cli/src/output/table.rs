use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Render the totals as a two-column table, the synchronized lines as a line
/// table, and any warnings underneath.
pub fn print_table(value: &Value) {
    let map = match value {
        Value::Object(map) => map,
        _ => {
            println!("{}", value);
            return;
        }
    };

    if let Some(Value::Object(result)) = map.get("result") {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in result {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }

    if let Some(Value::Array(lines)) = map.get("lines") {
        if !lines.is_empty() {
            println!("\nLines:");
            print_lines(lines);
        }
    }

    if let Some(Value::Array(warnings)) = map.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = map.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_lines(lines: &[Value]) {
    let mut builder = Builder::default();
    builder.push_record(["Name", "Subtotal", "Account", "Fiscal"]);
    for line in lines {
        if let Value::Object(line) = line {
            builder.push_record([
                line.get("name").map(format_value).unwrap_or_default(),
                line.get("subtotal").map(format_value).unwrap_or_default(),
                line.get("account_code").map(format_value).unwrap_or_default(),
                line.get("fiscal_kind").map(format_value).unwrap_or_default(),
            ]);
        }
    }
    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
