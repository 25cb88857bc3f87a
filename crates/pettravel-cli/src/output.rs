use std::collections::BTreeMap;

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

/// A table column: header and the JSON field it reads.
pub type Column = (&'static str, &'static str);

/// Prints `data` in `format`. Tables use `columns` for lists and a
/// field/value layout for single records.
pub fn print_data<T: Serialize>(data: &T, format: OutputFormat, columns: &[Column]) -> anyhow::Result<()> {
    let value = serde_json::to_value(data)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Yaml => println!("{}", format_yaml(&value, 0)),
        OutputFormat::Table => match &value {
            Value::Array(rows) => print_rows(rows, columns),
            other => print_record(other),
        },
    }
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_hint(msg: &str) {
    eprintln!("{} {}", "→".yellow(), msg);
}

/// Prints field errors under the summary line.
pub fn print_field_errors(fields: &BTreeMap<String, Vec<String>>) {
    for (field, messages) in fields {
        for message in messages {
            eprintln!("  {} {}", format!("{field}:").yellow(), message);
        }
    }
}

fn print_rows(rows: &[Value], columns: &[Column]) {
    if rows.is_empty() {
        println!("Nothing found.");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|(header, _)| header.to_string()));
    for row in rows {
        builder.push_record(columns.iter().map(|(_, key)| cell(row.get(*key))));
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
    println!("Total: {}", rows.len());
}

fn print_record(value: &Value) {
    let Some(obj) = value.as_object() else {
        println!("{}", cell(Some(value)));
        return;
    };
    let mut builder = Builder::default();
    for (key, val) in obj {
        if val.is_array() || val.is_object() {
            continue;
        }
        builder.push_record([key.cyan().to_string(), cell(Some(val))]);
    }
    println!("{}", builder.build().with(Style::rounded()));
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| cell(Some(v)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

fn format_yaml(value: &Value, indent: usize) -> String {
    let prefix = " ".repeat(indent);
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if s.contains('\n') {
                format!(
                    "|\n{}{}",
                    " ".repeat(indent + 2),
                    s.replace('\n', &format!("\n{}", " ".repeat(indent + 2)))
                )
            } else {
                format!("\"{}\"", s.replace('"', "\\\""))
            }
        }
        Value::Array(arr) => {
            if arr.is_empty() {
                return "[]".to_string();
            }
            let items: Vec<String> = arr
                .iter()
                .map(|v| format!("{prefix}- {}", format_yaml(v, indent + 2).trim_start()))
                .collect();
            format!("\n{}", items.join("\n"))
        }
        Value::Object(obj) => {
            if obj.is_empty() {
                return "{}".to_string();
            }
            let items: Vec<String> = obj
                .iter()
                .map(|(k, v)| {
                    let val = format_yaml(v, indent + 2);
                    if val.starts_with('\n') {
                        format!("{prefix}{k}:{val}")
                    } else {
                        format!("{prefix}{k}: {val}")
                    }
                })
                .collect();
            if indent == 0 {
                items.join("\n")
            } else {
                format!("\n{}", items.join("\n"))
            }
        }
    }
}
