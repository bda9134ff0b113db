//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

/// Render a list of items in the given format
pub fn render_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }

            table.to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(items).unwrap_or_default(),
        OutputFormat::Yaml => serde_yaml::to_string(items).unwrap_or_default(),
        OutputFormat::Plain => {
            let mut blocks = Vec::with_capacity(items.len());
            for item in items {
                let row = item.row();
                let lines: Vec<String> = T::headers()
                    .iter()
                    .zip(row.iter())
                    .map(|(header, value)| format!("{}: {}", header, value))
                    .collect();
                blocks.push(lines.join("\n"));
            }
            blocks.join("\n---\n")
        }
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if items.is_empty() && matches!(format, OutputFormat::Table | OutputFormat::Plain) {
        println!("No items found.");
        return;
    }
    println!("{}", render_list(items, format));
}

/// Print any serializable value in a machine format, falling back to JSON
pub fn print_value<T: Serialize + ?Sized>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(value).unwrap_or_default()),
        _ => println!("{}", serde_json::to_string_pretty(value).unwrap_or_default()),
    }
}

/// Print a simple message
pub fn print_message(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "message": message }));
        }
        _ => {
            println!("{}", message);
        }
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "!".yellow(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        id: String,
        clients: usize,
    }

    impl TableDisplay for Row {
        fn headers() -> Vec<&'static str> {
            vec!["ID", "Clients"]
        }

        fn row(&self) -> Vec<String> {
            vec![self.id.clone(), self.clients.to_string()]
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                id: "A".to_string(),
                clients: 1,
            },
            Row {
                id: "B".to_string(),
                clients: 2,
            },
        ]
    }

    #[test]
    fn test_table_contains_headers_and_cells() {
        let out = render_list(&rows(), OutputFormat::Table);
        assert!(out.contains("ID"));
        assert!(out.contains("Clients"));
        assert!(out.contains("B"));
    }

    #[test]
    fn test_plain_separates_items() {
        let out = render_list(&rows(), OutputFormat::Plain);
        assert_eq!(out, "ID: A\nClients: 1\n---\nID: B\nClients: 2");
    }

    #[test]
    fn test_machine_formats_serialize_fields() {
        let rendered = render_list(&rows(), OutputFormat::Json);
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(json[1]["id"], "B");

        let yaml = render_list(&rows(), OutputFormat::Yaml);
        assert!(yaml.contains("id: A"));
        assert!(yaml.contains("clients: 2"));
    }
}
