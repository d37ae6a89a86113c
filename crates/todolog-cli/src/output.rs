//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use todolog_core::{Id, Item};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single item
    pub fn print_item(&self, id: &Id, item: &Item) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:   {}", id);
                println!("Text: {}", item.text);
                println!("Done: {}", if item.done { "yes" } else { "no" });
            }
            OutputFormat::Json => {
                println!("{}", item_json(id, item));
            }
            OutputFormat::Quiet => {
                println!("{}", id);
            }
        }
    }

    /// Print a list of items followed by the status line
    pub fn print_items(&self, items: &[(&Id, &Item)], status: &str) {
        match self.format {
            OutputFormat::Human => {
                if items.is_empty() {
                    println!("No items.");
                } else {
                    for (id, item) in items {
                        println!("{}", item_line(id, item));
                    }
                }
                println!("\n{}", status);
            }
            OutputFormat::Json => {
                let json_items: Vec<_> = items
                    .iter()
                    .map(|(id, item)| item_json(id, item))
                    .collect();
                println!("{}", serde_json::Value::Array(json_items));
            }
            OutputFormat::Quiet => {
                for (id, _) in items {
                    println!("{}", id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr (suppressed in quiet mode)
    pub fn warning(&self, message: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", message);
        }
    }
}

/// One list line: short ID, checkbox, text
pub fn item_line(id: &Id, item: &Item) -> String {
    format!(
        "{} [{}] {}",
        id.short(),
        if item.done { "x" } else { " " },
        truncate(&item.text, 60)
    )
}

fn item_json(id: &Id, item: &Item) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "text": item.text,
        "done": item.done,
    })
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("ääääääääääää", 5), "ää...");
    }

    #[test]
    fn test_item_line() {
        let id = Id::from("0123456789abcdef0123456789abcdef");
        assert_eq!(item_line(&id, &Item::new("milk")), "01234567 [ ] milk");
        assert_eq!(
            item_line(&id, &Item::new("milk").with_done(true)),
            "01234567 [x] milk"
        );
    }

    #[test]
    fn test_item_json() {
        let id = Id::from("abc");
        let value = item_json(&id, &Item::new("milk"));
        assert_eq!(value["id"], "abc");
        assert_eq!(value["text"], "milk");
        assert_eq!(value["done"], false);
    }
}
