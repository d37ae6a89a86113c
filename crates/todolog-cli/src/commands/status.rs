//! Status command handler

use anyhow::Result;

use todolog_core::Config;

use super::item::Session;
use crate::output::{Output, OutputFormat};

/// Show status information
pub async fn show(config: &Config, output: &Output) -> Result<()> {
    let session = Session::open(config, output).await;
    let data_file = session.store.data_file().to_path_buf();
    let todos = session.finish().await?;

    let size = tokio::fs::metadata(&data_file)
        .await
        .map(|m| m.len())
        .unwrap_or(0);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_file": data_file,
                    "size": size,
                    "counts": {
                        "total": todos.len(),
                        "done": todos.done_count(),
                        "remaining": todos.remaining()
                    },
                    "status": todos.status_line()
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", todos.remaining());
        }
        OutputFormat::Human => {
            println!("todolog Status");
            println!("==============");
            println!();
            println!("Storage:");
            println!("  Data file: {}", data_file.display());
            println!("  Size:      {}", format_size(size));
            println!();
            println!("Items:");
            println!("  Total:     {}", todos.len());
            println!("  Done:      {}", todos.done_count());
            println!();
            println!("{}", todos.status_line());
        }
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    match bytes {
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{} B", b),
    }
}
