//! Check external tool availability.

use console::style;

use crate::config::Settings;
use crate::encryption::QpdfEncryptor;
use crate::extraction::check_tools;

pub async fn cmd_check(settings: &Settings) -> anyhow::Result<()> {
    let qpdf = QpdfEncryptor::discover(settings.qpdf.as_deref());

    println!("\n{}", style("Tool Status").bold());
    println!("{}", "-".repeat(50));

    let tools = check_tools(&[
        ("pdftotext", settings.pdftotext.as_path()),
        ("pdftoppm", settings.pdftoppm.as_path()),
        ("qpdf", qpdf.binary()),
    ]);

    let mut all_found = true;
    for (tool, available) in &tools {
        let status = if *available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }
    println!(
        "  {:<15} {}",
        "",
        style(format!("qpdf: {}", qpdf.binary().display())).dim()
    );

    if !all_found {
        println!("\n{}", style("Missing tools:").yellow());
        for (tool, available) in &tools {
            if !available {
                let hint = match *tool {
                    "qpdf" => "qpdf (apt install qpdf / brew install qpdf)",
                    _ => "poppler-utils (apt install poppler-utils / brew install poppler)",
                };
                println!("  {} needs {}", tool, hint);
            }
        }
    }

    Ok(())
}
