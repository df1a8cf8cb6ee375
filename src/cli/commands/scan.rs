//! Scan command: extract and review without writing PDFs.

use std::path::PathBuf;

use console::style;

use crate::config::Settings;
use crate::models::WorkingSet;
use crate::report::save_report;

use crate::cli::helpers::{
    build_service, collect_pdf_paths, print_review, report_dir, run_extraction,
};

/// Extract DOBs from the given files and print the review table or JSON.
pub async fn cmd_scan(
    settings: &Settings,
    paths: &[PathBuf],
    json: bool,
    report: bool,
) -> anyhow::Result<()> {
    let files = collect_pdf_paths(paths)?;
    if files.is_empty() {
        println!("{} No PDF files found", style("!").yellow());
        return Ok(());
    }

    let service = build_service(settings);
    let records = run_extraction(&service, &files, !json).await;

    let mut set = WorkingSet::new().with_output_dir(settings.output_dir.clone());
    set.extend(records);

    if json {
        println!("{}", serde_json::to_string_pretty(set.records())?);
    } else {
        print_review(&set);
    }

    if report {
        let path = save_report(&set, &report_dir(&set)).await?;
        if !json {
            println!(
                "{} Report saved to {}",
                style("✓").green(),
                path.display()
            );
        }
    }

    Ok(())
}
