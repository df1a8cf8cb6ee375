//! Shared helper functions for CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, Mutex};

use crate::config::Settings;
use crate::extraction::{PdftoppmRasterizer, PdftotextExtractor};
use crate::models::{ExtractionOutcome, FileRecord, WorkingSet};
use crate::services::{ExtractionService, ProcessingEvent};

/// Expand CLI paths into PDF files.
///
/// Directories contribute their `*.pdf` entries (case-insensitive, sorted,
/// non-recursive). Files are kept as given.
pub fn collect_pdf_paths(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("Failed to read directory {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_pdf(p))
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Build the extraction service from resolved settings.
pub fn build_service(settings: &Settings) -> ExtractionService {
    let text_source = PdftotextExtractor::new().with_binary(&settings.pdftotext);
    let rasterizer = PdftoppmRasterizer::new()
        .with_binary(&settings.pdftoppm)
        .with_dpi(settings.render_dpi)
        .with_crop_fraction(settings.crop_fraction);
    ExtractionService::new(Box::new(text_source), Box::new(rasterizer))
}

/// Process files with a progress bar, returning records in input order.
pub async fn run_extraction(
    service: &ExtractionService,
    paths: &[PathBuf],
    show_progress: bool,
) -> Vec<FileRecord> {
    if !show_progress {
        return service.process_files(paths, None).await;
    }

    let (event_tx, mut event_rx) = mpsc::channel::<ProcessingEvent>(100);

    let pb = Arc::new(Mutex::new(None::<ProgressBar>));
    let pb_clone = pb.clone();

    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                ProcessingEvent::FileStarted {
                    index,
                    total,
                    file_name,
                } => {
                    let mut guard = pb_clone.lock().await;
                    let progress = guard.get_or_insert_with(|| {
                        let progress = ProgressBar::new(total as u64);
                        progress.set_style(
                            ProgressStyle::default_bar()
                                .template(
                                    "{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}",
                                )
                                .unwrap()
                                .progress_chars("█▓░"),
                        );
                        progress
                    });
                    progress.set_message(format!(
                        "Processing {} of {}: {}",
                        index + 1,
                        total,
                        file_name
                    ));
                }
                ProcessingEvent::FileFinished { .. } => {
                    if let Some(ref progress) = *pb_clone.lock().await {
                        progress.inc(1);
                    }
                }
                ProcessingEvent::BatchComplete {
                    matched,
                    not_found,
                    failed,
                } => {
                    if let Some(progress) = pb_clone.lock().await.take() {
                        progress.finish_and_clear();
                    }
                    println!(
                        "{} Processed {} files: {} matched",
                        style("✓").green(),
                        matched + not_found + failed,
                        matched
                    );
                    if not_found > 0 {
                        println!("  {} {} without a DOB", style("!").yellow(), not_found);
                    }
                    if failed > 0 {
                        println!("  {} {} could not be read", style("✗").red(), failed);
                    }
                }
            }
        }
    });

    let records = service.process_files(paths, Some(event_tx)).await;
    let _ = event_handler.await;
    records
}

/// Parse a `NAME=PASSWORD` override.
pub fn parse_password_arg(arg: &str) -> anyhow::Result<(String, String)> {
    match arg.split_once('=') {
        Some((name, password)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), password.to_string()))
        }
        _ => bail!("Invalid password override '{}', expected NAME=PASSWORD", arg),
    }
}

/// Apply password overrides by file name.
///
/// A name shared by several files in the batch is rejected.
pub fn apply_passwords(set: &mut WorkingSet, overrides: &[(String, String)]) -> anyhow::Result<()> {
    for (name, password) in overrides {
        let Some(index) = set.position_by_name(name) else {
            bail!("No file named '{}' in this batch", name);
        };
        let matches = set.iter().filter(|r| r.file_name == *name).count();
        if matches > 1 {
            bail!(
                "{} files are named '{}'; protect them in separate runs",
                matches,
                name
            );
        }
        set.set_password(index, password.clone());
    }
    Ok(())
}

fn status_cell(record: &FileRecord) -> String {
    let status = match record.outcome {
        ExtractionOutcome::Matched => style("✓ found").green().to_string(),
        ExtractionOutcome::NotFound => style("⚠ no DOB").yellow().to_string(),
        ExtractionOutcome::ParseError => style("✗ unreadable").red().to_string(),
    };
    if record.password_edited() {
        format!("{} {}", status, style("(password set by hand)").dim())
    } else {
        status
    }
}

/// Evidence snippet with the raw match emphasized for the terminal.
fn evidence_line(record: &FileRecord) -> Option<String> {
    let context = record.text_context()?;
    let raw = record.raw_match().unwrap_or_default();
    Some(match context.split_once(raw) {
        Some((before, after)) if !raw.is_empty() => {
            format!("{}{}{}", before, style(raw).yellow().bold(), after)
        }
        _ => context.to_string(),
    })
}

/// Print the review table for the working set.
pub fn print_review(set: &WorkingSet) {
    println!("\n{}", style("Review").bold());
    println!("{}", "-".repeat(72));
    println!(
        "  {:<30} {:<12} {:<10} {}",
        style("File").cyan(),
        style("DOB").cyan(),
        style("Password").cyan(),
        style("Status").cyan()
    );

    for record in set.iter() {
        let password = if record.has_password() {
            record.password.as_str()
        } else {
            "-"
        };
        println!(
            "  {:<30} {:<12} {:<10} {}",
            record.file_name,
            record.dob().unwrap_or("-"),
            password,
            status_cell(record)
        );
        if let Some(evidence) = evidence_line(record) {
            println!("      {} {}", style("…").dim(), evidence);
        } else if let Some(ref error) = record.error {
            println!("      {}", style(error).dim());
        }
    }

    println!("{}", "-".repeat(72));
    println!("  {}", set.status_summary());
}

/// Directory reports are written to.
pub fn report_dir(set: &WorkingSet) -> PathBuf {
    set.display_output_dir()
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_password_arg() {
        assert_eq!(
            parse_password_arg("jane.pdf=01022015").unwrap(),
            ("jane.pdf".to_string(), "01022015".to_string())
        );
        // Only the first '=' separates
        assert_eq!(
            parse_password_arg("a.pdf=x=y").unwrap().1,
            "x=y".to_string()
        );
        assert!(parse_password_arg("no-separator").is_err());
        assert!(parse_password_arg("=secret").is_err());
    }

    #[test]
    fn test_apply_passwords() {
        let mut set = WorkingSet::new();
        set.extend([FileRecord::parse_error(PathBuf::from("/in/a.pdf"), "x")]);

        apply_passwords(&mut set, &[("a.pdf".to_string(), "pw".to_string())]).unwrap();
        assert!(set.is_ready());

        let err = apply_passwords(&mut set, &[("b.pdf".to_string(), "pw".to_string())]);
        assert!(err.is_err());
    }

    #[test]
    fn test_apply_passwords_rejects_shared_name() {
        let mut set = WorkingSet::new();
        set.extend([
            FileRecord::parse_error(PathBuf::from("/a/x.pdf"), "x"),
            FileRecord::parse_error(PathBuf::from("/b/x.pdf"), "x"),
        ]);

        let err = apply_passwords(&mut set, &[("x.pdf".to_string(), "pw".to_string())])
            .unwrap_err();
        assert!(err.to_string().contains("2 files are named 'x.pdf'"));
        assert_eq!(set.ready_count(), 0);
    }

    #[test]
    fn test_status_cell_marks_hand_set_password() {
        let mut record = FileRecord::parse_error(PathBuf::from("/a/x.pdf"), "x");
        assert!(!status_cell(&record).contains("set by hand"));

        record.set_password("pw");
        let cell = console::strip_ansi_codes(&status_cell(&record)).to_string();
        assert_eq!(cell, "✗ unreadable (password set by hand)");
    }

    #[test]
    fn test_collect_pdf_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let explicit = PathBuf::from("/elsewhere/c.pdf");
        let files = collect_pdf_paths(&[dir.path().to_path_buf(), explicit.clone()]).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.PDF"), dir.path().join("b.pdf"), explicit]
        );
    }
}
