//! Protect command: extract, review, then encrypt.

use std::path::PathBuf;

use anyhow::bail;
use console::{style, Term};
use tokio::sync::mpsc;

use crate::cli::helpers::{
    apply_passwords, build_service, collect_pdf_paths, parse_password_arg, print_review,
    report_dir, run_extraction,
};
use crate::config::Settings;
use crate::encryption::QpdfEncryptor;
use crate::extraction::check_binary;
use crate::models::WorkingSet;
use crate::report::save_report;
use crate::services::{protect_all, ProtectionEvent};

/// Flags of the protect command.
pub struct ProtectOptions {
    pub passwords: Vec<String>,
    pub no_prompt: bool,
    pub skip_missing: bool,
    pub report: bool,
}

/// Ask for the password of every record still missing one.
fn prompt_missing(set: &mut WorkingSet) -> anyhow::Result<()> {
    let term = Term::stdout();
    for index in 0..set.len() {
        let Some(record) = set.get(index) else {
            continue;
        };
        if record.has_password() {
            continue;
        }
        term.write_str(&format!(
            "{} Password for {} (blank to skip): ",
            style("?").cyan(),
            style(&record.file_name).bold()
        ))?;
        let input = term.read_line()?;
        let input = input.trim();
        if !input.is_empty() {
            set.set_password(index, input);
        }
    }
    Ok(())
}

pub async fn cmd_protect(
    settings: &Settings,
    paths: &[PathBuf],
    options: ProtectOptions,
) -> anyhow::Result<()> {
    let overrides = options
        .passwords
        .iter()
        .map(|arg| parse_password_arg(arg))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let encryptor = QpdfEncryptor::discover(settings.qpdf.as_deref());
    if !check_binary(encryptor.binary()) {
        bail!(
            "qpdf not found at {} (install qpdf or set tools.qpdf / DOBLOCK_QPDF)",
            encryptor.binary().display()
        );
    }

    let files = collect_pdf_paths(paths)?;
    if files.is_empty() {
        println!("{} No PDF files found", style("!").yellow());
        return Ok(());
    }

    let service = build_service(settings);
    let records = run_extraction(&service, &files, true).await;

    let mut set = WorkingSet::new().with_output_dir(settings.output_dir.clone());
    set.extend(records);
    apply_passwords(&mut set, &overrides)?;

    print_review(&set);

    if !set.is_ready() && !options.no_prompt && console::user_attended() {
        println!();
        prompt_missing(&mut set)?;
    }

    if !set.is_ready() {
        let missing: Vec<&str> = set
            .iter()
            .filter(|r| !r.has_password())
            .map(|r| r.file_name.as_str())
            .collect();
        if !options.skip_missing {
            bail!(
                "{} file(s) have no password: {} (use --password NAME=PASSWORD or --skip-missing)",
                missing.len(),
                missing.join(", ")
            );
        }
        println!(
            "{} Skipping {} file(s) without a password",
            style("!").yellow(),
            missing.len()
        );
    }

    if set.ready_count() == 0 {
        println!("{} Nothing to protect", style("!").yellow());
        return Ok(());
    }

    println!(
        "\n{} Protecting {} PDFs",
        style("→").cyan(),
        set.ready_count()
    );

    let (event_tx, mut event_rx) = mpsc::channel::<ProtectionEvent>(100);
    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                ProtectionEvent::Protected { output_path, .. } => {
                    println!("  {} {}", style("✓").green(), output_path.display());
                }
                ProtectionEvent::Failed { error, .. } => {
                    println!("  {} {}", style("✗").red(), error);
                }
                ProtectionEvent::Skipped { file_name, .. } => {
                    println!("  {} {} skipped", style("-").dim(), file_name);
                }
                ProtectionEvent::Started { .. } => {}
            }
        }
    });

    let summary = protect_all(&mut set, &encryptor, Some(event_tx)).await;
    let _ = event_handler.await;

    let marker = if summary.all_succeeded() {
        style("✓").green()
    } else {
        style("!").yellow()
    };
    println!("\n{} {}", marker, summary.headline());
    if let Some(ref dir) = summary.output_dir {
        println!("  Saved to: {}", dir.display());
    }

    if options.report {
        let path = save_report(&set, &report_dir(&set)).await?;
        println!(
            "{} Report saved to {}",
            style("✓").green(),
            path.display()
        );
    }

    if summary.succeeded < summary.attempted {
        bail!(
            "{} of {} encryptions failed",
            summary.attempted - summary.succeeded,
            summary.attempted
        );
    }

    Ok(())
}
