use super::ui;
use crate::core::AcquireError;
use crate::core::IndexRecord;
use crate::service::{AcquisitionReport, FreightIndexService};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;

/// Refreshes each family in turn and prints what was collected.
pub async fn run(
    service: &FreightIndexService,
    families: &[String],
    today: NaiveDate,
    dry_run: bool,
) -> Result<()> {
    if families.is_empty() {
        println!("No index families configured. Run `frate setup` or edit the configuration.");
        return Ok(());
    }

    let pb = ui::new_progress_bar(families.len() as u64);
    let mut reports = Vec::new();
    let mut failures: Vec<(String, AcquireError)> = Vec::new();
    for family in families {
        pb.set_message(family.clone());
        match service.refresh(family, today, dry_run).await {
            Ok(report) => reports.push(report),
            Err(err) => failures.push((family.clone(), err)),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let count = reports.len();
    for (i, report) in reports.iter().enumerate() {
        display_report(report, dry_run);
        if i + 1 < count {
            ui::print_separator();
        }
    }
    for (family, err) in &failures {
        println!(
            "{}",
            ui::style_text(&format!("{family}: {err}"), ui::StyleType::Warning)
        );
    }

    if reports.is_empty() && !failures.is_empty() {
        anyhow::bail!("No index family could be acquired");
    }
    Ok(())
}

fn display_report(report: &AcquisitionReport, dry_run: bool) {
    println!(
        "\nIndex family: {}",
        ui::style_text(&report.family.to_uppercase(), ui::StyleType::Title)
    );
    println!("{}", records_table(&report.records));

    let status = if report.degraded {
        ui::style_text(
            "All sources failed; showing mock data (not stored)",
            ui::StyleType::Warning,
        )
    } else if dry_run {
        ui::style_text("Dry run; nothing stored", ui::StyleType::Subtle)
    } else if let Some(stored) = report.stored {
        ui::style_text(
            &format!("Stored {}, rejected {}", stored.succeeded, stored.rejected),
            ui::StyleType::Subtle,
        )
    } else {
        ui::style_text(
            &format!(
                "Not stored: {}",
                report.store_error.as_deref().unwrap_or("unknown error")
            ),
            ui::StyleType::Warning,
        )
    };
    println!("{status}");
}

pub fn records_table(records: &[IndexRecord]) -> comfy_table::Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Route"),
        ui::header_cell("Unit"),
        ui::header_cell("Weight"),
        ui::header_cell("Previous"),
        ui::header_cell("Current"),
        ui::header_cell("Change"),
        ui::header_cell("Date"),
    ]);
    for record in records {
        table.add_row(vec![
            Cell::new(&record.route),
            Cell::new(record.unit.to_string()),
            ui::number_cell(record.weighting),
            ui::number_cell(record.previous_index),
            ui::number_cell(record.current_index),
            ui::change_cell(record.change),
            Cell::new(record.current_date.to_string()),
        ]);
    }
    table
}
