use super::acquire::records_table;
use super::ui;
use crate::service::FreightIndexService;
use anyhow::Result;

/// Prints the latest record matching `routes`, or the family's most recent
/// snapshot when no route is given.
pub async fn run(service: &FreightIndexService, family: &str, routes: &[String]) -> Result<()> {
    let family = family.to_lowercase();
    let records = if routes.is_empty() {
        service.store().snapshot(&family).await?
    } else {
        service.latest(&family, routes).await?.into_iter().collect()
    };

    if records.is_empty() {
        println!(
            "{}",
            ui::style_text(
                &format!("No stored {} readings found", family.to_uppercase()),
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }

    println!(
        "\nIndex family: {}",
        ui::style_text(&family.to_uppercase(), ui::StyleType::Title)
    );
    println!("{}", records_table(&records));
    Ok(())
}
