use super::ui;
use crate::fusion::{ContainerClass, RateEstimate};
use crate::service::FreightIndexService;
use anyhow::Result;
use comfy_table::Cell;

pub async fn run(
    service: &FreightIndexService,
    origin: &str,
    destination: &str,
    class: ContainerClass,
    weight_tons: Option<f64>,
    json: bool,
) -> Result<()> {
    let estimate = service
        .estimate_rate(origin, destination, class, weight_tons)
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
    } else {
        display_estimate(origin, destination, class, &estimate);
    }
    Ok(())
}

fn display_estimate(origin: &str, destination: &str, class: ContainerClass, estimate: &RateEstimate) {
    println!(
        "\nRate estimate: {}",
        ui::style_text(
            &format!("{origin} -> {destination} ({class})"),
            ui::StyleType::Title
        )
    );

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Measure"), ui::header_cell("Value")]);
    table.add_row(vec![
        Cell::new(ui::style_text("Point estimate", ui::StyleType::TotalLabel)),
        Cell::new(ui::style_text(
            &format!("{:.2}", estimate.point_estimate),
            ui::StyleType::TotalValue,
        )),
    ]);
    table.add_row(vec![Cell::new("Lower bound"), ui::number_cell(estimate.min_bound)]);
    table.add_row(vec![Cell::new("Upper bound"), ui::number_cell(estimate.max_bound)]);
    table.add_row(vec![Cell::new("Reliability"), ui::number_cell(estimate.reliability)]);
    table.add_row(vec![
        Cell::new("Sources"),
        Cell::new(
            estimate
                .contributing_sources
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        ),
    ]);
    println!("{table}");

    if estimate.is_degraded() {
        println!(
            "{}",
            ui::style_text(
                "No stored index data for this lane; this is a baseline estimate.",
                ui::StyleType::Warning
            )
        );
    }
}
