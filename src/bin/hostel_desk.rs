//! Print a dashboard report for the configured backend as JSON.

use std::process::ExitCode;

use hostel_desk::{Desk, DeskConfig, SystemClock};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "hostel_desk=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "report failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> hostel_desk::Result<()> {
    let config = DeskConfig::from_env();
    let desk = Desk::open(config, SystemClock)?;

    let occupancy = desk.occupancy();
    let report = json!({
        "user": desk.session().label(),
        "role": desk.session().role().name(),
        "dashboard": desk.dashboard(),
        "complaints": desk.complaint_summary(),
        "maintenance": desk.maintenance_summary(),
        "issueCategories": desk.issue_categories().series(),
        "occupancy": {
            "rooms": occupancy.rooms,
            "byStatus": occupancy.by_status.series(),
            "totalBeds": occupancy.total_beds,
            "occupiedBeds": occupancy.occupied_beds,
        },
        "visitorsOnPremises": desk.visitors.on_premises().len(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
