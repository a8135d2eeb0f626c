//! Operator tool: prints recent analyses, including the concealed risk level.

use anyhow::Context;
use leadership4dx_lib::config::Settings;
use leadership4dx_lib::database::{AssessmentStore, DatabaseManager};
use leadership4dx_lib::scoring::RiskLevel;

const DEFAULT_LIMIT: usize = 50;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("🔧 Listing stored analyses...");

    dotenvy::dotenv().ok();
    let settings = Settings::load().context("invalid configuration")?;

    let limit = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<usize>().context("limit must be a number"))
        .transpose()?
        .unwrap_or(DEFAULT_LIMIT);

    let db = DatabaseManager::new(&settings).await?;
    let analyses = db.list_analyses(limit).await?;

    println!("\n📋 Found {} analyses:", analyses.len());
    println!("{:-<132}", "");
    println!(
        "{:<38} {:<20} {:<22} {:<26} {:<8} {:<16}",
        "Analysis ID", "User", "Style", "Feedback", "Risk", "Created"
    );
    println!("{:-<132}", "");

    for analysis in &analyses {
        let marker = match analysis.risk_level {
            RiskLevel::High => "🔴",
            RiskLevel::Medium => "🟡",
            RiskLevel::Low => "🟢",
        };

        println!(
            "{} {:<36} {:<20} {:<22} {:<26} {:<8} {:<16}",
            marker,
            analysis.id.to_string(),
            analysis.user_id.chars().take(18).collect::<String>(),
            analysis.blake_mouton_style.as_str(),
            analysis.candor_quadrant.as_str(),
            analysis.risk_level.as_str(),
            analysis.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!("{:-<132}", "");
    Ok(())
}
