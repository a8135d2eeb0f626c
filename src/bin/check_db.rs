use anyhow::Context;
use leadership4dx_lib::config::Settings;
use leadership4dx_lib::database::{AssessmentStore, DatabaseManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("🔧 Testing database connection...");

    dotenvy::dotenv().ok();
    let settings = Settings::load().context("invalid configuration")?;

    println!("📊 Database Configuration:");
    println!("  DB_HOST: {}", settings.db_host);
    println!("  DB_PORT: {}", settings.db_port);
    println!("  DB_NAME: {}", settings.db_name);
    println!("  DB_USER: {}", settings.db_user);
    println!(
        "  DB_PASSWORD: {}",
        if settings.db_password.is_empty() { "<empty>" } else { "***set***" }
    );

    println!("\n🔗 Testing PostgreSQL connection...");
    let db = DatabaseManager::new(&settings)
        .await
        .context("PostgreSQL connection failed")?;
    println!("✅ PostgreSQL connection successful");

    db.ping().await.context("simple query failed")?;
    println!("✅ Simple query successful");

    println!("\n🔍 Checking tables...");
    let mut missing = 0;
    for (table, count) in db.table_counts().await? {
        match count {
            Some(count) => println!("✅ {:<22} {} rows", table, count),
            None => {
                missing += 1;
                println!("❌ {:<22} missing (see sql/schema.sql)", table);
            }
        }
    }

    if missing > 0 {
        anyhow::bail!("{} table(s) missing", missing);
    }

    println!("\n🎉 Database is ready");
    Ok(())
}
