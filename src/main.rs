use leadership4dx_lib::config::Settings;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = leadership4dx_lib::run(settings).await {
        eprintln!("Error running server: {:#}", e);
        std::process::exit(1);
    }
}
