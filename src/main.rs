use proposal_admin::{config, logging, tui};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 可选，缺失时忽略
    let _ = dotenvy::dotenv();

    let settings = config::Settings::load()?;
    logging::init(&settings.logging)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    tracing::info!(base_url = %settings.api.base_url, "starting admin console");

    tui::run(settings, runtime.handle().clone())?;
    Ok(())
}
