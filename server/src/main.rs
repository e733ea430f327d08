use transcribe_flow::config::AppSettings;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = AppSettings::from_env();
    if let Err(e) = transcribe_flow::run(settings).await {
        log::error!("{e}");
        std::process::exit(1);
    }
}
