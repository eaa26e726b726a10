use royale_decks::config::Settings;
use royale_decks::core::crawl;

use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(settings.get_trace_level())
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Setting default subscriber failed");

    info!(
        "Crawling up to {} ranked matches (rank {}, lang {}).",
        settings.limit, settings.rank, settings.lang
    );
    match crawl::run(&settings).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code(settings.allow_empty_success)),
        Err(e) => {
            error!("{e}");
            ExitCode::from(1)
        }
    }
}
