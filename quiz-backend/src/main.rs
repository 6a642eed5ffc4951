use std::sync::Arc;

use quiz_backend::config::ServerConfig;
use quiz_backend::quiz::QuizService;
use quiz_backend::routes::{AppState, router};
use quiz_backend::store::Store;
use word_bank::{ExperienceCurve, MasteryThresholds, ProgressionConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = ServerConfig::from_env()?;
    let store = Store::open(&config.database_path)?;
    log::info!("opened word bank at {}", config.database_path.display());

    let progression =
        ProgressionConfig::new(ExperienceCurve::default(), MasteryThresholds::default());
    let quiz = QuizService::new(Arc::new(progression), config.quiz);
    let state = Arc::new(AppState::new(store, quiz, config.jwt_secret));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    log::info!("listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
