//! Replace the MongoDB game catalogue with the games listed in a JSON file.
//!
//! Usage: `import-games [path]`, where the file holds an array of game creation payloads
//! (defaults to `data/games.json`). Connection settings come from the usual configuration.

#[cfg(feature = "mongo-store")]
fn main() -> anyhow::Result<()> {
    import::run()
}

#[cfg(not(feature = "mongo-store"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("import-games needs the mongo-store feature")
}

#[cfg(feature = "mongo-store")]
mod import {
    use std::{
        env,
        fs::File,
        io::BufReader,
        path::{Path, PathBuf},
        sync::Arc,
    };

    use anyhow::{Context, Result};
    use tracing::info;

    use gamevault_back::{
        config::AppConfig,
        dao::catalog_store::mongodb::{MongoCatalogStore, MongoConfig},
        dto::game::CreateGameRequest,
        services::game_service,
        state::AppState,
    };

    const DEFAULT_INPUT: &str = "data/games.json";

    pub fn run() -> Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();

        let input = env::args_os()
            .nth(1)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));
        let games = read_games(&input)?;

        let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
        runtime.block_on(import(games))
    }

    fn read_games(path: &Path) -> Result<Vec<CreateGameRequest>> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let games: Vec<CreateGameRequest> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing {}", path.display()))?;
        info!(path = %path.display(), count = games.len(), "games loaded");
        Ok(games)
    }

    async fn import(games: Vec<CreateGameRequest>) -> Result<()> {
        let config = AppConfig::load();
        let mongo = MongoConfig::from_uri(&config.mongo_uri, config.mongo_db.as_deref())
            .await
            .context("reading MongoDB settings")?;
        let store = MongoCatalogStore::connect(mongo)
            .await
            .context("connecting to MongoDB")?;

        let state = AppState::from_config(config);
        state.install_catalog_store(Arc::new(store)).await;

        let imported = game_service::import_games(&state, games)
            .await
            .context("importing games")?;
        info!(imported, "catalogue import finished");
        Ok(())
    }
}
