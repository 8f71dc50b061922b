//! Game catalogue CRUD.
//!
//! `rating` and `reviews` are owned by the review service and never written here.
//! Deleting a game leaves its reviews in place.

use std::time::SystemTime;

use tracing::{info, warn};
use validator::Validate;

use crate::{
    dao::{
        id::EntityId,
        models::{GameEntity, GamePatch},
    },
    dto::game::{CreateGameRequest, GameDetailResponse, GameResponse, UpdateGameRequest},
    error::ServiceError,
    services::{parse_id, required},
    state::SharedState,
};

/// Every game in the catalogue, ordered by id.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameResponse>, ServiceError> {
    let store = state.require_catalog_store().await?;
    let games = store.list_games().await?;
    Ok(games.into_iter().map(Into::into).collect())
}

/// Load a game together with the reviews it references, in reference order.
pub async fn get_game(state: &SharedState, id: &str) -> Result<GameDetailResponse, ServiceError> {
    let id = parse_id(id)?;
    let store = state.require_catalog_store().await?;
    let Some(game) = store.find_game(id.clone()).await? else {
        return Err(ServiceError::NotFound(format!("game `{id}` not found")));
    };

    let mut reviews = Vec::with_capacity(game.reviews.len());
    for review_id in &game.reviews {
        match store.find_review(review_id.clone()).await? {
            Some(review) => reviews.push(review),
            None => warn!(game_id = %id, review_id = %review_id, "game references a missing review"),
        }
    }

    Ok((game, reviews).into())
}

/// Validate a creation request and build the unrated game it describes.
fn new_game(request: CreateGameRequest, now: SystemTime) -> Result<GameEntity, ServiceError> {
    request.validate()?;
    let title = required(request.title, "title")?.trim().to_owned();

    Ok(GameEntity {
        id: EntityId::generate(),
        title,
        genre: request.genre,
        platform: request.platform,
        image: request.image,
        banner: request.banner,
        description: request.description,
        price: request.price,
        downloads: request.downloads,
        completed: request.completed.unwrap_or(false),
        rating: 0.0,
        reviews: Vec::new(),
        created_at: now,
        updated_at: now,
    })
}

/// Add a game to the catalogue. It starts with no reviews and a rating of zero.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<GameResponse, ServiceError> {
    let game = new_game(request, SystemTime::now())?;
    let store = state.require_catalog_store().await?;

    let game = store.insert_game(game).await?;
    info!(game_id = %game.id, title = %game.title, "game created");

    Ok(game.into())
}

/// Replace the whole catalogue with `requests`.
///
/// Every entry is validated before the existing games are removed, so a bad entry leaves
/// the catalogue as it was. Reviews and user collections are not touched.
pub async fn import_games(
    state: &SharedState,
    requests: Vec<CreateGameRequest>,
) -> Result<usize, ServiceError> {
    let now = SystemTime::now();
    let games = requests
        .into_iter()
        .enumerate()
        .map(|(index, request)| {
            new_game(request, now).map_err(|err| match err {
                ServiceError::InvalidInput(message) => {
                    ServiceError::InvalidInput(format!("game #{index}: {message}"))
                }
                other => other,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let store = state.require_catalog_store().await?;
    let imported = store.replace_games(games).await?;
    info!(imported, "game catalogue replaced");
    Ok(imported)
}

/// Apply the provided editable fields. An empty update returns the game unchanged.
pub async fn update_game(
    state: &SharedState,
    id: &str,
    request: UpdateGameRequest,
) -> Result<GameResponse, ServiceError> {
    request.validate()?;
    let id = parse_id(id)?;
    let patch = GamePatch::from(request);
    let store = state.require_catalog_store().await?;

    let updated = if patch.is_empty() {
        store.find_game(id.clone()).await?
    } else {
        store.update_game(id.clone(), patch).await?
    };

    updated
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("game `{id}` not found")))
}

/// Remove a game. Its reviews stay in place and user collections keep the dangling id.
pub async fn delete_game(state: &SharedState, id: &str) -> Result<(), ServiceError> {
    let id = parse_id(id)?;
    let store = state.require_catalog_store().await?;
    match store.delete_game(id.clone()).await? {
        Some(game) => {
            info!(game_id = %id, orphaned_reviews = game.reviews.len(), "game deleted");
            Ok(())
        }
        None => Err(ServiceError::NotFound(format!("game `{id}` not found"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::{catalog_store::CatalogStore, models::ReviewFilter},
        dto::review::CreateReviewRequest,
        services::review_service,
        state::test_support::memory_state,
    };

    fn titled(title: &str) -> CreateGameRequest {
        CreateGameRequest {
            title: Some(title.into()),
            genre: Some("Metroidvania".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn created_game_starts_unrated() {
        let (state, _store) = memory_state().await;
        let game = create_game(&state, titled("Hollow Knight")).await.unwrap();
        assert_eq!(game.summary.rating, 0.0);
        assert!(game.reviews.is_empty());
        assert!(!game.summary.completed);

        let all = list_games(&state).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn missing_title_is_invalid() {
        let (state, _store) = memory_state().await;
        let err = create_game(&state, CreateGameRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn import_replaces_the_catalogue() {
        let (state, _store) = memory_state().await;
        create_game(&state, titled("Braid")).await.unwrap();

        let imported = import_games(&state, vec![titled("Celeste"), titled("Hades")])
            .await
            .unwrap();
        assert_eq!(imported, 2);

        let mut titles: Vec<String> = list_games(&state)
            .await
            .unwrap()
            .into_iter()
            .map(|game| game.summary.title)
            .collect();
        titles.sort();
        assert_eq!(titles, ["Celeste", "Hades"]);
    }

    #[tokio::test]
    async fn invalid_import_keeps_existing_games() {
        let (state, _store) = memory_state().await;
        create_game(&state, titled("Braid")).await.unwrap();

        let err = import_games(&state, vec![titled("Celeste"), CreateGameRequest::default()])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(ref message) if message.starts_with("game #1")));

        let games = list_games(&state).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].summary.title, "Braid");
    }

    #[tokio::test]
    async fn update_changes_only_provided_fields() {
        let (state, _store) = memory_state().await;
        let game = create_game(&state, titled("Hollow Knight")).await.unwrap();

        let updated = update_game(
            &state,
            &game.summary.id,
            UpdateGameRequest {
                price: Some(14.99),
                completed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.summary.title, "Hollow Knight");
        assert_eq!(updated.summary.genre.as_deref(), Some("Metroidvania"));
        assert_eq!(updated.summary.price, Some(14.99));
        assert!(updated.summary.completed);

        let missing = update_game(
            &state,
            EntityId::generate().as_str(),
            UpdateGameRequest::default(),
        )
        .await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn detail_resolves_reviews() {
        let (state, _store) = memory_state().await;
        let game = create_game(&state, titled("Celeste")).await.unwrap();
        review_service::create_review(
            &state,
            CreateReviewRequest {
                game_id: Some(game.summary.id.clone()),
                user_name: Some("ana".into()),
                score: Some(5.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let detail = get_game(&state, &game.summary.id).await.unwrap();
        assert_eq!(detail.summary.rating, 5.0);
        assert_eq!(detail.reviews.len(), 1);
        assert_eq!(detail.reviews[0].user_name, "ana");
    }

    #[tokio::test]
    async fn delete_leaves_reviews_in_place() {
        let (state, store) = memory_state().await;
        let game = create_game(&state, titled("Braid")).await.unwrap();
        review_service::create_review(
            &state,
            CreateReviewRequest {
                game_id: Some(game.summary.id.clone()),
                user_name: Some("ana".into()),
                score: Some(3.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        delete_game(&state, &game.summary.id).await.unwrap();
        assert!(matches!(
            get_game(&state, &game.summary.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(
            store
                .find_reviews(ReviewFilter::default())
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(matches!(
            delete_game(&state, &game.summary.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
