//! User collections and played hours.
//!
//! Collections hold weak references: game ids are never checked against the
//! catalogue and stay in place when the game is deleted.

use std::time::SystemTime;

use tracing::debug;
use validator::Validate;

use crate::{
    dao::{
        catalog_store::CatalogStore,
        id::EntityId,
        models::{CollectionList, UserEntity},
    },
    dto::{
        game::GameResponse,
        user::{
            CollectionRemoveResponse, CollectionToggleRequest, CollectionToggleResponse,
            PlayedHoursRequest, PlayedHoursResponse,
        },
    },
    error::ServiceError,
    services::{parse_id, required},
    state::{LockScope, SharedState},
};

fn ids_of(user: &UserEntity, list: CollectionList) -> Vec<String> {
    user.collection(list).iter().map(ToString::to_string).collect()
}

async fn load_user(store: &dyn CatalogStore, id: &EntityId) -> Result<UserEntity, ServiceError> {
    store
        .find_user(id.clone())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("user `{id}` not found")))
}

async fn store_user(store: &dyn CatalogStore, user: UserEntity) -> Result<(), ServiceError> {
    let id = user.id.clone();
    if store.save_user(user).await? {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!("user `{id}` not found")))
    }
}

/// Resolve game ids to catalogue entries in collection order, skipping dangling ids.
pub(crate) async fn resolve_games<'a>(
    store: &dyn CatalogStore,
    ids: impl IntoIterator<Item = &'a EntityId>,
) -> Result<Vec<GameResponse>, ServiceError> {
    let mut games = Vec::new();
    for id in ids {
        match store.find_game(id.clone()).await? {
            Some(game) => games.push(game.into()),
            None => debug!(game_id = %id, "skipping dangling game reference"),
        }
    }
    Ok(games)
}

/// Add the game to `list` when absent, remove it when present.
pub async fn toggle_membership(
    state: &SharedState,
    user_id: &str,
    list: CollectionList,
    request: CollectionToggleRequest,
) -> Result<CollectionToggleResponse, ServiceError> {
    request.validate()?;
    let user_id = parse_id(user_id)?;
    let game_id = parse_id(&required(request.game_id, "game_id")?)?;
    let store = state.require_catalog_store().await?;

    let _guard = state.locks().lock(LockScope::User, &user_id).await;
    let mut user = load_user(store.as_ref(), &user_id).await?;
    let member = user.toggle_in(list, &game_id);
    user.updated_at = SystemTime::now();
    let ids = ids_of(&user, list);
    store_user(store.as_ref(), user).await?;

    debug!(
        user_id = %user_id,
        game_id = %game_id,
        list = list.field_name(),
        member,
        "collection toggled"
    );
    Ok(CollectionToggleResponse { member, list: ids })
}

/// Remove the game from `list`. Removing an absent game is not an error.
pub async fn remove_from_list(
    state: &SharedState,
    user_id: &str,
    list: CollectionList,
    game_id: &str,
) -> Result<CollectionRemoveResponse, ServiceError> {
    let user_id = parse_id(user_id)?;
    let game_id = parse_id(game_id)?;
    let store = state.require_catalog_store().await?;

    let _guard = state.locks().lock(LockScope::User, &user_id).await;
    let mut user = load_user(store.as_ref(), &user_id).await?;
    let removed = user.remove_from(list, &game_id);
    let ids = ids_of(&user, list);
    if removed {
        user.updated_at = SystemTime::now();
        store_user(store.as_ref(), user).await?;
    }

    Ok(CollectionRemoveResponse { removed, list: ids })
}

/// Games of one collection, resolved against the catalogue.
pub async fn list_games(
    state: &SharedState,
    user_id: &str,
    list: CollectionList,
) -> Result<Vec<GameResponse>, ServiceError> {
    let user_id = parse_id(user_id)?;
    let store = state.require_catalog_store().await?;
    let user = load_user(store.as_ref(), &user_id).await?;
    resolve_games(store.as_ref(), user.collection(list)).await
}

/// Record the hours played on a game, replacing any previous value.
pub async fn set_played_hours(
    state: &SharedState,
    user_id: &str,
    request: PlayedHoursRequest,
) -> Result<PlayedHoursResponse, ServiceError> {
    request.validate()?;
    let user_id = parse_id(user_id)?;
    let game_id = parse_id(&required(request.game_id, "game_id")?)?;
    let hours = required(request.hours, "hours")?;
    if !hours.is_finite() {
        return Err(ServiceError::InvalidInput(
            "hours must be a finite number".into(),
        ));
    }
    let store = state.require_catalog_store().await?;

    let _guard = state.locks().lock(LockScope::User, &user_id).await;
    let mut user = load_user(store.as_ref(), &user_id).await?;
    user.played_hours.insert(game_id.clone(), hours);
    user.updated_at = SystemTime::now();
    store_user(store.as_ref(), user).await?;

    debug!(user_id = %user_id, game_id = %game_id, hours, "played hours recorded");
    Ok(PlayedHoursResponse {
        game_id: game_id.to_string(),
        hours,
    })
}

/// Hours played on a game, zero when nothing was recorded.
pub async fn get_played_hours(
    state: &SharedState,
    user_id: &str,
    game_id: &str,
) -> Result<PlayedHoursResponse, ServiceError> {
    let user_id = parse_id(user_id)?;
    let game_id = parse_id(game_id)?;
    let store = state.require_catalog_store().await?;
    let user = load_user(store.as_ref(), &user_id).await?;

    Ok(PlayedHoursResponse {
        hours: user.hours_for(&game_id),
        game_id: game_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use indexmap::{IndexMap, IndexSet};

    use super::*;
    use crate::{
        dao::{catalog_store::memory::InMemoryCatalogStore, models::GameEntity},
        state::test_support::memory_state,
    };

    async fn seed_user(store: &InMemoryCatalogStore) -> EntityId {
        let now = SystemTime::now();
        let user = UserEntity {
            id: EntityId::generate(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "hash".into(),
            user_name: "ana".into(),
            avatar: "avatar.png".into(),
            wishlist: IndexSet::new(),
            favorites: IndexSet::new(),
            completed_games: IndexSet::new(),
            played_hours: IndexMap::new(),
            created_at: now,
            updated_at: now,
        };
        store.insert_user(user).await.unwrap().id
    }

    async fn seed_game(store: &InMemoryCatalogStore, title: &str) -> EntityId {
        let now = SystemTime::now();
        let game = GameEntity {
            id: EntityId::generate(),
            title: title.into(),
            genre: None,
            platform: None,
            image: None,
            banner: None,
            description: None,
            price: None,
            downloads: None,
            completed: false,
            rating: 0.0,
            reviews: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        store.insert_game(game).await.unwrap().id
    }

    fn toggle(game_id: &EntityId) -> CollectionToggleRequest {
        CollectionToggleRequest {
            game_id: Some(game_id.to_string()),
        }
    }

    #[tokio::test]
    async fn membership_alternates() {
        let (state, store) = memory_state().await;
        let user_id = seed_user(&store).await;
        let game_id = EntityId::generate();

        for expected in [true, false, true] {
            let response = toggle_membership(
                &state,
                user_id.as_str(),
                CollectionList::Favorites,
                toggle(&game_id),
            )
            .await
            .unwrap();
            assert_eq!(response.member, expected);
            assert_eq!(response.list.len(), usize::from(expected));
        }
    }

    #[tokio::test]
    async fn lists_are_independent() {
        let (state, store) = memory_state().await;
        let user_id = seed_user(&store).await;
        let game_id = EntityId::generate();

        toggle_membership(
            &state,
            user_id.as_str(),
            CollectionList::Wishlist,
            toggle(&game_id),
        )
        .await
        .unwrap();

        let user = store.find_user(user_id.clone()).await.unwrap().unwrap();
        assert!(user.wishlist.contains(&game_id));
        assert!(user.favorites.is_empty());
        assert!(user.completed_games.is_empty());
    }

    #[tokio::test]
    async fn toggle_rejects_unknown_user_and_bad_game_id() {
        let (state, store) = memory_state().await;
        let user_id = seed_user(&store).await;

        let unknown = toggle_membership(
            &state,
            EntityId::generate().as_str(),
            CollectionList::Wishlist,
            toggle(&EntityId::generate()),
        )
        .await;
        assert!(matches!(unknown, Err(ServiceError::NotFound(_))));

        let missing = toggle_membership(
            &state,
            user_id.as_str(),
            CollectionList::Wishlist,
            CollectionToggleRequest::default(),
        )
        .await;
        assert!(matches!(missing, Err(ServiceError::InvalidInput(_))));

        let malformed = toggle_membership(
            &state,
            user_id.as_str(),
            CollectionList::Wishlist,
            CollectionToggleRequest {
                game_id: Some("zzz".into()),
            },
        )
        .await;
        assert!(matches!(malformed, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn removal_is_idempotent() {
        let (state, store) = memory_state().await;
        let user_id = seed_user(&store).await;
        let game_id = EntityId::generate();
        toggle_membership(
            &state,
            user_id.as_str(),
            CollectionList::CompletedGames,
            toggle(&game_id),
        )
        .await
        .unwrap();

        let first = remove_from_list(
            &state,
            user_id.as_str(),
            CollectionList::CompletedGames,
            game_id.as_str(),
        )
        .await
        .unwrap();
        assert!(first.removed);
        let second = remove_from_list(
            &state,
            user_id.as_str(),
            CollectionList::CompletedGames,
            game_id.as_str(),
        )
        .await
        .unwrap();
        assert!(!second.removed);
        assert!(second.list.is_empty());
    }

    #[tokio::test]
    async fn listed_games_skip_dangling_ids() {
        let (state, store) = memory_state().await;
        let user_id = seed_user(&store).await;
        let kept = seed_game(&store, "Celeste").await;
        let dropped = seed_game(&store, "Braid").await;

        for game_id in [&kept, &dropped] {
            toggle_membership(
                &state,
                user_id.as_str(),
                CollectionList::Wishlist,
                toggle(game_id),
            )
            .await
            .unwrap();
        }
        store.delete_game(dropped.clone()).await.unwrap();

        let games = list_games(&state, user_id.as_str(), CollectionList::Wishlist)
            .await
            .unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].summary.title, "Celeste");

        let user = store.find_user(user_id).await.unwrap().unwrap();
        assert_eq!(user.wishlist.len(), 2);
    }

    #[tokio::test]
    async fn played_hours_overwrite_and_default_to_zero() {
        let (state, store) = memory_state().await;
        let user_id = seed_user(&store).await;
        let game_id = EntityId::generate();

        let before = get_played_hours(&state, user_id.as_str(), game_id.as_str())
            .await
            .unwrap();
        assert_eq!(before.hours, 0.0);

        for hours in [5.0, 2.0] {
            set_played_hours(
                &state,
                user_id.as_str(),
                PlayedHoursRequest {
                    game_id: Some(game_id.to_string()),
                    hours: Some(hours),
                },
            )
            .await
            .unwrap();
        }

        let after = get_played_hours(&state, user_id.as_str(), game_id.as_str())
            .await
            .unwrap();
        assert_eq!(after.hours, 2.0);
    }

    #[tokio::test]
    async fn negative_or_missing_hours_are_rejected() {
        let (state, store) = memory_state().await;
        let user_id = seed_user(&store).await;

        let negative = set_played_hours(
            &state,
            user_id.as_str(),
            PlayedHoursRequest {
                game_id: Some(EntityId::generate().to_string()),
                hours: Some(-3.0),
            },
        )
        .await;
        assert!(matches!(negative, Err(ServiceError::InvalidInput(_))));

        let missing = set_played_hours(
            &state,
            user_id.as_str(),
            PlayedHoursRequest {
                game_id: Some(EntityId::generate().to_string()),
                hours: None,
            },
        )
        .await;
        assert!(matches!(missing, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn concurrent_toggles_on_distinct_games_are_all_kept() {
        let (state, store) = memory_state().await;
        let user_id = seed_user(&store).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let state = state.clone();
            let user_id = user_id.clone();
            handles.push(tokio::spawn(async move {
                toggle_membership(
                    &state,
                    user_id.as_str(),
                    CollectionList::Favorites,
                    toggle(&EntityId::generate()),
                )
                .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().member);
        }

        let user = store.find_user(user_id).await.unwrap().unwrap();
        assert_eq!(user.favorites.len(), 8);
    }
}
