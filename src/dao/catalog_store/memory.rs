//! Process-local [`CatalogStore`] backed by concurrent hash maps.
//!
//! Used by the test-suite and by `STORE_BACKEND=memory` for local runs without MongoDB.

use std::{sync::Arc, time::SystemTime};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;

use crate::dao::{
    catalog_store::CatalogStore,
    id::EntityId,
    models::{GameEntity, GamePatch, ReviewEntity, ReviewFilter, UserEntity},
    storage::{StorageError, StorageResult},
};

/// Cheaply cloneable handle; clones share the same maps.
#[derive(Clone, Default)]
pub struct InMemoryCatalogStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    games: DashMap<EntityId, GameEntity>,
    reviews: DashMap<EntityId, ReviewEntity>,
    users: DashMap<EntityId, UserEntity>,
    users_by_email: DashMap<String, EntityId>,
    users_by_user_name: DashMap<String, EntityId>,
}

impl InMemoryCatalogStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryInner {
    fn insert_user(&self, user: UserEntity) -> StorageResult<UserEntity> {
        match self.users_by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => return Err(StorageError::duplicate("email")),
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
            }
        }

        match self.users_by_user_name.entry(user.user_name.clone()) {
            Entry::Occupied(_) => {
                self.users_by_email.remove(&user.email);
                return Err(StorageError::duplicate("user_name"));
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
            }
        }

        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn find_user_by_index(
        &self,
        index: &DashMap<String, EntityId>,
        key: &str,
    ) -> Option<UserEntity> {
        let id = index.get(key).map(|entry| entry.value().clone())?;
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    fn with_game<T>(&self, id: &EntityId, update: impl FnOnce(&mut GameEntity) -> T) -> Option<T> {
        self.games.get_mut(id).map(|mut game| {
            let outcome = update(game.value_mut());
            game.updated_at = SystemTime::now();
            outcome
        })
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.games.insert(game.id.clone(), game.clone());
            Ok(game)
        })
    }

    fn find_game(&self, id: EntityId) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.games.get(&id).map(|entry| entry.value().clone())) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut games: Vec<GameEntity> = inner
                .games
                .iter()
                .map(|entry| entry.value().clone())
                .collect();
            games.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(games)
        })
    }

    fn update_game(
        &self,
        id: EntityId,
        patch: GamePatch,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner.with_game(&id, |game| {
                patch.apply_to(game);
                game.clone()
            }))
        })
    }

    fn delete_game(&self, id: EntityId) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.games.remove(&id).map(|(_, game)| game)) })
    }

    fn replace_games(&self, games: Vec<GameEntity>) -> BoxFuture<'static, StorageResult<usize>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.games.clear();
            let count = games.len();
            for game in games {
                inner.games.insert(game.id.clone(), game);
            }
            Ok(count)
        })
    }

    fn push_game_review(
        &self,
        game_id: EntityId,
        review_id: EntityId,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .with_game(&game_id, |game| {
                    if !game.reviews.contains(&review_id) {
                        game.reviews.push(review_id);
                    }
                })
                .is_some())
        })
    }

    fn pull_game_review(
        &self,
        game_id: EntityId,
        review_id: EntityId,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .with_game(&game_id, |game| game.reviews.retain(|id| id != &review_id))
                .is_some())
        })
    }

    fn set_game_rating(
        &self,
        game_id: EntityId,
        rating: f64,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .with_game(&game_id, |game| game.rating = rating)
                .is_some())
        })
    }

    fn insert_review(
        &self,
        review: ReviewEntity,
    ) -> BoxFuture<'static, StorageResult<ReviewEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.reviews.insert(review.id.clone(), review.clone());
            Ok(review)
        })
    }

    fn find_review(
        &self,
        id: EntityId,
    ) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.reviews.get(&id).map(|entry| entry.value().clone())) })
    }

    fn find_reviews(
        &self,
        filter: ReviewFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<ReviewEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .reviews
                .iter()
                .filter(|entry| filter.matches(entry.value()))
                .map(|entry| entry.value().clone())
                .collect())
        })
    }

    fn save_review(&self, review: ReviewEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(match inner.reviews.get_mut(&review.id) {
                Some(mut stored) => {
                    *stored = review;
                    true
                }
                None => false,
            })
        })
    }

    fn delete_review(
        &self,
        id: EntityId,
    ) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.reviews.remove(&id).map(|(_, review)| review)) })
    }

    fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<UserEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.insert_user(user) })
    }

    fn find_user(&self, id: EntityId) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.users.get(&id).map(|entry| entry.value().clone())) })
    }

    fn find_user_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.find_user_by_index(&inner.users_by_email, &email)) })
    }

    fn find_user_by_user_name(
        &self,
        user_name: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner.find_user_by_index(&inner.users_by_user_name, &user_name))
        })
    }

    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(match inner.users.get_mut(&user.id) {
                Some(mut stored) => {
                    *stored = user;
                    true
                }
                None => false,
            })
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
