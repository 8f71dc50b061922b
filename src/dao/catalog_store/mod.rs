/// In-process backend.
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::id::EntityId;
use crate::dao::models::{GameEntity, GamePatch, ReviewEntity, ReviewFilter, UserEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the document store holding games, reviews and users.
///
/// Apart from [`CatalogStore::replace_games`], every method touches a single record and is
/// atomic for that record only.
/// Methods addressing a record by id return `None`/`false` when it does not exist.
pub trait CatalogStore: Send + Sync {
    /// Store a new game.
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>>;
    /// Look a game up by id.
    fn find_game(&self, id: EntityId) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Every game, ordered by id.
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Apply the fields set in `patch` and return the updated game.
    fn update_game(
        &self,
        id: EntityId,
        patch: GamePatch,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Remove a game and return it. Reviews pointing at it are left untouched.
    fn delete_game(&self, id: EntityId) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Remove every game and store `games` in their place, returning how many were stored.
    fn replace_games(&self, games: Vec<GameEntity>) -> BoxFuture<'static, StorageResult<usize>>;
    /// Append `review_id` to the game's review references unless already present.
    fn push_game_review(
        &self,
        game_id: EntityId,
        review_id: EntityId,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Remove `review_id` from the game's review references.
    fn pull_game_review(
        &self,
        game_id: EntityId,
        review_id: EntityId,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Overwrite the game's aggregate rating.
    fn set_game_rating(
        &self,
        game_id: EntityId,
        rating: f64,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Store a new review.
    fn insert_review(&self, review: ReviewEntity)
    -> BoxFuture<'static, StorageResult<ReviewEntity>>;
    /// Look a review up by id.
    fn find_review(&self, id: EntityId)
    -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>>;
    /// Reviews matching `filter`, in no particular order.
    fn find_reviews(
        &self,
        filter: ReviewFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<ReviewEntity>>>;
    /// Replace a stored review with `review`.
    fn save_review(&self, review: ReviewEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Remove a review and return it.
    fn delete_review(
        &self,
        id: EntityId,
    ) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>>;

    /// Insert a user, failing with [`StorageError::Duplicate`](crate::dao::storage::StorageError)
    /// when the email or user name is taken.
    fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<UserEntity>>;
    /// Look a user up by id.
    fn find_user(&self, id: EntityId) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Look a user up by normalized email.
    fn find_user_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Look a user up by user name.
    fn find_user_by_user_name(
        &self,
        user_name: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Replace a stored user with `user`.
    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<bool>>;

    /// Cheap round trip proving the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Rebuild the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
