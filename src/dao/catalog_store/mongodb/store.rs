use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{DateTime, Document, doc},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoGameDocument, MongoReviewDocument, MongoUserDocument, doc_id, game_patch_document,
        object_id, review_filter_document,
    },
};
use crate::dao::{
    catalog_store::CatalogStore,
    id::EntityId,
    models::{GameEntity, GamePatch, ReviewEntity, ReviewFilter, UserEntity},
    storage::StorageResult,
};

const GAME_COLLECTION_NAME: &str = "games";
const REVIEW_COLLECTION_NAME: &str = "reviews";
const USER_COLLECTION_NAME: &str = "users";

const USER_EMAIL_INDEX: &str = "user_email_idx";
const USER_NAME_INDEX: &str = "user_name_idx";
const REVIEW_GAME_INDEX: &str = "review_game_idx";

const DUPLICATE_KEY_CODE: i32 = 11000;

/// [`CatalogStore`] backed by the `games`, `reviews` and `users` collections.
#[derive(Clone)]
pub struct MongoCatalogStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

/// Map a duplicate-key write failure onto the unique field it violated.
fn duplicate_field(err: &MongoError) -> Option<&'static str> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE =>
        {
            if write_error.message.contains(USER_NAME_INDEX) {
                Some("user_name")
            } else {
                Some("email")
            }
        }
        _ => None,
    }
}

impl MongoCatalogStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let users = self.users().await;
        for (index, field) in [(USER_EMAIL_INDEX, "email"), (USER_NAME_INDEX, "user_name")] {
            let mut keys = Document::new();
            keys.insert(field, 1);
            let model = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(index.to_owned()))
                        .unique(Some(true))
                        .build(),
                )
                .build();
            users
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: USER_COLLECTION_NAME,
                    index,
                    source,
                })?;
        }

        let review_index = IndexModel::builder()
            .keys(doc! { "game_id": 1 })
            .options(
                IndexOptions::builder()
                    .name(Some(REVIEW_GAME_INDEX.to_owned()))
                    .build(),
            )
            .build();
        self.reviews()
            .await
            .create_index(review_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: REVIEW_COLLECTION_NAME,
                index: REVIEW_GAME_INDEX,
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn games(&self) -> Collection<MongoGameDocument> {
        self.database()
            .await
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn reviews(&self) -> Collection<MongoReviewDocument> {
        self.database()
            .await
            .collection::<MongoReviewDocument>(REVIEW_COLLECTION_NAME)
    }

    async fn users(&self) -> Collection<MongoUserDocument> {
        self.database()
            .await
            .collection::<MongoUserDocument>(USER_COLLECTION_NAME)
    }

    async fn insert_game(&self, game: GameEntity) -> MongoResult<GameEntity> {
        let document: MongoGameDocument = game.clone().into();
        self.games()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::Write {
                kind: "game",
                id: game.id.clone(),
                source,
            })?;
        Ok(game)
    }

    async fn find_game(&self, id: EntityId) -> MongoResult<Option<GameEntity>> {
        let document = self
            .games()
            .await
            .find_one(doc_id(&id))
            .await
            .map_err(|source| MongoDaoError::Load {
                kind: "game",
                id: id.to_string(),
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn list_games(&self) -> MongoResult<Vec<GameEntity>> {
        let documents: Vec<MongoGameDocument> = self
            .games()
            .await
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await
            .map_err(|source| MongoDaoError::List {
                kind: "games",
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::List {
                kind: "games",
                source,
            })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn update_game(&self, id: EntityId, patch: GamePatch) -> MongoResult<Option<GameEntity>> {
        let document = self
            .games()
            .await
            .find_one_and_update(doc_id(&id), game_patch_document(&patch))
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::Write {
                kind: "game",
                id: id.clone(),
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn delete_game(&self, id: EntityId) -> MongoResult<Option<GameEntity>> {
        let document = self
            .games()
            .await
            .find_one_and_delete(doc_id(&id))
            .await
            .map_err(|source| MongoDaoError::Write {
                kind: "game",
                id: id.clone(),
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn replace_games(&self, games: Vec<GameEntity>) -> MongoResult<usize> {
        let collection = self.games().await;
        collection
            .delete_many(doc! {})
            .await
            .map_err(|source| MongoDaoError::Replace {
                kind: "games",
                source,
            })?;
        if games.is_empty() {
            return Ok(0);
        }

        let documents: Vec<MongoGameDocument> = games.into_iter().map(Into::into).collect();
        let result = collection
            .insert_many(&documents)
            .await
            .map_err(|source| MongoDaoError::Replace {
                kind: "games",
                source,
            })?;
        Ok(result.inserted_ids.len())
    }

    /// Apply a single-document update to a game and report whether it matched.
    async fn update_game_fields(
        &self,
        game_id: EntityId,
        update: Document,
    ) -> MongoResult<bool> {
        let result = self
            .games()
            .await
            .update_one(doc_id(&game_id), update)
            .await
            .map_err(|source| MongoDaoError::Write {
                kind: "game",
                id: game_id.clone(),
                source,
            })?;
        Ok(result.matched_count > 0)
    }

    async fn insert_review(&self, review: ReviewEntity) -> MongoResult<ReviewEntity> {
        let document: MongoReviewDocument = review.clone().into();
        self.reviews()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::Write {
                kind: "review",
                id: review.id.clone(),
                source,
            })?;
        Ok(review)
    }

    async fn find_review(&self, id: EntityId) -> MongoResult<Option<ReviewEntity>> {
        let document = self
            .reviews()
            .await
            .find_one(doc_id(&id))
            .await
            .map_err(|source| MongoDaoError::Load {
                kind: "review",
                id: id.to_string(),
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn find_reviews(&self, filter: ReviewFilter) -> MongoResult<Vec<ReviewEntity>> {
        let documents: Vec<MongoReviewDocument> = self
            .reviews()
            .await
            .find(review_filter_document(&filter))
            .await
            .map_err(|source| MongoDaoError::List {
                kind: "reviews",
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::List {
                kind: "reviews",
                source,
            })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn save_review(&self, review: ReviewEntity) -> MongoResult<bool> {
        let id = review.id.clone();
        let document: MongoReviewDocument = review.into();
        let result = self
            .reviews()
            .await
            .replace_one(doc_id(&id), &document)
            .await
            .map_err(|source| MongoDaoError::Write {
                kind: "review",
                id,
                source,
            })?;
        Ok(result.matched_count > 0)
    }

    async fn delete_review(&self, id: EntityId) -> MongoResult<Option<ReviewEntity>> {
        let document = self
            .reviews()
            .await
            .find_one_and_delete(doc_id(&id))
            .await
            .map_err(|source| MongoDaoError::Write {
                kind: "review",
                id: id.clone(),
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn insert_user(&self, user: UserEntity) -> MongoResult<UserEntity> {
        let document: MongoUserDocument = user.clone().into();
        self.users()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| match duplicate_field(&source) {
                Some(field) => MongoDaoError::Duplicate { field, source },
                None => MongoDaoError::Write {
                    kind: "user",
                    id: user.id.clone(),
                    source,
                },
            })?;
        Ok(user)
    }

    async fn find_user_where(
        &self,
        filter: Document,
        label: String,
    ) -> MongoResult<Option<UserEntity>> {
        let document = self
            .users()
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::Load {
                kind: "user",
                id: label,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn save_user(&self, user: UserEntity) -> MongoResult<bool> {
        let id = user.id.clone();
        let document: MongoUserDocument = user.into();
        let result = self
            .users()
            .await
            .replace_one(doc_id(&id), &document)
            .await
            .map_err(|source| match duplicate_field(&source) {
                Some(field) => MongoDaoError::Duplicate { field, source },
                None => MongoDaoError::Write {
                    kind: "user",
                    id: id.clone(),
                    source,
                },
            })?;
        Ok(result.matched_count > 0)
    }
}

impl CatalogStore for MongoCatalogStore {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_game(game).await.map_err(Into::into) })
    }

    fn find_game(&self, id: EntityId) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(id).await.map_err(Into::into) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_games().await.map_err(Into::into) })
    }

    fn update_game(
        &self,
        id: EntityId,
        patch: GamePatch,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.update_game(id, patch).await.map_err(Into::into) })
    }

    fn delete_game(&self, id: EntityId) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.delete_game(id).await.map_err(Into::into) })
    }

    fn replace_games(&self, games: Vec<GameEntity>) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        Box::pin(async move { store.replace_games(games).await.map_err(Into::into) })
    }

    fn push_game_review(
        &self,
        game_id: EntityId,
        review_id: EntityId,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let update = doc! {
                "$addToSet": { "reviews": object_id(&review_id) },
                "$set": { "updated_at": DateTime::now() },
            };
            store
                .update_game_fields(game_id, update)
                .await
                .map_err(Into::into)
        })
    }

    fn pull_game_review(
        &self,
        game_id: EntityId,
        review_id: EntityId,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let update = doc! {
                "$pull": { "reviews": object_id(&review_id) },
                "$set": { "updated_at": DateTime::now() },
            };
            store
                .update_game_fields(game_id, update)
                .await
                .map_err(Into::into)
        })
    }

    fn set_game_rating(
        &self,
        game_id: EntityId,
        rating: f64,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let update = doc! {
                "$set": { "rating": rating, "updated_at": DateTime::now() },
            };
            store
                .update_game_fields(game_id, update)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_review(
        &self,
        review: ReviewEntity,
    ) -> BoxFuture<'static, StorageResult<ReviewEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_review(review).await.map_err(Into::into) })
    }

    fn find_review(
        &self,
        id: EntityId,
    ) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_review(id).await.map_err(Into::into) })
    }

    fn find_reviews(
        &self,
        filter: ReviewFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<ReviewEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_reviews(filter).await.map_err(Into::into) })
    }

    fn save_review(&self, review: ReviewEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.save_review(review).await.map_err(Into::into) })
    }

    fn delete_review(
        &self,
        id: EntityId,
    ) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.delete_review(id).await.map_err(Into::into) })
    }

    fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<UserEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_user(user).await.map_err(Into::into) })
    }

    fn find_user(&self, id: EntityId) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let label = id.to_string();
            store
                .find_user_where(doc_id(&id), label)
                .await
                .map_err(Into::into)
        })
    }

    fn find_user_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_user_where(doc! { "email": email.as_str() }, email.clone())
                .await
                .map_err(Into::into)
        })
    }

    fn find_user_by_user_name(
        &self,
        user_name: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_user_where(doc! { "user_name": user_name.as_str() }, user_name.clone())
                .await
                .map_err(Into::into)
        })
    }

    fn save_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.save_user(user).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
