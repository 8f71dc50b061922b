use indexmap::IndexMap;
use mongodb::bson::{DateTime, Document, doc, oid::ObjectId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::{
    id::EntityId,
    models::{CommentEntity, GameEntity, GamePatch, ReviewEntity, ReviewFilter, UserEntity},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    title: String,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    banner: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    downloads: Option<i64>,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    reviews: Vec<ObjectId>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: object_id(&value.id),
            title: value.title,
            genre: value.genre,
            platform: value.platform,
            image: value.image,
            banner: value.banner,
            description: value.description,
            price: value.price,
            downloads: value.downloads.map(saturating_i64),
            completed: value.completed,
            rating: value.rating,
            reviews: value.reviews.iter().map(object_id).collect(),
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoGameDocument> for GameEntity {
    fn from(value: MongoGameDocument) -> Self {
        Self {
            id: value.id.into(),
            title: value.title,
            genre: value.genre,
            platform: value.platform,
            image: value.image,
            banner: value.banner,
            description: value.description,
            price: value.price,
            downloads: value.downloads.map(|count| count.max(0) as u64),
            completed: value.completed,
            rating: value.rating,
            reviews: value.reviews.into_iter().map(Into::into).collect(),
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCommentDocument {
    id: Uuid,
    user_name: String,
    #[serde(default)]
    user_avatar: Option<String>,
    text: String,
    created_at: DateTime,
}

impl From<CommentEntity> for MongoCommentDocument {
    fn from(value: CommentEntity) -> Self {
        Self {
            id: value.id,
            user_name: value.user_name,
            user_avatar: value.user_avatar,
            text: value.text,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoCommentDocument> for CommentEntity {
    fn from(value: MongoCommentDocument) -> Self {
        Self {
            id: value.id,
            user_name: value.user_name,
            user_avatar: value.user_avatar,
            text: value.text,
            created_at: value.created_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoReviewDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    game_id: ObjectId,
    user_name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    score: f64,
    #[serde(default)]
    likes: i64,
    #[serde(default)]
    dislikes: i64,
    #[serde(default)]
    liked_by: Vec<String>,
    #[serde(default)]
    comments: Vec<MongoCommentDocument>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<ReviewEntity> for MongoReviewDocument {
    fn from(value: ReviewEntity) -> Self {
        Self {
            id: object_id(&value.id),
            game_id: object_id(&value.game_id),
            user_name: value.user_name,
            title: value.title,
            body: value.body,
            score: value.score,
            likes: saturating_i64(value.likes),
            dislikes: saturating_i64(value.dislikes),
            liked_by: value.liked_by.into_iter().collect(),
            comments: value.comments.into_iter().map(Into::into).collect(),
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoReviewDocument> for ReviewEntity {
    fn from(value: MongoReviewDocument) -> Self {
        Self {
            id: value.id.into(),
            game_id: value.game_id.into(),
            user_name: value.user_name,
            title: value.title,
            body: value.body,
            score: value.score,
            likes: value.likes.max(0) as u64,
            dislikes: value.dislikes.max(0) as u64,
            liked_by: value.liked_by.into_iter().collect(),
            comments: value.comments.into_iter().map(Into::into).collect(),
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    email: String,
    password_hash: String,
    user_name: String,
    avatar: String,
    #[serde(default)]
    wishlist: Vec<ObjectId>,
    #[serde(default)]
    favorites: Vec<ObjectId>,
    #[serde(default)]
    completed_games: Vec<ObjectId>,
    /// Keyed by the game id in hex form; BSON documents only allow string keys.
    #[serde(default)]
    played_hours: IndexMap<String, f64>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<UserEntity> for MongoUserDocument {
    fn from(value: UserEntity) -> Self {
        Self {
            id: object_id(&value.id),
            name: value.name,
            email: value.email,
            password_hash: value.password_hash,
            user_name: value.user_name,
            avatar: value.avatar,
            wishlist: value.wishlist.iter().map(object_id).collect(),
            favorites: value.favorites.iter().map(object_id).collect(),
            completed_games: value.completed_games.iter().map(object_id).collect(),
            played_hours: value
                .played_hours
                .into_iter()
                .map(|(game_id, hours)| (String::from(game_id), hours))
                .collect(),
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoUserDocument> for UserEntity {
    fn from(value: MongoUserDocument) -> Self {
        Self {
            id: value.id.into(),
            name: value.name,
            email: value.email,
            password_hash: value.password_hash,
            user_name: value.user_name,
            avatar: value.avatar,
            wishlist: value.wishlist.into_iter().map(Into::into).collect(),
            favorites: value.favorites.into_iter().map(Into::into).collect(),
            completed_games: value.completed_games.into_iter().map(Into::into).collect(),
            // Keys that are not ids cannot be addressed through the API; drop them.
            played_hours: value
                .played_hours
                .into_iter()
                .filter_map(|(key, hours)| EntityId::parse(&key).ok().map(|id| (id, hours)))
                .collect(),
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

pub fn object_id(id: &EntityId) -> ObjectId {
    id.into()
}

pub fn doc_id(id: &EntityId) -> Document {
    doc! {"_id": object_id(id)}
}

pub fn review_filter_document(filter: &ReviewFilter) -> Document {
    match &filter.game_id {
        Some(game_id) => doc! {"game_id": object_id(game_id)},
        None => doc! {},
    }
}

/// `$set` document for the fields carried by `patch`, stamped with a fresh `updated_at`.
pub fn game_patch_document(patch: &GamePatch) -> Document {
    let mut set = Document::new();
    if let Some(title) = &patch.title {
        set.insert("title", title.as_str());
    }
    if let Some(genre) = &patch.genre {
        set.insert("genre", genre.as_str());
    }
    if let Some(platform) = &patch.platform {
        set.insert("platform", platform.as_str());
    }
    if let Some(image) = &patch.image {
        set.insert("image", image.as_str());
    }
    if let Some(banner) = &patch.banner {
        set.insert("banner", banner.as_str());
    }
    if let Some(description) = &patch.description {
        set.insert("description", description.as_str());
    }
    if let Some(price) = patch.price {
        set.insert("price", price);
    }
    if let Some(downloads) = patch.downloads {
        set.insert("downloads", saturating_i64(downloads));
    }
    if let Some(completed) = patch.completed {
        set.insert("completed", completed);
    }
    set.insert("updated_at", DateTime::now());
    doc! {"$set": set}
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use indexmap::IndexSet;

    use super::*;

    #[test]
    fn user_document_keeps_collections_and_hours() {
        let now = SystemTime::now();
        let game_id = EntityId::generate();
        let mut played_hours = IndexMap::new();
        played_hours.insert(game_id.clone(), 12.5);
        let user = UserEntity {
            id: EntityId::generate(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "hash".into(),
            user_name: "ana".into(),
            avatar: "avatar.png".into(),
            wishlist: IndexSet::from([game_id.clone()]),
            favorites: IndexSet::new(),
            completed_games: IndexSet::new(),
            played_hours,
            created_at: now,
            updated_at: now,
        };

        let document = MongoUserDocument::from(user.clone());
        let restored = UserEntity::from(document);
        assert_eq!(restored.id, user.id);
        assert_eq!(restored.wishlist, user.wishlist);
        assert_eq!(restored.hours_for(&game_id), 12.5);
    }

    #[test]
    fn patch_document_sets_only_provided_fields() {
        let patch = GamePatch {
            title: Some("Celeste".into()),
            downloads: Some(u64::MAX),
            ..Default::default()
        };
        let update = game_patch_document(&patch);
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("title").unwrap(), "Celeste");
        assert_eq!(set.get_i64("downloads").unwrap(), i64::MAX);
        assert!(set.get("genre").is_none());
        assert!(set.contains_key("updated_at"));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(review_filter_document(&ReviewFilter::default()).is_empty());
        let game_id = EntityId::generate();
        let filter = review_filter_document(&ReviewFilter::for_game(game_id.clone()));
        assert_eq!(filter.get_object_id("game_id").unwrap(), object_id(&game_id));
    }
}
