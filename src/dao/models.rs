use std::time::SystemTime;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::id::EntityId;

/// Catalogue entry for a video game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: EntityId,
    /// Display title (required).
    pub title: String,
    pub genre: Option<String>,
    pub platform: Option<String>,
    /// Cover image URL.
    pub image: Option<String>,
    /// Banner image URL.
    pub banner: Option<String>,
    pub description: Option<String>,
    /// List price, non-negative.
    pub price: Option<f64>,
    /// Download counter as reported by the catalogue source.
    pub downloads: Option<u64>,
    /// Catalogue-level completion flag, unrelated to users' completed lists.
    pub completed: bool,
    /// Mean score of every review pointing at this game, 0 without reviews.
    pub rating: f64,
    /// Review ids in insertion order, newest last.
    pub reviews: Vec<EntityId>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

/// Editable subset of a game. Derived fields (`rating`, `reviews`) are absent on purpose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamePatch {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub platform: Option<String>,
    pub image: Option<String>,
    pub banner: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub downloads: Option<u64>,
    pub completed: Option<bool>,
}

impl GamePatch {
    /// Apply every provided field onto `game`.
    pub fn apply_to(&self, game: &mut GameEntity) {
        if let Some(title) = &self.title {
            game.title = title.clone();
        }
        if let Some(genre) = &self.genre {
            game.genre = Some(genre.clone());
        }
        if let Some(platform) = &self.platform {
            game.platform = Some(platform.clone());
        }
        if let Some(image) = &self.image {
            game.image = Some(image.clone());
        }
        if let Some(banner) = &self.banner {
            game.banner = Some(banner.clone());
        }
        if let Some(description) = &self.description {
            game.description = Some(description.clone());
        }
        if let Some(price) = self.price {
            game.price = Some(price);
        }
        if let Some(downloads) = self.downloads {
            game.downloads = Some(downloads);
        }
        if let Some(completed) = self.completed {
            game.completed = completed;
        }
    }

    /// True when the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A user review attached to exactly one game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewEntity {
    pub id: EntityId,
    /// Parent game. Never changes after creation.
    pub game_id: EntityId,
    /// Author display name as supplied by the client.
    pub user_name: String,
    pub title: String,
    pub body: String,
    /// Score in `[0, 5]`.
    pub score: f64,
    /// Like counter, kept in step with `liked_by`.
    pub likes: u64,
    /// Anonymous dislike counter; only ever grows.
    pub dislikes: u64,
    /// User names that currently like the review.
    pub liked_by: IndexSet<String>,
    /// Thread in the order comments were added.
    pub comments: Vec<CommentEntity>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl ReviewEntity {
    /// Flip the like of `user_name`, returning whether the user likes the review afterwards.
    ///
    /// `likes` never drops below zero even when it drifted from `liked_by`.
    pub fn toggle_like(&mut self, user_name: &str) -> bool {
        if self.liked_by.shift_remove(user_name) {
            self.likes = self.likes.saturating_sub(1);
            false
        } else {
            self.liked_by.insert(user_name.to_owned());
            self.likes += 1;
            true
        }
    }
}

/// Comment appended under a review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentEntity {
    /// Identifier unique within the review.
    pub id: Uuid,
    pub user_name: String,
    /// Avatar URL of the author, when the client sent one.
    pub user_avatar: Option<String>,
    pub text: String,
    pub created_at: SystemTime,
}

/// Filter accepted by review lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    /// Restrict to the reviews of one game.
    pub game_id: Option<EntityId>,
}

impl ReviewFilter {
    /// Filter selecting the reviews of `game_id`.
    pub fn for_game(game_id: EntityId) -> Self {
        Self {
            game_id: Some(game_id),
        }
    }

    /// Whether `review` passes the filter.
    pub fn matches(&self, review: &ReviewEntity) -> bool {
        self.game_id
            .as_ref()
            .is_none_or(|game_id| &review.game_id == game_id)
    }
}

/// The three game collections every user owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionList {
    Wishlist,
    Favorites,
    CompletedGames,
}

impl CollectionList {
    /// Field name used for this list in persisted documents.
    pub fn field_name(self) -> &'static str {
        match self {
            CollectionList::Wishlist => "wishlist",
            CollectionList::Favorites => "favorites",
            CollectionList::CompletedGames => "completed_games",
        }
    }
}

/// Registered user together with their game collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserEntity {
    pub id: EntityId,
    pub name: String,
    /// Login email, unique across users.
    pub email: String,
    /// Credential hash in PHC string format. Never the plaintext.
    pub password_hash: String,
    /// Public handle, unique across users.
    pub user_name: String,
    pub avatar: String,
    pub wishlist: IndexSet<EntityId>,
    pub favorites: IndexSet<EntityId>,
    pub completed_games: IndexSet<EntityId>,
    /// Hours played per game. Absent entries mean zero.
    pub played_hours: IndexMap<EntityId, f64>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl UserEntity {
    /// Borrow one of the user's collections.
    pub fn collection(&self, list: CollectionList) -> &IndexSet<EntityId> {
        match list {
            CollectionList::Wishlist => &self.wishlist,
            CollectionList::Favorites => &self.favorites,
            CollectionList::CompletedGames => &self.completed_games,
        }
    }

    fn collection_mut(&mut self, list: CollectionList) -> &mut IndexSet<EntityId> {
        match list {
            CollectionList::Wishlist => &mut self.wishlist,
            CollectionList::Favorites => &mut self.favorites,
            CollectionList::CompletedGames => &mut self.completed_games,
        }
    }

    /// Add `game_id` to `list` when absent, remove it when present.
    /// Returns whether the game is a member afterwards.
    pub fn toggle_in(&mut self, list: CollectionList, game_id: &EntityId) -> bool {
        let collection = self.collection_mut(list);
        if collection.shift_remove(game_id) {
            false
        } else {
            collection.insert(game_id.clone());
            true
        }
    }

    /// Remove `game_id` from `list`, returning whether it was present.
    pub fn remove_from(&mut self, list: CollectionList, game_id: &EntityId) -> bool {
        self.collection_mut(list).shift_remove(game_id)
    }

    /// Hours recorded for `game_id`, zero when nothing was recorded.
    pub fn hours_for(&self, game_id: &EntityId) -> f64 {
        self.played_hours.get(game_id).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review() -> ReviewEntity {
        let now = SystemTime::now();
        ReviewEntity {
            id: EntityId::generate(),
            game_id: EntityId::generate(),
            user_name: "ana".into(),
            title: String::new(),
            body: String::new(),
            score: 4.0,
            likes: 0,
            dislikes: 0,
            liked_by: IndexSet::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn user() -> UserEntity {
        let now = SystemTime::now();
        UserEntity {
            id: EntityId::generate(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "$argon2id$stub".into(),
            user_name: "ana".into(),
            avatar: "https://example.com/avatar.png".into(),
            wishlist: IndexSet::new(),
            favorites: IndexSet::new(),
            completed_games: IndexSet::new(),
            played_hours: IndexMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn like_toggle_twice_restores_state() {
        let mut review = review();
        assert!(review.toggle_like("bob"));
        assert_eq!(review.likes, 1);
        assert!(!review.toggle_like("bob"));
        assert_eq!(review.likes, 0);
        assert!(review.liked_by.is_empty());
    }

    #[test]
    fn like_count_never_goes_negative() {
        let mut review = review();
        review.liked_by.insert("bob".into());
        assert!(!review.toggle_like("bob"));
        assert_eq!(review.likes, 0);
    }

    #[test]
    fn collection_toggle_alternates_membership() {
        let mut user = user();
        let game = EntityId::generate();
        for list in [
            CollectionList::Wishlist,
            CollectionList::Favorites,
            CollectionList::CompletedGames,
        ] {
            assert!(user.toggle_in(list, &game));
            assert!(user.collection(list).contains(&game));
            assert!(!user.toggle_in(list, &game));
            assert!(user.collection(list).is_empty());
        }
    }

    #[test]
    fn lists_are_independent() {
        let mut user = user();
        let game = EntityId::generate();
        user.toggle_in(CollectionList::Favorites, &game);
        assert!(user.wishlist.is_empty());
        assert!(user.completed_games.is_empty());
    }

    #[test]
    fn missing_hours_default_to_zero() {
        let mut user = user();
        let game = EntityId::generate();
        assert_eq!(user.hours_for(&game), 0.0);
        user.played_hours.insert(game.clone(), 12.5);
        assert_eq!(user.hours_for(&game), 12.5);
    }

    #[test]
    fn patch_leaves_derived_fields_alone() {
        let now = SystemTime::now();
        let mut game = GameEntity {
            id: EntityId::generate(),
            title: "Celeste".into(),
            genre: None,
            platform: None,
            image: None,
            banner: None,
            description: None,
            price: None,
            downloads: None,
            completed: false,
            rating: 4.5,
            reviews: vec![EntityId::generate()],
            created_at: now,
            updated_at: now,
        };
        let patch = GamePatch {
            genre: Some("Platformer".into()),
            completed: Some(true),
            ..GamePatch::default()
        };
        patch.apply_to(&mut game);
        assert_eq!(game.genre.as_deref(), Some("Platformer"));
        assert!(game.completed);
        assert_eq!(game.rating, 4.5);
        assert_eq!(game.reviews.len(), 1);
        assert!(GamePatch::default().is_empty());
    }
}
