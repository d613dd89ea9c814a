//! Catalogue Models
//! Mission: Anime, reviews and favourites as stored and as served

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Anime entry with its aggregated rating
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Anime {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub release_date: Option<NaiveDate>,
    pub created_by: Option<i64>,
    /// Mean review rating, 0 when unrated.
    pub average_rating: f64,
}

/// Body for creating or replacing an anime
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnimeInput {
    pub title: String,
    pub description: String,
    pub genre: String,
    pub release_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub anime_id: i64,
    pub user_id: i64,
    pub rating: f64,
    pub content: String,
    pub created_at: String,
}

/// Review joined with the anime it is about
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithAnime {
    pub id: i64,
    pub anime_id: i64,
    pub anime_title: String,
    pub genre: String,
    pub release_date: Option<NaiveDate>,
    pub rating: f64,
    pub content: String,
}

/// Body for adding or editing a review
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReviewInput {
    pub rating: f64,
    pub content: String,
}

impl ReviewInput {
    pub const MIN_RATING: f64 = 1.0;
    pub const MAX_RATING: f64 = 5.0;

    pub fn rating_in_range(&self) -> bool {
        (Self::MIN_RATING..=Self::MAX_RATING).contains(&self.rating)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: i64,
    pub anime_id: i64,
    pub anime_title: String,
}

/// Favourite joined with the anime details shown on the favourites page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteWithAnime {
    pub id: i64,
    pub anime_id: i64,
    pub anime_title: String,
    pub genre: String,
    pub description: String,
    pub release_date: Option<NaiveDate>,
    pub rating: f64,
}
