//! Anime catalogue: titles, reviews and favourites.

pub mod models;
pub mod store;

pub use models::{
    Anime, AnimeInput, Favorite, FavoriteWithAnime, Review, ReviewInput, ReviewWithAnime,
};
pub use store::{CatalogStore, FavoriteOutcome, ReviewOutcome};
