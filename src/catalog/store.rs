//! Catalogue Storage
//! Mission: Anime, reviews and favourites in SQLite

use crate::catalog::models::{
    Anime, AnimeInput, Favorite, FavoriteWithAnime, Review, ReviewInput, ReviewWithAnime,
};
use crate::db::Database;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

const ANIME_SELECT: &str = "
    SELECT a.id, a.title, a.description, a.genre, a.release_date, a.created_by,
           COALESCE(AVG(r.rating), 0.0)
    FROM anime a
    LEFT JOIN reviews r ON r.anime_id = a.id";

const REVIEW_COLUMNS: &str = "id, anime_id, user_id, rating, content, created_at";

/// Result of adding a review
#[derive(Debug)]
pub enum ReviewOutcome {
    Added(Review),
    AnimeNotFound,
    /// The author has no account row, e.g. a token outliving a database reset.
    UserNotFound,
}

/// Result of adding a favourite
#[derive(Debug)]
pub enum FavoriteOutcome {
    Added(Favorite),
    AnimeNotFound,
    UserNotFound,
    AlreadyFavorite,
}

/// Catalogue storage sharing the application database
pub struct CatalogStore {
    db: Database,
}

impl CatalogStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn row_to_anime(row: &Row<'_>) -> rusqlite::Result<Anime> {
        Ok(Anime {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            genre: row.get(3)?,
            release_date: row.get(4)?,
            created_by: row.get(5)?,
            average_rating: row.get(6)?,
        })
    }

    fn row_to_review(row: &Row<'_>) -> rusqlite::Result<Review> {
        Ok(Review {
            id: row.get(0)?,
            anime_id: row.get(1)?,
            user_id: row.get(2)?,
            rating: row.get(3)?,
            content: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn anime_exists(conn: &Connection, id: i64) -> Result<bool> {
        let found = conn
            .query_row("SELECT 1 FROM anime WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn user_exists(conn: &Connection, id: i64) -> Result<bool> {
        let found = conn
            .query_row("SELECT 1 FROM users WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn find_anime(conn: &Connection, id: i64) -> Result<Option<Anime>> {
        let anime = conn
            .query_row(
                &format!("{ANIME_SELECT} WHERE a.id = ?1 GROUP BY a.id"),
                params![id],
                Self::row_to_anime,
            )
            .optional()?;
        Ok(anime)
    }

    fn find_review(conn: &Connection, id: i64) -> Result<Option<Review>> {
        let review = conn
            .query_row(
                &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1"),
                params![id],
                Self::row_to_review,
            )
            .optional()?;
        Ok(review)
    }

    // ----- anime -----

    /// All anime with their average rating
    pub fn list_anime(&self) -> Result<Vec<Anime>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(&format!("{ANIME_SELECT} GROUP BY a.id ORDER BY a.id"))?;
        let anime = stmt
            .query_map([], Self::row_to_anime)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list anime")?;
        Ok(anime)
    }

    pub fn get_anime(&self, id: i64) -> Result<Option<Anime>> {
        Self::find_anime(&self.db.lock(), id)
    }

    pub fn create_anime(&self, input: &AnimeInput, created_by: i64) -> Result<Anime> {
        let conn = self.db.lock();
        conn.execute(
            "INSERT INTO anime (title, description, genre, release_date, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                input.title,
                input.description,
                input.genre,
                input.release_date,
                created_by,
                Utc::now().to_rfc3339(),
            ],
        )
        .context("Failed to insert anime")?;

        let id = conn.last_insert_rowid();
        info!(anime_id = id, created_by, "🎬 Anime created");

        Self::find_anime(&conn, id)?.context("Inserted anime vanished")
    }

    /// Replace an anime's editable fields. `None` if it does not exist.
    pub fn update_anime(&self, id: i64, input: &AnimeInput) -> Result<Option<Anime>> {
        let conn = self.db.lock();
        let rows_affected = conn.execute(
            "UPDATE anime SET title = ?1, description = ?2, genre = ?3, release_date = ?4
             WHERE id = ?5",
            params![
                input.title,
                input.description,
                input.genre,
                input.release_date,
                id
            ],
        )?;

        if rows_affected == 0 {
            return Ok(None);
        }
        Self::find_anime(&conn, id)
    }

    /// Delete an anime together with its reviews and favourites.
    pub fn delete_anime(&self, id: i64) -> Result<bool> {
        let rows_affected = self
            .db
            .lock()
            .execute("DELETE FROM anime WHERE id = ?1", params![id])?;
        if rows_affected > 0 {
            info!(anime_id = id, "🗑️  Anime deleted");
        }
        Ok(rows_affected > 0)
    }

    // ----- reviews -----

    pub fn add_review(
        &self,
        anime_id: i64,
        user_id: i64,
        input: &ReviewInput,
    ) -> Result<ReviewOutcome> {
        let conn = self.db.lock();
        if !Self::anime_exists(&conn, anime_id)? {
            return Ok(ReviewOutcome::AnimeNotFound);
        }
        if !Self::user_exists(&conn, user_id)? {
            return Ok(ReviewOutcome::UserNotFound);
        }

        conn.execute(
            "INSERT INTO reviews (anime_id, user_id, rating, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                anime_id,
                user_id,
                input.rating,
                input.content,
                Utc::now().to_rfc3339()
            ],
        )
        .context("Failed to insert review")?;

        let id = conn.last_insert_rowid();
        debug!(review_id = id, anime_id, user_id, "Review added");
        Self::find_review(&conn, id)?
            .map(ReviewOutcome::Added)
            .context("Inserted review vanished")
    }

    pub fn get_review(&self, id: i64) -> Result<Option<Review>> {
        Self::find_review(&self.db.lock(), id)
    }

    pub fn update_review(&self, id: i64, input: &ReviewInput) -> Result<Option<Review>> {
        let conn = self.db.lock();
        let rows_affected = conn.execute(
            "UPDATE reviews SET rating = ?1, content = ?2 WHERE id = ?3",
            params![input.rating, input.content, id],
        )?;

        if rows_affected == 0 {
            return Ok(None);
        }
        Self::find_review(&conn, id)
    }

    pub fn delete_review(&self, id: i64) -> Result<bool> {
        let rows_affected = self
            .db
            .lock()
            .execute("DELETE FROM reviews WHERE id = ?1", params![id])?;
        Ok(rows_affected > 0)
    }

    pub fn reviews_for_anime(&self, anime_id: i64) -> Result<Vec<Review>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE anime_id = ?1 ORDER BY id"
        ))?;
        let reviews = stmt
            .query_map(params![anime_id], Self::row_to_review)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reviews)
    }

    /// The review `user_id` left on `anime_id`, if any.
    pub fn user_review(&self, anime_id: i64, user_id: i64) -> Result<Option<Review>> {
        let review = self
            .db
            .lock()
            .query_row(
                &format!(
                    "SELECT {REVIEW_COLUMNS} FROM reviews
                     WHERE anime_id = ?1 AND user_id = ?2
                     ORDER BY id DESC LIMIT 1"
                ),
                params![anime_id, user_id],
                Self::row_to_review,
            )
            .optional()?;
        Ok(review)
    }

    pub fn reviews_by_user(&self, user_id: i64) -> Result<Vec<ReviewWithAnime>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(
            "SELECT r.id, r.anime_id, a.title, a.genre, a.release_date, r.rating, r.content
             FROM reviews r
             JOIN anime a ON r.anime_id = a.id
             WHERE r.user_id = ?1
             ORDER BY r.id",
        )?;
        let reviews = stmt
            .query_map(params![user_id], |row| {
                Ok(ReviewWithAnime {
                    id: row.get(0)?,
                    anime_id: row.get(1)?,
                    anime_title: row.get(2)?,
                    genre: row.get(3)?,
                    release_date: row.get(4)?,
                    rating: row.get(5)?,
                    content: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reviews)
    }

    // ----- favourites -----

    pub fn add_favorite(&self, user_id: i64, anime_id: i64) -> Result<FavoriteOutcome> {
        let conn = self.db.lock();
        let Some(anime) = Self::find_anime(&conn, anime_id)? else {
            return Ok(FavoriteOutcome::AnimeNotFound);
        };
        if !Self::user_exists(&conn, user_id)? {
            return Ok(FavoriteOutcome::UserNotFound);
        }

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO favorites (anime_id, user_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![anime_id, user_id, Utc::now().to_rfc3339()],
        )?;
        if inserted == 0 {
            return Ok(FavoriteOutcome::AlreadyFavorite);
        }

        Ok(FavoriteOutcome::Added(Favorite {
            id: conn.last_insert_rowid(),
            anime_id,
            anime_title: anime.title,
        }))
    }

    pub fn favorites_for_user(&self, user_id: i64) -> Result<Vec<FavoriteWithAnime>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(
            "SELECT f.id, f.anime_id, a.title, a.genre, a.description, a.release_date,
                    COALESCE((SELECT AVG(r.rating) FROM reviews r WHERE r.anime_id = a.id), 0.0)
             FROM favorites f
             JOIN anime a ON f.anime_id = a.id
             WHERE f.user_id = ?1
             ORDER BY f.id",
        )?;
        let favorites = stmt
            .query_map(params![user_id], |row| {
                Ok(FavoriteWithAnime {
                    id: row.get(0)?,
                    anime_id: row.get(1)?,
                    anime_title: row.get(2)?,
                    genre: row.get(3)?,
                    description: row.get(4)?,
                    release_date: row.get(5)?,
                    rating: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(favorites)
    }

    /// Delete one of `user_id`'s favourites. Someone else's id is a miss.
    pub fn delete_favorite(&self, id: i64, user_id: i64) -> Result<bool> {
        let rows_affected = self.db.lock().execute(
            "DELETE FROM favorites WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    /// Store plus two user ids that satisfy the foreign keys.
    fn create_test_store() -> (CatalogStore, i64, i64) {
        let db = Database::in_memory().unwrap();
        {
            let conn = db.lock();
            for email in ["a@example.com", "b@example.com"] {
                conn.execute(
                    "INSERT INTO users (username, email, password_hash, role, created_at)
                     VALUES ('u', ?1, 'x', 'user', '2025-01-01T00:00:00Z')",
                    params![email],
                )
                .unwrap();
            }
        }
        (CatalogStore::new(db), 1, 2)
    }

    fn input(title: &str) -> AnimeInput {
        AnimeInput {
            title: title.to_string(),
            description: "desc".to_string(),
            genre: "Drama".to_string(),
            release_date: NaiveDate::from_ymd_opt(2011, 4, 6),
        }
    }

    fn review(rating: f64) -> ReviewInput {
        ReviewInput {
            rating,
            content: "great".to_string(),
        }
    }

    fn added(outcome: ReviewOutcome) -> Review {
        match outcome {
            ReviewOutcome::Added(review) => review,
            other => panic!("review not added: {:?}", other),
        }
    }

    #[test]
    fn test_anime_crud() {
        let (store, admin, _) = create_test_store();

        let created = store.create_anime(&input("Steins;Gate"), admin).unwrap();
        assert_eq!(created.title, "Steins;Gate");
        assert_eq!(created.created_by, Some(admin));
        assert_eq!(created.average_rating, 0.0);
        assert_eq!(created.release_date, NaiveDate::from_ymd_opt(2011, 4, 6));

        let updated = store
            .update_anime(created.id, &input("Steins;Gate 0"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Steins;Gate 0");

        assert_eq!(store.list_anime().unwrap().len(), 1);
        assert!(store.delete_anime(created.id).unwrap());
        assert!(!store.delete_anime(created.id).unwrap());
        assert!(store.get_anime(created.id).unwrap().is_none());
        assert!(store.update_anime(created.id, &input("x")).unwrap().is_none());
    }

    #[test]
    fn test_average_rating() {
        let (store, a, b) = create_test_store();
        let anime = store.create_anime(&input("Frieren"), a).unwrap();
        let other = store.create_anime(&input("Unrated"), a).unwrap();

        added(store.add_review(anime.id, a, &review(4.0)).unwrap());
        added(store.add_review(anime.id, b, &review(5.0)).unwrap());

        let rated = store.get_anime(anime.id).unwrap().unwrap();
        assert!((rated.average_rating - 4.5).abs() < f64::EPSILON);

        let listed = store.list_anime().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].id, other.id);
        assert_eq!(listed[1].average_rating, 0.0);
    }

    #[test]
    fn test_review_lifecycle() {
        let (store, a, b) = create_test_store();
        let anime = store.create_anime(&input("Mushishi"), a).unwrap();

        assert!(matches!(
            store.add_review(999, a, &review(3.0)).unwrap(),
            ReviewOutcome::AnimeNotFound
        ));

        let written = added(store.add_review(anime.id, b, &review(3.0)).unwrap());
        assert_eq!(written.user_id, b);

        assert_eq!(
            store.user_review(anime.id, b).unwrap().map(|r| r.id),
            Some(written.id)
        );
        assert!(store.user_review(anime.id, a).unwrap().is_none());

        let edited = store.update_review(written.id, &review(5.0)).unwrap().unwrap();
        assert_eq!(edited.rating, 5.0);

        let mine = store.reviews_by_user(b).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].anime_title, "Mushishi");

        assert!(store.delete_review(written.id).unwrap());
        assert!(store.reviews_for_anime(anime.id).unwrap().is_empty());
    }

    #[test]
    fn test_favorites() {
        let (store, a, b) = create_test_store();
        let anime = store.create_anime(&input("Haikyu"), a).unwrap();

        assert!(matches!(
            store.add_favorite(a, 999).unwrap(),
            FavoriteOutcome::AnimeNotFound
        ));

        let FavoriteOutcome::Added(favorite) = store.add_favorite(a, anime.id).unwrap() else {
            panic!("favorite not added");
        };
        assert_eq!(favorite.anime_title, "Haikyu");
        assert!(matches!(
            store.add_favorite(a, anime.id).unwrap(),
            FavoriteOutcome::AlreadyFavorite
        ));

        let listed = store.favorites_for_user(a).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].genre, "Drama");
        assert!(store.favorites_for_user(b).unwrap().is_empty());

        // someone else's favourite cannot be deleted
        assert!(!store.delete_favorite(favorite.id, b).unwrap());
        assert!(store.delete_favorite(favorite.id, a).unwrap());
    }

    #[test]
    fn test_unknown_user_cannot_review_or_favorite() {
        let (store, a, _) = create_test_store();
        let anime = store.create_anime(&input("Orphan"), a).unwrap();

        assert!(matches!(
            store.add_review(anime.id, 999, &review(4.0)).unwrap(),
            ReviewOutcome::UserNotFound
        ));
        assert!(matches!(
            store.add_favorite(999, anime.id).unwrap(),
            FavoriteOutcome::UserNotFound
        ));
        assert!(store.reviews_for_anime(anime.id).unwrap().is_empty());
    }

    #[test]
    fn test_deleting_anime_cascades() {
        let (store, a, _) = create_test_store();
        let anime = store.create_anime(&input("Cascade"), a).unwrap();
        added(store.add_review(anime.id, a, &review(4.0)).unwrap());
        store.add_favorite(a, anime.id).unwrap();

        store.delete_anime(anime.id).unwrap();

        assert!(store.reviews_for_anime(anime.id).unwrap().is_empty());
        assert!(store.favorites_for_user(a).unwrap().is_empty());
    }
}
