use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Inclusive rating bounds enforced on both creation and update
pub const RATING_MIN: i64 = 1;
pub const RATING_MAX: i64 = 5;

/// Returns true when the value is a valid rating
pub fn rating_in_bounds(rating: i64) -> bool {
    (RATING_MIN..=RATING_MAX).contains(&rating)
}

/// A user's rating of a catalog movie. Unique per (email, movie_id).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MovieRating {
    pub id: Uuid,
    pub email: String,
    pub movie_id: i64,
    pub rating: i32,
}

/// A user's rating of a catalog book. Unique per (email, isbn).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BookRating {
    pub id: Uuid,
    pub email: String,
    pub isbn: i64,
    pub rating: i32,
}

/// Item kind accepted by the rating endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Movie,
    Book,
}

impl ItemType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "movie" => Some(ItemType::Movie),
            "book" => Some(ItemType::Book),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemType::Movie => "Movie",
            ItemType::Book => "Book",
        }
    }
}

/// Type filter shared by the listing and recommendation endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemFilter {
    Movies,
    Books,
    All,
}

impl ItemFilter {
    /// Parses the `type` query parameter; an empty value means both kinds
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "" => Some(ItemFilter::All),
            "movie" => Some(ItemFilter::Movies),
            "book" => Some(ItemFilter::Books),
            _ => None,
        }
    }

    pub fn includes_movies(&self) -> bool {
        matches!(self, ItemFilter::Movies | ItemFilter::All)
    }

    pub fn includes_books(&self) -> bool {
        matches!(self, ItemFilter::Books | ItemFilter::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(rating_in_bounds(1));
        assert!(rating_in_bounds(5));
        assert!(!rating_in_bounds(0));
        assert!(!rating_in_bounds(6));
        assert!(!rating_in_bounds(-1));
    }

    #[test]
    fn test_item_type_parse() {
        assert_eq!(ItemType::parse("movie"), Some(ItemType::Movie));
        assert_eq!(ItemType::parse("book"), Some(ItemType::Book));
        assert_eq!(ItemType::parse("album"), None);
        assert_eq!(ItemType::parse(""), None);
    }

    #[test]
    fn test_item_filter_parse() {
        assert_eq!(ItemFilter::parse(""), Some(ItemFilter::All));
        assert_eq!(ItemFilter::parse("movie"), Some(ItemFilter::Movies));
        assert_eq!(ItemFilter::parse("book"), Some(ItemFilter::Books));
        assert_eq!(ItemFilter::parse("song"), None);
    }

    #[test]
    fn test_item_filter_inclusion() {
        assert!(ItemFilter::All.includes_movies());
        assert!(ItemFilter::All.includes_books());
        assert!(ItemFilter::Movies.includes_movies());
        assert!(!ItemFilter::Movies.includes_books());
        assert!(!ItemFilter::Books.includes_movies());
    }
}
