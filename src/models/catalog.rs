use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// Catalog movie entry. The id is supplied by the external movie database,
/// not generated locally.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub original_language: Option<String>,
    pub genres: Option<String>,
    #[serde(rename = "cast")]
    pub cast_members: Option<String>,
    pub director: Option<String>,
    pub poster_path: Option<String>,
}

/// Catalog book entry keyed by ISBN
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Book {
    pub isbn: i64,
    pub title: String,
    pub author: String,
    pub publication_year: Option<i32>,
    pub image_url: Option<String>,
}

/// Movie as it appears in listing responses
#[derive(Debug, Serialize)]
pub struct MovieListing {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(rename = "type")]
    pub item_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<i32>,
}

/// Book as it appears in listing responses. Books are addressed by their ISBN,
/// which doubles as the generic `id` field clients use for both item kinds.
#[derive(Debug, Serialize)]
pub struct BookListing {
    pub id: i64,
    #[serde(flatten)]
    pub book: Book,
    #[serde(rename = "type")]
    pub item_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<i32>,
}

impl Movie {
    pub fn into_listing(self, user_rating: Option<i32>) -> MovieListing {
        MovieListing {
            movie: self,
            item_type: "movie",
            user_rating,
        }
    }
}

impl Book {
    pub fn into_listing(self, user_rating: Option<i32>) -> BookListing {
        BookListing {
            id: self.isbn,
            book: self,
            item_type: "book",
            user_rating,
        }
    }
}

/// Pagination block reported per filtered type in listing responses
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
}

impl Pagination {
    pub fn new(current_page: i64, per_page: i64, total_items: i64) -> Self {
        Self {
            current_page,
            per_page,
            total_pages: (total_items + per_page - 1) / per_page,
            total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_movie() -> Movie {
        Movie {
            id: 603,
            title: "The Matrix".to_string(),
            release_date: NaiveDate::from_ymd_opt(1999, 3, 31),
            original_language: Some("en".to_string()),
            genres: Some("Action,Science Fiction".to_string()),
            cast_members: Some("Keanu Reeves,Laurence Fishburne".to_string()),
            director: Some("Lana Wachowski".to_string()),
            poster_path: None,
        }
    }

    #[test]
    fn test_movie_listing_serialization() {
        let listing = test_movie().into_listing(Some(5));
        let json = serde_json::to_value(&listing).unwrap();

        assert_eq!(json["id"], 603);
        assert_eq!(json["type"], "movie");
        assert_eq!(json["cast"], "Keanu Reeves,Laurence Fishburne");
        assert_eq!(json["user_rating"], 5);
    }

    #[test]
    fn test_movie_listing_omits_absent_rating() {
        let listing = test_movie().into_listing(None);
        let json = serde_json::to_value(&listing).unwrap();
        assert!(json.get("user_rating").is_none());
    }

    #[test]
    fn test_book_listing_uses_isbn_as_id() {
        let book = Book {
            isbn: 9780261103573,
            title: "The Fellowship of the Ring".to_string(),
            author: "J.R.R. Tolkien".to_string(),
            publication_year: Some(1954),
            image_url: None,
        };

        let json = serde_json::to_value(book.into_listing(None)).unwrap();
        assert_eq!(json["id"], 9780261103573i64);
        assert_eq!(json["isbn"], 9780261103573i64);
        assert_eq!(json["type"], "book");
    }

    #[test]
    fn test_pagination_rounds_pages_up() {
        assert_eq!(Pagination::new(1, 20, 45).total_pages, 3);
        assert_eq!(Pagination::new(1, 20, 40).total_pages, 2);
        assert_eq!(Pagination::new(1, 20, 0).total_pages, 0);
    }
}
