use std::fmt::Write as _;

use sqlx::PgPool;

use crate::db::{ratings, users};
use crate::db::ratings::{RatedBook, RatedMovie};
use crate::error::{AppError, AppResult};
use crate::models::{ItemFilter, Recommendation, MAX_RECOMMENDATIONS};
use crate::services::providers::RecommendationProvider;

/// Content-guidance sentence derived from the user's age band
fn age_guidance(age: Option<i32>) -> &'static str {
    match age {
        Some(age) if age < 13 => {
            "The user is under 13. Recommend only family-friendly titles with no mature themes."
        }
        Some(age) if age < 18 => {
            "The user is a teenager. Recommend age-appropriate titles and avoid adult content."
        }
        Some(_) => "The user is an adult. No content restrictions apply.",
        None => "The user's age is unknown. Prefer broadly suitable titles.",
    }
}

/// Assembles the prompt from the user's rating history.
///
/// The instruction block pins the response format so the reply parses as a
/// JSON array without a second round trip.
fn build_prompt(
    movies: &[RatedMovie],
    books: &[RatedBook],
    age: Option<i32>,
    filter: ItemFilter,
) -> String {
    let mut prompt = String::from(
        "You are a recommendation engine for movies and books. \
         Based on the user's rating history below, recommend new titles the user has not \
         already rated.\n\n",
    );

    if !movies.is_empty() {
        prompt.push_str("Rated movies (1-5 scale):\n");
        for entry in movies {
            let m = &entry.movie;
            let _ = writeln!(
                prompt,
                "- {} (rating {}, genres: {}, director: {}, cast: {})",
                m.title,
                entry.rating,
                m.genres.as_deref().unwrap_or("unknown"),
                m.director.as_deref().unwrap_or("unknown"),
                m.cast_members.as_deref().unwrap_or("unknown"),
            );
        }
        prompt.push('\n');
    }

    if !books.is_empty() {
        prompt.push_str("Rated books (1-5 scale):\n");
        for entry in books {
            let _ = writeln!(
                prompt,
                "- {} by {} (rating {})",
                entry.book.title, entry.book.author, entry.rating,
            );
        }
        prompt.push('\n');
    }

    prompt.push_str(age_guidance(age));
    prompt.push_str("\n\n");

    let wanted = match filter {
        ItemFilter::Movies => "movie recommendations only",
        ItemFilter::Books => "book recommendations only",
        ItemFilter::All => "a mix of movie and book recommendations",
    };

    let _ = write!(
        prompt,
        "Return exactly {} recommendations ({}) as a raw JSON array, no markdown and no \
         surrounding prose. Each element must have: \"type\" (\"movie\" or \"book\"), \
         \"title\", \"confidence\" (a number between 0 and 1), \"description\", \"genre\"; \
         movies additionally carry \"cast\" (array of names) and books carry \"author\".",
        MAX_RECOMMENDATIONS, wanted,
    );

    prompt
}

/// Parses the model reply into recommendations, tolerating markdown fences
fn parse_recommendations(text: &str) -> AppResult<Vec<Recommendation>> {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed).trim();

    let mut recommendations: Vec<Recommendation> = serde_json::from_str(trimmed)
        .map_err(|e| AppError::Upstream(format!("Unparseable recommendation response: {}", e)))?;

    recommendations.truncate(MAX_RECOMMENDATIONS);
    Ok(recommendations)
}

/// Generates recommendations from an already-fetched rating history.
///
/// An empty history short-circuits to an empty list; the provider is never
/// called for a user with nothing rated.
pub async fn generate_from_history(
    provider: &dyn RecommendationProvider,
    movies: &[RatedMovie],
    books: &[RatedBook],
    age: Option<i32>,
    filter: ItemFilter,
) -> AppResult<Vec<Recommendation>> {
    if movies.is_empty() && books.is_empty() {
        return Ok(Vec::new());
    }

    let prompt = build_prompt(movies, books, age, filter);

    tracing::info!(
        provider = provider.name(),
        movies = movies.len(),
        books = books.len(),
        "Requesting recommendations"
    );

    let reply = provider.generate(&prompt).await?;
    parse_recommendations(&reply)
}

/// Fetches the caller's history and age, then runs the relay
pub async fn generate_for_user(
    pool: &PgPool,
    provider: &dyn RecommendationProvider,
    email: &str,
    filter: ItemFilter,
) -> AppResult<Vec<Recommendation>> {
    let movies = if filter.includes_movies() {
        ratings::rated_movie_history(pool, email).await?
    } else {
        Vec::new()
    };

    let books = if filter.includes_books() {
        ratings::rated_book_history(pool, email).await?
    } else {
        Vec::new()
    };

    let age = users::find_by_email(pool, email).await?.and_then(|u| u.age);

    generate_from_history(provider, &movies, &books, age, filter).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Book, Movie};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        reply: String,
    }

    impl CountingProvider {
        fn new(reply: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: reply.to_string(),
            }
        }
    }

    #[async_trait::async_trait]
    impl RecommendationProvider for CountingProvider {
        async fn generate(&self, _prompt: &str) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn rated_movie(title: &str, rating: i32) -> RatedMovie {
        RatedMovie {
            movie: Movie {
                id: 1,
                title: title.to_string(),
                release_date: None,
                original_language: None,
                genres: Some("Drama".to_string()),
                cast_members: None,
                director: Some("Someone".to_string()),
                poster_path: None,
            },
            rating,
        }
    }

    fn rated_book(title: &str, author: &str, rating: i32) -> RatedBook {
        RatedBook {
            book: Book {
                isbn: 1,
                title: title.to_string(),
                author: author.to_string(),
                publication_year: None,
                image_url: None,
            },
            rating,
        }
    }

    #[test]
    fn test_age_guidance_bands() {
        assert!(age_guidance(Some(9)).contains("under 13"));
        assert!(age_guidance(Some(13)).contains("teenager"));
        assert!(age_guidance(Some(17)).contains("teenager"));
        assert!(age_guidance(Some(18)).contains("adult"));
        assert!(age_guidance(None).contains("unknown"));
    }

    #[test]
    fn test_prompt_carries_history_and_format() {
        let movies = vec![rated_movie("Arrival", 5)];
        let books = vec![rated_book("Dune", "Frank Herbert", 4)];

        let prompt = build_prompt(&movies, &books, Some(25), ItemFilter::All);

        assert!(prompt.contains("Arrival"));
        assert!(prompt.contains("Dune by Frank Herbert (rating 4)"));
        assert!(prompt.contains("adult"));
        assert!(prompt.contains("exactly 10 recommendations"));
        assert!(prompt.contains("mix of movie and book"));
    }

    #[test]
    fn test_prompt_filter_restricts_request() {
        let movies = vec![rated_movie("Arrival", 5)];
        let prompt = build_prompt(&movies, &[], None, ItemFilter::Movies);
        assert!(prompt.contains("movie recommendations only"));
    }

    #[test]
    fn test_parse_strips_markdown_fences() {
        let text = "```json\n[{\"type\": \"movie\", \"title\": \"Heat\", \"confidence\": 0.9}]\n```";
        let recs = parse_recommendations(text).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Heat");
    }

    #[test]
    fn test_parse_truncates_to_limit() {
        let entries: Vec<String> = (0..15)
            .map(|i| format!("{{\"type\":\"book\",\"title\":\"Book {}\",\"confidence\":0.5}}", i))
            .collect();
        let text = format!("[{}]", entries.join(","));

        let recs = parse_recommendations(&text).unwrap();
        assert_eq!(recs.len(), MAX_RECOMMENDATIONS);
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(parse_recommendations("Here are some ideas!").is_err());
    }

    #[tokio::test]
    async fn test_empty_history_skips_provider() {
        let provider = CountingProvider::new("[]");
        let recs = generate_from_history(&provider, &[], &[], None, ItemFilter::All)
            .await
            .unwrap();

        assert!(recs.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_history_reaches_provider() {
        let provider =
            CountingProvider::new("[{\"type\":\"movie\",\"title\":\"Heat\",\"confidence\":0.9}]");
        let movies = vec![rated_movie("Arrival", 5)];

        let recs = generate_from_history(&provider, &movies, &[], Some(30), ItemFilter::Movies)
            .await
            .unwrap();

        assert_eq!(recs.len(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
