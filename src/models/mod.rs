pub mod catalog;
pub mod rating;
pub mod recommendation;
pub mod user;

pub use catalog::{Book, BookListing, Movie, MovieListing, Pagination};
pub use rating::{
    rating_in_bounds, BookRating, ItemFilter, ItemType, MovieRating, RATING_MAX, RATING_MIN,
};
pub use recommendation::{Recommendation, MAX_RECOMMENDATIONS};
pub use user::{User, UserPayload};
