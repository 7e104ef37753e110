pub mod catalog;
pub mod postgres;
pub mod ratings;
pub mod users;

pub use postgres::{create_pool, run_migrations};

/// True when the error is a unique-constraint violation.
///
/// Concurrent inserts for the same (email, item) pair race past the friendly
/// duplicate check; the database constraint catches them and the violation is
/// reported like any other duplicate.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
