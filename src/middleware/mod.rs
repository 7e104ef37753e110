pub mod auth;
pub mod request_id;

pub use auth::{require_admin, require_user, ACCESS_TOKEN_COOKIE, ID_TOKEN_COOKIE};
pub use request_id::{make_span_with_request_id, request_id_middleware, RequestId};
