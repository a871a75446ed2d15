pub mod advisor;
pub mod courses;
pub mod responses;
pub mod router;
pub mod schedule;
pub mod state;
pub mod workspace;

#[cfg(test)]
mod test_support;

pub use responses::{ApiError, json_error};
pub use state::AppState;
