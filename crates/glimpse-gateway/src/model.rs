mod view;

pub use view::{ErrorResponse, HealthResponse, ViewResponse};
