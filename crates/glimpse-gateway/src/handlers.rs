mod health;
mod view;

pub use health::health_handler;
pub use view::view_handler;
