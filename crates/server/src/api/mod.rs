pub mod audio;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod scanner;

pub use routes::create_router;
