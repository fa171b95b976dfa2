//! Forum edge services: out-of-process password hashing and hot-reloading
//! legacy path redirection, plus the HTTP host that carries them.

pub mod config;
pub mod hashing;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod redirection;

pub use config::schema::ForumConfig;
pub use hashing::HashingPool;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use redirection::RedirectStore;
