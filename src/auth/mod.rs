pub mod bootstrap;
pub mod limiter;
pub mod middleware;
pub mod password;
pub mod token;

pub use bootstrap::bootstrap_admin;
pub use limiter::LoginLimiter;
pub use middleware::{limit_login, require_admin};
pub use token::{Claims, TokenKeys};
