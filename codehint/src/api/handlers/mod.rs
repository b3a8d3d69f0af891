pub mod explain;
pub mod health;
pub mod hint;

pub use explain::explain;
pub use health::{health_check, root};
pub use hint::generate_hint;
