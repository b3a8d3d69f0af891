mod chat;
mod hint;
mod problem;

pub use chat::*;
pub use hint::*;
pub use problem::*;
