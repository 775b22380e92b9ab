pub mod snippet;
pub mod user;

pub use snippet::*;
pub use user::*;
