pub mod prelude;

pub mod post;
pub mod user;
