pub mod evaluate;
pub mod schema;
pub mod score;
