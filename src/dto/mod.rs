pub mod categories;
pub mod orders;
pub mod products;
pub mod reports;
pub mod users;
