pub mod audit;
pub mod parameters;
pub mod photos;
pub mod products;
pub mod records;
pub mod reports;
pub mod users;
