pub mod auth;
pub mod catalog;
pub mod expenses;
pub mod rates;
pub mod stats;
pub mod users;
pub mod vehicles;
