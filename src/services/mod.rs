pub mod catalog;
pub mod debounce;
pub mod exchange_rate;
pub mod jobs;
pub mod ledger;
pub mod plate_lookup;
pub mod pricing;
pub mod registration;
pub mod statistics;
