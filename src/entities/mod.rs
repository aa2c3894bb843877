pub mod category;
pub mod expense;
pub mod extra_service;
pub mod payment_method;
pub mod service;
pub mod session;
pub mod user;
pub mod vehicle_record;
pub mod vehicle_record_extra;
pub mod vehicle_type;
