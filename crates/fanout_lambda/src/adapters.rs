pub mod invoke;
pub mod object_store;
pub mod request_execution;
