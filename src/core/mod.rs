pub mod access;
pub mod session;
pub mod shared;
pub mod store;
pub mod validation;
