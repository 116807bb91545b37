pub mod audit;
pub mod integrations;
pub mod registration;
pub mod session;
