pub mod export;
pub mod registrations;
