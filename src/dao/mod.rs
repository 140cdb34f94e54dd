pub mod pool;
pub mod registrations;
