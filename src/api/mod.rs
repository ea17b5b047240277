pub mod health;
pub mod job;
pub mod printer;
pub mod validation;
