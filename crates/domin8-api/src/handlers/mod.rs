pub mod health;
pub mod logo;
pub mod outputs;
pub mod process;
