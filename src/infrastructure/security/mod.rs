pub mod password;
pub mod signing;
