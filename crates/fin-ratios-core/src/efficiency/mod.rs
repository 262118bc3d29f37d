pub mod ccc;
pub mod days;
