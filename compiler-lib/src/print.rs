pub mod layout;
pub mod lextest;
