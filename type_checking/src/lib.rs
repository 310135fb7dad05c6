//! Second semantic pass: checks the program against the declarations the
//! collector registered and reports the first type error.
mod checker;
mod method_body_type_checker;

pub use self::checker::check;
