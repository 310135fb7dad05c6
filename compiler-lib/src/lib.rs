#![warn(rust_2018_idioms)]
#![warn(clippy::print_stdout)]

//! Runs the compiler's phases on a single source file. Every phase reports
//! its errors to the [`Context`](compiler_shared::context::Context)'s
//! diagnostics and aborts on the first one.
pub mod driver;
pub mod print;

pub use self::driver::{
    analyze, compile, lextest, parse, print_error, Analysis, CompileError, CompilerPhase,
};
pub use utils::OutputSpecification;
