#![warn(
    clippy::print_stdout,
    clippy::unimplemented,
    clippy::doc_markdown,
    clippy::items_after_statements,
    clippy::match_same_arms,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::use_self,
    clippy::use_debug
)]

//! Lowers a type checked program into textual LLVM IR.
//!
//! # Object Layout
//!
//! An object is a `calloc`ed block of `8 + fields` bytes. The first 8 bytes
//! hold a pointer to the class's vtable (or stay null if the class has no
//! methods), fields follow at the offsets computed by the layout calculator.
//!
//! # Array Layout
//!
//! An array of length `n` is a block of `n + 1` 32-bit words. Word 0 holds
//! `n`, element `i` lives in word `i + 1`. Boolean elements are widened to
//! `i32` when stored and truncated when loaded.
//!
//! # Generated Names
//!
//! Methods are called `@Class.method`, vtables `@.Class_vtable`. Inside a
//! method, temporaries are `%_N`, incoming parameters `%.name` and stack
//! slots of parameters and locals `%name.addr`.
pub mod llvm;
pub mod method_body_generator;
pub mod program_generator;
pub mod runtime;
mod type_translation;

pub use self::{
    llvm::Module, method_body_generator::MethodBodyGenerator,
    program_generator::ProgramGenerator, runtime::RuntimeFunction,
};
use failure::Fail;
use parser::ast;
use symtab::Repository;

/// The generator trusts the type checker. These only occur if the
/// repository and the program do not belong together.
#[derive(Debug, Fail, PartialEq, Eq)]
pub enum CodegenError {
    #[fail(display = "no declaration for class {}", name)]
    UnknownClass { name: String },
    #[fail(display = "no virtual method {}.{}", class, method)]
    UnknownMethod { class: String, method: String },
    #[fail(display = "no variable {} in {}.{}", name, class, method)]
    UnknownVariable {
        name: String,
        class: String,
        method: String,
    },
    #[fail(display = "expression of type {} has no static class", ty)]
    NotAnObject { ty: String },
    #[fail(display = "expression of type {} is not an array", ty)]
    NotAnArray { ty: String },
}

pub type CodegenResult<T> = Result<T, CodegenError>;

/// Generates the module for `program`. `repo` must be the checked
/// repository of `program` with its layout computed.
pub fn generate(repo: &Repository, program: &ast::Program) -> CodegenResult<Module> {
    ProgramGenerator::new(repo, program).generate()
}

#[cfg(test)]
pub(crate) mod test_utils {
    use asciifile::AsciiFile;
    use compiler_shared::context::Context;
    use lexer::Lexer;
    use parser::{ast, Parser};

    pub fn parse(src: &str) -> ast::Program {
        let file = AsciiFile::new(src.as_bytes()).unwrap();
        let ctx = Context::dummy(&file);
        let tokens = Lexer::new(&ctx)
            .map(|t| t.unwrap())
            .filter(|t| !t.data.is_trivia());
        Parser::new(tokens).parse().unwrap()
    }

    /// Runs the whole pipeline and returns the emitted IR.
    pub fn compile(src: &str) -> String {
        let program = parse(src);
        let mut repo = symtab::collect(&program).unwrap();
        symtab::compute_layout(&mut repo);
        type_checking::check(&repo, &program).unwrap();
        let module = crate::generate(&repo, &program).unwrap();

        let mut out = Vec::new();
        module.emit(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    /// Extracts the text of the function `@name`.
    pub fn function<'a>(ir: &'a str, name: &str) -> &'a str {
        let header = format!("@{}(", name);
        let start = ir
            .lines()
            .find(|line| line.starts_with("define") && line.contains(&header))
            .and_then(|line| ir.find(line))
            .unwrap_or_else(|| panic!("no function {} in\n{}", name, ir));
        let len = ir[start..].find("\n}\n").expect("unterminated function") + 3;
        &ir[start..start + len]
    }
}
