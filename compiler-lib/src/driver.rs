use crate::print::lextest;
use asciifile::MaybeSpanned;
use codegen::{CodegenError, Module};
use compiler_shared::context::Context;
use derive_more::Display;
use failure::{Error, Fail};
use lexer::{Lexer, Token};
use parser::{ast, Parser};
use std::io;
use symtab::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CompilerPhase {
    #[display(fmt = "lexing")]
    Lexer,
    #[display(fmt = "parsing")]
    Parser,
    #[display(fmt = "semantic analysis")]
    Semantics,
    #[display(fmt = "code generation")]
    Codegen,
}

#[derive(Debug, Fail)]
pub enum CompileError {
    /// The reason was already reported to the context's diagnostics.
    #[fail(display = "{} failed", phase)]
    Aborted { phase: CompilerPhase },
    #[fail(display = "code generation failed")]
    Codegen(#[cause] CodegenError),
    #[fail(display = "cannot write output")]
    Output(#[cause] io::Error),
}

impl CompileError {
    pub fn phase(&self) -> CompilerPhase {
        match self {
            CompileError::Aborted { phase } => *phase,
            CompileError::Codegen(_) | CompileError::Output(_) => CompilerPhase::Codegen,
        }
    }
}

/// A program that passed semantic analysis, with its layout computed.
#[derive(Debug)]
pub struct Analysis {
    pub program: ast::Program,
    pub repo: Repository,
}

/// Writes one line per token, followed by `EOF`. Stops at the first
/// lexical error.
pub fn lextest(context: &Context<'_>, out: &mut dyn io::Write) -> Result<(), CompileError> {
    for token in tokens(context)? {
        writeln!(out, "{}", lextest::Output::new(&token.data)).map_err(CompileError::Output)?;
    }
    writeln!(out, "{}", lextest::EOF).map_err(CompileError::Output)
}

pub fn parse(context: &Context<'_>) -> Result<ast::Program, CompileError> {
    let tokens = tokens(context)?;
    let mut parser = Parser::new(tokens.into_iter());
    parser.parse().map_err(|err| {
        context.diagnostics.error(&err);
        CompileError::Aborted {
            phase: CompilerPhase::Parser,
        }
    })
}

/// Parses and runs all semantic passes: declaration collection, layout
/// computation and type checking.
pub fn analyze(context: &Context<'_>) -> Result<Analysis, CompileError> {
    let program = parse(context)?;
    let abort = |err| {
        context.diagnostics.error(&MaybeSpanned::WithoutSpan(err));
        CompileError::Aborted {
            phase: CompilerPhase::Semantics,
        }
    };

    let mut repo = symtab::collect(&program).map_err(abort)?;
    symtab::compute_layout(&mut repo);
    type_checking::check(&repo, &program).map_err(abort)?;

    log::debug!("{} classes passed semantic analysis", repo.classes().count());
    Ok(Analysis { program, repo })
}

/// Runs every phase. Nothing is generated unless the program is correct.
pub fn compile(context: &Context<'_>) -> Result<Module, CompileError> {
    let analysis = analyze(context)?;
    codegen::generate(&analysis.repo, &analysis.program).map_err(CompileError::Codegen)
}

/// All tokens except whitespace and comments.
fn tokens<'f>(context: &'f Context<'f>) -> Result<Vec<Token<'f>>, CompileError> {
    let mut tokens = Vec::new();
    for result in Lexer::new(context) {
        match result {
            Ok(token) if token.data.is_trivia() => {}
            Ok(token) => tokens.push(token),
            Err(lexical_error) => {
                context.diagnostics.error(&lexical_error);
                return Err(CompileError::Aborted {
                    phase: CompilerPhase::Lexer,
                });
            }
        }
    }
    log::debug!("lexed {} tokens", tokens.len());
    Ok(tokens)
}

/// Print error objects in a format intended for end users
pub fn print_error(writer: &mut dyn io::Write, err: &Error) -> Result<(), Error> {
    writeln!(writer, "error: {}", err.as_fail())?;
    for cause in err.iter_causes() {
        writeln!(writer, "caused by: {}", cause)?;
    }
    Ok(())
}
