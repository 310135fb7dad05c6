use crate::llvm::{Instr, Operand, Ty};
use derive_more::Display;
use std::io;

/// Functions every module defines or declares, callable from generated
/// method bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RuntimeFunction {
    /// `i8* calloc(i32 count, i32 size)` from libc
    #[display(fmt = "calloc")]
    Calloc,
    /// Prints an `int` followed by a newline
    #[display(fmt = "print_int")]
    PrintInt,
    /// Reports an out of bounds access and exits with status 1
    #[display(fmt = "throw_oob")]
    ThrowOob,
}

impl RuntimeFunction {
    pub fn ret(self) -> Ty {
        match self {
            RuntimeFunction::Calloc => Ty::opaque(),
            RuntimeFunction::PrintInt | RuntimeFunction::ThrowOob => Ty::Void,
        }
    }

    pub fn callee(self) -> Operand {
        Operand::Global(self.to_string())
    }

    /// Builds a call to this function with `i32` arguments.
    pub fn call(self, dst: Option<Operand>, args: Vec<Operand>) -> Instr {
        Instr::Call {
            dst,
            ret: self.ret(),
            callee: self.callee(),
            args: args.into_iter().map(|arg| (Ty::I32, arg)).collect(),
        }
    }
}

const PREAMBLE: &str = r#"declare i8* @calloc(i32, i32)
declare i32 @printf(i8*, ...)
declare void @exit(i32)

@_cint = constant [4 x i8] c"%d\0a\00"
@_cOOB = constant [15 x i8] c"Out of bounds\0a\00"

define void @print_int(i32 %i) {
	%_str = bitcast [4 x i8]* @_cint to i8*
	call i32 (i8*, ...) @printf(i8* %_str, i32 %i)
	ret void
}

define void @throw_oob() {
	%_str = bitcast [15 x i8]* @_cOOB to i8*
	call i32 (i8*, ...) @printf(i8* %_str)
	call void @exit(i32 1)
	ret void
}

"#;

/// Writes the libc declarations and the helpers behind [`RuntimeFunction`].
pub fn emit_preamble(out: &mut impl io::Write) -> io::Result<()> {
    out.write_all(PREAMBLE.as_bytes())
}
