//! In-memory representation of the LLVM IR subset we generate, and its
//! textual form.
use derive_more::Display;
use itertools::Itertools;
use std::{fmt, io};

pub type Label = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ty {
    Void,
    I1,
    I8,
    I32,
    Ptr(Box<Ty>),
    Array(usize, Box<Ty>),
    Func { ret: Box<Ty>, params: Vec<Ty> },
}

impl Ty {
    pub fn ptr(self) -> Ty {
        Ty::Ptr(Box::new(self))
    }

    /// `i8*`, the untyped pointer used for objects and arrays
    pub fn opaque() -> Ty {
        Ty::I8.ptr()
    }

    /// `i8**`, a pointer into a vtable
    pub fn vtable_ptr() -> Ty {
        Ty::opaque().ptr()
    }

    /// The zero value for a stack slot of this type.
    pub fn zero(&self) -> Operand {
        match self {
            Ty::Ptr(_) => Operand::Null,
            _ => Operand::Const(0),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Void => write!(f, "void"),
            Ty::I1 => write!(f, "i1"),
            Ty::I8 => write!(f, "i8"),
            Ty::I32 => write!(f, "i32"),
            Ty::Ptr(inner) => write!(f, "{}*", inner),
            Ty::Array(len, elem) => write!(f, "[{} x {}]", len, elem),
            Ty::Func { ret, params } => write!(f, "{} ({})", ret, params.iter().join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Operand {
    /// Temporary `%_N`
    #[display(fmt = "%_{}", _0)]
    Reg(usize),
    #[display(fmt = "%{}", _0)]
    Local(String),
    #[display(fmt = "@{}", _0)]
    Global(String),
    #[display(fmt = "{}", _0)]
    Const(i64),
    #[display(fmt = "null")]
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BinopKind {
    #[display(fmt = "add")]
    Add,
    #[display(fmt = "sub")]
    Sub,
    #[display(fmt = "mul")]
    Mul,
    #[display(fmt = "xor")]
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Cond {
    /// signed less than
    #[display(fmt = "slt")]
    Slt,
    /// unsigned less than, which also catches negative indices
    #[display(fmt = "ult")]
    Ult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CastKind {
    #[display(fmt = "bitcast")]
    Bitcast,
    #[display(fmt = "zext")]
    Zext,
    #[display(fmt = "trunc")]
    Trunc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    Alloca {
        dst: Operand,
        ty: Ty,
    },
    Load {
        dst: Operand,
        ty: Ty,
        src: Operand,
    },
    Store {
        ty: Ty,
        value: Operand,
        dst: Operand,
    },
    /// `getelementptr` with `i32` indices
    Gep {
        dst: Operand,
        elem: Ty,
        base: Operand,
        indices: Vec<Operand>,
    },
    Cast {
        dst: Operand,
        kind: CastKind,
        from: Ty,
        value: Operand,
        to: Ty,
    },
    Binop {
        dst: Operand,
        kind: BinopKind,
        ty: Ty,
        lhs: Operand,
        rhs: Operand,
    },
    Icmp {
        dst: Operand,
        cond: Cond,
        ty: Ty,
        lhs: Operand,
        rhs: Operand,
    },
    Phi {
        dst: Operand,
        ty: Ty,
        incoming: Vec<(Operand, Label)>,
    },
    Call {
        dst: Option<Operand>,
        ret: Ty,
        callee: Operand,
        args: Vec<(Ty, Operand)>,
    },
    Br {
        target: Label,
    },
    CondBr {
        cond: Operand,
        then_target: Label,
        else_target: Label,
    },
    Ret {
        value: Option<(Ty, Operand)>,
    },
    Unreachable,
}

impl Instr {
    /// Whether this instruction ends a basic block.
    pub fn is_terminator(&self) -> bool {
        match self {
            Instr::Br { .. } | Instr::CondBr { .. } | Instr::Ret { .. } | Instr::Unreachable => {
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::Instr::*;
        match self {
            Alloca { dst, ty } => write!(f, "{} = alloca {}", dst, ty),
            Load { dst, ty, src } => write!(f, "{} = load {}, {}* {}", dst, ty, ty, src),
            Store { ty, value, dst } => write!(f, "store {} {}, {}* {}", ty, value, ty, dst),
            Gep {
                dst,
                elem,
                base,
                indices,
            } => write!(
                f,
                "{} = getelementptr {}, {}* {}, {}",
                dst,
                elem,
                elem,
                base,
                indices.iter().map(|idx| format!("i32 {}", idx)).join(", ")
            ),
            Cast {
                dst,
                kind,
                from,
                value,
                to,
            } => write!(f, "{} = {} {} {} to {}", dst, kind, from, value, to),
            Binop {
                dst,
                kind,
                ty,
                lhs,
                rhs,
            } => write!(f, "{} = {} {} {}, {}", dst, kind, ty, lhs, rhs),
            Icmp {
                dst,
                cond,
                ty,
                lhs,
                rhs,
            } => write!(f, "{} = icmp {} {} {}, {}", dst, cond, ty, lhs, rhs),
            Phi { dst, ty, incoming } => write!(
                f,
                "{} = phi {} {}",
                dst,
                ty,
                incoming
                    .iter()
                    .map(|(value, label)| format!("[{}, %{}]", value, label))
                    .join(", ")
            ),
            Call {
                dst,
                ret,
                callee,
                args,
            } => {
                if let Some(dst) = dst {
                    write!(f, "{} = ", dst)?;
                }
                write!(
                    f,
                    "call {} {}({})",
                    ret,
                    callee,
                    args.iter()
                        .map(|(ty, arg)| format!("{} {}", ty, arg))
                        .join(", ")
                )
            }
            Br { target } => write!(f, "br label %{}", target),
            CondBr {
                cond,
                then_target,
                else_target,
            } => write!(
                f,
                "br i1 {}, label %{}, label %{}",
                cond, then_target, else_target
            ),
            Ret { value: None } => write!(f, "ret void"),
            Ret {
                value: Some((ty, value)),
            } => write!(f, "ret {} {}", ty, value),
            Unreachable => write!(f, "unreachable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub label: Label,
    pub instrs: Vec<Instr>,
}

impl Block {
    pub fn new(label: impl Into<Label>) -> Self {
        Self {
            label: label.into(),
            instrs: Vec::new(),
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.instrs.last().map_or(false, Instr::is_terminator)
    }

    fn emit(&self, out: &mut impl io::Write) -> io::Result<()> {
        writeln!(out, "{}:", self.label)?;
        for instr in &self.instrs {
            writeln!(out, "\t{}", instr)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub ret: Ty,
    pub params: Vec<(Ty, Operand)>,
    pub blocks: Vec<Block>,
}

impl Function {
    pub fn emit(&self, out: &mut impl io::Write) -> io::Result<()> {
        writeln!(
            out,
            "define {} @{}({}) {{",
            self.ret,
            self.name,
            self.params
                .iter()
                .map(|(ty, param)| format!("{} {}", ty, param))
                .join(", ")
        )?;
        for (idx, block) in self.blocks.iter().enumerate() {
            if idx > 0 {
                writeln!(out)?;
            }
            block.emit(out)?;
        }
        writeln!(out, "}}")
    }
}

/// The table of function pointers objects of a class dispatch through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VTable {
    pub class: String,
    /// Function type and name of each entry, in slot order
    pub entries: Vec<(Ty, String)>,
}

impl VTable {
    pub fn global_name(class: &str) -> String {
        format!(".{}_vtable", class)
    }

    pub fn ty(&self) -> Ty {
        Ty::Array(self.entries.len(), Box::new(Ty::opaque()))
    }
}

impl fmt::Display for VTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{} = global {} [{}]",
            VTable::global_name(&self.class),
            self.ty(),
            self.entries
                .iter()
                .map(|(ty, name)| format!("i8* bitcast ({}* @{} to i8*)", ty, name))
                .join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Module {
    pub vtables: Vec<VTable>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn emit(&self, out: &mut impl io::Write) -> io::Result<()> {
        crate::runtime::emit_preamble(out)?;
        for vtable in &self.vtables {
            writeln!(out, "{}", vtable)?;
        }
        for function in &self.functions {
            writeln!(out)?;
            function.emit(out)?;
        }
        Ok(())
    }
}
