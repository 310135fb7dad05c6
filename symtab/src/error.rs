use crate::types::Type;
use derive_more::Display;
use failure::Fail;
use parser::ast;
use strum_macros::EnumDiscriminants;

pub type SemanticResult<T> = Result<T, SemanticError>;

/// What kind of declaration an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Entity {
    #[display(fmt = "class")]
    Class,
    #[display(fmt = "field")]
    Field,
    #[display(fmt = "method")]
    Method,
    #[display(fmt = "parameter")]
    Parameter,
    #[display(fmt = "variable")]
    Variable,
    #[display(fmt = "call argument")]
    CallArgument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Operation {
    #[display(fmt = "`&&`")]
    And,
    #[display(fmt = "`<`")]
    Compare,
    #[display(fmt = "`+`")]
    Plus,
    #[display(fmt = "`-`")]
    Minus,
    #[display(fmt = "`*`")]
    Times,
    #[display(fmt = "`!`")]
    Not,
}

impl From<ast::BinaryOp> for Operation {
    fn from(op: ast::BinaryOp) -> Self {
        match op {
            ast::BinaryOp::And => Operation::And,
            ast::BinaryOp::Less => Operation::Compare,
            ast::BinaryOp::Plus => Operation::Plus,
            ast::BinaryOp::Minus => Operation::Minus,
            ast::BinaryOp::Times => Operation::Times,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Construct {
    #[display(fmt = "if")]
    If,
    #[display(fmt = "while")]
    While,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum IndexAssignmentPart {
    #[display(fmt = "index")]
    Index,
    #[display(fmt = "assigned expression")]
    Expression,
}

/// The first violation found during semantic analysis. Analysis stops
/// there, so there is exactly one of these per rejected program.
#[derive(Debug, Clone, PartialEq, Eq, Fail, EnumDiscriminants)]
#[strum_discriminants(name(SemanticErrorKind), derive(strum_macros::Display))]
pub enum SemanticError {
    #[fail(display = "{} '{}' is declared more than once", what, name)]
    DuplicateDeclaration { what: Entity, name: String },
    #[fail(display = "{} '{}' is not declared", what, name)]
    UndeclaredClass { what: Entity, name: String },
    #[fail(
        display = "method '{}.{}' does not match the signature of '{}.{}' it overrides",
        class, method, ancestor, method
    )]
    NonVirtualOverride {
        class: String,
        method: String,
        ancestor: String,
    },
    #[fail(display = "cannot print a value of type {}, expected int", found)]
    InvalidPrintArgument { found: Type },
    #[fail(display = "operands of {} must be of type {}", op, expected)]
    BadOperandTypes { op: Operation, expected: Type },
    #[fail(
        display = "condition of {} must be of type boolean, found {}",
        construct, found
    )]
    BadConditionType { construct: Construct, found: Type },
    #[fail(
        display = "in method '{}': cannot assign {} to '{}' of type {}",
        method, found, target, expected
    )]
    BadAssignmentStatement {
        method: String,
        target: String,
        expected: Type,
        found: Type,
    },
    #[fail(
        display = "in method '{}': {} of the element assignment to '{}' has the wrong type",
        method, part, target
    )]
    BadIndexAssignment {
        part: IndexAssignmentPart,
        target: String,
        method: String,
    },
    #[fail(display = "cannot index into a value of type {}", found)]
    InvalidArrayAccess { found: Type },
    #[fail(display = "array index must be of type int, found {}", found)]
    InvalidArrayIndex { found: Type },
    #[fail(display = "cannot take the length of a value of type {}", found)]
    InvalidArrayLength { found: Type },
    #[fail(
        display = "cannot call method '{}' on a value of type {}",
        method, found
    )]
    InvalidMemberCallTarget { method: String, found: Type },
    #[fail(display = "cannot call method '{}' on an undeclared receiver", method)]
    MemberCallOnUndeclared { method: String },
    #[fail(display = "{} is not a subtype of {}", found, expected)]
    NotASubtype { expected: Type, found: Type },
    #[fail(
        display = "method '{}' must return {}, but returns {}",
        method, expected, found
    )]
    WrongReturnType {
        method: String,
        expected: Type,
        found: Type,
    },
    #[fail(display = "the parameter '{}' of main must not be used", name)]
    IllegalArgsParameterUse { name: String },
    #[fail(display = "arguments do not match the parameters of method '{}'", method)]
    WrongCallArguments { method: String },
    #[fail(display = "class {} has no method '{}'", class, method)]
    MethodNotFound { class: String, method: String },
    #[fail(display = "'this' cannot be used in the static main method")]
    IllegalThisInMain,
    #[fail(
        display = "size of a new {} array must be of type int, found {}",
        element, found
    )]
    InvalidArraySizeType {
        element: ast::ArrayElement,
        found: Type,
    },
    #[fail(display = "cannot allocate an object of undeclared class {}", name)]
    UnknownClassInAllocation { name: String },
}

impl SemanticError {
    pub fn kind(&self) -> SemanticErrorKind {
        SemanticErrorKind::from(self)
    }
}
