//! The program tree handed from the parser to the semantic passes.
//!
//! Nodes own their names, so the tree does not borrow from the input file
//! and can outlive the token stream it was built from.
use derive_more::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub main_class: MainClass,
    pub classes: Vec<ClassDeclaration>,
}

/// `class Main { public static void main(String[] args) { ... } }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainClass {
    pub name: String,
    /// name of the `String[]` parameter, which the body must not use
    pub args_name: String,
    pub vars: Vec<VarDeclaration>,
    pub body: Vec<Stmt>,
}

/// A class with or without `extends`. Fields always precede methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDeclaration {
    pub name: String,
    pub superclass: Option<String>,
    pub fields: Vec<VarDeclaration>,
    pub methods: Vec<MethodDeclaration>,
}

/// Used for fields, formal parameters and method locals alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDeclaration {
    pub ty: Type,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDeclaration {
    pub return_ty: Type,
    pub name: String,
    pub params: Vec<VarDeclaration>,
    pub vars: Vec<VarDeclaration>,
    pub body: Vec<Stmt>,
    pub return_expr: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum Type {
    #[display(fmt = "int")]
    Int,
    #[display(fmt = "boolean")]
    Boolean,
    #[display(fmt = "int[]")]
    IntArray,
    #[display(fmt = "boolean[]")]
    BooleanArray,
    #[display(fmt = "{}", _0)]
    Class(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `{ stmts }`
    Block(Vec<Stmt>),
    /// `target = value;`
    Assign { target: String, value: Expr },
    /// `target[index] = value;`
    ArrayAssign {
        target: String,
        index: Expr,
        value: Expr,
    },
    /// `if (cond) then_branch else else_branch`, the else branch is mandatory
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Box<Stmt>,
    },
    While { cond: Expr, body: Box<Stmt> },
    /// `System.out.println(expr);`
    Print(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// `!expr`
    Not(Box<Expr>),
    /// `array[index]`
    ArrayLookup { array: Box<Expr>, index: Box<Expr> },
    /// `array.length`
    ArrayLength(Box<Expr>),
    /// `receiver.method(args)`
    MessageSend {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Int(i32),
    Boolean(bool),
    Identifier(String),
    This,
    /// `new int[size]` or `new boolean[size]`
    NewArray(ArrayElement, Box<Expr>),
    /// `new Class()`
    NewObject(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum BinaryOp {
    /// short-circuit `&&`
    #[display(fmt = "&&")]
    And,
    #[display(fmt = "<")]
    Less,
    #[display(fmt = "+")]
    Plus,
    #[display(fmt = "-")]
    Minus,
    #[display(fmt = "*")]
    Times,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ArrayElement {
    #[display(fmt = "int")]
    Int,
    #[display(fmt = "boolean")]
    Boolean,
}
