use derive_more::Display;
use parser::ast;

/// Every object starts with a pointer to its class's vtable.
pub const HEADER_SIZE: usize = 8;
pub const POINTER_SIZE: usize = 8;

/// The static type of a declaration or an expression.
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
    /// Return type of the entry method
    #[display(fmt = "void")]
    Void,
    /// Type of the entry method's parameter, which must never be used
    #[display(fmt = "String[]")]
    StringArray,
    /// An identifier that resolved to nothing
    #[display(fmt = "undeclared")]
    Undeclared,
}

impl Type {
    /// Size of a value of this type when stored inside an object.
    pub fn size(&self) -> usize {
        match self {
            Type::Int => 4,
            Type::Boolean => 1,
            _ => POINTER_SIZE,
        }
    }

    pub fn is_array(&self) -> bool {
        match self {
            Type::IntArray | Type::BooleanArray => true,
            _ => false,
        }
    }

    pub fn element_type(&self) -> Option<Type> {
        match self {
            Type::IntArray => Some(Type::Int),
            Type::BooleanArray => Some(Type::Boolean),
            _ => None,
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            Type::Class(name) => Some(name),
            _ => None,
        }
    }

    pub fn array_of(element: ast::ArrayElement) -> Type {
        match element {
            ast::ArrayElement::Int => Type::IntArray,
            ast::ArrayElement::Boolean => Type::BooleanArray,
        }
    }
}

impl From<&ast::Type> for Type {
    fn from(ty: &ast::Type) -> Self {
        match ty {
            ast::Type::Int => Type::Int,
            ast::Type::Boolean => Type::Boolean,
            ast::Type::IntArray => Type::IntArray,
            ast::Type::BooleanArray => Type::BooleanArray,
            ast::Type::Class(name) => Type::Class(name.clone()),
        }
    }
}
