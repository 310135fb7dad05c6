//! Recursive descent parser for MiniJava.
//!
//! The grammar is LL(2): a variable declaration and a statement can both
//! start with an identifier, so one extra token of lookahead decides which
//! one follows. Binary expressions are not associative, their operands are
//! primary expressions.
pub mod ast;
mod spantracker;

use crate::spantracker::{SpanTracker, EOF};
use asciifile::{
    MaybeSpanned::{self, *},
    Spanned,
};
use derive_more::Display;
use failure::Fail;
use lexer::{Keyword, Operator, Token, TokenKind};
use std::fmt;

#[rustfmt::skip]
const BINARY_OPERATORS: &[(Operator, ast::BinaryOp)] = &[
    (Operator::LeftChevron, ast::BinaryOp::Less),
    (Operator::Plus,        ast::BinaryOp::Plus),
    (Operator::Minus,       ast::BinaryOp::Minus),
    (Operator::Star,        ast::BinaryOp::Times),
];

#[derive(Debug, Clone, Fail)]
pub enum SyntaxError {
    #[fail(display = "expected {}, found {}", expected, actual)]
    UnexpectedToken { actual: String, expected: String },
    #[fail(display = "unexpected end of file")]
    UnexpectedEOF,
    #[fail(display = "integer literal {} does not fit into 32 bits", literal)]
    IntegerLiteralOutOfRange { literal: String },
}

impl<'f> From<EOF> for MaybeSpanned<'f, SyntaxError> {
    fn from(_: EOF) -> Self {
        MaybeSpanned::WithoutSpan(SyntaxError::UnexpectedEOF)
    }
}

pub trait ExpectedToken<'f>: fmt::Debug + fmt::Display {
    type Yields;
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields>;

    fn matches(&self, token: &TokenKind<'f>) -> bool {
        self.matching(token).is_some()
    }
}

#[derive(Debug, Clone, Display)]
#[display(fmt = "{}", _0)]
struct Exactly<'f>(TokenKind<'f>);
#[derive(Debug, Clone, Display)]
#[display(fmt = "a binary operator")]
struct BinaryOp;
#[derive(Debug, Clone, Display)]
#[display(fmt = "an identifier")]
struct Identifier;
#[derive(Debug, Clone, Display)]
#[display(fmt = "an integer literal")]
struct IntegerLiteral;

impl<'f> From<Operator> for Exactly<'f> {
    fn from(op: Operator) -> Self {
        Exactly(TokenKind::Operator(op))
    }
}

impl<'f> From<Keyword> for Exactly<'f> {
    fn from(kw: Keyword) -> Self {
        Exactly(TokenKind::Keyword(kw))
    }
}

fn exactly<'f>(thing: impl Into<Exactly<'f>>) -> Exactly<'f> {
    thing.into()
}

impl<'f> ExpectedToken<'f> for Exactly<'f> {
    type Yields = ();
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        if &self.0 == token {
            Some(())
        } else {
            None
        }
    }
}

impl<'f> ExpectedToken<'f> for BinaryOp {
    type Yields = ast::BinaryOp;
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        match token {
            TokenKind::Operator(op) => BINARY_OPERATORS
                .iter()
                .find(|(this_op, _)| this_op == op)
                .map(|(_, op)| *op),
            _ => None,
        }
    }
}

impl<'f> ExpectedToken<'f> for Identifier {
    type Yields = &'f str;
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        match token {
            TokenKind::Identifier(ident) => Some(ident),
            _ => None,
        }
    }
}

impl<'f> ExpectedToken<'f> for IntegerLiteral {
    type Yields = &'f str;
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        match token {
            TokenKind::IntegerLiteral(lit) => Some(lit),
            _ => None,
        }
    }
}

pub type SyntaxResult<'f, T> = Result<T, MaybeSpanned<'f, SyntaxError>>;

pub struct Parser<'f, I>
where
    I: Iterator<Item = Token<'f>>,
{
    lexer: SpanTracker<'f, I>,
}

impl<'f, I> Parser<'f, I>
where
    I: Iterator<Item = Token<'f>>,
{
    /// `lexer` must not yield whitespace or comment tokens.
    pub fn new(lexer: I) -> Self {
        Parser {
            lexer: SpanTracker::new(lexer),
        }
    }

    #[allow(clippy::needless_pass_by_value)]
    fn omnomnom<E>(&mut self, want: E) -> SyntaxResult<'f, Spanned<'f, E::Yields>>
    where
        E: ExpectedToken<'f>,
    {
        let actual = self.lexer.next()?;

        match want.matching(&actual.data) {
            Some(yielded) => Ok(Spanned::new(actual.span, yielded)),
            None => Err(WithSpan(Spanned {
                span: actual.span,
                data: SyntaxError::UnexpectedToken {
                    actual: actual.data.to_string(),
                    expected: want.to_string(),
                },
            })),
        }
    }

    /// Only consume the next token if it is the one we want
    #[allow(clippy::needless_pass_by_value)]
    fn omnomnoptional<E>(&mut self, want: E) -> SyntaxResult<'f, Option<Spanned<'f, E::Yields>>>
    where
        E: ExpectedToken<'f>,
    {
        if !self.tastes_like(&want) {
            return Ok(None);
        }
        self.omnomnom(want).map(Some)
    }

    fn tastes_like<E>(&mut self, want: &E) -> bool
    where
        E: ExpectedToken<'f>,
    {
        self.nth_tastes_like(0, want)
    }

    fn nth_tastes_like<E>(&mut self, n: usize, want: &E) -> bool
    where
        E: ExpectedToken<'f>,
    {
        self.lexer
            .peek_nth(n)
            .map(|got| want.matches(&got.data))
            .unwrap_or(false)
    }

    /// Report the next token as not being what the grammar allows here.
    fn unexpected<T>(&mut self, expected: &str) -> SyntaxResult<'f, T> {
        let actual = self.lexer.next()?;
        Err(WithSpan(Spanned {
            span: actual.span,
            data: SyntaxError::UnexpectedToken {
                actual: actual.data.to_string(),
                expected: expected.to_string(),
            },
        }))
    }

    pub fn parse(&mut self) -> SyntaxResult<'f, ast::Program> {
        let main_class = self.parse_main_class()?;

        let mut classes = Vec::new();
        while !self.lexer.eof() {
            classes.push(self.parse_class_declaration()?);
        }

        log::debug!("parsed main class and {} other classes", classes.len());
        Ok(ast::Program {
            main_class,
            classes,
        })
    }

    fn parse_main_class(&mut self) -> SyntaxResult<'f, ast::MainClass> {
        self.omnomnom(exactly(Keyword::Class))?;
        let name = self.omnomnom(Identifier)?.data.to_string();
        self.omnomnom(exactly(Operator::LeftBrace))?;

        self.omnomnom(exactly(Keyword::Public))?;
        self.omnomnom(exactly(Keyword::Static))?;
        self.omnomnom(exactly(Keyword::Void))?;
        self.omnomnom(exactly(Keyword::Main))?;
        self.omnomnom(exactly(Operator::LeftParen))?;
        self.omnomnom(exactly(Keyword::String))?;
        self.omnomnom(exactly(Operator::LeftBracket))?;
        self.omnomnom(exactly(Operator::RightBracket))?;
        let args_name = self.omnomnom(Identifier)?.data.to_string();
        self.omnomnom(exactly(Operator::RightParen))?;

        self.omnomnom(exactly(Operator::LeftBrace))?;
        let vars = self.parse_var_declarations()?;
        let body = self.parse_statements()?;
        self.omnomnom(exactly(Operator::RightBrace))?;

        self.omnomnom(exactly(Operator::RightBrace))?;

        Ok(ast::MainClass {
            name,
            args_name,
            vars,
            body,
        })
    }

    fn parse_class_declaration(&mut self) -> SyntaxResult<'f, ast::ClassDeclaration> {
        self.omnomnom(exactly(Keyword::Class))?;
        let name = self.omnomnom(Identifier)?.data.to_string();

        let superclass = match self.omnomnoptional(exactly(Keyword::Extends))? {
            Some(_) => Some(self.omnomnom(Identifier)?.data.to_string()),
            None => None,
        };

        self.omnomnom(exactly(Operator::LeftBrace))?;
        let fields = self.parse_var_declarations()?;

        let mut methods = Vec::new();
        while self
            .omnomnoptional(exactly(Operator::RightBrace))?
            .is_none()
        {
            methods.push(self.parse_method_declaration()?);
        }

        Ok(ast::ClassDeclaration {
            name,
            superclass,
            fields,
            methods,
        })
    }

    /// A declaration starts with a type followed by the declared name.
    /// `x = 1;` and `x[0] = 1;` start with an identifier too, but the
    /// second token is not.
    fn tastes_like_var_declaration(&mut self) -> bool {
        self.tastes_like(&exactly(Keyword::Int))
            || self.tastes_like(&exactly(Keyword::Boolean))
            || (self.tastes_like(&Identifier) && self.nth_tastes_like(1, &Identifier))
    }

    fn parse_var_declarations(&mut self) -> SyntaxResult<'f, Vec<ast::VarDeclaration>> {
        let mut vars = Vec::new();
        while self.tastes_like_var_declaration() {
            let ty = self.parse_type()?;
            let name = self.omnomnom(Identifier)?.data.to_string();
            self.omnomnom(exactly(Operator::Semicolon))?;
            vars.push(ast::VarDeclaration { ty, name });
        }
        Ok(vars)
    }

    fn parse_type(&mut self) -> SyntaxResult<'f, ast::Type> {
        if self.omnomnoptional(exactly(Keyword::Int))?.is_some() {
            if self
                .omnomnoptional(exactly(Operator::LeftBracket))?
                .is_some()
            {
                self.omnomnom(exactly(Operator::RightBracket))?;
                Ok(ast::Type::IntArray)
            } else {
                Ok(ast::Type::Int)
            }
        } else if self.omnomnoptional(exactly(Keyword::Boolean))?.is_some() {
            if self
                .omnomnoptional(exactly(Operator::LeftBracket))?
                .is_some()
            {
                self.omnomnom(exactly(Operator::RightBracket))?;
                Ok(ast::Type::BooleanArray)
            } else {
                Ok(ast::Type::Boolean)
            }
        } else if let Some(class) = self.omnomnoptional(Identifier)? {
            Ok(ast::Type::Class(class.data.to_string()))
        } else {
            self.unexpected("a type")
        }
    }

    fn parse_method_declaration(&mut self) -> SyntaxResult<'f, ast::MethodDeclaration> {
        self.omnomnom(exactly(Keyword::Public))?;
        let return_ty = self.parse_type()?;
        let name = self.omnomnom(Identifier)?.data.to_string();

        self.omnomnom(exactly(Operator::LeftParen))?;
        let mut params = Vec::new();
        if !self.tastes_like(&exactly(Operator::RightParen)) {
            loop {
                let ty = self.parse_type()?;
                let name = self.omnomnom(Identifier)?.data.to_string();
                params.push(ast::VarDeclaration { ty, name });
                if self.omnomnoptional(exactly(Operator::Comma))?.is_none() {
                    break;
                }
            }
        }
        self.omnomnom(exactly(Operator::RightParen))?;

        self.omnomnom(exactly(Operator::LeftBrace))?;
        let vars = self.parse_var_declarations()?;
        let body = self.parse_statements()?;
        self.omnomnom(exactly(Keyword::Return))?;
        let return_expr = self.parse_expression()?;
        self.omnomnom(exactly(Operator::Semicolon))?;
        self.omnomnom(exactly(Operator::RightBrace))?;

        Ok(ast::MethodDeclaration {
            return_ty,
            name,
            params,
            vars,
            body,
            return_expr,
        })
    }

    /// Statements up to, but not including, a closing brace or `return`.
    fn parse_statements(&mut self) -> SyntaxResult<'f, Vec<ast::Stmt>> {
        let mut stmts = Vec::new();
        while !self.lexer.eof()
            && !self.tastes_like(&exactly(Operator::RightBrace))
            && !self.tastes_like(&exactly(Keyword::Return))
        {
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> SyntaxResult<'f, ast::Stmt> {
        use self::ast::Stmt::*;

        if self.omnomnoptional(exactly(Operator::LeftBrace))?.is_some() {
            let stmts = self.parse_statements()?;
            self.omnomnom(exactly(Operator::RightBrace))?;
            Ok(Block(stmts))
        } else if self.omnomnoptional(exactly(Keyword::If))?.is_some() {
            let cond = self.parse_parenthesized_expression()?;
            let then_branch = Box::new(self.parse_statement()?);
            self.omnomnom(exactly(Keyword::Else))?;
            let else_branch = Box::new(self.parse_statement()?);
            Ok(If {
                cond,
                then_branch,
                else_branch,
            })
        } else if self.omnomnoptional(exactly(Keyword::While))?.is_some() {
            let cond = self.parse_parenthesized_expression()?;
            let body = Box::new(self.parse_statement()?);
            Ok(While { cond, body })
        } else if self.omnomnoptional(exactly(Keyword::PrintLn))?.is_some() {
            let expr = self.parse_parenthesized_expression()?;
            self.omnomnom(exactly(Operator::Semicolon))?;
            Ok(Print(expr))
        } else if let Some(target) = self.omnomnoptional(Identifier)? {
            let target = target.data.to_string();
            let stmt = if self
                .omnomnoptional(exactly(Operator::LeftBracket))?
                .is_some()
            {
                let index = self.parse_expression()?;
                self.omnomnom(exactly(Operator::RightBracket))?;
                self.omnomnom(exactly(Operator::Equal))?;
                let value = self.parse_expression()?;
                ArrayAssign {
                    target,
                    index,
                    value,
                }
            } else {
                self.omnomnom(exactly(Operator::Equal))?;
                let value = self.parse_expression()?;
                Assign { target, value }
            };
            self.omnomnom(exactly(Operator::Semicolon))?;
            Ok(stmt)
        } else {
            self.unexpected("a statement")
        }
    }

    fn parse_parenthesized_expression(&mut self) -> SyntaxResult<'f, ast::Expr> {
        self.omnomnom(exactly(Operator::LeftParen))?;
        let expr = self.parse_expression()?;
        self.omnomnom(exactly(Operator::RightParen))?;
        Ok(expr)
    }

    fn parse_expression(&mut self) -> SyntaxResult<'f, ast::Expr> {
        // a leading `!` can only start a clause, which in turn can only
        // be the left operand of `&&`
        if self.tastes_like(&exactly(Operator::Exclaim)) {
            let clause = self.parse_clause()?;
            return self.parse_and_rest(clause);
        }

        let primary = self.parse_primary_expression()?;

        if self.tastes_like(&exactly(Operator::DoubleAmpersand)) {
            self.parse_and_rest(primary)
        } else if let Some(op) = self.omnomnoptional(BinaryOp)? {
            let rhs = self.parse_primary_expression()?;
            Ok(ast::Expr::Binary(op.data, Box::new(primary), Box::new(rhs)))
        } else if self
            .omnomnoptional(exactly(Operator::LeftBracket))?
            .is_some()
        {
            let index = self.parse_primary_expression()?;
            self.omnomnom(exactly(Operator::RightBracket))?;
            Ok(ast::Expr::ArrayLookup {
                array: Box::new(primary),
                index: Box::new(index),
            })
        } else if self.omnomnoptional(exactly(Operator::Dot))?.is_some() {
            if self.omnomnoptional(exactly(Keyword::Length))?.is_some() {
                return Ok(ast::Expr::ArrayLength(Box::new(primary)));
            }
            let method = self.omnomnom(Identifier)?.data.to_string();
            let args = self.parse_argument_list()?;
            Ok(ast::Expr::MessageSend {
                receiver: Box::new(primary),
                method,
                args,
            })
        } else {
            Ok(primary)
        }
    }

    fn parse_and_rest(&mut self, lhs: ast::Expr) -> SyntaxResult<'f, ast::Expr> {
        if self
            .omnomnoptional(exactly(Operator::DoubleAmpersand))?
            .is_some()
        {
            let rhs = self.parse_clause()?;
            Ok(ast::Expr::Binary(
                ast::BinaryOp::And,
                Box::new(lhs),
                Box::new(rhs),
            ))
        } else {
            Ok(lhs)
        }
    }

    fn parse_clause(&mut self) -> SyntaxResult<'f, ast::Expr> {
        if self.omnomnoptional(exactly(Operator::Exclaim))?.is_some() {
            Ok(ast::Expr::Not(Box::new(self.parse_clause()?)))
        } else {
            self.parse_primary_expression()
        }
    }

    fn parse_primary_expression(&mut self) -> SyntaxResult<'f, ast::Expr> {
        if let Some(lit) = self.omnomnoptional(IntegerLiteral)? {
            let value = lit.data.parse::<i32>().map_err(|_| {
                WithSpan(Spanned::new(
                    lit.span,
                    SyntaxError::IntegerLiteralOutOfRange {
                        literal: lit.data.to_string(),
                    },
                ))
            })?;
            Ok(ast::Expr::Int(value))
        } else if self.omnomnoptional(exactly(Keyword::True))?.is_some() {
            Ok(ast::Expr::Boolean(true))
        } else if self.omnomnoptional(exactly(Keyword::False))?.is_some() {
            Ok(ast::Expr::Boolean(false))
        } else if let Some(ident) = self.omnomnoptional(Identifier)? {
            Ok(ast::Expr::Identifier(ident.data.to_string()))
        } else if self.omnomnoptional(exactly(Keyword::This))?.is_some() {
            Ok(ast::Expr::This)
        } else if self.omnomnoptional(exactly(Keyword::New))?.is_some() {
            self.parse_allocation()
        } else if self.tastes_like(&exactly(Operator::LeftParen)) {
            self.parse_parenthesized_expression()
        } else {
            self.unexpected("a primary expression")
        }
    }

    /// Everything after `new`
    fn parse_allocation(&mut self) -> SyntaxResult<'f, ast::Expr> {
        let element = if self.omnomnoptional(exactly(Keyword::Int))?.is_some() {
            ast::ArrayElement::Int
        } else if self.omnomnoptional(exactly(Keyword::Boolean))?.is_some() {
            ast::ArrayElement::Boolean
        } else {
            let class = self.omnomnom(Identifier)?.data.to_string();
            self.omnomnom(exactly(Operator::LeftParen))?;
            self.omnomnom(exactly(Operator::RightParen))?;
            return Ok(ast::Expr::NewObject(class));
        };

        self.omnomnom(exactly(Operator::LeftBracket))?;
        let size = self.parse_expression()?;
        self.omnomnom(exactly(Operator::RightBracket))?;
        Ok(ast::Expr::NewArray(element, Box::new(size)))
    }

    fn parse_argument_list(&mut self) -> SyntaxResult<'f, Vec<ast::Expr>> {
        let mut list = Vec::new();
        self.omnomnom(exactly(Operator::LeftParen))?;

        if !self.tastes_like(&exactly(Operator::RightParen)) {
            list.push(self.parse_expression()?);
            while self.omnomnoptional(exactly(Operator::Comma))?.is_some() {
                list.push(self.parse_expression()?);
            }
        }

        self.omnomnom(exactly(Operator::RightParen))?;
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp::*, Expr, Stmt, Type};
    use asciifile::AsciiFile;
    use compiler_shared::context::Context;
    use lexer::Lexer;
    use utils::assert_matches;

    macro_rules! lex_input {
        ($itervar:ident = $input:expr) => {
            let input = AsciiFile::new($input.as_bytes()).unwrap();
            let ctx = Context::dummy(&input);
            let $itervar = Lexer::new(&ctx)
                .map(|r| r.unwrap())
                .filter(|t| !t.data.is_trivia());
        };
    }

    fn parse_main_body(body: &str) -> SyntaxResult<'static, Vec<Stmt>> {
        let source = format!(
            "class Main {{ public static void main(String[] a) {{ {} }} }}",
            body
        );
        lex_input!(lx = source);
        Parser::new(lx)
            .parse()
            .map(|program| program.main_class.body)
            .map_err(|err| MaybeSpanned::WithoutSpan(err.into_data()))
    }

    fn parse_single_print(expr: &str) -> Expr {
        let mut body = parse_main_body(&format!("System.out.println({});", expr)).unwrap();
        match body.pop() {
            Some(Stmt::Print(expr)) => expr,
            other => panic!("expected a print statement, got {:?}", other),
        }
    }

    #[test]
    fn hello_world() {
        lex_input!(
            lx = r#"
            class Foo {
                public static void main(String[] args) {
                    System.out.println(42);
                }
            }
        "#
        );
        let program = Parser::new(lx).parse().unwrap();
        assert_eq!("Foo", program.main_class.name);
        assert_eq!("args", program.main_class.args_name);
        assert_eq!(vec![Stmt::Print(Expr::Int(42))], program.main_class.body);
        assert!(program.classes.is_empty());
    }

    #[test]
    fn classes_with_fields_and_methods() {
        lex_input!(
            lx = r#"
            class Main { public static void main(String[] a) { } }
            class A {
                int x;
                boolean[] flags;
                public int get(int d, A other) { int y; y = x + d; return y; }
            }
            class B extends A {
                A parent;
                public int get(int d, A other) { return 0; }
            }
        "#
        );
        let program = Parser::new(lx).parse().unwrap();
        assert_eq!(2, program.classes.len());

        let a = &program.classes[0];
        assert_eq!(None, a.superclass);
        assert_eq!(
            vec![Type::Int, Type::BooleanArray],
            a.fields.iter().map(|f| f.ty.clone()).collect::<Vec<_>>()
        );
        let get = &a.methods[0];
        assert_eq!(Type::Int, get.return_ty);
        assert_eq!(Type::Class("A".to_string()), get.params[1].ty);
        assert_eq!("y", get.vars[0].name);
        assert_eq!(Expr::Identifier("y".to_string()), get.return_expr);

        let b = &program.classes[1];
        assert_eq!(Some("A".to_string()), b.superclass);
        assert_eq!(Type::Class("A".to_string()), b.fields[0].ty);
    }

    #[test]
    fn class_typed_local_versus_assignment() {
        let err = parse_main_body("a = new A(); A b;").unwrap_err();
        // declarations must precede statements
        assert_matches!(&*err, SyntaxError::UnexpectedToken { .. });

        lex_input!(
            lx = "class M { public static void main(String[] a) { A x; x = new A(); } }"
        );
        let program = Parser::new(lx).parse().unwrap();
        assert_eq!("x", program.main_class.vars[0].name);
        assert_eq!(
            vec![Stmt::Assign {
                target: "x".to_string(),
                value: Expr::NewObject("A".to_string())
            }],
            program.main_class.body
        );
    }

    #[test]
    fn statements() {
        let body = parse_main_body(
            "if (true) { } else x = 1; while (false) a[1] = 2; { System.out.println(3); }",
        )
        .unwrap();
        assert_eq!(3, body.len());
        assert_matches!(&body[0], Stmt::If { .. });
        match &body[1] {
            Stmt::While { body, .. } => assert_matches!(&**body, Stmt::ArrayAssign { .. }),
            other => panic!("expected a loop, got {:?}", other),
        }
        assert_eq!(
            Stmt::Block(vec![Stmt::Print(Expr::Int(3))]),
            body[2]
        );
    }

    #[test]
    fn expressions() {
        assert_eq!(
            Expr::Binary(
                And,
                Box::new(Expr::Not(Box::new(Expr::Identifier("a".to_string())))),
                Box::new(Expr::Boolean(true))
            ),
            parse_single_print("!a && true")
        );
        assert_eq!(
            Expr::Binary(
                Less,
                Box::new(Expr::Int(1)),
                Box::new(Expr::Binary(
                    Times,
                    Box::new(Expr::Int(2)),
                    Box::new(Expr::Int(3))
                ))
            ),
            parse_single_print("1 < (2 * 3)")
        );
        assert_matches!(parse_single_print("a[i]"), Expr::ArrayLookup { .. });
        assert_matches!(parse_single_print("a.length"), Expr::ArrayLength(_));
        match parse_single_print("this.m(1, new int[3], new Foo())") {
            Expr::MessageSend {
                receiver,
                method,
                args,
            } => {
                assert_eq!(Expr::This, *receiver);
                assert_eq!("m", method);
                assert_eq!(3, args.len());
            }
            other => panic!("expected a call, got {:?}", other),
        }
        assert_matches!(
            parse_single_print("new boolean[10]"),
            Expr::NewArray(ast::ArrayElement::Boolean, _)
        );
    }

    #[test]
    fn binary_operators_are_not_associative() {
        assert_matches!(parse_main_body("System.out.println(1 + 2 + 3);"), Err(_));
        assert_matches!(parse_main_body("System.out.println(a[i + 1]);"), Err(_));
    }

    #[test]
    fn missing_semicolon() {
        assert_matches!(parse_main_body("System.out.println(42)"), Err(_));
    }

    #[test]
    fn if_requires_else() {
        assert_matches!(parse_main_body("if (true) x = 1;"), Err(_));
    }

    #[test]
    fn integer_literal_out_of_range() {
        assert_matches!(
            parse_main_body("System.out.println(2147483648);").map_err(|e| e.into_data()),
            Err(SyntaxError::IntegerLiteralOutOfRange { .. })
        );
        assert_eq!(Expr::Int(2147483647), parse_single_print("2147483647"));
    }

    #[test]
    fn unexpected_eof() {
        assert_matches!(
            parse_main_body("while (true)").map_err(|e| e.into_data()),
            Err(SyntaxError::UnexpectedEOF)
        );
    }

    #[test]
    fn method_requires_return() {
        lex_input!(
            lx = r#"
            class Main { public static void main(String[] a) { } }
            class A { public int m() { x = 1; } }
        "#
        );
        assert_matches!(Parser::new(lx).parse(), Err(_));
    }
}
