use itertools::{EitherOrBoth, Itertools};
use parser::ast::{BinaryOp, Expr, Stmt};
use symtab::{
    ClassDescriptor, Construct, Entity, IndexAssignmentPart, MethodDescriptor, Operation,
    Repository, SemanticError, SemanticResult, Type,
};

/// Checks the statements and expressions of a single method.
pub struct MethodBodyTypeChecker<'r> {
    repo: &'r Repository,
    class: &'r ClassDescriptor,
    method: &'r MethodDescriptor,
}

impl<'r> MethodBodyTypeChecker<'r> {
    pub fn new(
        repo: &'r Repository,
        class: &'r ClassDescriptor,
        method: &'r MethodDescriptor,
    ) -> Self {
        Self {
            repo,
            class,
            method,
        }
    }

    pub fn check_body(&self, stmts: &[Stmt]) -> SemanticResult<()> {
        log::debug!("checking {}.{}", self.class.name, self.method.name);
        for stmt in stmts {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    pub fn check_return(&self, expr: &Expr) -> SemanticResult<()> {
        let found = self.type_of(expr)?;
        if found != self.method.return_ty {
            return Err(SemanticError::WrongReturnType {
                method: self.method.name.clone(),
                expected: self.method.return_ty.clone(),
                found,
            });
        }
        Ok(())
    }

    fn check_stmt(&self, stmt: &Stmt) -> SemanticResult<()> {
        match stmt {
            Stmt::Block(stmts) => self.check_body(stmts),
            Stmt::Assign { target, value } => self.check_assignment(target, value),
            Stmt::ArrayAssign {
                target,
                index,
                value,
            } => self.check_array_assignment(target, index, value),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_condition(Construct::If, cond)?;
                self.check_stmt(then_branch)?;
                self.check_stmt(else_branch)
            }
            Stmt::While { cond, body } => {
                self.check_condition(Construct::While, cond)?;
                self.check_stmt(body)
            }
            Stmt::Print(expr) => match self.type_of(expr)? {
                Type::Int => Ok(()),
                found => Err(SemanticError::InvalidPrintArgument { found }),
            },
        }
    }

    fn check_condition(&self, construct: Construct, cond: &Expr) -> SemanticResult<()> {
        match self.type_of(cond)? {
            Type::Boolean => Ok(()),
            found => Err(SemanticError::BadConditionType { construct, found }),
        }
    }

    fn check_assignment(&self, target: &str, value: &Expr) -> SemanticResult<()> {
        let expected = self.resolve_identifier(target)?;
        if expected == Type::Undeclared {
            return Err(SemanticError::UndeclaredClass {
                what: Entity::Variable,
                name: target.to_string(),
            });
        }
        let found = self.type_of(value)?;

        match (&expected, &found) {
            (Type::Class(_), Type::Undeclared) => Err(undeclared(Entity::Variable, value)),
            (Type::Class(sup), Type::Class(sub)) if sup != sub => {
                if !self.repo.contains_class(sub) {
                    Err(SemanticError::UndeclaredClass {
                        what: Entity::Class,
                        name: sub.clone(),
                    })
                } else if !self.repo.is_subtype(sub, sup) {
                    Err(SemanticError::NotASubtype {
                        expected: expected.clone(),
                        found: found.clone(),
                    })
                } else {
                    Ok(())
                }
            }
            _ if expected != found => Err(SemanticError::BadAssignmentStatement {
                method: self.method.name.clone(),
                target: target.to_string(),
                expected: expected.clone(),
                found: found.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn check_array_assignment(
        &self,
        target: &str,
        index: &Expr,
        value: &Expr,
    ) -> SemanticResult<()> {
        let array = self.resolve_identifier(target)?;
        let index = self.type_of(index)?;
        let found = self.type_of(value)?;

        if array == Type::Undeclared {
            return Err(SemanticError::UndeclaredClass {
                what: Entity::Variable,
                name: target.to_string(),
            });
        }
        if found == Type::Undeclared {
            return Err(undeclared(Entity::Variable, value));
        }
        let element = array
            .element_type()
            .ok_or_else(|| SemanticError::InvalidArrayAccess {
                found: array.clone(),
            })?;

        let bad_part = |part| SemanticError::BadIndexAssignment {
            part,
            target: target.to_string(),
            method: self.method.name.clone(),
        };
        if index != Type::Int {
            return Err(bad_part(IndexAssignmentPart::Index));
        }
        if found != element {
            return Err(bad_part(IndexAssignmentPart::Expression));
        }
        Ok(())
    }

    /// Locals, then parameters, then fields of the class and its ancestors.
    /// Names that resolve to nothing have the type [`Type::Undeclared`].
    fn resolve_identifier(&self, name: &str) -> SemanticResult<Type> {
        if let Some(ty) = self.method.local(name) {
            return Ok(ty.clone());
        }
        if let Some(ty) = self.method.param(name) {
            if self.method.is_entry {
                return Err(SemanticError::IllegalArgsParameterUse {
                    name: name.to_string(),
                });
            }
            return Ok(ty.clone());
        }
        Ok(self
            .repo
            .lookup_field(&self.class.name, name)
            .map(|(_, field)| field.ty.clone())
            .unwrap_or(Type::Undeclared))
    }

    pub fn type_of(&self, expr: &Expr) -> SemanticResult<Type> {
        match expr {
            Expr::Int(_) => Ok(Type::Int),
            Expr::Boolean(_) => Ok(Type::Boolean),
            Expr::Identifier(name) => self.resolve_identifier(name),
            Expr::This => {
                if self.method.is_entry {
                    Err(SemanticError::IllegalThisInMain)
                } else {
                    Ok(Type::Class(self.class.name.clone()))
                }
            }
            Expr::Binary(op, lhs, rhs) => self.type_of_binary(*op, lhs, rhs),
            Expr::Not(operand) => match self.type_of(operand)? {
                Type::Boolean => Ok(Type::Boolean),
                _ => Err(SemanticError::BadOperandTypes {
                    op: Operation::Not,
                    expected: Type::Boolean,
                }),
            },
            Expr::ArrayLookup { array, index } => {
                let array = self.type_of(array)?;
                let element = array
                    .element_type()
                    .ok_or_else(|| SemanticError::InvalidArrayAccess {
                        found: array.clone(),
                    })?;
                match self.type_of(index)? {
                    Type::Int => Ok(element),
                    found => Err(SemanticError::InvalidArrayIndex { found }),
                }
            }
            Expr::ArrayLength(array) => match self.type_of(array)? {
                ref ty if ty.is_array() => Ok(Type::Int),
                found => Err(SemanticError::InvalidArrayLength { found }),
            },
            Expr::MessageSend {
                receiver,
                method,
                args,
            } => self.type_of_call(receiver, method, args),
            Expr::NewArray(element, size) => match self.type_of(size)? {
                Type::Int => Ok(Type::array_of(*element)),
                found => Err(SemanticError::InvalidArraySizeType {
                    element: *element,
                    found,
                }),
            },
            Expr::NewObject(class) => {
                if self.repo.contains_class(class) {
                    Ok(Type::Class(class.clone()))
                } else {
                    Err(SemanticError::UnknownClassInAllocation {
                        name: class.clone(),
                    })
                }
            }
        }
    }

    fn type_of_binary(&self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> SemanticResult<Type> {
        let (operand, result) = match op {
            BinaryOp::And => (Type::Boolean, Type::Boolean),
            BinaryOp::Less => (Type::Int, Type::Boolean),
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Times => (Type::Int, Type::Int),
        };
        let lhs = self.type_of(lhs)?;
        let rhs = self.type_of(rhs)?;
        if lhs != operand || rhs != operand {
            return Err(SemanticError::BadOperandTypes {
                op: Operation::from(op),
                expected: operand,
            });
        }
        Ok(result)
    }

    fn type_of_call(&self, receiver: &Expr, method: &str, args: &[Expr]) -> SemanticResult<Type> {
        let class = match self.type_of(receiver)? {
            Type::Class(class) => class,
            Type::Undeclared => {
                return Err(SemanticError::MemberCallOnUndeclared {
                    method: method.to_string(),
                })
            }
            found => {
                return Err(SemanticError::InvalidMemberCallTarget {
                    method: method.to_string(),
                    found,
                })
            }
        };

        // arguments are evaluated before the method is looked up
        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args {
            match self.type_of(arg)? {
                Type::Undeclared => return Err(undeclared(Entity::CallArgument, arg)),
                ty => arg_types.push(ty),
            }
        }

        let (_, callee) =
            self.repo
                .lookup_method(&class, method)
                .ok_or_else(|| SemanticError::MethodNotFound {
                    class: class.clone(),
                    method: method.to_string(),
                })?;

        let arguments_match = callee
            .param_types()
            .zip_longest(arg_types.iter())
            .all(|pair| match pair {
                EitherOrBoth::Both(param, arg) => self.is_assignable(param, arg),
                _ => false,
            });
        if !arguments_match {
            return Err(SemanticError::WrongCallArguments {
                method: method.to_string(),
            });
        }

        Ok(callee.return_ty.clone())
    }

    fn is_assignable(&self, to: &Type, from: &Type) -> bool {
        match (to, from) {
            (Type::Class(sup), Type::Class(sub)) => self.repo.is_subtype(sub, sup),
            _ => to == from,
        }
    }
}

fn undeclared(what: Entity, expr: &Expr) -> SemanticError {
    let name = match expr {
        Expr::Identifier(name) => name.clone(),
        _ => Type::Undeclared.to_string(),
    };
    SemanticError::UndeclaredClass { what, name }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::*;
    use symtab::{
        Construct, Entity, IndexAssignmentPart, Operation, SemanticError, SemanticErrorKind,
        Type,
    };

    fn check_main(vars: &str, body: &str, classes: &str) -> Result<(), SemanticError> {
        check_src(&main_with(vars, body, classes))
    }

    fn kind_of(vars: &str, body: &str, classes: &str) -> Result<(), SemanticErrorKind> {
        check_main(vars, body, classes).map_err(|err| err.kind())
    }

    const SHAPES: &str = r#"
        class Shape { int id; public int area() { return 0; } public Shape self() { return this; } }
        class Square extends Shape { int side; public int area() { return side * side; } }
        class Cube extends Square { }
        class Other { }
    "#;

    #[test]
    fn well_typed_program() {
        assert_eq!(
            Ok(()),
            check_main(
                "int[] a; boolean[] b; int i; Shape s; Cube c;",
                r#"
                a = new int[10];
                b = new boolean[a.length];
                i = 0;
                while (i < (a.length)) {
                    a[i] = (i * 2) - 1;
                    b[i] = !((a[i]) < 3) && true;
                    i = i + 1;
                }
                c = new Cube();
                s = c;
                if (b[0]) System.out.println(s.area()); else System.out.println((c.self()).area());
                "#,
                SHAPES,
            )
        );
    }

    #[test]
    fn args_parameter_cannot_be_used() {
        let err = check_main("int x;", "x = args;", "").unwrap_err();
        assert_eq!(
            SemanticError::IllegalArgsParameterUse {
                name: "args".to_string()
            },
            err
        );
        assert_eq!(
            Err(SemanticErrorKind::IllegalArgsParameterUse),
            kind_of("", "System.out.println(args.length);", "")
        );
    }

    #[test]
    fn this_in_main() {
        assert_eq!(
            Err(SemanticErrorKind::IllegalThisInMain),
            kind_of("", "System.out.println(this.foo());", "")
        );
        assert_eq!(
            Err(SemanticErrorKind::IllegalThisInMain),
            kind_of("Main m;", "m = this;", "")
        );
    }

    #[test]
    fn subtype_assignment() {
        assert_eq!(Ok(()), kind_of("Shape s;", "s = new Cube();", SHAPES));
        let err = check_main("Cube c;", "c = new Shape();", SHAPES).unwrap_err();
        assert_eq!(
            SemanticError::NotASubtype {
                expected: Type::Class("Cube".to_string()),
                found: Type::Class("Shape".to_string()),
            },
            err
        );
        assert_eq!(
            Err(SemanticErrorKind::NotASubtype),
            kind_of("Shape s;", "s = new Other();", SHAPES)
        );
    }

    #[test]
    fn assignment_to_undeclared_variable() {
        let err = check_main("", "x = 1;", "").unwrap_err();
        assert_eq!(
            SemanticError::UndeclaredClass {
                what: Entity::Variable,
                name: "x".to_string()
            },
            err
        );
    }

    #[test]
    fn assignment_from_undeclared_variable() {
        assert_eq!(
            Err(SemanticErrorKind::UndeclaredClass),
            kind_of("Shape s;", "s = nope;", SHAPES)
        );
        assert_eq!(
            Err(SemanticErrorKind::BadAssignmentStatement),
            kind_of("int i;", "i = nope;", "")
        );
    }

    #[test]
    fn bad_assignment() {
        let err = check_main("int i;", "i = true;", "").unwrap_err();
        assert_eq!(
            SemanticError::BadAssignmentStatement {
                method: "main".to_string(),
                target: "i".to_string(),
                expected: Type::Int,
                found: Type::Boolean,
            },
            err
        );
        assert_eq!(
            Err(SemanticErrorKind::BadAssignmentStatement),
            kind_of("int[] a;", "a = new boolean[1];", "")
        );
        assert_eq!(
            Err(SemanticErrorKind::BadAssignmentStatement),
            kind_of("Shape s;", "s = 1;", SHAPES)
        );
    }

    #[test]
    fn array_assignment() {
        let bad_part = |part| SemanticError::BadIndexAssignment {
            part,
            target: "a".to_string(),
            method: "main".to_string(),
        };
        assert_eq!(
            Err(bad_part(IndexAssignmentPart::Index)),
            check_main("int[] a;", "a[true] = 1;", "")
        );
        assert_eq!(
            Err(bad_part(IndexAssignmentPart::Expression)),
            check_main("int[] a;", "a[0] = false;", "")
        );
        assert_eq!(
            Err(SemanticErrorKind::InvalidArrayAccess),
            kind_of("int a;", "a[0] = 1;", "")
        );
        assert_eq!(
            Err(SemanticErrorKind::UndeclaredClass),
            kind_of("", "a[0] = 1;", "")
        );
    }

    #[test]
    fn conditions_must_be_boolean() {
        assert_eq!(
            Err(SemanticError::BadConditionType {
                construct: Construct::If,
                found: Type::Int
            }),
            check_main("", "if (1) { } else { }", "")
        );
        assert_eq!(
            Err(SemanticError::BadConditionType {
                construct: Construct::While,
                found: Type::IntArray
            }),
            check_main("int[] a;", "while (a) { }", "")
        );
    }

    #[test]
    fn print_requires_int() {
        assert_eq!(
            Err(SemanticErrorKind::InvalidPrintArgument),
            kind_of("", "System.out.println(false);", "")
        );
        assert_eq!(
            Err(SemanticErrorKind::InvalidPrintArgument),
            kind_of("Shape s;", "System.out.println(s);", SHAPES)
        );
    }

    #[test]
    fn operand_types() {
        let op_err = |op, expected| -> Result<(), SemanticError> {
            Err(SemanticError::BadOperandTypes { op, expected })
        };
        assert_eq!(
            op_err(Operation::And, Type::Boolean),
            check_main("", "System.out.println(1 && true);", "")
        );
        assert_eq!(
            op_err(Operation::Compare, Type::Int),
            check_main("boolean b;", "b = true < 1;", "")
        );
        assert_eq!(
            op_err(Operation::Plus, Type::Int),
            check_main("", "System.out.println(1 + false);", "")
        );
        assert_eq!(
            op_err(Operation::Minus, Type::Int),
            check_main("int[] a;", "System.out.println(a - 1);", "")
        );
        assert_eq!(
            op_err(Operation::Times, Type::Int),
            check_main("", "System.out.println(true * 2);", "")
        );
        assert_eq!(
            op_err(Operation::Not, Type::Boolean),
            check_main("boolean b;", "b = !1;", "")
        );
    }

    #[test]
    fn array_lookup_and_length() {
        assert_eq!(
            Err(SemanticErrorKind::InvalidArrayAccess),
            kind_of("int i;", "System.out.println(i[0]);", "")
        );
        assert_eq!(
            Err(SemanticErrorKind::InvalidArrayIndex),
            kind_of("int[] a;", "System.out.println(a[true]);", "")
        );
        assert_eq!(
            Err(SemanticErrorKind::InvalidArrayLength),
            kind_of("boolean b;", "System.out.println(b.length);", "")
        );
        assert_eq!(
            Ok(()),
            kind_of("boolean[] b;", "if (b[0]) { } else { }", "")
        );
    }

    #[test]
    fn allocations() {
        assert_eq!(
            Err(SemanticError::InvalidArraySizeType {
                element: parser::ast::ArrayElement::Boolean,
                found: Type::Boolean
            }),
            check_main("boolean[] b;", "b = new boolean[true];", "")
        );
        assert_eq!(
            Err(SemanticErrorKind::InvalidArraySizeType),
            kind_of("int[] a;", "a = new int[new int[1]];", "")
        );
        assert_eq!(
            Err(SemanticError::UnknownClassInAllocation {
                name: "Ghost".to_string()
            }),
            check_main("", "System.out.println(new Ghost().m());", "")
        );
    }

    #[test]
    fn call_targets() {
        assert_eq!(
            Err(SemanticErrorKind::InvalidMemberCallTarget),
            kind_of("int i;", "System.out.println(i.area());", "")
        );
        assert_eq!(
            Err(SemanticErrorKind::InvalidMemberCallTarget),
            kind_of("int[] a;", "System.out.println(a.area());", "")
        );
        assert_eq!(
            Err(SemanticErrorKind::MemberCallOnUndeclared),
            kind_of("", "System.out.println(nope.area());", "")
        );
        assert_eq!(
            Err(SemanticError::MethodNotFound {
                class: "Other".to_string(),
                method: "area".to_string()
            }),
            check_main("", "System.out.println(new Other().area());", SHAPES)
        );
    }

    #[test]
    fn inherited_methods_are_found() {
        assert_eq!(
            Ok(()),
            kind_of(
                "Cube c;",
                "c = new Cube(); System.out.println((c.self()).area());",
                SHAPES
            )
        );
    }

    const CALLS: &str = r#"
        class Shape { }
        class Square extends Shape { }
        class Calc {
            public int f(int a, Shape s, boolean b) { return a; }
            public int g() { return this.f(1, new Square(), true); }
        }
    "#;

    #[test]
    fn call_arguments() {
        assert_eq!(
            Ok(()),
            kind_of("Calc c;", "c = new Calc(); System.out.println(c.g());", CALLS)
        );
        for args in &[
            "",
            "1, new Shape()",
            "1, new Shape(), true, 2",
            "true, new Shape(), true",
            "1, new Calc(), true",
            "1, new Shape(), 0",
        ] {
            let body = format!(
                "c = new Calc(); System.out.println(c.f({}));",
                args
            );
            assert_eq!(
                Err(SemanticErrorKind::WrongCallArguments),
                kind_of("Calc c;", &body, CALLS),
                "arguments: {}",
                args
            );
        }
    }

    #[test]
    fn undeclared_call_argument() {
        let err = check_main(
            "Calc c;",
            "c = new Calc(); System.out.println(c.f(1, ghost, true));",
            CALLS,
        )
        .unwrap_err();
        assert_eq!(
            SemanticError::UndeclaredClass {
                what: Entity::CallArgument,
                name: "ghost".to_string()
            },
            err
        );
    }

    #[test]
    fn nested_calls_keep_their_own_arguments() {
        let classes = r#"
            class A {
                public int two(int x, int y) { return x + y; }
                public int one(int x) { return x; }
                public int run() { return this.two(this.one(1), this.one(this.two(2, 3))); }
            }
        "#;
        assert_eq!(
            Ok(()),
            kind_of("A a;", "a = new A(); System.out.println(a.run());", classes)
        );
    }

    #[test]
    fn fields_resolve_through_ancestors() {
        let classes = r#"
            class A { int x; }
            class B extends A { public int get() { return x; } }
            class C extends B { boolean x; public boolean own() { return x; } }
        "#;
        assert_eq!(Ok(()), kind_of("", "", classes));
    }

    #[test]
    fn locals_shadow_fields() {
        let classes = r#"
            class A { int x; public boolean m() { boolean x; x = true; return x; } }
        "#;
        assert_eq!(Ok(()), kind_of("", "", classes));
    }

    #[test]
    fn this_has_the_enclosing_class_type() {
        let classes = r#"
            class A { public A me() { return this; } }
            class B extends A { public int m() { A a; a = this; return 0; } }
        "#;
        assert_eq!(Ok(()), kind_of("", "", classes));
    }
}
