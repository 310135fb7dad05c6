use crate::{error::SemanticResult, repository::Repository, types::Type};
use parser::ast;

/// Registers every class of `program` with its fields, methods, parameters
/// and locals. Stops at the first duplicate or at a superclass that has not
/// been declared before its subclass.
pub fn collect(program: &ast::Program) -> SemanticResult<Repository> {
    let mut collector = DeclarationCollector {
        repo: Repository::new(),
    };
    collector.collect_main_class(&program.main_class)?;
    for class in &program.classes {
        collector.collect_class(class)?;
    }
    log::debug!("collected {} classes", program.classes.len() + 1);
    Ok(collector.repo)
}

struct DeclarationCollector {
    repo: Repository,
}

impl DeclarationCollector {
    fn collect_main_class(&mut self, main: &ast::MainClass) -> SemanticResult<()> {
        const MAIN: &str = "main";

        self.repo.register_class(&main.name, None, true)?;
        self.repo
            .register_method(&main.name, MAIN, Type::Void, true)?;
        self.repo
            .register_param(&main.name, MAIN, &main.args_name, Type::StringArray)?;
        for var in &main.vars {
            self.repo
                .register_local(&main.name, MAIN, &var.name, Type::from(&var.ty))?;
        }
        Ok(())
    }

    fn collect_class(&mut self, class: &ast::ClassDeclaration) -> SemanticResult<()> {
        self.repo
            .register_class(&class.name, class.superclass.as_ref().map(String::as_str), false)?;

        for field in &class.fields {
            self.repo
                .register_field(&class.name, &field.name, Type::from(&field.ty))?;
        }

        for method in &class.methods {
            self.repo.register_method(
                &class.name,
                &method.name,
                Type::from(&method.return_ty),
                false,
            )?;
            for param in &method.params {
                self.repo.register_param(
                    &class.name,
                    &method.name,
                    &param.name,
                    Type::from(&param.ty),
                )?;
            }
            for var in &method.vars {
                self.repo.register_local(
                    &class.name,
                    &method.name,
                    &var.name,
                    Type::from(&var.ty),
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{Entity, SemanticError, SemanticErrorKind},
        test_utils::parse,
    };

    fn collect_src(src: &str) -> SemanticResult<Repository> {
        collect(&parse(src))
    }

    #[test]
    fn registers_everything_in_order() {
        let repo = collect_src(
            r#"
            class Main {
                public static void main(String[] args) { int i; Foo f; }
            }
            class Foo {
                int a;
                boolean[] b;
                public int m(int x, Foo y) { boolean z; return x; }
            }
            class Bar extends Foo { }
        "#,
        )
        .unwrap();

        let names = repo.classes().map(|c| c.name.as_str()).collect::<Vec<_>>();
        assert_eq!(vec!["Main", "Foo", "Bar"], names);

        let main = repo.entry_class().unwrap();
        assert_eq!("Main", main.name);
        let entry = main.method("main").unwrap();
        assert!(entry.is_entry);
        assert_eq!(Some(&Type::StringArray), entry.param("args"));
        assert_eq!(Some(&Type::Class("Foo".to_string())), entry.local("f"));

        let foo = repo.class("Foo").unwrap();
        assert_eq!(2, foo.fields.len());
        let m = foo.method("m").unwrap();
        assert_eq!(
            vec![&Type::Int, &Type::Class("Foo".to_string())],
            m.param_types().collect::<Vec<_>>()
        );
        assert_eq!(Some(&Type::Boolean), m.local("z"));

        assert_eq!(Some("Foo".to_string()), repo.class("Bar").unwrap().superclass);
    }

    #[test]
    fn superclass_declared_later() {
        let err = collect_src(
            r#"
            class Main { public static void main(String[] a) { } }
            class B extends A { }
            class A { }
        "#,
        )
        .unwrap_err();
        assert_eq!(
            SemanticError::UndeclaredClass {
                what: Entity::Class,
                name: "A".to_string()
            },
            err
        );
    }

    #[test]
    fn main_class_name_is_taken() {
        let err = collect_src(
            r#"
            class Main { public static void main(String[] a) { } }
            class Main { }
        "#,
        )
        .unwrap_err();
        assert_eq!(SemanticErrorKind::DuplicateDeclaration, err.kind());
    }

    #[test]
    fn local_shadowing_a_parameter() {
        let err = collect_src(
            r#"
            class Main { public static void main(String[] a) { } }
            class A { public int m(int x) { int x; return 0; } }
        "#,
        )
        .unwrap_err();
        assert_eq!(SemanticErrorKind::DuplicateDeclaration, err.kind());
    }

    #[test]
    fn local_named_like_args() {
        let err = collect_src("class Main { public static void main(String[] a) { int a; } }")
            .unwrap_err();
        assert_eq!(
            SemanticError::DuplicateDeclaration {
                what: Entity::Variable,
                name: "a".to_string()
            },
            err
        );
    }

    #[test]
    fn overloading_is_rejected() {
        let err = collect_src(
            r#"
            class Main { public static void main(String[] a) { } }
            class A {
                public int m() { return 0; }
                public int m(int x) { return x; }
            }
        "#,
        )
        .unwrap_err();
        assert_eq!(
            SemanticError::DuplicateDeclaration {
                what: Entity::Method,
                name: "m".to_string()
            },
            err
        );
    }
}
