use crate::method_body_type_checker::MethodBodyTypeChecker;
use parser::ast;
use symtab::{
    ClassDescriptor, Entity, MethodDescriptor, Repository, SemanticError, SemanticResult, Type,
};

/// Checks `program` against `repo`, which must have been collected from the
/// same program. Classes and their members are visited in declaration
/// order and the first violation is returned.
pub fn check(repo: &Repository, program: &ast::Program) -> SemanticResult<()> {
    let main = &program.main_class;
    let (class, method) = lookup(repo, &main.name, "main")?;
    for (_, ty) in &method.locals {
        check_declared_type(repo, ty)?;
    }
    MethodBodyTypeChecker::new(repo, class, method).check_body(&main.body)?;

    for class_decl in &program.classes {
        let class = repo
            .class(&class_decl.name)
            .ok_or_else(|| SemanticError::UndeclaredClass {
                what: Entity::Class,
                name: class_decl.name.clone(),
            })?;
        check_class(repo, class, class_decl)?;
    }

    log::debug!("type check passed");
    Ok(())
}

fn check_class(
    repo: &Repository,
    class: &ClassDescriptor,
    class_decl: &ast::ClassDeclaration,
) -> SemanticResult<()> {
    for field in &class.fields {
        check_declared_type(repo, &field.ty)?;
    }

    for method_decl in &class_decl.methods {
        let (_, method) = lookup(repo, &class.name, &method_decl.name)?;

        check_override(repo, class, method)?;
        check_declared_type(repo, &method.return_ty)?;
        for ty in method.param_types() {
            check_declared_type(repo, ty)?;
        }
        for (_, ty) in &method.locals {
            check_declared_type(repo, ty)?;
        }

        let checker = MethodBodyTypeChecker::new(repo, class, method);
        checker.check_body(&method_decl.body)?;
        checker.check_return(&method_decl.return_expr)?;
    }
    Ok(())
}

fn lookup<'r>(
    repo: &'r Repository,
    class: &str,
    method: &str,
) -> SemanticResult<(&'r ClassDescriptor, &'r MethodDescriptor)> {
    repo.class(class)
        .and_then(|c| c.method(method).map(|m| (c, m)))
        .ok_or_else(|| SemanticError::MethodNotFound {
            class: class.to_string(),
            method: method.to_string(),
        })
}

/// A declared type naming a class requires that class to exist.
fn check_declared_type(repo: &Repository, ty: &Type) -> SemanticResult<()> {
    match ty {
        Type::Class(name) if !repo.contains_class(name) => Err(SemanticError::UndeclaredClass {
            what: Entity::Class,
            name: name.clone(),
        }),
        _ => Ok(()),
    }
}

/// A method redeclared in a subclass must keep the exact signature of the
/// nearest ancestor's declaration.
fn check_override(
    repo: &Repository,
    class: &ClassDescriptor,
    method: &MethodDescriptor,
) -> SemanticResult<()> {
    match repo.overridden_method(&class.name, &method.name) {
        Some((ancestor, overridden)) if !method.has_signature_of(overridden) => {
            Err(SemanticError::NonVirtualOverride {
                class: class.name.clone(),
                method: method.name.clone(),
                ancestor: ancestor.name.clone(),
            })
        }
        _ => Ok(()),
    }
}
