use crate::{
    llvm::{Function, Label, Module, VTable},
    type_translation::method_type,
    CodegenError, CodegenResult, MethodBodyGenerator,
};
use derive_more::Display;
use parser::ast;
use std::collections::HashMap;
use symtab::{ClassDescriptor, MethodDescriptor, Repository};

/// The constructs that need fresh labels. Each kind counts on its own and
/// never restarts within a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum LabelKind {
    #[display(fmt = "if")]
    If,
    #[display(fmt = "loop")]
    Loop,
    /// array bounds checks
    #[display(fmt = "oob")]
    Oob,
    #[display(fmt = "arr_alloc")]
    ArrAlloc,
    #[display(fmt = "and")]
    And,
}

#[derive(Debug, Default)]
pub struct LabelCounters {
    next: HashMap<LabelKind, usize>,
}

impl LabelCounters {
    pub fn fresh(&mut self, kind: LabelKind) -> Label {
        let counter = self.next.entry(kind).or_insert(0);
        let label = format!("{}{}", kind, counter);
        *counter += 1;
        label
    }
}

pub struct ProgramGenerator<'r> {
    repo: &'r Repository,
    program: &'r ast::Program,
    labels: LabelCounters,
}

impl<'r> ProgramGenerator<'r> {
    pub fn new(repo: &'r Repository, program: &'r ast::Program) -> Self {
        Self {
            repo,
            program,
            labels: LabelCounters::default(),
        }
    }

    /// Vtables of all classes in declaration order, followed by the entry
    /// function and every other method.
    pub fn generate(mut self) -> CodegenResult<Module> {
        let program = self.program;
        let vtables = self.repo.classes().map(|class| self.vtable(class)).collect();

        let main = &program.main_class;
        let (class, method) = self.lookup(&main.name, "main")?;
        let mut functions = vec![self.generate_method(class, method, &main.body, None)?];

        for class_decl in &program.classes {
            for method_decl in &class_decl.methods {
                let (class, method) = self.lookup(&class_decl.name, &method_decl.name)?;
                functions.push(self.generate_method(
                    class,
                    method,
                    &method_decl.body,
                    Some(&method_decl.return_expr),
                )?);
            }
        }

        log::debug!("generated {} functions", functions.len());
        Ok(Module { vtables, functions })
    }

    fn vtable(&self, class: &ClassDescriptor) -> VTable {
        let entries = self
            .repo
            .vtable(&class.name)
            .into_iter()
            .map(|(owner, method)| {
                (
                    method_type(&method.return_ty, method.param_types()),
                    format!("{}.{}", owner.name, method.name),
                )
            })
            .collect();
        VTable {
            class: class.name.clone(),
            entries,
        }
    }

    fn generate_method(
        &mut self,
        class: &'r ClassDescriptor,
        method: &'r MethodDescriptor,
        body: &[ast::Stmt],
        return_expr: Option<&ast::Expr>,
    ) -> CodegenResult<Function> {
        MethodBodyGenerator::new(self.repo, class, method, &mut self.labels)
            .generate(body, return_expr)
    }

    fn lookup(
        &self,
        class: &str,
        method: &str,
    ) -> CodegenResult<(&'r ClassDescriptor, &'r MethodDescriptor)> {
        let repo = self.repo;
        let class_desc = repo
            .class(class)
            .ok_or_else(|| CodegenError::UnknownClass {
                name: class.to_string(),
            })?;
        let method_desc = class_desc
            .method(method)
            .ok_or_else(|| CodegenError::UnknownMethod {
                class: class.to_string(),
                method: method.to_string(),
            })?;
        Ok((class_desc, method_desc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn label_kinds_count_independently() {
        let mut labels = LabelCounters::default();
        assert_eq!("if0", labels.fresh(LabelKind::If));
        assert_eq!("if1", labels.fresh(LabelKind::If));
        assert_eq!("loop0", labels.fresh(LabelKind::Loop));
        assert_eq!("arr_alloc0", labels.fresh(LabelKind::ArrAlloc));
        assert_eq!("if2", labels.fresh(LabelKind::If));
    }

    #[test]
    fn labels_continue_across_methods() {
        let ir = compile(
            r#"
            class Main { public static void main(String[] args) {
                if (true) System.out.println(1); else System.out.println(2);
            } }
            class A { public int m() {
                if (true) System.out.println(1); else System.out.println(2);
                return 0;
            } }
        "#,
        );
        assert!(function(&ir, "main").contains("label %if0, label %if1"));
        assert!(function(&ir, "A.m").contains("label %if3, label %if4"));
    }

    #[test]
    fn override_reuses_the_slot() {
        let ir = compile(
            r#"
            class Main { public static void main(String[] args) { } }
            class A { int x; public int m() { return x; } }
            class B extends A { public int m() { return x; } }
        "#,
        );
        assert!(ir.contains("@.Main_vtable = global [0 x i8*] []\n"));
        assert!(ir.contains(
            "@.A_vtable = global [1 x i8*] [i8* bitcast (i32 (i8*)* @A.m to i8*)]\n"
        ));
        assert!(ir.contains(
            "@.B_vtable = global [1 x i8*] [i8* bitcast (i32 (i8*)* @B.m to i8*)]\n"
        ));
    }

    #[test]
    fn inherited_methods_keep_their_owner() {
        let ir = compile(
            r#"
            class Main { public static void main(String[] args) { } }
            class A {
                public int f() { return 1; }
                public boolean g(int a, A b) { return true; }
            }
            class B extends A {
                public int f() { return 2; }
                public int h() { return 3; }
            }
        "#,
        );
        assert!(ir.contains(
            "@.B_vtable = global [3 x i8*] [\
             i8* bitcast (i32 (i8*)* @B.f to i8*), \
             i8* bitcast (i1 (i8*, i32, i8*)* @A.g to i8*), \
             i8* bitcast (i32 (i8*)* @B.h to i8*)]\n"
        ));
        assert!(!ir.contains("@B.g("));
    }

    #[test]
    fn object_allocation_installs_the_vtable() {
        let ir = compile(
            r#"
            class Main { public static void main(String[] args) {
                A a; E e;
                a = new A();
                e = new E();
            } }
            class A { int x; boolean b; public int m() { return x; } }
            class E { }
        "#,
        );
        let main = function(&ir, "main");
        assert!(main.contains(
            "\t%_0 = call i8* @calloc(i32 1, i32 13)\n\
             \t%_1 = bitcast i8* %_0 to i8***\n\
             \t%_2 = getelementptr [1 x i8*], [1 x i8*]* @.A_vtable, i32 0, i32 0\n\
             \tstore i8** %_2, i8*** %_1\n\
             \tstore i8* %_0, i8** %a.addr\n"
        ));
        // no methods, nothing to install
        assert!(main.contains(
            "\t%_3 = call i8* @calloc(i32 1, i32 8)\n\
             \tstore i8* %_3, i8** %e.addr\n"
        ));
    }

    #[test]
    fn virtual_call() {
        let ir = compile(
            r#"
            class Main { public static void main(String[] args) {
                System.out.println((new A()).add(1, true));
            } }
            class A {
                public int other() { return 0; }
                public int add(int x, boolean b) { return x; }
            }
        "#,
        );
        let main = function(&ir, "main");
        assert!(main.contains(
            "\t%_3 = bitcast i8* %_0 to i8***\n\
             \t%_4 = load i8**, i8*** %_3\n\
             \t%_5 = getelementptr i8*, i8** %_4, i32 1\n\
             \t%_6 = load i8*, i8** %_5\n\
             \t%_7 = bitcast i8* %_6 to i32 (i8*, i32, i1)*\n\
             \t%_8 = call i32 %_7(i8* %_0, i32 1, i1 1)\n\
             \tcall void @print_int(i32 %_8)\n"
        ));
    }

    #[test]
    fn module_layout() {
        let ir = compile(
            r#"
            class Main { public static void main(String[] args) { } }
            class A { public int m() { return 0; } }
        "#,
        );
        let preamble_end = ir.find("define void @throw_oob()").unwrap();
        let vtable = ir.find("@.Main_vtable").unwrap();
        let main = ir.find("define i32 @main()").unwrap();
        let method = ir.find("define i32 @A.m(i8* %this)").unwrap();
        assert!(preamble_end < vtable);
        assert!(vtable < main);
        assert!(main < method);
    }
}
