use crate::{
    error::{Entity, SemanticError, SemanticResult},
    types::{Type, HEADER_SIZE},
};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: Type,
    /// Byte offset behind the object header, `None` until the layout is
    /// computed.
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: String,
    pub return_ty: Type,
    pub params: Vec<(String, Type)>,
    pub locals: Vec<(String, Type)>,
    /// Index into the vtable, `None` until the layout is computed and
    /// always `None` for the entry method.
    pub slot: Option<usize>,
    pub is_entry: bool,
}

impl MethodDescriptor {
    pub fn param(&self, name: &str) -> Option<&Type> {
        lookup(&self.params, name)
    }

    pub fn local(&self, name: &str) -> Option<&Type> {
        lookup(&self.locals, name)
    }

    pub fn param_types(&self) -> impl Iterator<Item = &Type> {
        self.params.iter().map(|(_, ty)| ty)
    }

    /// Same return type and the same parameter types in the same order.
    pub fn has_signature_of(&self, other: &MethodDescriptor) -> bool {
        self.return_ty == other.return_ty && self.param_types().eq(other.param_types())
    }
}

fn lookup<'a>(vars: &'a [(String, Type)], name: &str) -> Option<&'a Type> {
    vars.iter()
        .find(|(var, _)| var == name)
        .map(|(_, ty)| ty)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDescriptor {
    pub name: String,
    pub superclass: Option<String>,
    pub is_entry: bool,
    pub fields: Vec<FieldDescriptor>,
    pub methods: Vec<MethodDescriptor>,
}

impl ClassDescriptor {
    fn new(name: &str, superclass: Option<&str>, is_entry: bool) -> Self {
        Self {
            name: name.to_string(),
            superclass: superclass.map(str::to_string),
            is_entry,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|method| method.name == name)
    }

    fn method_mut(&mut self, name: &str) -> Option<&mut MethodDescriptor> {
        self.methods.iter_mut().find(|method| method.name == name)
    }
}

/// One vtable entry: the class whose implementation is called and that
/// implementation.
pub type VTableEntry<'r> = (&'r ClassDescriptor, &'r MethodDescriptor);

/// All classes of one program, in declaration order.
#[derive(Debug, Default)]
pub struct Repository {
    classes: Vec<ClassDescriptor>,
    index: HashMap<String, usize>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_class(
        &mut self,
        name: &str,
        superclass: Option<&str>,
        is_entry: bool,
    ) -> SemanticResult<()> {
        if self.index.contains_key(name) {
            return Err(SemanticError::DuplicateDeclaration {
                what: Entity::Class,
                name: name.to_string(),
            });
        }
        if let Some(superclass) = superclass {
            if !self.index.contains_key(superclass) {
                return Err(SemanticError::UndeclaredClass {
                    what: Entity::Class,
                    name: superclass.to_string(),
                });
            }
        }

        log::debug!("register class {} (extends {:?})", name, superclass);
        self.index.insert(name.to_string(), self.classes.len());
        self.classes
            .push(ClassDescriptor::new(name, superclass, is_entry));
        Ok(())
    }

    pub fn register_field(&mut self, class: &str, name: &str, ty: Type) -> SemanticResult<()> {
        let class = self.class_mut(class)?;
        if class.field(name).is_some() {
            return Err(SemanticError::DuplicateDeclaration {
                what: Entity::Field,
                name: name.to_string(),
            });
        }
        class.fields.push(FieldDescriptor {
            name: name.to_string(),
            ty,
            offset: None,
        });
        Ok(())
    }

    pub fn register_method(
        &mut self,
        class: &str,
        name: &str,
        return_ty: Type,
        is_entry: bool,
    ) -> SemanticResult<()> {
        let class = self.class_mut(class)?;
        if class.method(name).is_some() {
            return Err(SemanticError::DuplicateDeclaration {
                what: Entity::Method,
                name: name.to_string(),
            });
        }
        class.methods.push(MethodDescriptor {
            name: name.to_string(),
            return_ty,
            params: Vec::new(),
            locals: Vec::new(),
            slot: None,
            is_entry,
        });
        Ok(())
    }

    pub fn register_param(
        &mut self,
        class: &str,
        method: &str,
        name: &str,
        ty: Type,
    ) -> SemanticResult<()> {
        let method = self.method_scope(class, method, name, Entity::Parameter)?;
        method.params.push((name.to_string(), ty));
        Ok(())
    }

    pub fn register_local(
        &mut self,
        class: &str,
        method: &str,
        name: &str,
        ty: Type,
    ) -> SemanticResult<()> {
        let method = self.method_scope(class, method, name, Entity::Variable)?;
        method.locals.push((name.to_string(), ty));
        Ok(())
    }

    /// Parameters and locals share one scope per method.
    fn method_scope(
        &mut self,
        class: &str,
        method: &str,
        name: &str,
        what: Entity,
    ) -> SemanticResult<&mut MethodDescriptor> {
        let class_name = class;
        let method = self
            .class_mut(class)?
            .method_mut(method)
            .ok_or_else(|| SemanticError::MethodNotFound {
                class: class_name.to_string(),
                method: method.to_string(),
            })?;
        if method.param(name).is_some() || method.local(name).is_some() {
            return Err(SemanticError::DuplicateDeclaration {
                what,
                name: name.to_string(),
            });
        }
        Ok(method)
    }

    fn class_mut(&mut self, name: &str) -> SemanticResult<&mut ClassDescriptor> {
        match self.index.get(name) {
            Some(&idx) => Ok(&mut self.classes[idx]),
            None => Err(SemanticError::UndeclaredClass {
                what: Entity::Class,
                name: name.to_string(),
            }),
        }
    }

    pub(crate) fn class_at_mut(&mut self, idx: usize) -> &mut ClassDescriptor {
        &mut self.classes[idx]
    }

    pub fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        self.index.get(name).map(|&idx| &self.classes[idx])
    }

    pub fn contains_class(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.classes.iter()
    }

    pub fn entry_class(&self) -> Option<&ClassDescriptor> {
        self.classes.iter().find(|class| class.is_entry)
    }

    /// The class itself followed by its ancestors, nearest first.
    pub fn lineage(&self, class: &str) -> Lineage<'_> {
        Lineage {
            repo: self,
            next: self.class(class),
        }
    }

    /// Ancestors of `class`, nearest first.
    pub fn ancestors(&self, class: &str) -> Lineage<'_> {
        let mut lineage = self.lineage(class);
        lineage.next();
        lineage
    }

    /// Find a field declared by `class` or one of its ancestors.
    pub fn lookup_field(
        &self,
        class: &str,
        name: &str,
    ) -> Option<(&ClassDescriptor, &FieldDescriptor)> {
        self.lineage(class)
            .find_map(|class| class.field(name).map(|field| (class, field)))
    }

    /// Find a method declared by `class` or one of its ancestors.
    pub fn lookup_method(
        &self,
        class: &str,
        name: &str,
    ) -> Option<(&ClassDescriptor, &MethodDescriptor)> {
        self.lineage(class)
            .find_map(|class| class.method(name).map(|method| (class, method)))
    }

    /// The nearest ancestor's method that a method `name` declared in
    /// `class` overrides.
    pub fn overridden_method(
        &self,
        class: &str,
        name: &str,
    ) -> Option<(&ClassDescriptor, &MethodDescriptor)> {
        self.ancestors(class)
            .find_map(|class| class.method(name).map(|method| (class, method)))
    }

    /// `sub` is a subtype of `sup` if they are the same class or `sup` is
    /// an ancestor of `sub`.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        self.lineage(sub).any(|class| class.name == sup)
    }

    pub fn instance_size(&self, class: &str) -> usize {
        HEADER_SIZE
            + self
                .lineage(class)
                .flat_map(|class| class.fields.iter())
                .map(|field| field.ty.size())
                .sum::<usize>()
    }

    /// The vtable of `class`, ordered by slot. Empty before the layout is
    /// computed.
    pub fn vtable(&self, class: &str) -> Vec<VTableEntry<'_>> {
        let mut lineage = self.lineage(class).collect::<Vec<_>>();
        lineage.reverse();

        let mut table: Vec<Option<VTableEntry<'_>>> = Vec::new();
        for class in lineage {
            for method in &class.methods {
                if let Some(slot) = method.slot {
                    if table.len() <= slot {
                        table.resize(slot + 1, None);
                    }
                    table[slot] = Some((class, method));
                }
            }
        }
        table.into_iter().flatten().collect()
    }
}

pub struct Lineage<'r> {
    repo: &'r Repository,
    next: Option<&'r ClassDescriptor>,
}

impl<'r> Iterator for Lineage<'r> {
    type Item = &'r ClassDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current
            .superclass
            .as_ref()
            .and_then(|superclass| self.repo.class(superclass));
        Some(current)
    }
}
