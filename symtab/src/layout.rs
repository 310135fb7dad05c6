//! Field offsets and vtable slots for single inheritance.
//!
//! A subclass object starts with the complete layout of its superclass, so
//! an inherited field has the same offset in every descendant. Likewise an
//! overriding method keeps the slot of the method it overrides and new
//! methods are appended behind the superclass's vtable.
use crate::repository::Repository;

/// Assigns an offset to every field and a slot to every method except the
/// entry method. Superclasses are always declared before their subclasses,
/// so visiting the classes in declaration order sees every ancestor's layout
/// before the layout of its descendants.
pub fn compute_layout(repo: &mut Repository) {
    let class_names = repo
        .classes()
        .map(|class| class.name.clone())
        .collect::<Vec<_>>();

    for (idx, name) in class_names.iter().enumerate() {
        let (offsets, slots) = {
            let repo = &*repo;
            (field_offsets(repo, name), method_slots(repo, name))
        };

        let class = repo.class_at_mut(idx);
        for (field, offset) in class.fields.iter_mut().zip(offsets) {
            field.offset = Some(offset);
        }
        for (method, slot) in class.methods.iter_mut().zip(slots) {
            method.slot = slot;
        }

        log::debug!(
            "layout of {}: fields {:?}, slots {:?}",
            name,
            class
                .fields
                .iter()
                .map(|f| (&f.name, f.offset))
                .collect::<Vec<_>>(),
            class
                .methods
                .iter()
                .map(|m| (&m.name, m.slot))
                .collect::<Vec<_>>(),
        );
    }
}

fn field_offsets(repo: &Repository, class: &str) -> Vec<usize> {
    let mut next = repo
        .ancestors(class)
        .flat_map(|ancestor| ancestor.fields.iter())
        .filter_map(|field| field.offset.map(|offset| offset + field.ty.size()))
        .max()
        .unwrap_or(0);

    let fields = match repo.class(class) {
        Some(class) => &class.fields,
        None => return Vec::new(),
    };
    fields
        .iter()
        .map(|field| {
            let offset = next;
            next += field.ty.size();
            offset
        })
        .collect()
}

fn method_slots(repo: &Repository, class: &str) -> Vec<Option<usize>> {
    let mut next = repo
        .ancestors(class)
        .flat_map(|ancestor| ancestor.methods.iter())
        .filter_map(|method| method.slot)
        .max()
        .map_or(0, |slot| slot + 1);

    let methods = match repo.class(class) {
        Some(class) => &class.methods,
        None => return Vec::new(),
    };
    methods
        .iter()
        .map(|method| {
            if method.is_entry {
                return None;
            }
            match repo.overridden_method(class, &method.name) {
                Some((_, overridden)) if overridden.slot.is_some() => overridden.slot,
                _ => {
                    let slot = next;
                    next += 1;
                    Some(slot)
                }
            }
        })
        .collect()
}
