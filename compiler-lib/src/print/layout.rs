//! The report printed by `--print-offsets`.
use std::io;
use symtab::{Repository, POINTER_SIZE};

/// Lists the fields and the newly introduced methods of every class but
/// the entry class, with their offsets. A method's offset is its position
/// in the vtable in bytes. Overriding methods keep the ancestor's position
/// and are not listed.
pub fn write_layout(repo: &Repository, out: &mut dyn io::Write) -> io::Result<()> {
    for class in repo.classes().filter(|class| !class.is_entry) {
        writeln!(out, "-----------Class {}-----------", class.name)?;

        writeln!(out, "--Variables---")?;
        for field in &class.fields {
            if let Some(offset) = field.offset {
                writeln!(out, "{}.{} : {}", class.name, field.name, offset)?;
            }
        }

        writeln!(out, "---Methods---")?;
        for method in &class.methods {
            if repo.overridden_method(&class.name, &method.name).is_some() {
                continue;
            }
            if let Some(slot) = method.slot {
                writeln!(out, "{}.{} : {}", class.name, method.name, slot * POINTER_SIZE)?;
            }
        }

        writeln!(out)?;
    }
    Ok(())
}
