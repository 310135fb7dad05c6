//! Everything the semantic passes know about the declared classes of a
//! program.
//!
//! The [`Repository`] is filled once by the [`collect`]or, annotated with
//! field offsets and vtable slots by [`compute_layout`] and afterwards only
//! read by the type checker and the code generator.
mod collector;
mod error;
mod layout;
mod repository;
mod types;

pub use self::{
    collector::collect,
    error::{
        Construct, Entity, IndexAssignmentPart, Operation, SemanticError, SemanticErrorKind,
        SemanticResult,
    },
    layout::compute_layout,
    repository::{
        ClassDescriptor, FieldDescriptor, Lineage, MethodDescriptor, Repository, VTableEntry,
    },
    types::{Type, HEADER_SIZE, POINTER_SIZE},
};
