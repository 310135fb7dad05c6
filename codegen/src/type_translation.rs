use crate::llvm::Ty;
use symtab::Type;

/// The IR type values of `ty` are held in. Arrays and objects are
/// untyped pointers.
pub fn llvm_type(ty: &Type) -> Ty {
    match ty {
        Type::Int => Ty::I32,
        Type::Boolean => Ty::I1,
        Type::Void => Ty::Void,
        Type::IntArray
        | Type::BooleanArray
        | Type::Class(_)
        | Type::StringArray
        | Type::Undeclared => Ty::opaque(),
    }
}

/// The function type of a method taking the receiver plus `params`.
pub fn method_type<'t>(ret: &Type, params: impl Iterator<Item = &'t Type>) -> Ty {
    let mut param_tys = vec![Ty::opaque()];
    param_tys.extend(params.map(llvm_type));
    Ty::Func {
        ret: Box::new(llvm_type(ret)),
        params: param_tys,
    }
}
