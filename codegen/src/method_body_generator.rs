use crate::{
    llvm::{BinopKind, Block, CastKind, Cond, Function, Instr, Label, Operand, Ty, VTable},
    program_generator::{LabelCounters, LabelKind},
    runtime::RuntimeFunction,
    type_translation::{llvm_type, method_type},
    CodegenError, CodegenResult,
};
use parser::ast::{self, BinaryOp};
use std::mem;
use symtab::{ClassDescriptor, MethodDescriptor, Repository, Type, HEADER_SIZE};

/// Where a named variable lives: a stack slot or a field of `this`.
struct Place {
    ptr: Operand,
    ty: Type,
}

pub struct MethodBodyGenerator<'g, 'r> {
    repo: &'r Repository,
    class: &'r ClassDescriptor,
    method: &'r MethodDescriptor,
    labels: &'g mut LabelCounters,
    next_reg: usize,
    current: Block,
    finished: Vec<Block>,
}

impl<'g, 'r> MethodBodyGenerator<'g, 'r> {
    pub fn new(
        repo: &'r Repository,
        class: &'r ClassDescriptor,
        method: &'r MethodDescriptor,
        labels: &'g mut LabelCounters,
    ) -> Self {
        Self {
            repo,
            class,
            method,
            labels,
            next_reg: 0,
            current: Block::new("entry"),
            finished: Vec::new(),
        }
    }

    /// Lowers a method with the given body. The entry method has no return
    /// expression and becomes `i32 @main()`.
    pub fn generate(
        mut self,
        body: &[ast::Stmt],
        return_expr: Option<&ast::Expr>,
    ) -> CodegenResult<Function> {
        log::debug!("generating {}.{}", self.class.name, self.method.name);

        let params = self.gen_prologue();
        for stmt in body {
            self.gen_stmt(stmt)?;
        }

        let (name, ret) = if self.method.is_entry {
            self.emit(Instr::Ret {
                value: Some((Ty::I32, Operand::Const(0))),
            });
            ("main".to_string(), Ty::I32)
        } else {
            if let Some(expr) = return_expr {
                let (value, _) = self.gen_expr(expr)?;
                let ty = llvm_type(&self.method.return_ty);
                self.emit(Instr::Ret {
                    value: Some((ty, value)),
                });
            }
            (
                format!("{}.{}", self.class.name, self.method.name),
                llvm_type(&self.method.return_ty),
            )
        };

        let mut blocks = self.finished;
        blocks.push(self.current);
        Ok(Function {
            name,
            ret,
            params,
            blocks,
        })
    }

    /// Spills the parameters into stack slots and zero-initialises the
    /// locals. Returns the function's parameter list.
    fn gen_prologue(&mut self) -> Vec<(Ty, Operand)> {
        let method = self.method;
        let mut params = Vec::new();

        if !method.is_entry {
            params.push((Ty::opaque(), Operand::Local("this".to_string())));
            for (name, ty) in &method.params {
                let ty = llvm_type(ty);
                let incoming = Operand::Local(format!(".{}", name));
                let slot = slot_of(name);
                self.emit(Instr::Alloca {
                    dst: slot.clone(),
                    ty: ty.clone(),
                });
                self.emit(Instr::Store {
                    ty: ty.clone(),
                    value: incoming.clone(),
                    dst: slot,
                });
                params.push((ty, incoming));
            }
        }

        for (name, ty) in &method.locals {
            let ty = llvm_type(ty);
            let slot = slot_of(name);
            self.emit(Instr::Alloca {
                dst: slot.clone(),
                ty: ty.clone(),
            });
            self.emit(Instr::Store {
                value: ty.zero(),
                ty,
                dst: slot,
            });
        }

        params
    }

    fn gen_stmt(&mut self, stmt: &ast::Stmt) -> CodegenResult<()> {
        use self::ast::Stmt::*;
        match stmt {
            Block(stmts) => {
                for stmt in stmts {
                    self.gen_stmt(stmt)?;
                }
            }
            Assign { target, value } => {
                let (value, _) = self.gen_expr(value)?;
                let place = self.place(target)?;
                self.emit(Instr::Store {
                    ty: llvm_type(&place.ty),
                    value,
                    dst: place.ptr,
                });
            }
            ArrayAssign {
                target,
                index,
                value,
            } => {
                let (array, array_ty) = self.load_variable(target)?;
                element_type(&array_ty)?;
                let (index, _) = self.gen_expr(index)?;
                let (value, value_ty) = self.gen_expr(value)?;
                let elem_ptr = self.gen_element_ptr(array, index);
                let value = self.widen(value, &value_ty);
                self.emit(Instr::Store {
                    ty: Ty::I32,
                    value,
                    dst: elem_ptr,
                });
            }
            If {
                cond,
                then_branch,
                else_branch,
            } => {
                let (cond, _) = self.gen_expr(cond)?;
                let then_label = self.labels.fresh(LabelKind::If);
                let else_label = self.labels.fresh(LabelKind::If);
                let end_label = self.labels.fresh(LabelKind::If);
                self.emit(Instr::CondBr {
                    cond,
                    then_target: then_label.clone(),
                    else_target: else_label.clone(),
                });

                self.start_block(then_label);
                self.gen_stmt(then_branch)?;
                self.emit(Instr::Br {
                    target: end_label.clone(),
                });

                self.start_block(else_label);
                self.gen_stmt(else_branch)?;
                self.emit(Instr::Br {
                    target: end_label.clone(),
                });

                self.start_block(end_label);
            }
            While { cond, body } => {
                let cond_label = self.labels.fresh(LabelKind::Loop);
                let body_label = self.labels.fresh(LabelKind::Loop);
                let end_label = self.labels.fresh(LabelKind::Loop);
                self.emit(Instr::Br {
                    target: cond_label.clone(),
                });

                self.start_block(cond_label.clone());
                let (cond, _) = self.gen_expr(cond)?;
                self.emit(Instr::CondBr {
                    cond,
                    then_target: body_label.clone(),
                    else_target: end_label.clone(),
                });

                self.start_block(body_label);
                self.gen_stmt(body)?;
                self.emit(Instr::Br { target: cond_label });

                self.start_block(end_label);
            }
            Print(expr) => {
                let (value, _) = self.gen_expr(expr)?;
                self.emit(RuntimeFunction::PrintInt.call(None, vec![value]));
            }
        }
        Ok(())
    }

    fn gen_expr(&mut self, expr: &ast::Expr) -> CodegenResult<(Operand, Type)> {
        use self::ast::Expr::*;
        Ok(match expr {
            Int(value) => (Operand::Const(i64::from(*value)), Type::Int),
            Boolean(value) => (Operand::Const(i64::from(*value)), Type::Boolean),
            Identifier(name) => self.load_variable(name)?,
            This => (
                Operand::Local("this".to_string()),
                Type::Class(self.class.name.clone()),
            ),
            Binary(BinaryOp::And, lhs, rhs) => self.gen_and(lhs, rhs)?,
            Binary(op, lhs, rhs) => {
                let (lhs, _) = self.gen_expr(lhs)?;
                let (rhs, _) = self.gen_expr(rhs)?;
                let dst = self.fresh_reg();
                let instr = match op {
                    BinaryOp::Less => Instr::Icmp {
                        dst: dst.clone(),
                        cond: Cond::Slt,
                        ty: Ty::I32,
                        lhs,
                        rhs,
                    },
                    _ => Instr::Binop {
                        dst: dst.clone(),
                        kind: match op {
                            BinaryOp::Minus => BinopKind::Sub,
                            BinaryOp::Times => BinopKind::Mul,
                            _ => BinopKind::Add,
                        },
                        ty: Ty::I32,
                        lhs,
                        rhs,
                    },
                };
                self.emit(instr);
                let ty = if *op == BinaryOp::Less {
                    Type::Boolean
                } else {
                    Type::Int
                };
                (dst, ty)
            }
            Not(inner) => {
                let (value, _) = self.gen_expr(inner)?;
                let dst = self.fresh_reg();
                self.emit(Instr::Binop {
                    dst: dst.clone(),
                    kind: BinopKind::Xor,
                    ty: Ty::I1,
                    lhs: value,
                    rhs: Operand::Const(1),
                });
                (dst, Type::Boolean)
            }
            ArrayLookup { array, index } => {
                let (array, array_ty) = self.gen_expr(array)?;
                let (index, _) = self.gen_expr(index)?;
                let elem_ptr = self.gen_element_ptr(array, index);
                let word = self.fresh_reg();
                self.emit(Instr::Load {
                    dst: word.clone(),
                    ty: Ty::I32,
                    src: elem_ptr,
                });
                let elem_ty = element_type(&array_ty)?;
                (self.narrow(word, &elem_ty), elem_ty)
            }
            ArrayLength(array) => {
                let (array, _) = self.gen_expr(array)?;
                let words = self.cast_to_words(array);
                let len = self.fresh_reg();
                self.emit(Instr::Load {
                    dst: len.clone(),
                    ty: Ty::I32,
                    src: words,
                });
                (len, Type::Int)
            }
            MessageSend {
                receiver,
                method,
                args,
            } => self.gen_call(receiver, method, args)?,
            NewArray(element, size) => {
                let (size, _) = self.gen_expr(size)?;
                (self.gen_new_array(size), Type::array_of(*element))
            }
            NewObject(class) => (self.gen_new_object(class)?, Type::Class(class.clone())),
        })
    }

    /// `lhs && rhs`, evaluating `rhs` only if `lhs` holds.
    fn gen_and(&mut self, lhs: &ast::Expr, rhs: &ast::Expr) -> CodegenResult<(Operand, Type)> {
        let (lhs, _) = self.gen_expr(lhs)?;
        let lhs_end = self.current.label.clone();
        let rhs_label = self.labels.fresh(LabelKind::And);
        let end_label = self.labels.fresh(LabelKind::And);
        self.emit(Instr::CondBr {
            cond: lhs,
            then_target: rhs_label.clone(),
            else_target: end_label.clone(),
        });

        self.start_block(rhs_label);
        let (rhs, _) = self.gen_expr(rhs)?;
        let rhs_end = self.current.label.clone();
        self.emit(Instr::Br {
            target: end_label.clone(),
        });

        self.start_block(end_label);
        let dst = self.fresh_reg();
        self.emit(Instr::Phi {
            dst: dst.clone(),
            ty: Ty::I1,
            incoming: vec![(Operand::Const(0), lhs_end), (rhs, rhs_end)],
        });
        Ok((dst, Type::Boolean))
    }

    /// Dispatches through the receiver's vtable. The receiver is evaluated
    /// before the arguments.
    fn gen_call(
        &mut self,
        receiver: &ast::Expr,
        method_name: &str,
        args: &[ast::Expr],
    ) -> CodegenResult<(Operand, Type)> {
        let repo = self.repo;
        let (receiver, receiver_ty) = self.gen_expr(receiver)?;
        let class = receiver_ty
            .class_name()
            .ok_or_else(|| CodegenError::NotAnObject {
                ty: receiver_ty.to_string(),
            })?;
        let (_, method) = repo
            .lookup_method(class, method_name)
            .ok_or_else(|| CodegenError::UnknownMethod {
                class: class.to_string(),
                method: method_name.to_string(),
            })?;
        let slot = method.slot.ok_or_else(|| CodegenError::UnknownMethod {
            class: class.to_string(),
            method: method_name.to_string(),
        })?;

        let mut call_args = vec![(Ty::opaque(), receiver.clone())];
        for (arg, param_ty) in args.iter().zip(method.param_types()) {
            let (value, _) = self.gen_expr(arg)?;
            call_args.push((llvm_type(param_ty), value));
        }

        let header = self.fresh_reg();
        self.emit(Instr::Cast {
            dst: header.clone(),
            kind: CastKind::Bitcast,
            from: Ty::opaque(),
            value: receiver,
            to: Ty::vtable_ptr().ptr(),
        });
        let vtable = self.fresh_reg();
        self.emit(Instr::Load {
            dst: vtable.clone(),
            ty: Ty::vtable_ptr(),
            src: header,
        });
        let entry = self.fresh_reg();
        self.emit(Instr::Gep {
            dst: entry.clone(),
            elem: Ty::opaque(),
            base: vtable,
            indices: vec![Operand::Const(slot as i64)],
        });
        let raw_fn = self.fresh_reg();
        self.emit(Instr::Load {
            dst: raw_fn.clone(),
            ty: Ty::opaque(),
            src: entry,
        });
        let fn_ty = method_type(&method.return_ty, method.param_types());
        let callee = self.fresh_reg();
        self.emit(Instr::Cast {
            dst: callee.clone(),
            kind: CastKind::Bitcast,
            from: Ty::opaque(),
            value: raw_fn,
            to: fn_ty.ptr(),
        });

        let result = self.fresh_reg();
        self.emit(Instr::Call {
            dst: Some(result.clone()),
            ret: llvm_type(&method.return_ty),
            callee,
            args: call_args,
        });
        Ok((result, method.return_ty.clone()))
    }

    /// Allocates `size + 1` words and stores the length in the first one.
    /// A negative size traps.
    fn gen_new_array(&mut self, size: Operand) -> Operand {
        let negative = self.fresh_reg();
        self.emit(Instr::Icmp {
            dst: negative.clone(),
            cond: Cond::Slt,
            ty: Ty::I32,
            lhs: size.clone(),
            rhs: Operand::Const(0),
        });
        let err_label = self.labels.fresh(LabelKind::ArrAlloc);
        let ok_label = self.labels.fresh(LabelKind::ArrAlloc);
        self.emit(Instr::CondBr {
            cond: negative,
            then_target: err_label.clone(),
            else_target: ok_label.clone(),
        });
        self.gen_trap(err_label);

        self.start_block(ok_label);
        let words = self.fresh_reg();
        self.emit(Instr::Binop {
            dst: words.clone(),
            kind: BinopKind::Add,
            ty: Ty::I32,
            lhs: size.clone(),
            rhs: Operand::Const(1),
        });
        let array = self.fresh_reg();
        self.emit(
            RuntimeFunction::Calloc.call(Some(array.clone()), vec![words, Operand::Const(4)]),
        );
        let header = self.cast_to_words(array.clone());
        self.emit(Instr::Store {
            ty: Ty::I32,
            value: size,
            dst: header,
        });
        array
    }

    fn gen_new_object(&mut self, class: &str) -> CodegenResult<Operand> {
        if !self.repo.contains_class(class) {
            return Err(CodegenError::UnknownClass {
                name: class.to_string(),
            });
        }
        let size = self.repo.instance_size(class);
        let object = self.fresh_reg();
        self.emit(RuntimeFunction::Calloc.call(
            Some(object.clone()),
            vec![Operand::Const(1), Operand::Const(size as i64)],
        ));

        let slots = self.repo.vtable(class).len();
        if slots > 0 {
            let header = self.fresh_reg();
            self.emit(Instr::Cast {
                dst: header.clone(),
                kind: CastKind::Bitcast,
                from: Ty::opaque(),
                value: object.clone(),
                to: Ty::vtable_ptr().ptr(),
            });
            let vtable = self.fresh_reg();
            self.emit(Instr::Gep {
                dst: vtable.clone(),
                elem: Ty::Array(slots, Box::new(Ty::opaque())),
                base: Operand::Global(VTable::global_name(class)),
                indices: vec![Operand::Const(0), Operand::Const(0)],
            });
            self.emit(Instr::Store {
                ty: Ty::vtable_ptr(),
                value: vtable,
                dst: header,
            });
        }
        Ok(object)
    }

    /// Checks `index` against the array's length and returns a pointer to
    /// the element's word. An index outside `0..length` traps.
    fn gen_element_ptr(&mut self, array: Operand, index: Operand) -> Operand {
        let words = self.cast_to_words(array);
        let len = self.fresh_reg();
        self.emit(Instr::Load {
            dst: len.clone(),
            ty: Ty::I32,
            src: words.clone(),
        });
        let in_bounds = self.fresh_reg();
        self.emit(Instr::Icmp {
            dst: in_bounds.clone(),
            cond: Cond::Ult,
            ty: Ty::I32,
            lhs: index.clone(),
            rhs: len,
        });
        let ok_label = self.labels.fresh(LabelKind::Oob);
        let err_label = self.labels.fresh(LabelKind::Oob);
        self.emit(Instr::CondBr {
            cond: in_bounds,
            then_target: ok_label.clone(),
            else_target: err_label.clone(),
        });
        self.gen_trap(err_label);

        self.start_block(ok_label);
        let word_index = self.fresh_reg();
        self.emit(Instr::Binop {
            dst: word_index.clone(),
            kind: BinopKind::Add,
            ty: Ty::I32,
            lhs: index,
            rhs: Operand::Const(1),
        });
        let elem_ptr = self.fresh_reg();
        self.emit(Instr::Gep {
            dst: elem_ptr.clone(),
            elem: Ty::I32,
            base: words,
            indices: vec![word_index],
        });
        elem_ptr
    }

    /// A block that reports the error and never returns.
    fn gen_trap(&mut self, label: Label) {
        self.start_block(label);
        self.emit(RuntimeFunction::ThrowOob.call(None, vec![]));
        self.emit(Instr::Unreachable);
    }

    fn cast_to_words(&mut self, array: Operand) -> Operand {
        let words = self.fresh_reg();
        self.emit(Instr::Cast {
            dst: words.clone(),
            kind: CastKind::Bitcast,
            from: Ty::opaque(),
            value: array,
            to: Ty::I32.ptr(),
        });
        words
    }

    /// Array elements are stored as words.
    fn widen(&mut self, value: Operand, ty: &Type) -> Operand {
        if *ty != Type::Boolean {
            return value;
        }
        let dst = self.fresh_reg();
        self.emit(Instr::Cast {
            dst: dst.clone(),
            kind: CastKind::Zext,
            from: Ty::I1,
            value,
            to: Ty::I32,
        });
        dst
    }

    fn narrow(&mut self, word: Operand, ty: &Type) -> Operand {
        if *ty != Type::Boolean {
            return word;
        }
        let dst = self.fresh_reg();
        self.emit(Instr::Cast {
            dst: dst.clone(),
            kind: CastKind::Trunc,
            from: Ty::I32,
            value: word,
            to: Ty::I1,
        });
        dst
    }

    fn load_variable(&mut self, name: &str) -> CodegenResult<(Operand, Type)> {
        let place = self.place(name)?;
        let dst = self.fresh_reg();
        self.emit(Instr::Load {
            dst: dst.clone(),
            ty: llvm_type(&place.ty),
            src: place.ptr,
        });
        Ok((dst, place.ty))
    }

    /// Resolves `name` the way the type checker does: locals, then
    /// parameters, then fields of `this` and its ancestors.
    fn place(&mut self, name: &str) -> CodegenResult<Place> {
        let repo = self.repo;
        let method = self.method;
        let stack_ty = method
            .local(name)
            .or_else(|| method.param(name).filter(|_| !method.is_entry));
        if let Some(ty) = stack_ty {
            return Ok(Place {
                ptr: slot_of(name),
                ty: ty.clone(),
            });
        }

        let field = repo
            .lookup_field(&self.class.name, name)
            .and_then(|(_, field)| field.offset.map(|offset| (field, offset)))
            .filter(|_| !method.is_entry);
        let (field, offset) = field.ok_or_else(|| CodegenError::UnknownVariable {
            name: name.to_string(),
            class: self.class.name.clone(),
            method: method.name.clone(),
        })?;

        let raw = self.fresh_reg();
        self.emit(Instr::Gep {
            dst: raw.clone(),
            elem: Ty::I8,
            base: Operand::Local("this".to_string()),
            indices: vec![Operand::Const((offset + HEADER_SIZE) as i64)],
        });
        let ptr = self.fresh_reg();
        self.emit(Instr::Cast {
            dst: ptr.clone(),
            kind: CastKind::Bitcast,
            from: Ty::opaque(),
            value: raw,
            to: llvm_type(&field.ty).ptr(),
        });
        Ok(Place {
            ptr,
            ty: field.ty.clone(),
        })
    }

    fn fresh_reg(&mut self) -> Operand {
        let reg = Operand::Reg(self.next_reg);
        self.next_reg += 1;
        reg
    }

    fn emit(&mut self, instr: Instr) {
        self.current.instrs.push(instr);
    }

    fn start_block(&mut self, label: Label) {
        let done = mem::replace(&mut self.current, Block::new(label));
        debug_assert!(done.is_terminated(), "block {} falls through", done.label);
        self.finished.push(done);
    }
}

fn element_type(array_ty: &Type) -> CodegenResult<Type> {
    array_ty
        .element_type()
        .ok_or_else(|| CodegenError::NotAnArray {
            ty: array_ty.to_string(),
        })
}

fn slot_of(name: &str) -> Operand {
    Operand::Local(format!("{}.addr", name))
}
