#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::mem;

use cranelift::codegen::{verify_function, CodegenError};
use cranelift::prelude::*;
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{FuncId, FuncOrDataId, Linkage, Module as _};
use kaleido_frontend::ast::*;
use kaleido_frontend::OperatorTable;
use kaleido_interner::{Interner, Symbol};
use kaleido_session::diagnostics::prelude::Span;
use target_lexicon::Triple;

use crate::{runtime, Backend, BackendError, BackendResult};

/// A compiled unit. Extern declarations produce an artifact with no code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitArtifact {
    func_id: Option<FuncId>,
    arity: usize,
}

#[derive(Debug, Clone, Copy)]
struct FunctionEntry {
    arity: usize,
    func_id: Option<FuncId>,
    defined: bool,
}

#[derive(Debug, Clone, Copy)]
struct Callee {
    func_id: FuncId,
    arity: usize,
}

/// Compiles units to native code in memory and runs them in-process.
pub struct JitBackend {
    module: JITModule,
    ctx: codegen::Context,
    builder_ctx: FunctionBuilderContext,

    functions: HashMap<Symbol, FunctionEntry>,
    link_count: usize,
}

impl JitBackend {
    pub fn new() -> BackendResult<Self> {
        let mut flag_builder = settings::builder();
        for (name, value) in [
            ("use_colocated_libcalls", "false"),
            ("is_pic", "false"),
            ("opt_level", "speed"),
        ] {
            flag_builder
                .set(name, value)
                .map_err(|err| BackendError::Settings(err.to_string()))?;
        }

        let flags = settings::Flags::new(flag_builder);

        let target = Triple::host();
        let isa = match isa::lookup(target.clone()) {
            Ok(isa_builder) => isa_builder.finish(flags)?,
            Err(_) => {
                return Err(BackendError::UnsupportedArch(target.architecture));
            }
        };

        let mut builder = JITBuilder::with_isa(isa, cranelift_module::default_libcall_names());
        for function in runtime::functions() {
            builder.symbol(function.name, function.ptr);
        }

        let module = JITModule::new(builder);

        Ok(Self {
            ctx: module.make_context(),
            builder_ctx: FunctionBuilderContext::new(),
            module,

            functions: HashMap::new(),
            link_count: 0,
        })
    }

    fn declare_extern(
        &mut self,
        proto: &Prototype,
        interner: &Interner,
    ) -> BackendResult<JitArtifact> {
        let name = interner.resolve(proto.name);
        let arity = proto.arity();

        if let Some(entry) = self.functions.get(&proto.name) {
            if entry.arity != arity {
                return Err(BackendError::ArityMismatch {
                    name: name.to_owned(),
                    declared: entry.arity,
                    found: arity,
                });
            }
        }

        if let Some(function) = runtime::lookup(name) {
            if function.arity != arity {
                return Err(BackendError::RuntimeArity {
                    name: name.to_owned(),
                    expected: function.arity,
                    found: arity,
                });
            }
        }

        self.functions.entry(proto.name).or_insert(FunctionEntry {
            arity,
            func_id: None,
            defined: false,
        });

        Ok(JitArtifact {
            func_id: None,
            arity,
        })
    }

    fn define(
        &mut self,
        proto: &Prototype,
        body: &Expr,
        interner: &Interner,
    ) -> BackendResult<JitArtifact> {
        let name = interner.resolve(proto.name);
        let arity = proto.arity();

        if let Some(entry) = self.functions.get(&proto.name) {
            if entry.defined {
                return Err(BackendError::Redefinition(name.to_owned()));
            }

            if entry.arity != arity {
                return Err(BackendError::ArityMismatch {
                    name: name.to_owned(),
                    declared: entry.arity,
                    found: arity,
                });
            }
        }

        let link_name = self.link_name(name, arity);
        let signature = self.signature(arity);
        let func_id = self
            .module
            .declare_function(&link_name, Linkage::Export, &signature)?;

        // The namespace only changes once the body has compiled.
        let recursive = Some((proto.name, Callee { func_id, arity }));
        self.translate(proto, body, func_id, recursive, interner)?;

        self.functions.insert(
            proto.name,
            FunctionEntry {
                arity,
                func_id: Some(func_id),
                defined: true,
            },
        );

        Ok(JitArtifact {
            func_id: Some(func_id),
            arity,
        })
    }

    fn compile_anonymous(
        &mut self,
        proto: &Prototype,
        body: &Expr,
        interner: &Interner,
    ) -> BackendResult<JitArtifact> {
        let name = self.fresh_link_name(interner.resolve(proto.name));

        let signature = self.signature(0);
        let func_id = self
            .module
            .declare_function(&name, Linkage::Local, &signature)?;

        self.translate(proto, body, func_id, None, interner)?;

        Ok(JitArtifact {
            func_id: Some(func_id),
            arity: 0,
        })
    }

    fn translate(
        &mut self,
        proto: &Prototype,
        body: &Expr,
        func_id: FuncId,
        recursive: Option<(Symbol, Callee)>,
        interner: &Interner,
    ) -> BackendResult<()> {
        self.module.clear_context(&mut self.ctx);
        self.ctx.func.signature = self.signature(proto.arity());

        let mut builder = FunctionBuilder::new(&mut self.ctx.func, &mut self.builder_ctx);

        let entry_block = builder.create_block();
        builder.append_block_params_for_function_params(entry_block);
        builder.switch_to_block(entry_block);
        builder.seal_block(entry_block); // no predecessors

        let params = builder.block_params(entry_block).to_vec();

        let mut translator = FunctionTranslator {
            builder,
            module: &mut self.module,
            functions: &self.functions,
            interner,
            recursive,

            variables: HashMap::new(),
            next_var: 0,
        };

        for (&param, value) in proto.params.iter().zip(params) {
            let var = translator.declare_variable(value);
            translator.variables.insert(param, var);
        }

        let value = match translator.translate_expr(body) {
            Ok(value) => value,
            Err(err) => {
                drop(translator);

                // abandoned mid-function, so the scratch state is stale
                self.builder_ctx = FunctionBuilderContext::new();
                return Err(err);
            }
        };
        translator.builder.ins().return_(&[value]);

        translator.builder.seal_all_blocks();
        translator.builder.finalize();

        verify_function(&self.ctx.func, self.module.isa()).map_err(CodegenError::from)?;

        self.module.define_function(func_id, &mut self.ctx)?;
        self.module.finalize_definitions()?;

        Ok(())
    }

    /// The module name to define `name` under.
    ///
    /// Module declarations outlive failed definitions, so a name left declared
    /// with a different signature gets a fresh link name instead.
    fn link_name(&mut self, name: &str, arity: usize) -> String {
        let stale = match self.module.get_name(name) {
            Some(FuncOrDataId::Func(func_id)) => {
                let decl = self.module.declarations().get_function_decl(func_id);
                decl.signature.params.len() != arity
            }
            Some(FuncOrDataId::Data(_)) => true,
            None => false,
        };

        if stale {
            self.fresh_link_name(name)
        } else {
            name.to_owned()
        }
    }

    /// A link name no source identifier can collide with.
    fn fresh_link_name(&mut self, name: &str) -> String {
        let link_name = format!("{name}.{}", self.link_count);
        self.link_count += 1;
        link_name
    }

    fn signature(&self, arity: usize) -> Signature {
        signature(&self.module, arity)
    }
}

impl Backend for JitBackend {
    type Artifact = JitArtifact;

    fn compile_function(
        &mut self,
        unit: &FunctionUnit,
        interner: &Interner,
    ) -> BackendResult<JitArtifact> {
        let proto = &unit.proto;

        for (i, &param) in proto.params.iter().enumerate() {
            if proto.params[..i].contains(&param) {
                return Err(BackendError::DuplicateParam {
                    name: interner.resolve(param).to_owned(),
                    span: proto.span,
                });
            }
        }

        match &unit.body {
            None => self.declare_extern(proto, interner),
            Some(body) if proto.is_anonymous() => self.compile_anonymous(proto, body, interner),
            Some(body) => self.define(proto, body, interner),
        }
    }

    fn lookup_arity(&self, name: Symbol) -> Option<usize> {
        self.functions.get(&name).map(|entry| entry.arity)
    }

    fn invoke(&mut self, artifact: &JitArtifact) -> BackendResult<f64> {
        let (Some(func_id), 0) = (artifact.func_id, artifact.arity) else {
            return Err(BackendError::NotInvocable);
        };

        let code = self.module.get_finalized_function(func_id);

        // SAFETY: the function was finalized with the signature `fn() -> f64`
        // in the host's default calling convention.
        let function = unsafe { mem::transmute::<*const u8, extern "C" fn() -> f64>(code) };

        Ok(function())
    }
}

fn signature(module: &JITModule, arity: usize) -> Signature {
    let mut signature = module.make_signature();

    signature
        .params
        .extend((0..arity).map(|_| AbiParam::new(types::F64)));
    signature.returns.push(AbiParam::new(types::F64));

    signature
}

struct FunctionTranslator<'a> {
    builder: FunctionBuilder<'a>,
    module: &'a mut JITModule,
    functions: &'a HashMap<Symbol, FunctionEntry>,
    interner: &'a Interner,
    recursive: Option<(Symbol, Callee)>,

    variables: HashMap<Symbol, Variable>,
    next_var: usize,
}

impl FunctionTranslator<'_> {
    fn translate_expr(&mut self, expr: &Expr) -> BackendResult<Value> {
        match &expr.kind {
            ExprKind::Number(n) => Ok(self.builder.ins().f64const(*n)),

            ExprKind::Variable(name) => {
                let var = self.variables.get(name).copied().ok_or_else(|| {
                    BackendError::UnknownVariable {
                        name: self.interner.resolve(*name).to_owned(),
                        span: expr.span,
                    }
                })?;

                Ok(self.builder.use_var(var))
            }

            ExprKind::Unary { op, operand } => self.translate_unary(*op, operand, expr.span),

            ExprKind::Binary { op, lhs, rhs } => self.translate_binary(*op, lhs, rhs, expr.span),

            ExprKind::Call { callee, args } => {
                let callee_name = *callee;
                let callee = self.resolve_callee(callee_name, expr.span)?;

                if args.len() != callee.arity {
                    return Err(BackendError::CallArity {
                        name: self.interner.resolve(callee_name).to_owned(),
                        expected: callee.arity,
                        found: args.len(),
                        span: expr.span,
                    });
                }

                self.emit_call(callee, args)
            }

            ExprKind::If { cond, then, else_ } => self.translate_if(cond, then, else_.as_deref()),

            ExprKind::For {
                var,
                start,
                end,
                step,
                body,
            } => self.translate_for(*var, start, end, step, body),
        }
    }

    fn translate_unary(&mut self, op: char, operand: &Expr, span: Span) -> BackendResult<Value> {
        if let Some(callee) = self.operator_function(OperatorFixity::Unary, op) {
            return self.emit_call(callee, [operand]);
        }

        if op == '-' {
            let operand = self.translate_expr(operand)?;
            return Ok(self.builder.ins().fneg(operand));
        }

        Err(BackendError::UnknownUnaryOperator { op, span })
    }

    fn translate_binary(
        &mut self,
        op: char,
        lhs: &Expr,
        rhs: &Expr,
        span: Span,
    ) -> BackendResult<Value> {
        if !OperatorTable::is_builtin(op) {
            let callee = self
                .operator_function(OperatorFixity::Binary, op)
                .ok_or(BackendError::UnknownBinaryOperator { op, span })?;

            return self.emit_call(callee, [lhs, rhs]);
        }

        let lhs = self.translate_expr(lhs)?;
        let rhs = self.translate_expr(rhs)?;

        let ins = self.builder.ins();
        let value = match op {
            '+' => ins.fadd(lhs, rhs),
            '-' => ins.fsub(lhs, rhs),
            '*' => ins.fmul(lhs, rhs),
            '/' => ins.fdiv(lhs, rhs),
            _ => {
                debug_assert_eq!(op, '<');

                let less = ins.fcmp(FloatCC::LessThan, lhs, rhs);
                self.bool_to_float(less)
            }
        };

        Ok(value)
    }

    fn translate_if(
        &mut self,
        cond: &Expr,
        then: &Expr,
        else_: Option<&Expr>,
    ) -> BackendResult<Value> {
        let cond = self.translate_expr(cond)?;
        let cond = self.is_true(cond);

        let then_block = self.builder.create_block();
        let else_block = self.builder.create_block();
        let merge_block = self.builder.create_block();
        self.builder.append_block_param(merge_block, types::F64);

        self.builder
            .ins()
            .brif(cond, then_block, &[], else_block, &[]);

        self.builder.switch_to_block(then_block);
        let then_value = self.translate_expr(then)?;
        self.builder.ins().jump(merge_block, &[then_value]);

        self.builder.switch_to_block(else_block);
        let else_value = match else_ {
            Some(else_) => self.translate_expr(else_)?,
            None => self.builder.ins().f64const(0.0),
        };
        self.builder.ins().jump(merge_block, &[else_value]);

        self.builder.switch_to_block(merge_block);

        Ok(self.builder.block_params(merge_block)[0])
    }

    /// The body runs at least once. After each iteration the end condition
    /// is evaluated before the loop variable is stepped.
    fn translate_for(
        &mut self,
        name: Symbol,
        start: &Expr,
        end: &Expr,
        step: &Expr,
        body: &Expr,
    ) -> BackendResult<Value> {
        let start = self.translate_expr(start)?;

        let var = self.declare_variable(start);
        let shadowed = self.variables.insert(name, var);

        let loop_block = self.builder.create_block();
        let after_block = self.builder.create_block();

        self.builder.ins().jump(loop_block, &[]);
        self.builder.switch_to_block(loop_block);

        self.translate_expr(body)?;
        let step = self.translate_expr(step)?;
        let end = self.translate_expr(end)?;

        let current = self.builder.use_var(var);
        let next = self.builder.ins().fadd(current, step);
        self.builder.def_var(var, next);

        let keep_going = self.is_true(end);
        self.builder
            .ins()
            .brif(keep_going, loop_block, &[], after_block, &[]);

        self.builder.switch_to_block(after_block);

        match shadowed {
            Some(outer) => self.variables.insert(name, outer),
            None => self.variables.remove(&name),
        };

        Ok(self.builder.ins().f64const(0.0))
    }

    fn emit_call<'e>(
        &mut self,
        callee: Callee,
        args: impl IntoIterator<Item = &'e Expr>,
    ) -> BackendResult<Value> {
        let mut values = vec![];
        for arg in args {
            values.push(self.translate_expr(arg)?);
        }

        let func_ref = self
            .module
            .declare_func_in_func(callee.func_id, self.builder.func);
        let call = self.builder.ins().call(func_ref, &values);

        Ok(self.builder.inst_results(call)[0])
    }

    fn resolve_callee(&mut self, name: Symbol, span: Span) -> BackendResult<Callee> {
        if let Some(callee) = self.defined_callee(name) {
            return Ok(callee);
        }

        let name_str = self.interner.resolve(name);

        let Some(arity) = self.functions.get(&name).map(|entry| entry.arity) else {
            return Err(BackendError::UnknownFunction {
                name: name_str.to_owned(),
                span,
            });
        };

        // Declared but not defined: only runtime functions can be linked.
        if runtime::lookup(name_str).is_none() {
            return Err(BackendError::Undefined {
                name: name_str.to_owned(),
                span,
            });
        }

        let signature = signature(&*self.module, arity);
        let func_id = self
            .module
            .declare_function(name_str, Linkage::Import, &signature)?;

        Ok(Callee { func_id, arity })
    }

    fn defined_callee(&self, name: Symbol) -> Option<Callee> {
        match self.recursive {
            Some((current, callee)) if current == name => Some(callee),
            _ => {
                let entry = self.functions.get(&name).filter(|entry| entry.defined)?;
                entry.func_id.map(|func_id| Callee {
                    func_id,
                    arity: entry.arity,
                })
            }
        }
    }

    fn operator_function(&self, fixity: OperatorFixity, op: char) -> Option<Callee> {
        let name = self.interner.find(&operator_fn_name(fixity, op))?;
        self.defined_callee(name)
    }

    fn declare_variable(&mut self, value: Value) -> Variable {
        let var = Variable::new(self.next_var);
        self.next_var += 1;

        self.builder.declare_var(var, types::F64);
        self.builder.def_var(var, value);

        var
    }

    fn is_true(&mut self, value: Value) -> Value {
        let zero = self.builder.ins().f64const(0.0);
        self.builder
            .ins()
            .fcmp(FloatCC::OrderedNotEqual, value, zero)
    }

    fn bool_to_float(&mut self, cond: Value) -> Value {
        let one = self.builder.ins().f64const(1.0);
        let zero = self.builder.ins().f64const(0.0);
        self.builder.ins().select(cond, one, zero)
    }
}
