//! Reference evaluator for compiled bytecode
//!
//! Runs a script the way its bytecode describes so tests can check what a
//! destructuring actually binds instead of which instructions it emits.
//! Regexp and BigInt constants are not evaluated.
//!
//! Generator objects keep their suspended frame and resume it on
//! `next`/`return`. Objects made by `object` inherit from one shared
//! prototype, which is what `super` reads through inside object literal
//! methods.

use std::cell::RefCell;
use std::rc::Rc;

use bytecode_system::{Bytecode, LabelId, Opcode, Value as Constant};
use core_types::JsError;
use thiserror::Error;
use tracing::trace;

use crate::value::{
    Access, Arguments, Closure, Env, EnvRef, Handler, IteratorState, Native, ObjRef, Object,
    ObjectKind, Value,
};

const MAX_CALL_DEPTH: usize = 200;

/// Why a script did not run to completion
#[derive(Debug, Error)]
pub enum EvalError {
    /// Source was rejected by the compiler
    #[error("{}", .0.describe())]
    Compile(#[from] JsError),
    /// An exception reached the top level
    #[error("uncaught {0}")]
    Uncaught(String),
    /// Bytecode uses something the evaluator does not model
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// Bytecode broke a stack or label invariant
    #[error("broken bytecode: {0}")]
    Fault(String),
}

enum Abrupt {
    Throw(Value),
    Error(EvalError),
}

type Step<T> = Result<T, Abrupt>;

/// How a frame stopped running
enum Completion {
    Return(Value),
    Yield(Value),
}

impl Completion {
    /// Result of a frame that may not suspend.
    fn into_return(self) -> Step<Value> {
        match self {
            Completion::Return(value) => Ok(value),
            Completion::Yield(_) => Err(fault("yield outside a generator")),
        }
    }
}

fn fault(message: impl Into<String>) -> Abrupt {
    Abrupt::Error(EvalError::Fault(message.into()))
}

fn unsupported(message: impl Into<String>) -> Abrupt {
    Abrupt::Error(EvalError::Unsupported(message.into()))
}

fn error_value(name: &'static str, message: String) -> Value {
    let mut obj = Object::new(ObjectKind::Error(name));
    obj.set("name", Value::string(name));
    obj.set("message", Value::String(Rc::from(message)));
    Value::Object(Rc::new(RefCell::new(obj)))
}

fn type_error(message: impl Into<String>) -> Abrupt {
    Abrupt::Throw(error_value("TypeError", message.into()))
}

fn reference_error(message: impl Into<String>) -> Abrupt {
    Abrupt::Throw(error_value("ReferenceError", message.into()))
}

fn check_access(name: &str, access: Access) -> Step<()> {
    match access {
        Access::Done => Ok(()),
        Access::Uninitialized => Err(reference_error(format!("{} is not initialized", name))),
        Access::Constant => Err(type_error(format!("'{}' is read-only", name))),
    }
}

fn to_js_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_string(),
        other => other.to_key(),
    }
}

/// Iterator activity on values produced by `tracked(...)`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IteratorStats {
    /// Calls to `next`, including the one reporting completion
    pub steps: usize,
    /// Iterators closed before completion
    pub closed: usize,
}

#[derive(Debug)]
struct Frame {
    code: Rc<Bytecode>,
    pc: usize,
    stack: Vec<Value>,
    env: EnvRef,
    args: Rc<RefCell<Vec<Value>>>,
    this: Value,
    home: Option<ObjRef>,
}

impl Frame {
    fn pop(&mut self) -> Step<Value> {
        self.stack.pop().ok_or_else(|| fault("stack underflow"))
    }

    fn peek(&self, offset: usize) -> Step<&Value> {
        self.stack
            .len()
            .checked_sub(offset + 1)
            .and_then(|idx| self.stack.get(idx))
            .ok_or_else(|| fault("stack underflow"))
    }

    fn top(&mut self, n: usize) -> Step<&mut [Value]> {
        let start = self
            .stack
            .len()
            .checked_sub(n)
            .ok_or_else(|| fault("stack underflow"))?;
        Ok(&mut self.stack[start..])
    }

    fn take(&mut self, n: usize) -> Step<Vec<Value>> {
        let start = self
            .stack
            .len()
            .checked_sub(n)
            .ok_or_else(|| fault("stack underflow"))?;
        Ok(self.stack.split_off(start))
    }

    /// Copies the top slot `n` slots down.
    fn insert_top(&mut self, n: usize) -> Step<()> {
        let top = self.peek(0)?.clone();
        let at = self
            .stack
            .len()
            .checked_sub(n)
            .ok_or_else(|| fault("stack underflow"))?;
        self.stack.insert(at, top);
        Ok(())
    }

    fn target(&self, label: LabelId) -> Step<usize> {
        self.code
            .label_target(label)
            .ok_or_else(|| fault(format!("unbound label {}", label)))
    }
}

#[derive(Debug)]
enum GeneratorStatus {
    /// Created, body not entered yet
    Start(Frame),
    /// Stopped at a `yield`
    Suspended(Frame),
    Running,
    Done,
}

/// Execution state behind a generator object
#[derive(Debug)]
pub struct GeneratorState {
    status: GeneratorStatus,
}

fn iterator_result(value: Value, done: bool) -> Value {
    let mut obj = Object::new(ObjectKind::Plain);
    obj.set("value", value);
    obj.set("done", Value::Bool(done));
    Value::Object(Rc::new(RefCell::new(obj)))
}

/// Global environment plus the state of the last script run
#[derive(Debug)]
pub struct Realm {
    global: EnvRef,
    script: Option<EnvRef>,
    object_prototype: ObjRef,
    stats: IteratorStats,
    depth: usize,
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

impl Realm {
    /// Creates a realm whose globals hold `undefined` and the host
    /// functions `tracked` and `set_prototype`.
    pub fn new() -> Self {
        let global = Env::global();
        global.define("undefined", Value::Undefined);
        global.define("tracked", Value::object(ObjectKind::Native(Native::Tracked)));
        global.define(
            "set_prototype",
            Value::object(ObjectKind::Native(Native::SetPrototype)),
        );
        Self {
            global,
            script: None,
            object_prototype: Rc::new(RefCell::new(Object::new(ObjectKind::Plain))),
            stats: IteratorStats::default(),
            depth: 0,
        }
    }

    /// Runs a compiled script.
    pub fn run(&mut self, code: &Bytecode) -> Result<Value, EvalError> {
        let code = Rc::new(code.clone());
        let scope = code
            .scopes
            .first()
            .ok_or_else(|| EvalError::Fault("script has no scope".to_string()))?;
        let env = Env::for_scope(scope, Some(self.global.clone()), None);
        self.script = Some(env.clone());

        let mut frame = Frame {
            code,
            pc: 0,
            stack: Vec::new(),
            env,
            args: Rc::new(RefCell::new(Vec::new())),
            this: Value::Undefined,
            home: None,
        };
        match self.run_frame(&mut frame).and_then(Completion::into_return) {
            Ok(value) => Ok(value),
            Err(Abrupt::Throw(value)) => Err(EvalError::Uncaught(value.inspect())),
            Err(Abrupt::Error(err)) => Err(err),
        }
    }

    /// Value of a binding visible at the script's top level. `None` for
    /// unknown names and bindings still in their dead zone.
    pub fn get(&self, name: &str) -> Option<Value> {
        let script = self.script.as_ref().unwrap_or(&self.global);
        Env::resolve(script, name).and_then(|env| env.read(name).ok())
    }

    /// [`Value::inspect`] of a binding, `<unbound>` when [`Realm::get`]
    /// finds nothing.
    pub fn inspect(&self, name: &str) -> String {
        self.get(name)
            .map(|value| value.inspect())
            .unwrap_or_else(|| "<unbound>".to_string())
    }

    /// Iterator activity so far.
    pub fn stats(&self) -> IteratorStats {
        self.stats
    }

    fn run_frame(&mut self, frame: &mut Frame) -> Step<Completion> {
        loop {
            let opcode = match frame.code.instructions.get(frame.pc) {
                Some(inst) => inst.opcode.clone(),
                None => return Ok(Completion::Return(Value::Undefined)),
            };
            trace!(pc = frame.pc, depth = frame.stack.len(), %opcode, "step");
            frame.pc += 1;
            match self.execute(frame, opcode) {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(Abrupt::Throw(value)) => self.unwind(frame, value)?,
                Err(err) => return Err(err),
            }
        }
    }

    /// Pops to the nearest handler slot. Iterator records passed on the way
    /// are closed.
    fn unwind(&mut self, frame: &mut Frame, value: Value) -> Step<()> {
        while let Some(slot) = frame.stack.pop() {
            let Value::CatchOffset(handler) = slot else {
                continue;
            };
            match handler.target {
                Some(target) => {
                    frame.env = handler.env;
                    frame.pc = target;
                    frame.stack.push(value);
                    return Ok(());
                }
                None => {
                    frame.stack.pop();
                    if let Some(iter) = frame.stack.pop() {
                        self.close_iterator(&iter);
                    }
                }
            }
        }
        Err(Abrupt::Throw(value))
    }

    fn execute(&mut self, frame: &mut Frame, opcode: Opcode) -> Step<Option<Completion>> {
        match opcode {
            Opcode::PushUndefined => frame.stack.push(Value::Undefined),
            Opcode::PushNull => frame.stack.push(Value::Null),
            Opcode::PushTrue => frame.stack.push(Value::Bool(true)),
            Opcode::PushFalse => frame.stack.push(Value::Bool(false)),
            Opcode::PushI32(n) => frame.stack.push(Value::Number(f64::from(n))),
            Opcode::PushConst(idx) => {
                let value = match frame.code.constants.get(idx) {
                    Some(Constant::Number(n)) => Value::Number(*n),
                    Some(Constant::String(s)) => Value::string(s),
                    Some(other) => return Err(unsupported(format!("constant {}", other))),
                    None => return Err(fault(format!("no constant #{}", idx))),
                };
                frame.stack.push(value);
            }
            Opcode::PushThis => frame.stack.push(frame.this.clone()),
            Opcode::FClosure(idx) => {
                let code = frame
                    .code
                    .functions
                    .get(idx)
                    .cloned()
                    .ok_or_else(|| fault(format!("no function #{}", idx)))?;
                frame.stack.push(Value::object(ObjectKind::Function(Closure {
                    code: Rc::new(code),
                    env: frame.env.clone(),
                    home: None,
                })));
            }

            Opcode::Drop => {
                frame.pop()?;
            }
            Opcode::Nip => {
                let top = frame.pop()?;
                frame.pop()?;
                frame.stack.push(top);
            }
            Opcode::Dup => {
                let top = frame.peek(0)?.clone();
                frame.stack.push(top);
            }
            Opcode::Dup1 => {
                let below = frame.peek(1)?.clone();
                let at = frame.stack.len() - 1;
                frame.stack.insert(at, below);
            }
            Opcode::Swap => frame.top(2)?.swap(0, 1),
            Opcode::Swap2 => frame.top(4)?.rotate_left(2),
            Opcode::Rot3l => frame.top(3)?.rotate_left(1),
            Opcode::Rot3r => frame.top(3)?.rotate_right(1),
            Opcode::Rot4l => frame.top(4)?.rotate_left(1),
            Opcode::Rot5l => frame.top(5)?.rotate_left(1),
            Opcode::Perm3 => frame.top(3)?.swap(0, 1),
            Opcode::Insert2 => frame.insert_top(2)?,
            Opcode::Insert3 => frame.insert_top(3)?,
            Opcode::Insert4 => frame.insert_top(4)?,

            Opcode::Goto(label) => frame.pc = frame.target(label)?,
            Opcode::IfTrue(label) => {
                if frame.pop()?.is_truthy() {
                    frame.pc = frame.target(label)?;
                }
            }
            Opcode::IfFalse(label) => {
                if !frame.pop()?.is_truthy() {
                    frame.pc = frame.target(label)?;
                }
            }
            Opcode::Label(_) => {}
            Opcode::Catch(label) => {
                let handler = Handler {
                    target: Some(frame.target(label)?),
                    env: frame.env.clone(),
                };
                frame.stack.push(Value::CatchOffset(handler));
            }
            Opcode::Return => return Ok(Some(Completion::Return(frame.pop()?))),
            Opcode::Throw => return Err(Abrupt::Throw(frame.pop()?)),
            Opcode::Yield => return Ok(Some(Completion::Yield(frame.pop()?))),

            Opcode::Object => {
                let mut obj = Object::new(ObjectKind::Plain);
                obj.proto = Some(self.object_prototype.clone());
                frame.stack.push(Value::Object(Rc::new(RefCell::new(obj))));
            }
            Opcode::ArrayFrom(n) => {
                let items = frame.take(n as usize)?;
                frame.stack.push(Value::array(items));
            }
            Opcode::DefineField(name) => {
                let value = frame.pop()?;
                define_own(frame.peek(0)?, &name, value)?;
            }
            Opcode::DefineArrayEl => {
                let value = frame.pop()?;
                let key = frame.peek(0)?.to_key();
                define_own(frame.peek(1)?, &key, value)?;
            }
            Opcode::GetField(name) => {
                let obj = frame.pop()?;
                frame.stack.push(get_property(&obj, &name)?);
            }
            Opcode::GetField2(name) => {
                let value = get_property(frame.peek(0)?, &name)?;
                frame.stack.push(value);
            }
            Opcode::GetArrayEl => {
                let key = frame.pop()?;
                let obj = frame.pop()?;
                frame.stack.push(get_property(&obj, &key.to_key())?);
            }
            Opcode::GetArrayEl2 => {
                let key = frame.pop()?;
                let value = get_property(frame.peek(0)?, &key.to_key())?;
                frame.stack.push(value);
            }
            Opcode::PutField(name) => {
                let value = frame.pop()?;
                let obj = frame.pop()?;
                set_property(&obj, &name, value)?;
            }
            Opcode::PutArrayEl => {
                let value = frame.pop()?;
                let key = frame.pop()?;
                let obj = frame.pop()?;
                set_property(&obj, &key.to_key(), value)?;
            }
            Opcode::ToObject => {
                let value = frame.peek(0)?;
                if value.is_nullish() {
                    return Err(type_error(format!(
                        "cannot convert {} to object",
                        value.inspect()
                    )));
                }
            }
            Opcode::ToPropKey => {
                let key = frame.pop()?;
                frame.stack.push(Value::String(Rc::from(key.to_key())));
            }
            Opcode::ToPropKey2 => {
                let key = frame.pop()?;
                if frame.peek(0)?.is_nullish() {
                    return Err(type_error("value has no property"));
                }
                frame.stack.push(Value::String(Rc::from(key.to_key())));
            }
            Opcode::CopyDataProperties {
                target,
                source,
                exclude,
            } => {
                let target = frame.peek(target as usize)?.clone();
                let source = frame.peek(source as usize)?.clone();
                let excluded: Vec<String> = match frame.peek(exclude as usize)? {
                    Value::Object(obj) => obj.borrow().entries().into_iter().map(|(k, _)| k).collect(),
                    _ => Vec::new(),
                };
                if let Value::Object(src) = &source {
                    let entries = src.borrow().entries();
                    for (key, value) in entries {
                        if !excluded.contains(&key) {
                            define_own(&target, &key, value)?;
                        }
                    }
                }
            }
            Opcode::SetHomeObject => {
                if let (Value::Object(func), Value::Object(home)) = (frame.peek(0)?, frame.peek(1)?) {
                    if let ObjectKind::Function(closure) = &mut func.borrow_mut().kind {
                        closure.home = Some(home.clone());
                    }
                }
            }
            Opcode::PushSuperBase => {
                let base = frame
                    .home
                    .as_ref()
                    .and_then(|home| home.borrow().proto.clone());
                frame.stack.push(base.map_or(Value::Null, Value::Object));
            }
            Opcode::GetSuperValue => {
                let key = frame.pop()?;
                let base = frame.pop()?;
                frame.pop()?;
                frame.stack.push(get_property(&base, &key.to_key())?);
            }
            Opcode::PutSuperValue => {
                let value = frame.pop()?;
                let key = frame.pop()?;
                let base = frame.pop()?;
                let this = frame.pop()?;
                if base.is_nullish() {
                    return Err(type_error(format!(
                        "cannot set property '{}' of {}",
                        key.to_key(),
                        base.inspect()
                    )));
                }
                // only data properties exist, so the store lands on `this`
                set_property(&this, &key.to_key(), value)?;
            }

            Opcode::ScopeGetVar { name, .. } => {
                let value = match Env::resolve(&frame.env, &name) {
                    Some(env) => env
                        .read(&name)
                        .map_err(|_| reference_error(format!("{} is not initialized", name)))?,
                    None => return Err(reference_error(format!("{} is not defined", name))),
                };
                frame.stack.push(value);
            }
            Opcode::ScopePutVar { name, .. } => {
                let value = frame.pop()?;
                let env = Env::resolve(&frame.env, &name);
                self.store(frame, env.as_ref(), &name, value)?;
            }
            Opcode::ScopePutVarInit { name, .. } => {
                let value = frame.pop()?;
                let env = Env::resolve(&frame.env, &name)
                    .ok_or_else(|| fault(format!("no binding '{}' to initialize", name)))?;
                check_access(&name, env.write(&name, value, true))?;
            }
            Opcode::MakeScopeRef { name, .. } => {
                let env = Env::resolve(&frame.env, &name);
                frame.stack.push(Value::Env(env));
                frame.stack.push(Value::String(Rc::from(name)));
            }
            Opcode::PutRefValue => {
                let value = frame.pop()?;
                let name = frame.pop()?;
                let Value::Env(env) = frame.pop()? else {
                    return Err(fault("put_ref_value without a reference"));
                };
                self.store(frame, env.as_ref(), &to_js_string(&name), value)?;
            }
            Opcode::EnterScope(id) => {
                let scope = frame
                    .code
                    .scope(id)
                    .ok_or_else(|| fault(format!("no scope {}", id)))?;
                frame.env = Env::for_scope(scope, Some(frame.env.clone()), None);
            }
            Opcode::LeaveScope(_) => {
                frame.env = frame
                    .env
                    .parent
                    .clone()
                    .ok_or_else(|| fault("left the outermost scope"))?;
            }
            Opcode::GetArg(index) => {
                let value = frame.args.borrow().get(index as usize).cloned();
                frame.stack.push(value.unwrap_or(Value::Undefined));
            }
            Opcode::PutArg(index) => {
                let value = frame.pop()?;
                let mut args = frame.args.borrow_mut();
                let index = index as usize;
                if index >= args.len() {
                    args.resize(index + 1, Value::Undefined);
                }
                args[index] = value;
            }
            Opcode::Rest(index) => {
                let rest: Vec<Value> = frame.args.borrow().iter().skip(index as usize).cloned().collect();
                frame.stack.push(Value::array(rest));
            }

            Opcode::ForOfStart => {
                let iterable = frame.pop()?;
                let iter = get_iterator(&iterable)?;
                frame.stack.push(iter);
                frame.stack.push(Value::Undefined);
                frame.stack.push(Value::CatchOffset(Handler {
                    target: None,
                    env: frame.env.clone(),
                }));
            }
            Opcode::ForOfNext(offset) => {
                let record = frame
                    .stack
                    .len()
                    .checked_sub(3 + offset as usize)
                    .ok_or_else(|| fault("for_of_next below the stack"))?;
                let iter = frame.stack[record].clone();
                let (value, done) = self.step_iterator(&iter)?;
                frame.stack.push(value);
                frame.stack.push(Value::Bool(done));
            }
            Opcode::IteratorClose => {
                frame.pop()?;
                frame.pop()?;
                let iter = frame.pop()?;
                self.close_iterator(&iter);
            }
            Opcode::IteratorCloseReturn => {
                let value = frame.pop()?;
                loop {
                    if let Value::CatchOffset(Handler { target: None, .. }) = frame.pop()? {
                        break;
                    }
                }
                frame.pop()?;
                let iter = frame.pop()?;
                self.close_iterator(&iter);
                frame.stack.push(value);
            }

            op @ (Opcode::StrictEq
            | Opcode::StrictNeq
            | Opcode::Eq
            | Opcode::Neq
            | Opcode::Lt
            | Opcode::Lte
            | Opcode::Gt
            | Opcode::Gte
            | Opcode::In
            | Opcode::Instanceof
            | Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Mod) => {
                let b = frame.pop()?;
                let a = frame.pop()?;
                frame.stack.push(binary(&op, &a, &b)?);
            }
            Opcode::Neg => {
                let a = frame.pop()?;
                frame.stack.push(Value::Number(-a.to_number()));
            }
            Opcode::Plus => {
                let a = frame.pop()?;
                frame.stack.push(Value::Number(a.to_number()));
            }
            Opcode::Not => {
                let a = frame.pop()?;
                frame.stack.push(Value::Bool(!a.is_truthy()));
            }
            Opcode::Typeof => {
                let a = frame.pop()?;
                frame.stack.push(Value::string(a.type_of()));
            }
            Opcode::Inc => {
                let a = frame.pop()?;
                frame.stack.push(Value::Number(a.to_number() + 1.0));
            }
            Opcode::IsUndefinedOrNull => {
                let a = frame.pop()?;
                frame.stack.push(Value::Bool(a.is_nullish()));
            }
            Opcode::Call(argc) => {
                let args = frame.take(argc as usize)?;
                let callee = frame.pop()?;
                let result = self.call(&callee, Value::Undefined, args)?;
                frame.stack.push(result);
            }
            Opcode::CallMethod(argc) => {
                let args = frame.take(argc as usize)?;
                let callee = frame.pop()?;
                let this = frame.pop()?;
                let result = self.call(&callee, this, args)?;
                frame.stack.push(result);
            }
        }
        Ok(None)
    }

    /// Plain store: dead zone and `const` are checked, unresolved names
    /// become globals in sloppy code.
    fn store(&mut self, frame: &Frame, env: Option<&EnvRef>, name: &str, value: Value) -> Step<()> {
        match env {
            Some(env) => check_access(name, env.write(name, value, false)),
            None if frame.code.flags.strict => {
                Err(reference_error(format!("{} is not defined", name)))
            }
            None => {
                self.global.define(name, value);
                Ok(())
            }
        }
    }

    fn call(&mut self, callee: &Value, this: Value, args: Vec<Value>) -> Step<Value> {
        let Value::Object(obj) = callee else {
            return Err(type_error(format!("{} is not a function", callee.inspect())));
        };
        let kind = obj.borrow().kind.clone();
        match kind {
            ObjectKind::Function(closure) => {
                let scope = closure
                    .code
                    .scopes
                    .first()
                    .ok_or_else(|| fault("function has no scope"))?;
                let values = Rc::new(RefCell::new(args));
                let arguments = Arguments {
                    names: closure.code.params.clone(),
                    values: values.clone(),
                };
                let env = Env::for_scope(scope, Some(closure.env.clone()), Some(arguments));
                let mut frame = Frame {
                    code: closure.code.clone(),
                    pc: 0,
                    stack: Vec::new(),
                    env,
                    args: values,
                    this,
                    home: closure.home.clone(),
                };
                if closure.code.flags.generator {
                    let state = GeneratorState {
                        status: GeneratorStatus::Start(frame),
                    };
                    return Ok(Value::object(ObjectKind::Generator(Rc::new(RefCell::new(state)))));
                }
                self.run_nested(&mut frame)?.into_return()
            }
            ObjectKind::Native(Native::Tracked) => {
                let items = match args.first() {
                    Some(Value::Object(source)) => match &source.borrow().kind {
                        ObjectKind::Array(items) => Some(items.clone()),
                        _ => None,
                    },
                    _ => None,
                };
                items
                    .map(|items| Value::object(ObjectKind::Tracked(items)))
                    .ok_or_else(|| type_error("tracked() expects an array"))
            }
            ObjectKind::Native(Native::SetPrototype) => set_prototype(&args),
            ObjectKind::Native(Native::GeneratorNext) => {
                let received = args.into_iter().next().unwrap_or(Value::Undefined);
                self.resume(&this, received, false)
            }
            ObjectKind::Native(Native::GeneratorReturn) => {
                let received = args.into_iter().next().unwrap_or(Value::Undefined);
                self.resume(&this, received, true)
            }
            _ => Err(type_error(format!("{} is not a function", callee.inspect()))),
        }
    }

    /// Runs a callee frame one level deeper.
    fn run_nested(&mut self, frame: &mut Frame) -> Step<Completion> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(Abrupt::Throw(error_value(
                "RangeError",
                "call stack size exceeded".to_string(),
            )));
        }
        self.depth += 1;
        let result = self.run_frame(frame);
        self.depth -= 1;
        result
    }

    /// Continues a generator. The first `next` enters the body and ignores
    /// `received`; later calls deliver it as the result of the pending
    /// `yield`, as a return completion when `is_return` is set.
    fn resume(&mut self, generator: &Value, received: Value, is_return: bool) -> Step<Value> {
        let state = match generator {
            Value::Object(obj) => match &obj.borrow().kind {
                ObjectKind::Generator(state) => Some(state.clone()),
                _ => None,
            },
            _ => None,
        };
        let state = state.ok_or_else(|| type_error("not a generator"))?;
        let status = std::mem::replace(&mut state.borrow_mut().status, GeneratorStatus::Running);
        let mut frame = match status {
            GeneratorStatus::Start(frame) if !is_return => frame,
            GeneratorStatus::Suspended(mut frame) => {
                frame.stack.push(received);
                frame.stack.push(Value::Bool(is_return));
                frame
            }
            GeneratorStatus::Running => return Err(type_error("generator is already running")),
            GeneratorStatus::Start(_) | GeneratorStatus::Done => {
                state.borrow_mut().status = GeneratorStatus::Done;
                let value = if is_return { received } else { Value::Undefined };
                return Ok(iterator_result(value, true));
            }
        };
        trace!(is_return, pc = frame.pc, "resume generator");

        match self.run_nested(&mut frame) {
            Ok(Completion::Yield(value)) => {
                state.borrow_mut().status = GeneratorStatus::Suspended(frame);
                Ok(iterator_result(value, false))
            }
            Ok(Completion::Return(value)) => {
                state.borrow_mut().status = GeneratorStatus::Done;
                Ok(iterator_result(value, true))
            }
            Err(err) => {
                state.borrow_mut().status = GeneratorStatus::Done;
                Err(err)
            }
        }
    }

    fn step_iterator(&mut self, iter: &Value) -> Step<(Value, bool)> {
        let Value::Object(obj) = iter else {
            return Err(fault("iterator record holds a non-object"));
        };
        let mut obj = obj.borrow_mut();
        let ObjectKind::Iterator(state) = &mut obj.kind else {
            return Err(fault("iterator record holds a non-iterator"));
        };
        if state.done {
            return Ok((Value::Undefined, true));
        }
        if state.tracked {
            self.stats.steps += 1;
        }
        match state.items.get(state.index).cloned() {
            Some(value) => {
                state.index += 1;
                Ok((value, false))
            }
            None => {
                state.done = true;
                Ok((Value::Undefined, true))
            }
        }
    }

    fn close_iterator(&mut self, iter: &Value) {
        let Value::Object(obj) = iter else {
            return;
        };
        if let ObjectKind::Iterator(state) = &mut obj.borrow_mut().kind {
            if !state.done {
                state.done = true;
                if state.tracked {
                    self.stats.closed += 1;
                }
            }
        }
    }
}

fn get_iterator(value: &Value) -> Step<Value> {
    let (items, tracked) = match value {
        Value::Object(obj) => match &obj.borrow().kind {
            ObjectKind::Array(items) => (items.clone(), false),
            ObjectKind::Tracked(items) => (items.clone(), true),
            _ => return Err(type_error("value is not iterable")),
        },
        Value::String(s) => (s.chars().map(|c| Value::string(&c.to_string())).collect(), false),
        _ => return Err(type_error(format!("{} is not iterable", value.inspect()))),
    };
    Ok(Value::object(ObjectKind::Iterator(IteratorState {
        items,
        index: 0,
        done: false,
        tracked,
    })))
}

/// `set_prototype(obj, proto)`; `proto` may be `null`.
fn set_prototype(args: &[Value]) -> Step<Value> {
    let Some(Value::Object(obj)) = args.first() else {
        return Err(type_error("set_prototype() expects an object"));
    };
    let proto = match args.get(1) {
        Some(Value::Object(proto)) => Some(proto.clone()),
        Some(Value::Null) => None,
        _ => return Err(type_error("prototype must be an object or null")),
    };
    let mut link = proto.clone();
    while let Some(current) = link {
        if Rc::ptr_eq(&current, obj) {
            return Err(type_error("cyclic prototype chain"));
        }
        link = current.borrow().proto.clone();
    }
    obj.borrow_mut().proto = proto;
    Ok(Value::Object(obj.clone()))
}

fn define_own(target: &Value, key: &str, value: Value) -> Step<()> {
    match target {
        Value::Object(obj) => {
            obj.borrow_mut().set(key, value);
            Ok(())
        }
        _ => Err(fault("property definition on a non-object")),
    }
}

fn get_property(target: &Value, key: &str) -> Step<Value> {
    match target {
        Value::Undefined | Value::Null => Err(type_error(format!(
            "cannot read property '{}' of {}",
            key,
            target.inspect()
        ))),
        Value::Object(obj) => Ok(Object::lookup(obj, key).unwrap_or(Value::Undefined)),
        Value::String(s) => {
            if key == "length" {
                return Ok(Value::Number(s.chars().count() as f64));
            }
            let ch = key.parse::<usize>().ok().and_then(|idx| s.chars().nth(idx));
            Ok(ch.map_or(Value::Undefined, |c| Value::string(&c.to_string())))
        }
        _ => Ok(Value::Undefined),
    }
}

fn set_property(target: &Value, key: &str, value: Value) -> Step<()> {
    match target {
        Value::Undefined | Value::Null => Err(type_error(format!(
            "cannot set property '{}' of {}",
            key,
            target.inspect()
        ))),
        Value::Object(obj) => {
            obj.borrow_mut().set(key, value);
            Ok(())
        }
        _ => Ok(()),
    }
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => a.to_number().partial_cmp(&b.to_number()),
    }
}

fn binary(op: &Opcode, a: &Value, b: &Value) -> Step<Value> {
    use std::cmp::Ordering::{Equal, Greater, Less};
    let value = match op {
        Opcode::StrictEq => Value::Bool(a.strict_equals(b)),
        Opcode::StrictNeq => Value::Bool(!a.strict_equals(b)),
        Opcode::Eq => Value::Bool(a.loose_equals(b)),
        Opcode::Neq => Value::Bool(!a.loose_equals(b)),
        Opcode::Lt => Value::Bool(compare(a, b) == Some(Less)),
        Opcode::Lte => Value::Bool(matches!(compare(a, b), Some(Less | Equal))),
        Opcode::Gt => Value::Bool(compare(a, b) == Some(Greater)),
        Opcode::Gte => Value::Bool(matches!(compare(a, b), Some(Greater | Equal))),
        Opcode::In => match b {
            Value::Object(obj) => Value::Bool(Object::lookup(obj, &a.to_key()).is_some()),
            _ => return Err(type_error("invalid 'in' operand")),
        },
        Opcode::Instanceof => return Err(unsupported("instanceof")),
        Opcode::Add => match (a, b) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Value::String(Rc::from(format!("{}{}", to_js_string(a), to_js_string(b))))
            }
            _ => Value::Number(a.to_number() + b.to_number()),
        },
        Opcode::Sub => Value::Number(a.to_number() - b.to_number()),
        Opcode::Mul => Value::Number(a.to_number() * b.to_number()),
        Opcode::Div => Value::Number(a.to_number() / b.to_number()),
        Opcode::Mod => Value::Number(a.to_number() % b.to_number()),
        other => return Err(fault(format!("{} is not a binary operator", other))),
    };
    Ok(value)
}
