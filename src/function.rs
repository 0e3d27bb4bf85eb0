use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use gc::{Finalize, Gc, Trace};

use crate::class::LoxInstance;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::expr::Stmt;
use crate::interpreter::{Interpreter, Value};
use crate::scanner::Token;
use crate::types::Shared;

/// Anything a `Call` expression can invoke: user functions, classes
/// (construction), and host natives.
pub trait Callable {
    fn arity(&self) -> usize;
    fn name(&self) -> &str;
    fn call(
        &self,
        interpreter: &mut Interpreter<'_>,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError>;
}

/// The single built-in: wall-clock seconds since the Unix epoch.
#[derive(Clone, Debug, Trace, Finalize)]
pub struct Clock;

impl Callable for Clock {
    fn arity(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        "clock"
    }

    fn call(&self, _: &mut Interpreter<'_>, _: Vec<Value>) -> Result<Value, RuntimeError> {
        let since_the_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Ok(Value::Number(since_the_epoch.as_secs_f64()))
    }
}

/// A user-defined function (or method) together with the environment it
/// was declared in. The declaration itself is shared through `Rc`, so
/// binding a method copies two pointers, not the body.
#[derive(Trace, Finalize)]
pub struct LoxFunction {
    #[unsafe_ignore_trace]
    name: Token,
    #[unsafe_ignore_trace]
    params: Rc<Vec<Token>>,
    #[unsafe_ignore_trace]
    body: Rc<Vec<Stmt>>,
    closure: Shared<Environment>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        name: &Token,
        params: &[Token],
        body: &[Stmt],
        closure: Shared<Environment>,
        is_initializer: bool,
    ) -> Gc<Self> {
        Gc::new(Self {
            name: name.clone(),
            params: Rc::new(params.to_vec()),
            body: Rc::new(body.to_vec()),
            closure,
            is_initializer,
        })
    }

    /// Produces a copy of this method whose closure additionally binds
    /// `this` to the given instance. Extracted methods stay attached to
    /// the instance they were read from.
    pub fn bind(&self, instance: Shared<LoxInstance>) -> Gc<LoxFunction> {
        let environment = Environment::new(Some(self.closure.clone()));
        environment
            .borrow_mut()
            .define("this".to_string(), Value::Instance(instance));
        Gc::new(LoxFunction {
            name: self.name.clone(),
            params: self.params.clone(),
            body: self.body.clone(),
            closure: environment,
            is_initializer: self.is_initializer,
        })
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.params.len()
    }

    fn name(&self) -> &str {
        &self.name.lexeme
    }

    fn call(
        &self,
        interpreter: &mut Interpreter<'_>,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        // The new frame hangs off the captured closure, not the
        // caller's environment; that is what makes scoping lexical.
        let environment = Environment::new(Some(self.closure.clone()));
        {
            let mut frame = environment.borrow_mut();
            for (param, arg) in self.params.iter().zip(args) {
                frame.define(param.lexeme.clone(), arg);
            }
        }
        let returned = interpreter.execute_block(&self.body, environment)?;
        if self.is_initializer {
            // `init` always hands back the instance under construction,
            // even through an early bare `return`.
            return Ok(self.closure.borrow().get_at(0, "this"));
        }
        Ok(returned.unwrap_or(Value::Nil))
    }
}
