use gc::{Finalize, Gc, Trace};
use rustc_hash::FxHashMap;

use crate::error::RuntimeError;
use crate::function::{Callable, LoxFunction};
use crate::interpreter::{Interpreter, Value};
use crate::scanner::Token;
use crate::types::{create_shared, Shared};

#[derive(Trace, Finalize)]
pub struct LoxClass {
    pub name: String,
    superclass: Option<Gc<LoxClass>>,
    methods: FxHashMap<String, Gc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Gc<LoxClass>>,
        methods: FxHashMap<String, Gc<LoxFunction>>,
    ) -> Gc<Self> {
        Gc::new(Self {
            name,
            superclass,
            methods,
        })
    }

    /// Walks the inheritance chain from here upward; the first
    /// definition wins.
    pub fn find_method(&self, name: &str) -> Option<Gc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            Some(method.clone())
        } else if let Some(superclass) = &self.superclass {
            superclass.find_method(name)
        } else {
            None
        }
    }
}

// Calling a class constructs an instance. The impl lives on the handle
// rather than the class itself because construction needs to store a
// reference to the class inside the new instance.
impl Callable for Gc<LoxClass> {
    fn arity(&self) -> usize {
        self.find_method("init")
            .map(|init| init.arity())
            .unwrap_or(0)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn call(
        &self,
        interpreter: &mut Interpreter<'_>,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let instance = LoxInstance::new(self.clone());
        if let Some(init) = self.find_method("init") {
            init.bind(instance.clone()).call(interpreter, args)?;
        }
        Ok(Value::Instance(instance))
    }
}

#[derive(Trace, Finalize)]
pub struct LoxInstance {
    pub class: Gc<LoxClass>,
    fields: FxHashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Gc<LoxClass>) -> Shared<Self> {
        create_shared(Self {
            class,
            fields: FxHashMap::default(),
        })
    }

    /// Fields shadow methods. A method hit is bound to this instance so
    /// the returned value keeps its `this` when stored or passed on.
    pub fn get(&self, name: &Token, self_ref: &Shared<LoxInstance>) -> Result<Value, RuntimeError> {
        if let Some(value) = self.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }
        if let Some(method) = self.class.find_method(&name.lexeme) {
            return Ok(Value::Function(method.bind(self_ref.clone())));
        }
        RuntimeError::new(name, &format!("Undefined property '{}'.", name.lexeme))
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}
