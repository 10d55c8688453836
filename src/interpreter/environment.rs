use super::native::{NativeLen, NativeType};
use crate::{
    parser::statement::Scope,
    value::{Function, FunctionDefinition, NativeFunction, Value},
};
use compact_str::CompactString;
use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
};

#[derive(Debug, Clone)]
pub struct Binding {
    pub scope: Scope,
    pub value: Value,
}

/// What an environment stores for a name.
enum Slot {
    Value(Value),
    /// A function whose closure is the environment storing it. Rebuilt on every read.
    Declared(Rc<FunctionDefinition>),
}

struct Entry {
    scope: Scope,
    slot: Slot,
}

/// One activation's variables. Cloning shares the same table.
///
/// Lookups that leave the current activation only see `PRIVATE` and `PUBLIC` bindings, so a
/// `LOCAL` is invisible to every call made below the activation that declared it.
#[derive(Clone)]
pub struct Environment {
    inner: Rc<RefCell<EnvironmentImpl>>,
}

/// A non-owning handle to an [`Environment`].
#[derive(Clone)]
pub struct WeakEnvironment {
    inner: Weak<RefCell<EnvironmentImpl>>,
}

impl WeakEnvironment {
    pub fn upgrade(&self) -> Option<Environment> {
        self.inner.upgrade().map(|inner| Environment { inner })
    }
}

struct EnvironmentImpl {
    values: HashMap<CompactString, Entry>,
    parent: Option<Environment>,
    /// `None` for the global environment itself.
    global: Option<Environment>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let mut names: Vec<&str> = inner.values.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("is_global", &inner.global.is_none())
            .finish_non_exhaustive()
    }
}

impl Environment {
    /// A fresh global environment with the native functions bound as `PUBLIC`.
    pub fn new_global() -> Self {
        let environment = Self {
            inner: Rc::new(RefCell::new(EnvironmentImpl {
                values: HashMap::new(),
                parent: None,
                global: None,
            })),
        };

        // Inject native functions here
        let natives: [Rc<dyn NativeFunction>; 2] = [Rc::new(NativeLen), Rc::new(NativeType)];
        for native in natives {
            environment.set(native.get_name(), Scope::Public, Value::NativeFunction(native));
        }
        tracing::trace!("created global environment");
        environment
    }

    /// The environment of one call, a child of the environment the function was declared in.
    pub fn new_call_scope(&self) -> Self {
        Self {
            inner: Rc::new(RefCell::new(EnvironmentImpl {
                values: HashMap::new(),
                parent: Some(self.clone()),
                global: Some(self.get_global()),
            })),
        }
    }

    pub fn get_global(&self) -> Environment {
        match self.inner.borrow().global {
            Some(ref global) => global.clone(),
            None => self.clone(),
        }
    }

    pub fn is_global(&self) -> bool {
        self.inner.borrow().global.is_none()
    }

    /// Binds `name` in this environment, or in the global one when `scope` is `PUBLIC`.
    pub fn set(&self, name: &str, scope: Scope, value: Value) {
        let target = match scope {
            Scope::Public => self.get_global(),
            Scope::Local | Scope::Private => self.clone(),
        };
        let slot = target.to_slot(value);
        target
            .inner
            .borrow_mut()
            .values
            .insert(name.into(), Entry { scope, slot });
    }

    /// Binds a function declared in this environment as a `PRIVATE`.
    pub fn declare_function(&self, definition: Rc<FunctionDefinition>) {
        let name = definition.name.name.clone();
        self.inner.borrow_mut().values.insert(
            name,
            Entry {
                scope: Scope::Private,
                slot: Slot::Declared(definition),
            },
        );
    }

    pub fn downgrade(&self) -> WeakEnvironment {
        WeakEnvironment {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn to_slot(&self, value: Value) -> Slot {
        match value {
            Value::Function(function) if Rc::ptr_eq(&function.closure.inner, &self.inner) => {
                Slot::Declared(function.definition.clone())
            }
            value => Slot::Value(value),
        }
    }

    fn from_slot(&self, slot: &Slot) -> Value {
        match slot {
            Slot::Value(value) => value.clone(),
            Slot::Declared(definition) => Value::Function(Rc::new(Function {
                definition: definition.clone(),
                closure: self.clone(),
            })),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.lookup_owner(name)?.get_local(name)
    }

    /// Updates the nearest visible binding. Without one a `PRIVATE` is created here.
    pub fn assign(&self, name: &str, value: Value) {
        match self.lookup_owner(name) {
            Some(owner) => owner.replace_local(name, value),
            None => self.set(name, Scope::Private, value),
        }
    }

    /// The environment holding the binding `get` would return.
    pub fn lookup_owner(&self, name: &str) -> Option<Environment> {
        if self.contains_local(name) {
            return Some(self.clone());
        }

        let mut current = self.inner.borrow().parent.clone();
        while let Some(environment) = current {
            let (visible, next) = {
                let inner = environment.inner.borrow();
                let visible = inner
                    .values
                    .get(name)
                    .is_some_and(|entry| entry.scope != Scope::Local);
                (visible, inner.parent.clone())
            };
            if visible {
                return Some(environment);
            }
            current = next;
        }
        None
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.inner.borrow().values.contains_key(name)
    }

    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.inner
            .borrow()
            .values
            .get(name)
            .map(|entry| self.from_slot(&entry.slot))
    }

    pub fn get_binding(&self, name: &str) -> Option<Binding> {
        self.inner.borrow().values.get(name).map(|entry| Binding {
            scope: entry.scope,
            value: self.from_slot(&entry.slot),
        })
    }

    /// Replaces the value of an existing binding here, keeping its scope.
    pub fn replace_local(&self, name: &str, value: Value) {
        let slot = self.to_slot(value);
        if let Some(entry) = self.inner.borrow_mut().values.get_mut(name) {
            entry.slot = slot;
        }
    }
}
