//! Unit constructors and wrappers
//!
//! Type parameters shared by everything in this module:
//! - `S`: the wrapped state value
//! - `C`: the context handed to every operation alongside the state
//! - `A`: the call argument type
//! - `O`: the output type of value-returning operations

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{AuralError, Result};

/// Whether a wrapper's `bind` runs operations or skips them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Operations run against the wrapped value
    #[default]
    Active,
    /// Every operation is an identity on the wrapper
    Disabled,
}

/// Result of a state-transforming operation
pub enum Lifted<S, C, A, O> {
    /// A new state value, to be wrapped by the unit
    State(S),
    /// The input state is passed on as-is (same allocation)
    Unchanged,
    /// An already wrapped result, returned without re-wrapping
    Wrapped(Wrapper<S, C, A, O>),
}

/// Result of [`Wrapper::bind`]
#[derive(Debug)]
pub enum Bound<R, W> {
    /// The function ran and produced `R`
    Ran(R),
    /// The wrapper is disabled; the function was not called
    Skipped(W),
}

/// Result of calling a registered operation
pub enum Reply<S, C, A, O> {
    Wrapped(Wrapper<S, C, A, O>),
    Value(O),
}

impl<S, C, A, O> Reply<S, C, A, O> {
    /// The wrapper, if the operation produced one
    pub fn into_wrapper(self) -> Option<Wrapper<S, C, A, O>> {
        match self {
            Reply::Wrapped(w) => Some(w),
            Reply::Value(_) => None,
        }
    }

    /// The raw value, if the operation produced one
    pub fn into_value(self) -> Option<O> {
        match self {
            Reply::Wrapped(_) => None,
            Reply::Value(v) => Some(v),
        }
    }

    pub fn is_wrapper(&self) -> bool {
        matches!(self, Reply::Wrapped(_))
    }
}

type MethodFn<S, C, A, O> = Rc<dyn Fn(&Wrapper<S, C, A, O>, &[A]) -> Reply<S, C, A, O>>;
type ValueFn<S, C, A, O> = Rc<dyn Fn(&S, &C, &[A]) -> O>;
type LiftFn<S, C, A, O> = Rc<dyn Fn(&S, &C, &[A]) -> Lifted<S, C, A, O>>;
type Customize<S, C> = Box<dyn Fn(&C, &S) -> Mode>;

/// A registered operation, by registration mode
enum Operation<S, C, A, O> {
    /// Called with the wrapper itself; in charge of its own binding
    Method(MethodFn<S, C, A, O>),
    /// Bound, and the raw result returned
    Value(ValueFn<S, C, A, O>),
    /// Bound, and the result wrapped unless it already is
    Lift(LiftFn<S, C, A, O>),
}

impl<S, C, A, O> Clone for Operation<S, C, A, O> {
    fn clone(&self) -> Self {
        match self {
            Operation::Method(f) => Operation::Method(Rc::clone(f)),
            Operation::Value(f) => Operation::Value(Rc::clone(f)),
            Operation::Lift(f) => Operation::Lift(Rc::clone(f)),
        }
    }
}

struct UnitInner<S, C, A, O> {
    context: C,
    customize: Option<Customize<S, C>>,
    registry: RefCell<HashMap<String, Operation<S, C, A, O>>>,
}

/// A unit constructor: wraps values and owns the operation registry
///
/// Cloning a `Unit` is cheap and yields a handle to the same registry, so
/// operations registered through any handle are visible to every wrapper.
pub struct Unit<S, C, A, O> {
    inner: Rc<UnitInner<S, C, A, O>>,
}

impl<S, C, A, O> Clone for Unit<S, C, A, O> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: 'static, C: 'static, A: 'static, O: 'static> Unit<S, C, A, O> {
    /// Create a unit whose wrappers are always active
    pub fn new(context: C) -> Self {
        Self {
            inner: Rc::new(UnitInner {
                context,
                customize: None,
                registry: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Create a unit with a customization hook
    ///
    /// The hook runs once per wrapper, at construction, and decides its
    /// [`Mode`]. A wrapper never changes mode afterwards.
    pub fn with_customize(context: C, hook: impl Fn(&C, &S) -> Mode + 'static) -> Self {
        Self {
            inner: Rc::new(UnitInner {
                context,
                customize: Some(Box::new(hook)),
                registry: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// The context passed to every operation
    pub fn context(&self) -> &C {
        &self.inner.context
    }

    /// Wrap a value
    pub fn wrap(&self, value: S) -> Wrapper<S, C, A, O> {
        self.wrap_shared(Rc::new(value))
    }

    /// Wrap a value that may be absent
    ///
    /// An absent value produces a disabled wrapper around `S::default()`.
    pub fn wrap_or_disable(&self, value: Option<S>) -> Wrapper<S, C, A, O>
    where
        S: Default,
    {
        match value {
            Some(v) => self.wrap(v),
            None => Wrapper {
                mode: Mode::Disabled,
                value: Rc::new(S::default()),
                unit: self.clone(),
            },
        }
    }

    fn wrap_shared(&self, value: Rc<S>) -> Wrapper<S, C, A, O> {
        let mode = match &self.inner.customize {
            Some(hook) => hook(&self.inner.context, &value),
            None => Mode::Active,
        };
        Wrapper {
            mode,
            value,
            unit: self.clone(),
        }
    }

    /// Register a raw method, called with the wrapper itself
    pub fn method(
        &self,
        name: impl Into<String>,
        f: impl Fn(&Wrapper<S, C, A, O>, &[A]) -> Reply<S, C, A, O> + 'static,
    ) -> &Self {
        self.register(name.into(), Operation::Method(Rc::new(f)))
    }

    /// Register an accessor: bound, result returned unwrapped
    pub fn lift_value(
        &self,
        name: impl Into<String>,
        f: impl Fn(&S, &C, &[A]) -> O + 'static,
    ) -> &Self {
        self.register(name.into(), Operation::Value(Rc::new(f)))
    }

    /// Register a state transformation: bound, result kept wrapped
    pub fn lift(
        &self,
        name: impl Into<String>,
        f: impl Fn(&S, &C, &[A]) -> Lifted<S, C, A, O> + 'static,
    ) -> &Self {
        self.register(name.into(), Operation::Lift(Rc::new(f)))
    }

    fn register(&self, name: String, op: Operation<S, C, A, O>) -> &Self {
        // A later registration under the same name replaces the earlier one
        self.inner.registry.borrow_mut().insert(name, op);
        self
    }

    /// Check whether an operation is registered under `name`
    pub fn has_operation(&self, name: &str) -> bool {
        self.inner.registry.borrow().contains_key(name)
    }

    /// List registered operation names, sorted
    pub fn operations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.registry.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    fn lookup(&self, name: &str) -> Result<Operation<S, C, A, O>> {
        self.inner
            .registry
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| AuralError::UnknownOperation {
                name: name.to_string(),
            })
    }
}

/// An immutable container for one state value
pub struct Wrapper<S, C, A, O> {
    mode: Mode,
    value: Rc<S>,
    unit: Unit<S, C, A, O>,
}

impl<S, C, A, O> Clone for Wrapper<S, C, A, O> {
    fn clone(&self) -> Self {
        Self {
            mode: self.mode,
            value: Rc::clone(&self.value),
            unit: self.unit.clone(),
        }
    }
}

impl<S: fmt::Debug, C, A, O> fmt::Debug for Wrapper<S, C, A, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("mode", &self.mode)
            .field("value", &self.value)
            .finish()
    }
}

impl<S: 'static, C: 'static, A: 'static, O: 'static> Wrapper<S, C, A, O> {
    /// The wrapped value
    pub fn value(&self) -> &S {
        &self.value
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.mode == Mode::Active
    }

    /// The unit that produced this wrapper
    pub fn unit(&self) -> &Unit<S, C, A, O> {
        &self.unit
    }

    pub fn context(&self) -> &C {
        self.unit.context()
    }

    /// Check whether two wrappers hold the very same value allocation
    pub fn shares_value(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }

    /// Apply `f` to the wrapped value, the context, and `args`
    ///
    /// A disabled wrapper ignores `f` and hands itself back.
    pub fn bind<R>(&self, f: impl FnOnce(&S, &C, &[A]) -> R, args: &[A]) -> Bound<R, Self> {
        match self.mode {
            Mode::Active => Bound::Ran(f(&self.value, self.unit.context(), args)),
            Mode::Disabled => Bound::Skipped(self.clone()),
        }
    }

    /// Call the operation registered under `name`
    pub fn call(&self, name: &str, args: &[A]) -> Result<Reply<S, C, A, O>> {
        // The registry borrow ends before the operation runs, so operations
        // may register further operations.
        let op = self.unit.lookup(name)?;

        let reply = match op {
            Operation::Method(f) => f(self, args),
            Operation::Value(f) => match self.bind(|s, c, a| f(s, c, a), args) {
                Bound::Ran(out) => Reply::Value(out),
                Bound::Skipped(w) => Reply::Wrapped(w),
            },
            Operation::Lift(f) => match self.bind(|s, c, a| f(s, c, a), args) {
                Bound::Ran(Lifted::State(s)) => Reply::Wrapped(self.unit.wrap(s)),
                Bound::Ran(Lifted::Unchanged) => {
                    Reply::Wrapped(self.unit.wrap_shared(Rc::clone(&self.value)))
                }
                Bound::Ran(Lifted::Wrapped(w)) => Reply::Wrapped(w),
                Bound::Skipped(w) => Reply::Wrapped(w),
            },
        };

        Ok(reply)
    }
}
