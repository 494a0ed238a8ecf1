//! Zero-argument actions run by cases and hooks

use crate::error::Outcome;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

/// Future produced by invoking an [`Action`].
pub type ActionFuture = Pin<Box<dyn Future<Output = Outcome>>>;

/// A case body or hook body.
///
/// Actions may be invoked many times (a `before_each` hook runs once per
/// case), so the underlying closure is `Fn`. They are not required to be
/// `Send`: execution is single-threaded, and hooks commonly share state with
/// cases through `Rc<RefCell<_>>`.
#[derive(Clone)]
pub struct Action(Rc<dyn Fn() -> ActionFuture>);

impl Action {
    /// Wrap a synchronous body. The body runs when the executor polls the
    /// action, not when it is registered.
    pub fn new<F>(body: F) -> Self
    where
        F: Fn() -> Outcome + 'static,
    {
        let body = Rc::new(body);
        Action(Rc::new(move || {
            let body = body.clone();
            Box::pin(async move { body() })
        }))
    }

    /// Wrap a body that may suspend.
    pub fn future<F, Fut>(body: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Outcome> + 'static,
    {
        Action(Rc::new(move || Box::pin(body())))
    }

    /// Start one invocation.
    pub fn invoke(&self) -> ActionFuture {
        (self.0)()
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action(..)")
    }
}
