/*!
Reverse-mode automatic differentiation.

Densities are written once against the [`Scalar`] trait and evaluated either at
`f64` or at the dual type [`Var`]. Evaluating at `Var` records the computation in
an [`Arena`]; one reverse sweep through an [`ArenaScope`] then yields every
partial derivative of the result.

```rust
use general_logp::autodiff::Arena;

let arena = Arena::new();
{
    let scope = arena.scope();
    let x = scope.var(3.0);
    let y = x * x + x;
    let grad = scope.gradient(&y, &[x]);
    assert_eq!(grad, vec![7.0]);
}
// The scope recovered the arena when it went out of scope.
assert!(arena.is_empty());
```
*/

mod arena;
mod var;

pub use arena::{Arena, ArenaScope};
pub use var::Var;

use num_traits::Float;
use std::fmt;
use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

/// Numeric scalar a density can be evaluated at: plain `f64` or the dual [`Var`].
pub trait Scalar:
    Float + fmt::Debug + fmt::Display + Sum + AddAssign + SubAssign + MulAssign + DivAssign
{
    /// Lifts a literal into this scalar type.
    fn constant(value: f64) -> Self;

    /// The primal (real) value.
    fn primal(&self) -> f64;
}

impl Scalar for f64 {
    fn constant(value: f64) -> Self {
        value
    }

    fn primal(&self) -> f64 {
        *self
    }
}

impl Scalar for Var<'_> {
    fn constant(value: f64) -> Self {
        Var::constant(value)
    }

    fn primal(&self) -> f64 {
        self.value()
    }
}

thread_local! {
    static THREAD_ARENA: Arena = Arena::new();
}

/// Runs `f` with this thread's default arena.
///
/// Each thread owns a separate arena, so gradient evaluations on different
/// threads never share recorded nodes.
pub fn with_thread_arena<R>(f: impl FnOnce(&Arena) -> R) -> R {
    THREAD_ARENA.with(f)
}
