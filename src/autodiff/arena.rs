use super::var::Var;
use std::cell::{Cell, RefCell};

/// Maximum number of operands recorded per node.
const MAX_PARENTS: usize = 2;

/// One recorded operation: the indices of its operands and the local partial
/// derivative of the result with respect to each of them.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Node {
    parents: [(usize, f64); MAX_PARENTS],
    arity: u8,
    serial: u64,
}

impl Node {
    fn parents(&self) -> &[(usize, f64)] {
        &self.parents[..self.arity as usize]
    }
}

/// Handle to a recorded node.
///
/// `serial` is unique per arena, so a handle whose slot was recovered and
/// reused no longer matches the node stored there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeRef {
    pub(crate) index: usize,
    serial: u64,
}

/// Append-only store of the computation graph recorded by [`Var`] arithmetic.
///
/// An arena is not `Sync`: concurrent gradient evaluations either run on
/// separate arenas (see [`super::with_thread_arena`]) or are serialized by the
/// caller. Content is only ever released when an [`ArenaScope`] is dropped.
///
/// Using a variable after the scope that recorded it has been recovered
/// panics instead of reading whatever node now occupies its slot.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: RefCell<Vec<Node>>,
    recoveries: Cell<usize>,
    next_serial: Cell<u64>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes currently recorded.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times this arena has been recovered since creation.
    pub fn recoveries(&self) -> usize {
        self.recoveries.get()
    }

    /// Opens a scope that records from the current length and recovers back to
    /// it when dropped.
    pub fn scope(&self) -> ArenaScope<'_> {
        ArenaScope {
            arena: self,
            mark: self.len(),
        }
    }

    /// Discards every node recorded at or after `mark`.
    pub(crate) fn recover_to(&self, mark: usize) {
        let mut nodes = self.nodes.borrow_mut();
        let before = nodes.len();
        nodes.truncate(mark);
        self.recoveries.set(self.recoveries.get() + 1);
        log::debug!("arena recovered from {} to {} nodes", before, nodes.len());
    }

    pub(crate) fn push(&self, parents: &[(NodeRef, f64)]) -> NodeRef {
        debug_assert!(parents.len() <= MAX_PARENTS);
        let mut nodes = self.nodes.borrow_mut();
        let serial = self.next_serial.get();
        self.next_serial.set(serial + 1);
        let mut node = Node {
            parents: [(0, 0.0); MAX_PARENTS],
            arity: parents.len() as u8,
            serial,
        };
        for (slot, &(parent, partial)) in node.parents.iter_mut().zip(parents) {
            assert_live(&nodes, parent);
            *slot = (parent.index, partial);
        }
        nodes.push(node);
        NodeRef {
            index: nodes.len() - 1,
            serial,
        }
    }
}

fn assert_live(nodes: &[Node], node: NodeRef) {
    assert!(
        nodes.get(node.index).map(|n| n.serial) == Some(node.serial),
        "variable used after the arena scope that recorded it was recovered"
    );
}

/// Scoped use of an [`Arena`].
///
/// Variables created through the scope borrow it, so they cannot outlive the
/// recovery that happens in `Drop`. Recovery runs exactly once whichever way
/// the scope is left: normal return, early `?` return or unwinding.
#[derive(Debug)]
pub struct ArenaScope<'a> {
    arena: &'a Arena,
    mark: usize,
}

impl<'a> ArenaScope<'a> {
    /// Arena length at the time the scope was opened.
    pub fn mark(&self) -> usize {
        self.mark
    }

    pub fn arena(&self) -> &Arena {
        self.arena
    }

    /// Creates an independent variable with value `value` and a zero adjoint.
    pub fn var(&self, value: f64) -> Var<'_> {
        let node = self.arena.push(&[]);
        Var::tracked(value, self.arena, node)
    }

    /// Creates one independent variable per entry of `values`, in order.
    pub fn vars(&self, values: &[f64]) -> Vec<Var<'_>> {
        values.iter().map(|&v| self.var(v)).collect()
    }

    /// Runs a single reverse sweep from `output` and returns d`output`/d`w`
    /// for every `w` in `wrt`, in order.
    ///
    /// Entries of `wrt` that are constants, or that were recorded before this
    /// scope was opened, receive a zero partial.
    ///
    /// # Panics
    ///
    /// If `output` or any entry of `wrt` was recorded in a scope that has
    /// since been recovered.
    pub fn gradient(&self, output: &Var<'_>, wrt: &[Var<'_>]) -> Vec<f64> {
        let nodes = self.arena.nodes.borrow();
        for node in std::iter::once(output).chain(wrt).filter_map(Var::node_ref) {
            assert_live(&nodes, node);
        }
        let base = self.mark;
        let mut adjoints = vec![0.0; nodes.len().saturating_sub(base)];

        if let Some(out) = output.index().and_then(|i| i.checked_sub(base)) {
            adjoints[out] = 1.0;
            for i in (0..=out).rev() {
                let adj = adjoints[i];
                if adj == 0.0 {
                    continue;
                }
                for &(parent, partial) in nodes[base + i].parents() {
                    if let Some(p) = parent.checked_sub(base) {
                        adjoints[p] += adj * partial;
                    }
                }
            }
        }

        wrt.iter()
            .map(|v| {
                v.index()
                    .and_then(|i| i.checked_sub(base))
                    .and_then(|i| adjoints.get(i).copied())
                    .unwrap_or(0.0)
            })
            .collect()
    }
}

impl Drop for ArenaScope<'_> {
    fn drop(&mut self) {
        self.arena.recover_to(self.mark);
    }
}
