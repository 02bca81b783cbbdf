//! Country: one candidate solution, its fitness, and its place in the
//! empire/colony graph.
//!
//! The empire↔vassal cycle of the reference algorithm is flattened into an
//! arena of [`Country`] values plus integer handles: `empire_of` and
//! `vassals` hold indices into that arena rather than pointers, so there is
//! no ownership cycle to break and no stale-pointer class of bug when a
//! coup swaps roles in place.

use ndarray::Array1;

/// Index into the engine's Country arena.
pub type Handle = usize;

#[derive(Debug, Clone)]
pub struct Country {
    pub position: Array1<f64>,
    pub fitness: f64,
    /// `None` when this Country is itself an empire.
    pub empire_of: Option<Handle>,
    /// Non-empty only while this Country is an empire.
    pub vassals: Vec<Handle>,
    /// Present only in visual mode; `None` for every Country in a plain engine.
    pub color: Option<[f64; 3]>,
}

impl Country {
    pub fn new(position: Array1<f64>) -> Self {
        Self {
            position,
            fitness: f64::INFINITY,
            empire_of: None,
            vassals: Vec::new(),
            color: None,
        }
    }

    pub fn is_empire(&self) -> bool {
        self.empire_of.is_none()
    }
}
