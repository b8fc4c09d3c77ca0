//! Feature adaptive representation.
//!
//! The `far` module holds the subdivision machinery itself: the adjacency of
//! one level ([`TopologyLevel`]), the refinement [`rules`], direct
//! subdivision ([`subdivide_once()`]) and the symbolic levels
//! ([`SymbolicMesh`]) with their [`StencilTable`]s.
pub(crate) mod refinement;
pub mod rules;
mod stencil_table;
mod subdivide;
mod topology_level;
mod topology_refiner;

pub use refinement::ParentComponent;
pub use stencil_table::{Stencil, StencilTable};
pub use subdivide::{subdivide, subdivide_once};
pub use topology_level::TopologyLevel;
pub use topology_refiner::{BoundaryMode, MapBorderMode, SymbolicMesh, TopologyRefinerOptions};
