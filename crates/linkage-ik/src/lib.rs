//! Planar inverse kinematics for a single open chain.
//!
//! Positions a chain of rigid segments so its free end reaches (or points
//! at) a target, using FABRIK with a straight-stretch fallback for targets
//! beyond reach.
//!
//! # Architecture
//!
//! ```text
//! ChainConfig ──► Chain ──► FabrikSolver ──► joint positions (in place)
//! ```
//!
//! The [`Chain`] owns joint positions and fixed segment lengths. The
//! [`FabrikSolver`] mutates those positions each call, using the previous
//! pose as its warm start. [`LinkageIkPlugin`] runs the solve once per
//! frame inside a Bevy app.

pub mod chain;
pub mod plugin;
pub mod solver;

pub use chain::{build_chain, Chain, Joint};
pub use plugin::{solve_chain, IkChain, IkSolver, LinkageIkPlugin};
pub use solver::{solve, FabrikSolver, IkResult, SolveBranch};

pub mod prelude {
    pub use crate::{
        Chain, FabrikSolver, IkChain, IkResult, IkSolver, LinkageIkPlugin, SolveBranch,
        build_chain, solve, solve_chain,
    };
}
