//! Narrow interface onto the external neuroevolution engine.
//!
//! The viewer never builds substrates or evaluates networks itself; everything
//! it needs from the engine is expressed as the object-safe traits in this
//! crate. Production wires these up to the real HyperNEAT bindings; tests and
//! the demo binary use the deterministic [`scripted`] implementation.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod scripted;

/// Substrate position: grid coordinates within a layer plus the layer index.
///
/// Unique within a layer only; the layer index disambiguates across layers.
/// Used as a map key for input overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeAddress {
    pub x: i32,
    pub y: i32,
    pub layer: usize,
}

impl NodeAddress {
    #[must_use]
    pub const fn new(x: i32, y: i32, layer: usize) -> Self {
        Self { x, y, layer }
    }

    /// Only layer-0 nodes accept forced input values.
    #[must_use]
    pub const fn is_input(&self) -> bool {
        self.layer == 0
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.layer)
    }
}

/// Opaque per-network node handle resolved via [`Substrate::node_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Experiment identifier as recorded by the engine.
///
/// A handful of experiments seed the first layer as a checkerboard: odd
/// (x + y) positions in layer 0 simply do not exist there, and the viewer
/// must skip them in both geometry and picking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentType(pub i32);

const CHECKERBOARD_EXPERIMENTS: [i32; 4] = [15, 16, 21, 24];

impl ExperimentType {
    #[must_use]
    pub fn checkerboard_input(&self) -> bool {
        CHECKERBOARD_EXPERIMENTS.contains(&self.0)
    }

    /// Input overrides seeded when a substrate is first shown and no prior
    /// override map exists: two bands of checkerboard cells, the top rows
    /// pushed positive and the bottom rows negative.
    #[must_use]
    pub fn default_overrides(&self) -> HashMap<NodeAddress, f64> {
        let mut overrides = HashMap::new();
        if !self.checkerboard_input() {
            return overrides;
        }
        for x in (0..8).step_by(2) {
            for y in 0..3 {
                overrides.insert(NodeAddress::new(x + y % 2, y, 0), 0.5);
            }
            for y in 5..8 {
                overrides.insert(NodeAddress::new(x + y % 2, y, 0), -0.5);
            }
        }
        overrides
    }
}

/// Failures surfaced by the engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("population file {path} could not be loaded: {reason}")]
    PopulationUnavailable { path: PathBuf, reason: String },
    #[error("generation {generation} has no individual {individual}")]
    MissingIndividual {
        generation: usize,
        individual: usize,
    },
    #[error("substrate rejected genome: {0}")]
    IncompatibleGenome(String),
}

/// Opaque genome handle passed from a population into a substrate.
pub trait Genome: fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

/// A loaded population: an indexed archive of genomes per generation.
pub trait Population {
    fn generation_count(&self) -> usize;
    fn individual_count(&self, generation: usize) -> usize;
    fn individual(&self, individual: usize, generation: usize) -> Result<&dyn Genome, EngineError>;
}

/// One propagating network instance owned by a substrate.
///
/// Lookups against absent nodes or links read as zero; absence is a normal
/// outcome at this boundary, not an error.
pub trait Network {
    fn reinitialize(&mut self);
    /// One full propagation pass.
    fn update(&mut self);
    fn value(&self, node: NodeId) -> f64;
    fn has_link(&self, from: NodeId, to: NodeId) -> bool;
    fn link_weight(&self, from: NodeId, to: NodeId) -> f64;
}

/// Layered substrate topology plus the network mapped onto it.
pub trait Substrate {
    /// Rebuilds topology and weights from a genome.
    fn populate(&mut self, genome: &dyn Genome) -> Result<(), EngineError>;
    fn num_layers(&self) -> usize;
    /// (width, height) of the node grid at layer `z`.
    fn layer_size(&self, z: usize) -> (i32, i32);
    /// 3D offset of layer `z`'s grid.
    fn layer_location(&self, z: usize) -> (f32, f32, f32);
    fn node_name(&self, node: NodeAddress) -> Option<NodeId>;
    /// Forces an input node's value ahead of the next evaluation. Unknown
    /// addresses are ignored.
    fn set_value(&mut self, node: NodeAddress, value: f64);
    fn network(&self) -> &dyn Network;
    fn network_mut(&mut self) -> &mut dyn Network;
}

/// Entry point the viewer holds onto for the lifetime of a session.
pub trait Engine {
    fn load_population(&self, path: &Path) -> Result<Box<dyn Population>, EngineError>;
    fn new_substrate(&self) -> Box<dyn Substrate>;
    fn experiment_type(&self) -> ExperimentType;
}
