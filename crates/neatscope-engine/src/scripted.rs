//! Deterministic in-memory engine stand-in.
//!
//! Populations are registered per path with a generation/individual shape;
//! everything else (link weights, propagation) is derived from a seeded RNG so
//! a given (seed, path, generation, individual) always produces the same
//! network. The demo binary and the viewer tests run against this; the real
//! engine replaces it behind the same traits.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::any::Any;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::{
    Engine, EngineError, ExperimentType, Genome, Network, NodeAddress, NodeId, Population,
    Substrate,
};

/// Layer layout used by the scripted substrate: two 8x8 sheets feeding a
/// single output node, stacked along +Y.
const DEMO_LAYERS: [((i32, i32), (f32, f32, f32)); 3] = [
    ((8, 8), (0.0, 0.0, 0.0)),
    ((8, 8), (0.0, 4.0, 0.0)),
    ((1, 1), (0.0, 8.0, 0.0)),
];

#[derive(Debug, Clone, Copy)]
struct PopulationShape {
    generations: usize,
    individuals: usize,
}

/// Scripted [`Engine`]: serves registered populations and fresh scripted
/// substrates.
pub struct ScriptedEngine {
    experiment: ExperimentType,
    seed: u64,
    populations: HashMap<PathBuf, PopulationShape>,
}

impl ScriptedEngine {
    #[must_use]
    pub fn new(experiment: ExperimentType, seed: u64) -> Self {
        Self {
            experiment,
            seed,
            populations: HashMap::new(),
        }
    }

    /// Registers a loadable population at `path`. Paths never registered fail
    /// to load, which is how tests exercise the run-retry policy.
    #[must_use]
    pub fn with_population(
        mut self,
        path: impl Into<PathBuf>,
        generations: usize,
        individuals: usize,
    ) -> Self {
        self.populations.insert(
            path.into(),
            PopulationShape {
                generations,
                individuals,
            },
        );
        self
    }
}

impl Engine for ScriptedEngine {
    fn load_population(&self, path: &Path) -> Result<Box<dyn Population>, EngineError> {
        let shape = self.populations.get(path).ok_or_else(|| {
            EngineError::PopulationUnavailable {
                path: path.to_path_buf(),
                reason: "no population registered at this path".into(),
            }
        })?;
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        let base = self.seed ^ hasher.finish();
        let generations = (0..shape.generations)
            .map(|g| {
                (0..shape.individuals)
                    .map(|i| ScriptedGenome {
                        seed: base
                            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
                            .wrapping_add((g as u64) << 32 | i as u64),
                    })
                    .collect()
            })
            .collect();
        Ok(Box::new(ScriptedPopulation { generations }))
    }

    fn new_substrate(&self) -> Box<dyn Substrate> {
        Box::new(ScriptedSubstrate::with_layers(&DEMO_LAYERS))
    }

    fn experiment_type(&self) -> ExperimentType {
        self.experiment
    }
}

/// Genome carrying only the seed its network is derived from.
#[derive(Debug, Clone, Copy)]
pub struct ScriptedGenome {
    pub seed: u64,
}

impl Genome for ScriptedGenome {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct ScriptedPopulation {
    generations: Vec<Vec<ScriptedGenome>>,
}

impl Population for ScriptedPopulation {
    fn generation_count(&self) -> usize {
        self.generations.len()
    }

    fn individual_count(&self, generation: usize) -> usize {
        self.generations.get(generation).map_or(0, Vec::len)
    }

    fn individual(&self, individual: usize, generation: usize) -> Result<&dyn Genome, EngineError> {
        self.generations
            .get(generation)
            .and_then(|gen| gen.get(individual))
            .map(|genome| genome as &dyn Genome)
            .ok_or(EngineError::MissingIndividual {
                generation,
                individual,
            })
    }
}

#[derive(Debug, Clone, Copy)]
struct LayerSpec {
    width: i32,
    height: i32,
    location: (f32, f32, f32),
    /// Flat node-id offset of this layer's first node.
    id_offset: u32,
}

/// In-memory layered substrate with a dense feed-forward network between
/// consecutive layers.
pub struct ScriptedSubstrate {
    layers: Vec<LayerSpec>,
    network: ScriptedNetwork,
}

impl ScriptedSubstrate {
    /// Builds an empty (zero-weight) substrate over the given
    /// `((width, height), location)` layer stack.
    #[must_use]
    pub fn with_layers(layers: &[((i32, i32), (f32, f32, f32))]) -> Self {
        let mut specs = Vec::with_capacity(layers.len());
        let mut offset = 0u32;
        for &((width, height), location) in layers {
            specs.push(LayerSpec {
                width,
                height,
                location,
                id_offset: offset,
            });
            offset += (width * height) as u32;
        }
        Self {
            layers: specs,
            network: ScriptedNetwork::with_nodes(offset as usize),
        }
    }

    /// Test hook: installs a specific link weight between two addresses.
    pub fn force_link(&mut self, from: NodeAddress, to: NodeAddress, weight: f64) {
        if let (Some(a), Some(b)) = (self.node_name(from), self.node_name(to)) {
            self.network.weights.insert((a, b), weight);
        }
    }
}

impl Substrate for ScriptedSubstrate {
    fn populate(&mut self, genome: &dyn Genome) -> Result<(), EngineError> {
        let genome = genome
            .as_any()
            .downcast_ref::<ScriptedGenome>()
            .ok_or_else(|| {
                EngineError::IncompatibleGenome("scripted substrate needs a scripted genome".into())
            })?;
        let mut rng = SmallRng::seed_from_u64(genome.seed);
        self.network.weights.clear();
        for window in self.layers.windows(2) {
            let (src, dst) = (window[0], window[1]);
            let src_nodes = (src.width * src.height) as u32;
            let dst_nodes = (dst.width * dst.height) as u32;
            for a in 0..src_nodes {
                for b in 0..dst_nodes {
                    // Sparse connectivity so hasLink is meaningfully false
                    // for some pairs.
                    if rng.gen_bool(0.8) {
                        self.network.weights.insert(
                            (NodeId(src.id_offset + a), NodeId(dst.id_offset + b)),
                            rng.gen_range(-3.0..3.0),
                        );
                    }
                }
            }
        }
        self.network.reinitialize();
        Ok(())
    }

    fn num_layers(&self) -> usize {
        self.layers.len()
    }

    fn layer_size(&self, z: usize) -> (i32, i32) {
        self.layers.get(z).map_or((0, 0), |l| (l.width, l.height))
    }

    fn layer_location(&self, z: usize) -> (f32, f32, f32) {
        self.layers.get(z).map_or((0.0, 0.0, 0.0), |l| l.location)
    }

    fn node_name(&self, node: NodeAddress) -> Option<NodeId> {
        let layer = self.layers.get(node.layer)?;
        if node.x < 0 || node.y < 0 || node.x >= layer.width || node.y >= layer.height {
            return None;
        }
        Some(NodeId(
            layer.id_offset + (node.y * layer.width + node.x) as u32,
        ))
    }

    fn set_value(&mut self, node: NodeAddress, value: f64) {
        if let Some(id) = self.node_name(node) {
            self.network.values[id.0 as usize] = value;
        }
    }

    fn network(&self) -> &dyn Network {
        &self.network
    }

    fn network_mut(&mut self) -> &mut dyn Network {
        &mut self.network
    }
}

struct ScriptedNetwork {
    values: Vec<f64>,
    weights: HashMap<(NodeId, NodeId), f64>,
}

impl ScriptedNetwork {
    fn with_nodes(count: usize) -> Self {
        Self {
            values: vec![0.0; count],
            weights: HashMap::new(),
        }
    }
}

impl Network for ScriptedNetwork {
    fn reinitialize(&mut self) {
        self.values.fill(0.0);
    }

    fn update(&mut self) {
        // One forward pass: every node with incoming links takes the weighted
        // sum of its sources (pre-pass values), squashed.
        let mut sums: HashMap<NodeId, f64> = HashMap::new();
        for (&(from, to), &weight) in &self.weights {
            *sums.entry(to).or_insert(0.0) += self.values[from.0 as usize] * weight;
        }
        for (node, sum) in sums {
            self.values[node.0 as usize] = sum.tanh();
        }
    }

    fn value(&self, node: NodeId) -> f64 {
        self.values.get(node.0 as usize).copied().unwrap_or(0.0)
    }

    fn has_link(&self, from: NodeId, to: NodeId) -> bool {
        self.weights.contains_key(&(from, to))
    }

    fn link_weight(&self, from: NodeId, to: NodeId) -> f64 {
        self.weights.get(&(from, to)).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded_engine() -> ScriptedEngine {
        ScriptedEngine::new(ExperimentType(15), 7).with_population("pop_run4.xml.gz", 3, 5)
    }

    #[test]
    fn unregistered_paths_fail_to_load() {
        let engine = loaded_engine();
        assert!(engine.load_population(Path::new("pop_run1.xml.gz")).is_err());
    }

    #[test]
    fn population_shape_round_trips() {
        let engine = loaded_engine();
        let population = engine
            .load_population(Path::new("pop_run4.xml.gz"))
            .expect("registered population loads");
        assert_eq!(population.generation_count(), 3);
        assert_eq!(population.individual_count(2), 5);
        assert!(population.individual(5, 2).is_err());
    }

    #[test]
    fn populate_is_deterministic_per_genome() {
        let engine = loaded_engine();
        let population = engine
            .load_population(Path::new("pop_run4.xml.gz"))
            .expect("registered population loads");
        let genome = population.individual(1, 2).expect("genome exists");

        let mut first = ScriptedSubstrate::with_layers(&DEMO_LAYERS);
        let mut second = ScriptedSubstrate::with_layers(&DEMO_LAYERS);
        first.populate(genome).expect("populate");
        second.populate(genome).expect("populate");

        let a = first.node_name(NodeAddress::new(2, 3, 0)).expect("node");
        let b = first.node_name(NodeAddress::new(4, 4, 1)).expect("node");
        assert_eq!(
            first.network().link_weight(a, b),
            second.network().link_weight(a, b)
        );
    }

    #[test]
    fn forced_inputs_flow_through_update() {
        let mut substrate = ScriptedSubstrate::with_layers(&DEMO_LAYERS);
        let input = NodeAddress::new(1, 1, 0);
        let hidden = NodeAddress::new(0, 0, 1);
        substrate.force_link(input, hidden, 2.0);
        substrate.set_value(input, 0.5);
        substrate.network_mut().update();
        let id = substrate.node_name(hidden).expect("node");
        let expected = (0.5f64 * 2.0).tanh();
        assert!((substrate.network().value(id) - expected).abs() < 1e-12);
    }

    #[test]
    fn missing_nodes_read_as_zero() {
        let substrate = ScriptedSubstrate::with_layers(&DEMO_LAYERS);
        assert!(substrate.node_name(NodeAddress::new(9, 0, 0)).is_none());
        assert_eq!(substrate.network().value(NodeId(10_000)), 0.0);
    }
}
