//! Per-node color encoding.
//!
//! With a node hovered, every other node is tinted by the weight of its link
//! to the hovered node; otherwise nodes show their own activation. Negative
//! values render as red intensity, non-negative as grayscale, so sign reads
//! at a glance. The two modes clamp differently on purpose: activations to
//! [-1, 1], link weights to [-3, 3], so weight reds deliberately saturate
//! past full channel intensity.

use neatscope_engine::{NodeAddress, Substrate};

/// RGB triple; channels are only guaranteed inside [0, 1] for the activation
/// mode (see module docs).
pub type Rgb = [f64; 3];

const ACTIVATION_CAP: f64 = 1.0;
const WEIGHT_CAP: f64 = 3.0;

/// Borrow-only view over a substrate that turns node state into colors.
pub struct ColorEncoder<'a> {
    substrate: &'a dyn Substrate,
}

impl<'a> ColorEncoder<'a> {
    #[must_use]
    pub fn new(substrate: &'a dyn Substrate) -> Self {
        Self { substrate }
    }

    /// Color for `current`, in link-weight mode when `selected` is present.
    ///
    /// The link is looked up selected→current first, then current→selected;
    /// with neither present (or either node unknown) the effective weight is
    /// zero. Absence is a normal outcome, never an error.
    #[must_use]
    pub fn color_for(&self, current: NodeAddress, selected: Option<NodeAddress>) -> Rgb {
        let value = match selected {
            Some(selected) => self
                .link_weight(selected, current)
                .clamp(-WEIGHT_CAP, WEIGHT_CAP),
            None => self
                .activation(current)
                .clamp(-ACTIVATION_CAP, ACTIVATION_CAP),
        };
        scalar_to_rgb(value)
    }

    fn activation(&self, node: NodeAddress) -> f64 {
        match self.substrate.node_name(node) {
            Some(id) => self.substrate.network().value(id),
            None => 0.0,
        }
    }

    fn link_weight(&self, selected: NodeAddress, current: NodeAddress) -> f64 {
        let network = self.substrate.network();
        let (Some(selected), Some(current)) = (
            self.substrate.node_name(selected),
            self.substrate.node_name(current),
        ) else {
            return 0.0;
        };
        if network.has_link(selected, current) {
            network.link_weight(selected, current)
        } else if network.has_link(current, selected) {
            network.link_weight(current, selected)
        } else {
            0.0
        }
    }
}

/// Sign-split scalar map: negative → red channel, non-negative → gray. Both
/// branches agree at zero (black).
fn scalar_to_rgb(value: f64) -> Rgb {
    if value < 0.0 {
        [value.abs(), 0.0, 0.0]
    } else {
        [value, value, value]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neatscope_engine::scripted::ScriptedSubstrate;

    const LAYERS: [((i32, i32), (f32, f32, f32)); 2] =
        [((4, 4), (0.0, 0.0, 0.0)), ((2, 2), (0.0, 4.0, 0.0))];

    fn substrate_with_activation(node: NodeAddress, value: f64) -> ScriptedSubstrate {
        let mut substrate = ScriptedSubstrate::with_layers(&LAYERS);
        substrate.set_value(node, value);
        substrate
    }

    #[test]
    fn activation_mode_maps_sign_split() {
        let node = NodeAddress::new(1, 1, 0);
        let cases = [
            (0.0, [0.0, 0.0, 0.0]),
            (0.7, [0.7, 0.7, 0.7]),
            (-0.7, [0.7, 0.0, 0.0]),
        ];
        for (value, expected) in cases {
            let substrate = substrate_with_activation(node, value);
            let encoder = ColorEncoder::new(&substrate);
            assert_eq!(encoder.color_for(node, None), expected, "value {value}");
        }
    }

    #[test]
    fn activation_clamps_to_unit_range() {
        let node = NodeAddress::new(0, 0, 0);
        let substrate = substrate_with_activation(node, 2.0);
        let encoder = ColorEncoder::new(&substrate);
        assert_eq!(encoder.color_for(node, None), [1.0, 1.0, 1.0]);

        let substrate = substrate_with_activation(node, -5.0);
        let encoder = ColorEncoder::new(&substrate);
        assert_eq!(encoder.color_for(node, None), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn weight_mode_clamps_wider_than_activation() {
        let selected = NodeAddress::new(0, 0, 0);
        let current = NodeAddress::new(1, 0, 1);
        let mut substrate = ScriptedSubstrate::with_layers(&LAYERS);
        substrate.force_link(selected, current, -5.0);
        let encoder = ColorEncoder::new(&substrate);
        // Clamped to -3 before mapping, then the magnitude goes straight to
        // the red channel.
        assert_eq!(encoder.color_for(current, Some(selected)), [3.0, 0.0, 0.0]);
    }

    #[test]
    fn weight_lookup_falls_back_to_reverse_link() {
        let selected = NodeAddress::new(2, 2, 0);
        let current = NodeAddress::new(0, 1, 1);
        let mut substrate = ScriptedSubstrate::with_layers(&LAYERS);
        substrate.force_link(current, selected, 1.5);
        let encoder = ColorEncoder::new(&substrate);
        assert_eq!(encoder.color_for(current, Some(selected)), [1.5, 1.5, 1.5]);
    }

    #[test]
    fn missing_links_and_nodes_read_black() {
        let substrate = ScriptedSubstrate::with_layers(&LAYERS);
        let encoder = ColorEncoder::new(&substrate);
        let selected = NodeAddress::new(0, 0, 0);
        assert_eq!(
            encoder.color_for(NodeAddress::new(1, 1, 1), Some(selected)),
            [0.0, 0.0, 0.0]
        );
        assert_eq!(
            encoder.color_for(NodeAddress::new(99, 99, 5), None),
            [0.0, 0.0, 0.0]
        );
    }
}
