//! Interactive substrate rendering and navigation core.
//!
//! Maps a layered 3D substrate to screen geometry, answers screen-space pick
//! queries, derives per-node colors from network state, and runs the
//! run/generation/individual browsing state machine. The neuroevolution
//! engine and the actual renderer/window host both sit behind interfaces:
//! the engine behind the `neatscope-engine` traits, the host behind
//! [`InputSink`].

pub mod camera;
pub mod color;
pub mod config;
pub mod controller;
pub mod error;
pub mod navigation;
pub mod view;

pub use camera::{OrbitCamera, ScreenProjector};
pub use color::ColorEncoder;
pub use config::ViewerConfig;
pub use controller::{InputSink, InteractionController, Key, Modifiers, PointerButton, ViewerCommand};
pub use error::ViewerError;
pub use navigation::NavigationState;
pub use view::{FrameGeometry, HudState, NodeQuad, PickRect, SubstrateView};
