pub mod bounds;
pub mod component;
pub mod ee_nodes;
pub mod hermite;
pub mod jacobian;
pub mod node_values;
pub mod phase_nodes;
pub mod state;
pub mod timing;
