use serde::Deserialize;

/// Binds one interface's ingress and/or egress arc to a lookup context.
/// An arc left unbound falls back to the dataplane's documented default
/// epoch/lookup-context behavior for that direction.
#[derive(Debug, Deserialize, Clone)]
pub struct InterfaceConfig {
    /// Interface index as the forwarder's graph knows it.
    pub index: u32,
    #[serde(default)]
    pub input_lookup_context: Option<u32>,
    #[serde(default)]
    pub output_lookup_context: Option<u32>,
}
