use serde::{Deserialize, Serialize};

/// A single audio port as the platform describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDescription {
    pub name: String,
    pub port_type: String,
}

impl PortDescription {
    pub fn new(name: impl Into<String>, port_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            port_type: port_type.into(),
        }
    }
}

/// Snapshot of the current input and output ports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteChange {
    pub input_name: Option<String>,
    pub input_type: Option<String>,
    pub output_name: Option<String>,
    pub output_type: Option<String>,
}

impl RouteChange {
    pub fn from_ports(input: Option<PortDescription>, output: Option<PortDescription>) -> Self {
        let (input_name, input_type) = split(input);
        let (output_name, output_type) = split(output);
        Self {
            input_name,
            input_type,
            output_name,
            output_type,
        }
    }
}

fn split(port: Option<PortDescription>) -> (Option<String>, Option<String>) {
    match port {
        Some(port) => (Some(port.name), Some(port.port_type)),
        None => (None, None),
    }
}

/// Platform route enumeration and the native route picker.
pub trait RouteControl: Send + Sync {
    fn current_input(&self) -> Option<PortDescription>;

    fn current_output(&self) -> Option<PortDescription>;

    fn present_route_picker(&self);
}
