use colored::{ColoredString, Colorize};

use crate::{AnnotatedEndpoint, EndpointKind, TreeLine, TreeLineKind, Upstream};

pub const TREE_HEADER: &str = "// Root Port ";

const NOT_AVAILABLE: &str = "N/A";

fn label(kind: EndpointKind, text: String) -> ColoredString {
    match kind {
        EndpointKind::Gpu => text.cyan().bold(),
        EndpointKind::Nic => text.yellow().bold(),
    }
}

pub fn endpoint_line(ep: &AnnotatedEndpoint) -> String {
    let mut line = label(ep.kind, format!("[{} bus ID: {}]", ep.kind, ep.bus)).to_string();

    let slot = if ep.physical_slot.is_empty() {
        NOT_AVAILABLE
    } else {
        ep.physical_slot.as_str()
    };

    match ep.upstream {
        Upstream::Main(Some(switch)) => {
            line += &format!(" -> PCI Slot: {} -> PLX bus ID: {}", slot, switch);
        }
        Upstream::Main(None) | Upstream::Unknown => {
            line += &format!(" -> PCI Slot: {} -> PLX bus ID: {}", slot, NOT_AVAILABLE);
        }
        Upstream::Side(switch) => {
            line += &format!(" -> PCI Slot: {} -> Side SW bus ID: {}", slot, switch);
        }
    }

    if let Some(link) = &ep.link {
        line += " -> Link: ";
        line += &if link.downgraded() {
            link.to_string().red().to_string()
        } else {
            link.to_string()
        };
    }

    if !ep.cpu_node.is_empty() {
        line += &format!(" -> CPU slot: {}", ep.cpu_node);
    }

    line
}

pub fn tree_line(line: &TreeLine) -> String {
    match line.kind {
        TreeLineKind::Domain => line.text.green().bold().to_string(),
        TreeLineKind::Switch => line.text.truecolor(255, 135, 0).to_string(),
        TreeLineKind::Endpoint => line.text.clone(),
    }
}

pub fn tree_header() -> String {
    TREE_HEADER.magenta().bold().to_string()
}
