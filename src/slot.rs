use crate::{LnkSta, PciAddr, PciSource, enumerate_verbose};

/// Firmware-reported placement of one endpoint. Empty strings mean the
/// attribute was not reported; switch-internal endpoints have no slot.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotInfo {
    pub bus: PciAddr,
    pub physical_slot: String,
    pub cpu_node: String,
    pub link: Option<LnkSta>,
}

const PHYSICAL_SLOT: &str = "Physical Slot:";
const NUMA_NODE: &str = "NUMA node:";

pub fn annotate(source: &dyn PciSource, addr: PciAddr) -> SlotInfo {
    let info = parse_slot_info(addr, &enumerate_verbose(source, addr));

    if info.physical_slot.is_empty() {
        log::debug!("{} reports no physical slot", addr);
    }

    info
}

pub fn parse_slot_info<S: AsRef<str>>(bus: PciAddr, lines: &[S]) -> SlotInfo {
    let mut info = SlotInfo {
        bus,
        physical_slot: String::new(),
        cpu_node: String::new(),
        link: None,
    };

    for line in lines {
        let line = line.as_ref().trim();

        if let Some(slot) = line.strip_prefix(PHYSICAL_SLOT) {
            info.physical_slot = slot.trim().to_string();
        } else if let Some(node) = line.strip_prefix(NUMA_NODE) {
            // The NUMA node is the CPU socket the device hangs off.
            info.cpu_node = node.trim().to_string();
        } else if info.link.is_none() {
            info.link = LnkSta::parse(line);
        }
    }

    info
}
