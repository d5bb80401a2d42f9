use std::fmt::{Display, Formatter};

use crate::{PciAddr, PcieDevice, Profile, context_chunks};

/// Records following an anchor record that are searched for the side switch.
pub const SIDE_SWITCH_WINDOW: usize = 1;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SideSwitchPair {
    pub endpoint: PciAddr,
    pub switch: PciAddr,
}

impl Display for SideSwitchPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "[{}, {}]", self.endpoint, self.switch)
    }
}

/// Scans the `lspci -k` records for a link-class NIC followed closely by a
/// side-switch family device. Returns the first such pair.
pub fn resolve_side_switch(devices: &[PcieDevice], profile: &Profile) -> Option<SideSwitchPair> {
    let side = &profile.switch;

    let devices = devices
        .iter()
        .filter(|dev| !dev.is_secondary_function())
        .collect::<Vec<_>>();

    let anchors = devices
        .iter()
        .enumerate()
        .filter(|(_, dev)| dev.mentions(&side.side_anchor))
        .map(|(i, _)| i);

    for chunk in context_chunks(devices.len(), anchors, SIDE_SWITCH_WINDOW) {
        let chunk = &devices[chunk];

        let Some(nic) = chunk
            .iter()
            .position(|dev| dev.mentions(&side.side_link_class))
        else {
            continue;
        };

        if let Some(switch) = chunk[nic + 1..]
            .iter()
            .find(|dev| dev.mentions(&side.side_family))
        {
            let pair = SideSwitchPair {
                endpoint: chunk[nic].addr(),
                switch: switch.addr(),
            };

            log::debug!("side switch pair {}", pair);

            return Some(pair);
        }
    }

    log::debug!("no {} side switch found", side.side_family);

    None
}
