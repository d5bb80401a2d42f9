use crate::PciAddr;

/// One device record from a flat lspci listing. With `-k` the record also
/// carries the indented `Subsystem`/`Kernel` lines as attributes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PcieDevice {
    addr: PciAddr,
    desc: String,
    raw_attributes: Vec<String>,
}

impl PcieDevice {
    pub fn parse(line: &str) -> Option<PcieDevice> {
        PciAddr::parse_prefix(line).map(|(addr, rest)| PcieDevice {
            addr,
            desc: rest.trim().to_string(),
            raw_attributes: Vec::new(),
        })
    }

    fn push_attribute(&mut self, line: &str) {
        self.raw_attributes.push(line.trim().to_string());
    }

    pub fn addr(&self) -> PciAddr {
        self.addr
    }

    pub fn description(&self) -> &str {
        &self.desc
    }

    /// Bound kernel driver, empty when none is reported.
    pub fn driver_info(&self) -> &str {
        self.attribute("Kernel driver in use").unwrap_or_default()
    }

    #[cfg(test)]
    pub fn raw_attributes(&self) -> &[String] {
        &self.raw_attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.raw_attributes.iter().find_map(|attr| {
            attr.split_once(':')
                .filter(|(k, _)| k.trim() == key)
                .map(|(_, v)| v.trim())
        })
    }

    pub fn mentions(&self, pattern: &str) -> bool {
        self.desc.contains(pattern)
    }

    pub fn mentions_ignore_case(&self, pattern: &str) -> bool {
        self.desc
            .to_ascii_lowercase()
            .contains(&pattern.to_ascii_lowercase())
    }

    pub fn is_secondary_function(&self) -> bool {
        self.addr.function() == 1
    }
}

/// Splits a flat lspci listing into device records. Device lines start at
/// column zero with a bus address; indented lines belong to the preceding
/// device. Anything else (headers, blank lines, stray text) is skipped.
pub fn parse_listing<S: AsRef<str>>(lines: &[S]) -> Vec<PcieDevice> {
    let mut devices: Vec<PcieDevice> = Vec::new();

    for line in lines {
        let line = line.as_ref();

        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with(char::is_whitespace) {
            match devices.last_mut() {
                Some(dev) => dev.push_attribute(line),
                None => log::debug!("attribute line before any device: {:?}", line),
            }
            continue;
        }

        match PcieDevice::parse(line) {
            Some(dev) => devices.push(dev),
            None => log::debug!("skipping unrecognised listing line: {:?}", line),
        }
    }

    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
18:00.0 3D controller: NVIDIA Corporation GH100 [H100 SXM5 80GB] (rev a1)
\tSubsystem: NVIDIA Corporation Device 16c1
\tKernel driver in use: nvidia
\tKernel modules: nvidiafb, nouveau, nvidia_drm, nvidia
19:00.0 PCI bridge: Broadcom / LSI PEX890xx PCIe Gen 5 Switch (rev b0)
\tKernel driver in use: pcieport
";

    #[test]
    fn records_carry_attributes() {
        let lines = LISTING.lines().collect::<Vec<_>>();
        let devices = parse_listing(&lines);

        assert_eq!(devices.len(), 2);

        let gpu = &devices[0];
        assert_eq!(gpu.addr().to_string(), "0000:18:00.0");
        assert_eq!(
            gpu.description(),
            "3D controller: NVIDIA Corporation GH100 [H100 SXM5 80GB] (rev a1)"
        );
        assert_eq!(gpu.driver_info(), "nvidia");
        assert_eq!(gpu.raw_attributes().len(), 3);
        assert_eq!(
            gpu.attribute("Subsystem"),
            Some("NVIDIA Corporation Device 16c1")
        );

        assert_eq!(devices[1].driver_info(), "pcieport");
        assert!(devices[1].mentions("PEX890xx"));
    }

    #[test]
    fn missing_driver_is_empty() {
        let devices = parse_listing(&["4f:00.1 Ethernet controller: Mellanox Technologies MT2910"]);

        assert_eq!(devices[0].driver_info(), "");
        assert!(devices[0].raw_attributes().is_empty());
        assert!(devices[0].is_secondary_function());
        assert!(devices[0].mentions_ignore_case("mellanox"));
    }

    #[test]
    fn stray_lines_are_skipped() {
        let devices = parse_listing(&[
            "\tSubsystem: orphan",
            "pcilib: sysfs_read_vpd: read failed",
            "",
            "00:00.0 Host bridge: Intel Corporation Device 09a2 (rev 20)",
        ]);

        assert_eq!(devices.len(), 1);
        assert!(devices[0].raw_attributes().is_empty());
    }
}
