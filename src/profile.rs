use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Profile {
    #[serde(deserialize_with = "gpu_section")]
    pub gpu: EndpointProfile,
    #[serde(deserialize_with = "nic_section")]
    pub nic: EndpointProfile,
    pub switch: SwitchProfile,
    pub tree: TreeProfile,
    /// Product part numbers this tool has been validated on.
    pub compatible_systems: Vec<String>,
}

/// How to find one kind of endpoint in the listings.
#[derive(Clone, Debug, PartialEq)]
pub struct EndpointProfile {
    /// Case-insensitive substring selecting endpoints from `lspci`.
    pub filter: String,
    /// Model string that seeds a switch-resolution chunk in `lspci -k`.
    pub model: String,
    /// Substring identifying the endpoint's own record inside a chunk.
    pub marker: String,
}

// Endpoint sections fall back key by key to the defaults of their own kind.
#[derive(Deserialize)]
struct EndpointSection {
    filter: Option<String>,
    model: Option<String>,
    marker: Option<String>,
}

impl EndpointSection {
    fn over(self, base: EndpointProfile) -> EndpointProfile {
        EndpointProfile {
            filter: self.filter.unwrap_or(base.filter),
            model: self.model.unwrap_or(base.model),
            marker: self.marker.unwrap_or(base.marker),
        }
    }
}

fn gpu_section<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<EndpointProfile, D::Error> {
    Ok(EndpointSection::deserialize(d)?.over(EndpointProfile::default_gpu()))
}

fn nic_section<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<EndpointProfile, D::Error> {
    Ok(EndpointSection::deserialize(d)?.over(EndpointProfile::default_nic()))
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SwitchProfile {
    pub vendor: String,
    pub side_anchor: String,
    pub side_link_class: String,
    pub side_family: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TreeProfile {
    /// Lines opening an IOMMU domain in `lspci -tvv`.
    pub domain_markers: Vec<String>,
    pub exclude: Vec<String>,
    pub keywords: Vec<String>,
    pub domain_indent: usize,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            gpu: EndpointProfile::default_gpu(),
            nic: EndpointProfile::default_nic(),
            switch: SwitchProfile::default(),
            tree: TreeProfile::default(),
            compatible_systems: vec!["SYS-821GE-TNHR".into()],
        }
    }
}

impl EndpointProfile {
    pub fn default_gpu() -> Self {
        Self {
            filter: "sxm5".into(),
            model: "H100 SXM5 80GB".into(),
            marker: "3D controller".into(),
        }
    }

    pub fn default_nic() -> Self {
        Self {
            filter: "mella".into(),
            model: "ConnectX-7".into(),
            marker: "ConnectX-7".into(),
        }
    }
}

impl Default for SwitchProfile {
    fn default() -> Self {
        Self {
            vendor: "Broadcom".into(),
            side_anchor: "Mellanox".into(),
            side_link_class: "Ethernet".into(),
            side_family: "PEX890xx".into(),
        }
    }
}

impl Default for TreeProfile {
    fn default() -> Self {
        Self {
            domain_markers: vec!["Map/VT-d".into()],
            exclude: ["Mesh 2 PCIe", "RAS", "0b23", "PMON", "MSM", "324c", "324d", "2710"]
                .into_iter()
                .map(String::from)
                .collect(),
            // 49-58 is the bus range behind the side switch.
            keywords: [
                "H100 SXM5 80GB",
                "ConnectX-7",
                "LSI PCIe Switch",
                "NVSwitch",
                "49-58",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            domain_indent: 3,
        }
    }
}

impl Profile {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("TOML parse error: {}", e)))
    }

    pub fn sample_toml() -> &'static str {
        r#"# pcislot profile; every key is optional
compatible_systems = ["SYS-821GE-TNHR"]

[gpu]
filter = "sxm5"
model = "H100 SXM5 80GB"
marker = "3D controller"

[nic]
filter = "mella"
model = "ConnectX-7"
marker = "ConnectX-7"

[switch]
vendor = "Broadcom"
side_anchor = "Mellanox"
side_link_class = "Ethernet"
side_family = "PEX890xx"

[tree]
domain_markers = ["Map/VT-d"]
exclude = ["Mesh 2 PCIe", "RAS", "0b23", "PMON", "MSM", "324c", "324d", "2710"]
keywords = ["H100 SXM5 80GB", "ConnectX-7", "LSI PCIe Switch", "NVSwitch", "49-58"]
domain_indent = 3
"#
    }
}
