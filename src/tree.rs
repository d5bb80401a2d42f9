use std::sync::OnceLock;

use regex::Regex;

use crate::{Profile, context_chunks};

/// Lines after each domain marker that still belong to its domain.
pub const DOMAIN_CONTEXT: usize = 6;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TreeLineKind {
    Domain,
    Switch,
    Endpoint,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreeLine {
    pub kind: TreeLineKind,
    pub text: String,
}

fn domain_id(line: &str) -> Option<&str> {
    static DOMAIN_ID_RE: OnceLock<Regex> = OnceLock::new();

    DOMAIN_ID_RE
        .get_or_init(|| Regex::new(r"\[(.*?)\]").unwrap())
        .find(line)
        .map(|m| m.as_str())
}

fn mentions_any(line: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| line.contains(p.as_str()))
}

fn is_indent(c: char) -> bool {
    c == ' ' || c == '|'
}

/// Removes up to `width` leading indentation characters, then blanks the
/// first vertical connector left in the indentation since the siblings it
/// joined have been filtered out.
fn reindent(line: &str, width: usize) -> String {
    let indent = line.chars().take_while(|c| is_indent(*c)).count();
    let strip = indent.min(width);

    if strip < width {
        log::debug!("line indented {} short of {}: {:?}", width - strip, width, line);
    }

    let mut out = String::with_capacity(line.len());
    let mut blanked = false;

    for (i, c) in line.chars().enumerate().skip(strip) {
        if c == '|' && i < indent && !blanked {
            out.push(' ');
            blanked = true;
        } else {
            out.push(c);
        }
    }

    out
}

pub fn render_tree<S: AsRef<str>>(dump: &[S], profile: &Profile) -> Vec<TreeLine> {
    let tree = &profile.tree;

    let lines = dump
        .iter()
        .map(|line| line.as_ref())
        .filter(|line| !mentions_any(line, &tree.exclude))
        .collect::<Vec<&str>>();

    let markers = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| mentions_any(line, &tree.domain_markers))
        .map(|(i, _)| i);

    let mut out = Vec::new();
    let mut width = 0;

    for chunk in context_chunks(lines.len(), markers, DOMAIN_CONTEXT) {
        for line in &lines[chunk] {
            if mentions_any(line, &tree.domain_markers) {
                match domain_id(line) {
                    Some(id) => {
                        // Assumes every depth of the domain is drawn with the
                        // same connector width; other lspci layouts misalign.
                        width = id.chars().count();
                        out.push(TreeLine {
                            kind: TreeLineKind::Domain,
                            text: format!("{:indent$}{}", "", id, indent = tree.domain_indent),
                        });
                    }
                    None => log::warn!("domain marker without an id: {:?}", line),
                }
            }

            if !mentions_any(line, &tree.keywords) {
                continue;
            }

            let kind = if line.contains(profile.switch.vendor.as_str()) {
                TreeLineKind::Switch
            } else {
                TreeLineKind::Endpoint
            };

            out.push(TreeLine {
                kind,
                text: reindent(line, width),
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\
-+-[0000:00]-+-00.0  Intel Corporation Sky Lake-E DMI3 Registers
 |           \\-1f.0  Intel Corporation C621 Series Chipset LPC/eSPI Controller
 +-[0000:15]-+-00.0  Intel Corporation Ice Lake Memory Map/VT-d
 |           +-00.1  Intel Corporation Ice Lake Mesh 2 PCIe
 |           +-00.2  Intel Corporation Ice Lake RAS
 |           +-01.0-[16-1f]----00.0-[17-1f]--+-00.0-[18]----00.0  NVIDIA Corporation GH100 [H100 SXM5 80GB]
 |           |                               +-01.0-[19]----00.0  Broadcom / LSI PCIe Switch management endpoint
 |           |                               \\-02.0-[1a]----00.0  Samsung Electronics Co Ltd NVMe SSD Controller
 |           +-02.0  Intel Corporation Ice Lake Integrated Device
 |           +-03.0  Intel Corporation Ice Lake Integrated Device
 |           +-04.0  Intel Corporation Ice Lake Integrated Device
 |           \\-05.0-[20]----00.0  NVIDIA Corporation GH100 [H100 SXM5 80GB]
 \\-[0000:97]-+-00.0  Intel Corporation Ice Lake Memory Map/VT-d
             \\-01.0-[98-a0]----00.0-[99]----00.0  Mellanox Technologies MT2910 Family [ConnectX-7]
";

    fn render(text: &str) -> Vec<TreeLine> {
        render_tree(&text.lines().collect::<Vec<_>>(), &Profile::default())
    }

    #[test]
    fn domains_and_keywords_in_order() {
        let out = render(DUMP);

        let kinds = out.iter().map(|l| l.kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            [
                TreeLineKind::Domain,
                TreeLineKind::Endpoint,
                TreeLineKind::Switch,
                TreeLineKind::Domain,
                TreeLineKind::Endpoint,
            ]
        );

        assert_eq!(out[0].text, "   [0000:15]");
        assert_eq!(out[3].text, "   [0000:97]");
    }

    #[test]
    fn children_hang_under_domain_id() {
        let out = render(DUMP);

        assert_eq!(
            out[1].text,
            "    +-01.0-[16-1f]----00.0-[17-1f]--+-00.0-[18]----00.0  NVIDIA Corporation GH100 [H100 SXM5 80GB]"
        );
        assert_eq!(
            out[2].text,
            "    |                               +-01.0-[19]----00.0  Broadcom / LSI PCIe Switch management endpoint"
                .replacen('|', " ", 1)
        );
        assert_eq!(
            out[4].text,
            "    \\-01.0-[98-a0]----00.0-[99]----00.0  Mellanox Technologies MT2910 Family [ConnectX-7]"
        );
    }

    #[test]
    fn lines_past_domain_context_are_dropped() {
        let out = render(DUMP);

        // 05.0 sits seven lines below its marker once excluded lines are gone.
        assert!(!out.iter().any(|l| l.text.contains("05.0-[20]")));
    }

    #[test]
    fn domain_id_on_its_own_line() {
        let out = render(
            " +-[domain:0000]-+-00.0  Intel Corporation Ice Lake Memory Map/VT-d\n \
             |               \\-01.0  NVIDIA Corporation NVSwitch\n",
        );

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind, TreeLineKind::Domain);
        assert_eq!(out[0].text, "   [domain:0000]");
        assert_eq!(out[1].text, "    \\-01.0  NVIDIA Corporation NVSwitch");
    }

    #[test]
    fn no_marker_no_output() {
        assert!(render("-+-[0000:00]-+-00.0  NVIDIA Corporation NVSwitch\n").is_empty());
    }

    #[test]
    fn short_indent_is_never_cut_into_content() {
        assert_eq!(reindent(" +-00.0  NVSwitch", 9), "+-00.0  NVSwitch");
        assert_eq!(reindent("  |  | +-00.0", 3), "    +-00.0");
    }
}
