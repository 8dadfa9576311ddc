//! Reference schema: which properties of which object kinds name other objects
//!
//! The schema is a capability table, not code. Each row maps a type tag (or a
//! whole-word type family such as `ltm profile`) to an ordered list of
//! property paths. A path is split on `.`; a `*` segment stands for every
//! value of a block:
//!
//! ```text
//! ltm pool   members           member names   -> /Common/n1:80 -> node /Common/n1
//! ltm pool   members.*.monitor per-member monitor
//! ltm virtual profiles         every key of the profiles block
//! ```
//!
//! Rules configured in YAML are appended after the built-in ones.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How the values found at a rule's path are turned into target paths
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceMode {
    /// Every path-like item names an object
    #[default]
    Object,
    /// Pool member names: `/Common/n1:80` names node `/Common/n1`,
    /// `/Common/server1:/Common/vs1` names GTM server `/Common/server1`
    Member,
    /// Free text (script bodies) scanned for paths; only hits become edges
    Embedded,
}

/// One reference-bearing property path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRule {
    pub path: String,
    #[serde(default)]
    pub mode: ReferenceMode,
}

impl ReferenceRule {
    pub fn new(path: impl Into<String>, mode: ReferenceMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }

    /// Path segments (`members.*.monitor` -> `["members", "*", "monitor"]`)
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }
}

use self::ReferenceMode::{Embedded, Member, Object};

/// Built-in rules for stock BIG-IP object kinds
const BUILTIN: &[(&str, &[(&str, ReferenceMode)])] = &[
    (
        "ltm virtual",
        &[
            ("destination", Member),
            ("pool", Object),
            ("rules", Object),
            ("profiles", Object),
            ("persist", Object),
            ("fallback-persistence", Object),
            ("policies", Object),
            ("source-address-translation.pool", Object),
            ("vlans", Object),
            ("clone-pools", Object),
            ("security-log-profiles", Object),
            ("last-hop-pool", Object),
        ],
    ),
    (
        "ltm pool",
        &[
            ("members", Member),
            ("monitor", Object),
            ("members.*.monitor", Object),
        ],
    ),
    ("ltm node", &[("monitor", Object)]),
    ("ltm rule", &[("definition", Embedded)]),
    ("gtm rule", &[("definition", Embedded)]),
    (
        "ltm policy",
        &[
            ("rules.*.actions.*.pool", Object),
            ("rules.*.actions.*.virtual", Object),
        ],
    ),
    (
        "ltm profile",
        &[
            ("defaults-from", Object),
            ("cert-key-chain.*.cert", Object),
            ("cert-key-chain.*.key", Object),
            ("cert-key-chain.*.chain", Object),
            ("cert", Object),
            ("key", Object),
            ("chain", Object),
        ],
    ),
    ("ltm monitor", &[("defaults-from", Object)]),
    (
        "ltm persistence",
        &[("defaults-from", Object), ("rule", Object)],
    ),
    ("ltm snatpool", &[("members", Object)]),
    ("ltm snat", &[("snatpool", Object)]),
    ("gtm wideip", &[("pools", Object), ("rules", Object)]),
    ("gtm pool", &[("members", Member)]),
    ("net self", &[("vlan", Object)]),
];

/// Whether `type_tag` is `family` itself or a kind within it
pub fn in_family(type_tag: &str, family: &str) -> bool {
    type_tag == family
        || type_tag
            .strip_prefix(family)
            .is_some_and(|rest| rest.starts_with(' '))
}

/// Compiled schema: built-in rows followed by configured rows
#[derive(Debug, Clone)]
pub struct ReferenceSchema {
    rows: Vec<(String, Vec<ReferenceRule>)>,
}

impl Default for ReferenceSchema {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReferenceSchema {
    /// Schema with only the built-in rows
    pub fn builtin() -> Self {
        let rows = BUILTIN
            .iter()
            .map(|(family, rules)| {
                let rules = rules
                    .iter()
                    .map(|(path, mode)| ReferenceRule::new(*path, *mode))
                    .collect();
                ((*family).to_string(), rules)
            })
            .collect();
        Self { rows }
    }

    /// Built-in rows plus configured ones
    pub fn with_rules(extra: &IndexMap<String, Vec<ReferenceRule>>) -> Self {
        let mut schema = Self::builtin();
        for (family, rules) in extra {
            schema.rows.push((family.clone(), rules.clone()));
        }
        schema
    }

    /// Rules applying to `type_tag`, in schema order
    pub fn rules_for<'a>(&'a self, type_tag: &'a str) -> impl Iterator<Item = &'a ReferenceRule> {
        self.rows
            .iter()
            .filter(move |(family, _)| in_family(type_tag, family))
            .flat_map(|(_, rules)| rules.iter())
    }
}
