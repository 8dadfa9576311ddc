//! Reference resolution over a complete object store
//!
//! Resolution runs once, after every file is ingested, because references
//! point forward as often as backward. For each object (insertion order) the
//! [`schema::ReferenceSchema`] names the reference-bearing property paths
//! (schema order); every item found there (list order) is looked up in the
//! store:
//!
//! - found: a [`ReferenceEdge`] is emitted
//! - not found: counted as unresolved in [`Stats`], never fatal
//!
//! ## Graph Structure
//!
//! Edges are kept as a flat list plus an adjacency list over store indices:
//!
//! ```text
//! adjacency[index_of("/Common/vs")] = [index_of("/Common/pool"), index_of("/Common/http")]
//! ```
//!
//! The graph is derived data and is rebuilt from scratch on every run.

pub mod schema;

use serde::{Deserialize, Serialize};

use crate::domain::{Properties, Value};
use crate::parser::path::{embedded_paths, is_object_path, member_target};
use crate::stats::Stats;
use crate::store::ObjectStore;

use schema::{ReferenceMode, ReferenceRule, ReferenceSchema};

/// A resolved reference between two stored objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub from: String,
    pub to: String,
    /// Schema path that held the reference, e.g. `members.*.monitor`
    pub via_property: String,
}

/// Directed reference graph over a store
#[derive(Debug, Clone, Default)]
pub struct ReferenceGraph {
    edges: Vec<ReferenceEdge>,
    adjacency: Vec<Vec<usize>>,
}

impl ReferenceGraph {
    /// All edges in emission order
    pub fn edges(&self) -> &[ReferenceEdge] {
        &self.edges
    }

    /// Store indices referenced by the object at `index`, in edge order
    pub fn outgoing(&self, index: usize) -> Option<&[usize]> {
        self.adjacency.get(index).map(Vec::as_slice)
    }

    /// Number of nodes (store size at resolution time)
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }
}

/// Builds the [`ReferenceGraph`] of a store
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    schema: ReferenceSchema,
}

impl Resolver {
    pub fn new(schema: ReferenceSchema) -> Self {
        Self { schema }
    }

    /// Resolve every reference in `store`, recording misses in `stats`
    pub fn resolve(&self, store: &ObjectStore, stats: &mut Stats) -> ReferenceGraph {
        let mut graph = ReferenceGraph {
            edges: Vec::new(),
            adjacency: vec![Vec::new(); store.len()],
        };

        for (from_index, object) in store.all().enumerate() {
            let mut seen: Vec<(usize, &str)> = Vec::new();
            for rule in self.schema.rules_for(&object.type_tag) {
                for target in targets(&object.properties, rule) {
                    if target == object.full_path {
                        continue;
                    }
                    match store.index_of(target) {
                        Some(to_index) => {
                            if seen.contains(&(to_index, rule.path.as_str())) {
                                continue;
                            }
                            seen.push((to_index, rule.path.as_str()));
                            tracing::trace!(from = %object.full_path, to = target, via = %rule.path, "edge");
                            graph.adjacency[from_index].push(to_index);
                            graph.edges.push(ReferenceEdge {
                                from: object.full_path.clone(),
                                to: target.to_string(),
                                via_property: rule.path.clone(),
                            });
                        }
                        None if rule.mode != ReferenceMode::Embedded => {
                            tracing::debug!(from = %object.full_path, to = target, "unresolved reference");
                            stats.record_unresolved(target);
                        }
                        None => {}
                    }
                }
            }
        }

        stats.edges = graph.edges.len();
        tracing::info!(
            edges = graph.edges.len(),
            unresolved = stats.unresolved_references,
            "references resolved"
        );
        graph
    }
}

/// Candidate target paths named by one rule on one object, in order
fn targets<'a>(properties: &'a Properties, rule: &ReferenceRule) -> Vec<&'a str> {
    let segments: Vec<&str> = rule.segments().collect();
    let mut values = Vec::new();
    values_at(properties, &segments, &mut values);

    let mut out = Vec::new();
    for value in values {
        match rule.mode {
            ReferenceMode::Object => out.extend(
                value
                    .named_items()
                    .into_iter()
                    .filter(|item| is_object_path(item)),
            ),
            ReferenceMode::Member => out.extend(
                value
                    .named_items()
                    .into_iter()
                    .filter(|item| is_object_path(item))
                    .map(member_target),
            ),
            ReferenceMode::Embedded => {
                for text in value.named_items() {
                    out.extend(embedded_paths(text));
                }
            }
        }
    }
    out
}

/// Collect the values at a dotted path; `*` walks every value of a block
fn values_at<'a>(properties: &'a Properties, segments: &[&str], out: &mut Vec<&'a Value>) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    let matched: Vec<&Value> = if *head == "*" {
        properties.values().collect()
    } else {
        properties.get(*head).into_iter().collect()
    };
    for value in matched {
        if rest.is_empty() {
            out.push(value);
        } else if let Value::Block(inner) = value {
            values_at(inner, rest, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserSettings;
    use crate::domain::ConfigFile;
    use crate::parser::Parser;

    fn store_from(text: &str) -> ObjectStore {
        let settings = ParserSettings::default();
        let file = ConfigFile::tmsh("bigip.conf", text);
        let mut store = ObjectStore::new();
        for outcome in Parser::new(&settings).parse(&file) {
            store.insert(outcome.expect("fixture parses"));
        }
        store
    }

    fn edge_pairs(graph: &ReferenceGraph) -> Vec<(&str, &str, &str)> {
        graph
            .edges()
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str(), e.via_property.as_str()))
            .collect()
    }

    const APP: &str = "\
ltm monitor http /Common/mon {
    defaults-from /Common/http
}
ltm node /Common/n1 {
    address 10.0.0.1
}
ltm node /Common/n2 {
    address 10.0.0.2
}
ltm pool /Common/p1 {
    members {
        /Common/n1:80 {
            address 10.0.0.1
        }
        /Common/n2:80 {
            address 10.0.0.2
            monitor /Common/mon
        }
    }
    monitor /Common/mon
}
ltm virtual /Common/vs {
    pool /Common/p1
    profiles {
        /Common/tcp { }
    }
}
";

    #[test]
    fn test_edges_follow_store_then_schema_then_item_order() {
        let store = store_from(APP);
        let mut stats = Stats::default();
        let graph = Resolver::default().resolve(&store, &mut stats);

        assert_eq!(
            edge_pairs(&graph),
            vec![
                ("/Common/p1", "/Common/n1", "members"),
                ("/Common/p1", "/Common/n2", "members"),
                ("/Common/p1", "/Common/mon", "monitor"),
                ("/Common/p1", "/Common/mon", "members.*.monitor"),
                ("/Common/vs", "/Common/p1", "pool"),
            ]
        );
        assert_eq!(stats.edges, 5);
        // /Common/http (monitor parent) and /Common/tcp (profile) are built-ins
        assert_eq!(stats.unresolved_references, 2);
        assert!(stats.unresolved_targets.contains("/Common/tcp"));

        let vs = store.index_of("/Common/vs").unwrap();
        let p1 = store.index_of("/Common/p1").unwrap();
        assert_eq!(graph.outgoing(vs), Some(&[p1][..]));
        assert_eq!(graph.node_count(), store.len());
    }

    #[test]
    fn test_one_line_snat_block_links_snatpool() {
        let store = store_from(
            "ltm snatpool /Common/snat {\n    members { /Common/10.1.1.1 }\n}\nltm virtual /Common/vs {\n    source-address-translation { pool /Common/snat type snat }\n}\n",
        );
        let mut stats = Stats::default();
        let graph = Resolver::default().resolve(&store, &mut stats);
        assert!(edge_pairs(&graph).contains(&(
            "/Common/vs",
            "/Common/snat",
            "source-address-translation.pool"
        )));
    }

    #[test]
    fn test_missing_pool_counts_as_unresolved() {
        let store = store_from("ltm virtual /Common/vs {\n    pool /Common/missing\n}\n");
        let mut stats = Stats::default();
        let graph = Resolver::default().resolve(&store, &mut stats);
        assert!(graph.edges().is_empty());
        assert_eq!(stats.unresolved_references, 1);
    }

    #[test]
    fn test_non_path_values_are_ignored() {
        let store = store_from("ltm virtual /Common/vs {\n    pool none\n    vlans { }\n}\n");
        let mut stats = Stats::default();
        Resolver::default().resolve(&store, &mut stats);
        assert_eq!(stats.unresolved_references, 0);
    }

    #[test]
    fn test_embedded_references_only_link_hits() {
        let store = store_from(
            "ltm pool /Common/api_pool { }\nltm rule /Common/r1 {\nwhen HTTP_REQUEST {\n    if { [HTTP::uri] starts_with \"/api\" } { pool /Common/api_pool }\n}\n}\n",
        );
        let mut stats = Stats::default();
        let graph = Resolver::default().resolve(&store, &mut stats);
        assert_eq!(
            edge_pairs(&graph),
            vec![("/Common/r1", "/Common/api_pool", "definition")]
        );
        assert_eq!(stats.unresolved_references, 0);
    }

    #[test]
    fn test_gtm_member_names_server() {
        let store = store_from(
            "gtm server /Common/dc1_ltm {\n    product bigip\n}\ngtm pool a /Common/gp {\n    members {\n        /Common/dc1_ltm:/Common/vs1 {\n            member-order 0\n        }\n    }\n}\n",
        );
        let mut stats = Stats::default();
        let graph = Resolver::default().resolve(&store, &mut stats);
        assert_eq!(
            edge_pairs(&graph),
            vec![("/Common/gp", "/Common/dc1_ltm", "members")]
        );
    }

    #[test]
    fn test_values_at_walks_wildcards() {
        let store = store_from(
            "ltm policy /Common/pol {\n    rules {\n        r1 {\n            actions {\n                0 {\n                    forward\n                    select\n                    pool /Common/p9\n                }\n            }\n        }\n    }\n}\n",
        );
        let policy = store.get("/Common/pol").unwrap();
        let rule = ReferenceRule::new("rules.*.actions.*.pool", ReferenceMode::Object);
        assert_eq!(targets(&policy.properties, &rule), vec!["/Common/p9"]);
    }
}
