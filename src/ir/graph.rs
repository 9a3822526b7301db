//! Model Reference Graph
//!
//! Models are nodes, named references between them are edges. Strongly
//! connected components tell the validator backend which models are
//! recursive (and need lazy references) and give a dependencies-first
//! declaration order for emitted validator constants.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use super::ParsedModel;

/// Recursion and ordering facts from the model reference graph
#[derive(Debug, Clone)]
pub struct ModelGraph {
    /// Models in a cycle (multi-member SCC or self-reference)
    recursive: BTreeSet<String>,
    /// Dependencies before dependents; cycle members in document order
    order: Vec<String>,
}

impl ModelGraph {
    pub fn build(models: &[ParsedModel]) -> Self {
        let mut graph = DiGraph::new();
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();
        let mut position: HashMap<NodeIndex, usize> = HashMap::new();

        for (i, model) in models.iter().enumerate() {
            let node = graph.add_node(model.name.clone());
            index.insert(model.name.as_str(), node);
            position.insert(node, i);
        }

        for model in models {
            let from = index[model.name.as_str()];
            for target in model.schema.referenced_names() {
                // references into other component sections are not models
                if let Some(&to) = index.get(target.as_str()) {
                    graph.update_edge(from, to, ());
                }
            }
        }

        let mut recursive = BTreeSet::new();
        let mut order = Vec::with_capacity(models.len());

        // tarjan_scc yields components in reverse topological order, which is
        // exactly "referenced models first"
        for mut scc in tarjan_scc(&graph) {
            let self_referential = scc.len() == 1
                && graph
                    .edges_directed(scc[0], Direction::Outgoing)
                    .any(|e| e.target() == scc[0]);

            scc.sort_by_key(|node| position[node]);
            for node in &scc {
                let name = graph[*node].clone();
                if scc.len() > 1 || self_referential {
                    recursive.insert(name.clone());
                }
                order.push(name);
            }
        }

        Self { recursive, order }
    }

    pub fn is_recursive(&self, name: &str) -> bool {
        self.recursive.contains(name)
    }

    pub fn recursive_models(&self) -> &BTreeSet<String> {
        &self.recursive
    }

    /// Model names with every referenced model before its referrers
    pub fn declaration_order(&self) -> &[String] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::build_spec;
    use serde_json::json;

    fn models() -> Vec<ParsedModel> {
        let doc = json!({
            "components": {
                "schemas": {
                    "Order": {
                        "type": "object",
                        "properties": {
                            "customer": { "$ref": "#/components/schemas/Customer" },
                            "lines": { "type": "array", "items": { "$ref": "#/components/schemas/OrderLine" } }
                        }
                    },
                    "OrderLine": {
                        "type": "object",
                        "properties": { "sku": { "type": "string" } }
                    },
                    "Customer": {
                        "type": "object",
                        "properties": { "name": { "type": "string" } }
                    },
                    "Category": {
                        "type": "object",
                        "properties": {
                            "children": { "type": "array", "items": { "$ref": "#/components/schemas/Category" } }
                        }
                    },
                    "Ping": {
                        "type": "object",
                        "properties": { "pong": { "$ref": "#/components/schemas/Pong" } }
                    },
                    "Pong": {
                        "type": "object",
                        "properties": { "ping": { "$ref": "#/components/schemas/Ping" } }
                    }
                }
            }
        });
        build_spec(&doc).models
    }

    #[test]
    fn test_recursive_models_detected() {
        let graph = ModelGraph::build(&models());
        assert!(graph.is_recursive("Category"));
        assert!(graph.is_recursive("Ping"));
        assert!(graph.is_recursive("Pong"));
        assert!(!graph.is_recursive("Order"));
        assert!(!graph.is_recursive("Customer"));
    }

    #[test]
    fn test_declaration_order_puts_dependencies_first() {
        let graph = ModelGraph::build(&models());
        let order = graph.declaration_order();
        let pos = |name: &str| order.iter().position(|n| n == name).unwrap();

        assert_eq!(order.len(), 6);
        assert!(pos("Customer") < pos("Order"));
        assert!(pos("OrderLine") < pos("Order"));
    }
}
