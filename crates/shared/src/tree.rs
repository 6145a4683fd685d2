use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A fully resolved, renderable UI node.
///
/// `Module` placeholders have already been resolved against the client
/// module base URL by the decoder; the presentation layer only ever sees
/// absolute module URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RenderNode {
    Text {
        value: String,
    },
    Element {
        tag: String,
        #[serde(default)]
        props: BTreeMap<String, Value>,
        #[serde(default)]
        children: Vec<RenderNode>,
    },
    Module {
        url: String,
        export: String,
        #[serde(default)]
        props: BTreeMap<String, Value>,
    },
}

/// One decoded UI description, ready to paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderTree {
    pub root: RenderNode,
}

impl RenderTree {
    pub fn new(root: RenderNode) -> Self {
        Self { root }
    }

    /// Total node count, including the root.
    pub fn node_count(&self) -> usize {
        fn count(node: &RenderNode) -> usize {
            match node {
                RenderNode::Text { .. } | RenderNode::Module { .. } => 1,
                RenderNode::Element { children, .. } => {
                    1 + children.iter().map(count).sum::<usize>()
                }
            }
        }
        count(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_nested_nodes() {
        let tree = RenderTree::new(RenderNode::Element {
            tag: "section".into(),
            props: BTreeMap::new(),
            children: vec![
                RenderNode::Text {
                    value: "hello".into(),
                },
                RenderNode::Module {
                    url: "https://assets.example/widgets/chart.js".into(),
                    export: "default".into(),
                    props: BTreeMap::new(),
                },
            ],
        });
        assert_eq!(tree.node_count(), 3);
    }
}
