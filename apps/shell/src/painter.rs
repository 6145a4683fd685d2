//! Paints decoded trees as an indented outline on stdout.

use async_trait::async_trait;
use nav_core::TreePainter;
use shared::{
    error::ContentError,
    location::Location,
    tree::{RenderNode, RenderTree},
};

pub struct TerminalPainter;

impl TerminalPainter {
    fn print_node(node: &RenderNode, depth: usize) {
        let indent = "  ".repeat(depth);
        match node {
            RenderNode::Text { value } => println!("{indent}\"{value}\""),
            RenderNode::Element {
                tag,
                props,
                children,
            } => {
                if props.is_empty() {
                    println!("{indent}<{tag}>");
                } else {
                    let rendered: Vec<String> = props
                        .iter()
                        .map(|(key, value)| format!("{key}={value}"))
                        .collect();
                    println!("{indent}<{tag} {}>", rendered.join(" "));
                }
                for child in children {
                    Self::print_node(child, depth + 1);
                }
            }
            RenderNode::Module { url, export, .. } => {
                println!("{indent}[module {url}#{export}]");
            }
        }
    }
}

#[async_trait]
impl TreePainter for TerminalPainter {
    async fn paint(&self, location: &Location, tree: &RenderTree) {
        println!("--- {location} ({} nodes)", tree.node_count());
        Self::print_node(&tree.root, 0);
    }

    async fn paint_fallback(&self, location: &Location, error: &ContentError) {
        println!("--- {location}");
        println!("!! failed to load this view: {error}");
    }
}
