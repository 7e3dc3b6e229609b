//! Text and JSON rendering of plan trees.

use riptide_error::{Result, RiptideError};
use serde::Serialize;

use super::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// A plan tree whose nodes can produce explain entries.
pub trait ExplainableTree: Explainable {
    fn explain_children(&self) -> Vec<&Self>;
}

/// Render a plan tree with two-space indentation per level.
pub fn format_tree<T: ExplainableTree>(root: &T, conf: ExplainConfig) -> String {
    let mut out = String::new();
    format_node(root, conf, 0, &mut out);
    out
}

fn format_node<T: ExplainableTree>(node: &T, conf: ExplainConfig, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(&node.explain_entry(conf).to_string());
    out.push('\n');
    for child in node.explain_children() {
        format_node(child, conf, depth + 1, out);
    }
}

#[derive(Debug, Serialize)]
struct JsonNode {
    #[serde(flatten)]
    entry: ExplainEntry,
    children: Vec<JsonNode>,
}

fn build_json_node<T: ExplainableTree>(node: &T, conf: ExplainConfig) -> JsonNode {
    JsonNode {
        entry: node.explain_entry(conf),
        children: node
            .explain_children()
            .into_iter()
            .map(|child| build_json_node(child, conf))
            .collect(),
    }
}

/// Render a plan tree as pretty-printed JSON.
pub fn format_tree_json<T: ExplainableTree>(root: &T, conf: ExplainConfig) -> Result<String> {
    serde_json::to_string_pretty(&build_json_node(root, conf))
        .map_err(|e| RiptideError::internal(format!("failed to serialize plan tree: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestNode {
        name: &'static str,
        children: Vec<TestNode>,
    }

    impl Explainable for TestNode {
        fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
            ExplainEntry::new(self.name)
        }
    }

    impl ExplainableTree for TestNode {
        fn explain_children(&self) -> Vec<&Self> {
            self.children.iter().collect()
        }
    }

    fn tree() -> TestNode {
        TestNode {
            name: "Root",
            children: vec![
                TestNode {
                    name: "Left",
                    children: vec![TestNode {
                        name: "Leaf",
                        children: Vec::new(),
                    }],
                },
                TestNode {
                    name: "Right",
                    children: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn text_tree_indents_by_depth() {
        let out = format_tree(&tree(), ExplainConfig::default());
        assert_eq!("Root\n  Left\n    Leaf\n  Right\n", out);
    }

    #[test]
    fn json_tree_nests_children() {
        let out = format_tree_json(&tree(), ExplainConfig::default()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!("Root", parsed["name"]);
        assert_eq!("Leaf", parsed["children"][0]["children"][0]["name"]);
    }
}
