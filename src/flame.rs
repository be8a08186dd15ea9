//! Flame-graph aggregation of stack samples

use crate::sample::StackSample;
use serde::Serialize;

/// A node of the aggregated call tree.
///
/// `total` counts samples whose call path passes through the node, `self`
/// counts samples whose innermost frame landed on it, so sample counts stand
/// in for time spent. Serializes to the nested `{name, self, total, children}`
/// shape flame-graph renderers consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlameNode {
    /// Frame identifier: `Class::function` or the bare function name
    pub name: String,
    /// Samples whose innermost frame landed on this node
    #[serde(rename = "self")]
    pub self_count: u64,
    /// Samples whose call path passes through this node
    #[serde(rename = "total")]
    pub total_count: u64,
    /// Callees, ordered by first appearance
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FlameNode>,
}

impl FlameNode {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            self_count: 0,
            total_count: 0,
            children: Vec::new(),
        }
    }

    /// Aggregate retained samples into a call tree under a synthetic root
    pub fn from_samples(samples: &[StackSample]) -> FlameNode {
        let mut root = FlameNode::new("root");
        for sample in samples {
            root.insert(sample);
        }
        root
    }

    /// Add one sample's call path to the tree
    fn insert(&mut self, sample: &StackSample) {
        self.total_count += 1;
        let mut node = self;
        // Frames are stored leaf first; walk the call path top down.
        for frame in sample.frames.iter().rev() {
            node = node.child_mut(&frame.identifier());
            node.total_count += 1;
        }
        node.self_count += 1;
    }

    /// Find or append the child with the given name.
    /// Sibling fan-out is small in practice, so a linear scan suffices.
    fn child_mut(&mut self, name: &str) -> &mut FlameNode {
        if let Some(pos) = self.children.iter().position(|c| c.name == name) {
            &mut self.children[pos]
        } else {
            self.children.push(FlameNode::new(name));
            // Just pushed, cannot be empty.
            self.children.last_mut().unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::StackFrame;

    fn sample(frames: Vec<StackFrame>) -> StackSample {
        StackSample::new(0.0, frames)
    }

    #[test]
    fn test_aggregates_a_shared_prefix() {
        let samples = vec![
            sample(vec![StackFrame::func("parse"), StackFrame::func("main")]),
            sample(vec![StackFrame::func("parse"), StackFrame::func("main")]),
            sample(vec![StackFrame::func("emit"), StackFrame::func("main")]),
        ];
        let root = FlameNode::from_samples(&samples);

        assert_eq!(root.total_count, 3);
        assert_eq!(root.self_count, 0);
        assert_eq!(root.children.len(), 1);

        let main = &root.children[0];
        assert_eq!(main.name, "main");
        assert_eq!(main.total_count, 3);
        assert_eq!(main.self_count, 0);
        assert_eq!(main.children.len(), 2);

        let parse = &main.children[0];
        assert_eq!(parse.name, "parse");
        assert_eq!(parse.total_count, 2);
        assert_eq!(parse.self_count, 2);
        let emit = &main.children[1];
        assert_eq!(emit.name, "emit");
        assert_eq!(emit.total_count, 1);
        assert_eq!(emit.self_count, 1);
    }

    #[test]
    fn test_self_time_lands_on_interior_nodes() {
        let samples = vec![
            sample(vec![StackFrame::func("inner"), StackFrame::func("outer")]),
            sample(vec![StackFrame::func("outer")]),
        ];
        let root = FlameNode::from_samples(&samples);
        let outer = &root.children[0];
        assert_eq!(outer.total_count, 2);
        assert_eq!(outer.self_count, 1);
        assert_eq!(outer.children[0].self_count, 1);
    }

    #[test]
    fn test_method_frames_aggregate_by_class_and_function() {
        let samples = vec![
            sample(vec![StackFrame::method("TaskA", "execute")]),
            sample(vec![StackFrame::method("TaskB", "execute")]),
        ];
        let root = FlameNode::from_samples(&samples);
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].name, "TaskA::execute");
        assert_eq!(root.children[1].name, "TaskB::execute");
    }

    #[test]
    fn test_empty_stack_counts_against_the_root() {
        let samples = vec![sample(vec![])];
        let root = FlameNode::from_samples(&samples);
        assert_eq!(root.total_count, 1);
        assert_eq!(root.self_count, 1);
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_serializes_to_renderer_field_names() {
        let samples = vec![sample(vec![StackFrame::func("main")])];
        let root = FlameNode::from_samples(&samples);
        let json = serde_json::to_value(&root).unwrap();

        assert_eq!(json["name"], "root");
        assert_eq!(json["self"], 0);
        assert_eq!(json["total"], 1);
        assert_eq!(json["children"][0]["name"], "main");
        assert_eq!(json["children"][0]["self"], 1);
        // Leaf nodes omit the empty children array.
        assert!(json["children"][0].get("children").is_none());
    }
}
