#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use reactree_core::Store;
use reactree_tree::{CyclePolicy, Keyed, NodeKey, Tree, TreeConfig};

#[derive(Debug, Clone, PartialEq)]
struct Node(u8);

impl Keyed for Node {
    type Key = u8;
    fn key(&self) -> &u8 {
        &self.0
    }
}

#[derive(Arbitrary, Debug)]
enum TreeOp {
    Add { key: u8, parent: Option<u8>, at: Option<u8> },
    Move { key: u8, parent: Option<u8>, at: Option<u8> },
    Remove(u8),
    RemoveDescendants(Option<u8>),
    Up(u8),
    Down(u8),
    To(u8, i8),
}

#[derive(Arbitrary, Debug)]
struct Input {
    allow_cycles: bool,
    ops: Vec<TreeOp>,
}

fn target(parent: Option<u8>) -> NodeKey<u8> {
    parent.map_or(NodeKey::Root, NodeKey::Node)
}

fuzz_target!(|input: Input| {
    let policy = if input.allow_cycles {
        CyclePolicy::Allow
    } else {
        CyclePolicy::Reject
    };
    let store = Store::new();
    let mut tree: Tree<Node> =
        Tree::with_config(&store, TreeConfig::default().with_cycle_policy(policy));

    for op in input.ops.into_iter().take(256) {
        match op {
            TreeOp::Add { key, parent, at } => {
                let _ = tree.add_node(Node(key), &target(parent), at.map(usize::from));
            }
            TreeOp::Move { key, parent, at } => {
                tree.move_node(&key, &target(parent), at.map(usize::from));
            }
            TreeOp::Remove(key) => {
                tree.remove_node(&NodeKey::Node(key));
            }
            TreeOp::RemoveDescendants(key) => {
                tree.remove_descendants(&target(key));
            }
            TreeOp::Up(key) => {
                tree.reorder_up(&key);
            }
            TreeOp::Down(key) => {
                tree.reorder_down(&key);
            }
            TreeOp::To(key, to) => {
                tree.reorder_to(&key, isize::from(to));
            }
        }

        // Walks must terminate and stay within the index, cycles or not.
        for key in 0..=u8::MAX {
            if let Some(chain) = tree.ancestors(&key) {
                assert!(chain.len() <= tree.size());
            }
        }
        let reachable = tree.descendant_ids(&NodeKey::Root).unwrap_or_default();
        assert!(reachable.len() <= tree.size());
        if !input.allow_cycles {
            assert_eq!(reachable.len(), tree.size());
        }
    }
});
