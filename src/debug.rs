extern crate std;

use core::{fmt, ptr::NonNull};
use std::{collections::VecDeque, format, prelude::v1::*};

use crate::{AvlTree, Links, TreeNode};

/// A textual rendering of an [`AvlTree`]'s structure, created by [`AvlTree::dump`].
///
/// Each element is printed as `(key, bf: balance)` on its own line, below and indented from its
/// parent. `|--` marks a left child and `\--` the root or a right child:
///
/// ```text
/// \-- (20, bf: 0)
///     |-- (10, bf: 0)
///     \-- (30, bf: 0)
/// ```
///
/// An empty tree renders as nothing.
pub struct Dump<'tree, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    tree: &'tree AvlTree<T>,
}

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a [`Display`](fmt::Display)able dump of the tree structure and balance factors.
    pub fn dump(&self) -> Dump<'_, T> {
        Dump { tree: self }
    }

    /// Writes the tree as a Graphviz `digraph` named `name`.
    ///
    /// Nodes are labelled `key:balance`; missing children are drawn as points so that left and
    /// right remain distinguishable.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
    {
        let root = match self.root {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<T: ?Sized> {
            Node(NonNull<T>, usize),
            Missing(usize),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root, 0));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut next_id = 1;
        let mut missing = 0;
        let mut links = String::new();

        loop {
            use fmt::Write;
            let remaining = queue.len();
            if remaining == 0 {
                break;
            }

            write!(w, "{{rank=same; ")?;

            for _ in 0..remaining {
                let Some(item) = queue.pop_front() else {
                    break;
                };

                let (node, id) = match item {
                    Item::Node(node, id) => (node, id),
                    Item::Missing(id) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let label = unsafe { format!("{:?}:{}", node.as_ref().key(), Self::balance(node)) };
                let label = label.replace('\\', "\\\\").replace('"', "\\\"");
                write!(w, "\"graph{name}-{id}\" [label=\"{label}\"]; ")?;

                let node_links = unsafe { Self::links(node) };
                for child in [node_links.left(), node_links.right()] {
                    match child {
                        Some(child) => {
                            queue.push_back(Item::Node(child, next_id));
                            writeln!(links, "\"graph{name}-{id}\" -> \"graph{name}-{next_id}\";")?;
                            next_id += 1;
                        }
                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(
                                links,
                                "\"graph{name}-{id}\" -> \"graph{name}-missing{missing}\";"
                            )?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}

impl<T> fmt::Display for Dump<'_, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(root) = self.tree.root else {
            return Ok(());
        };

        // (node, prefix, is_left)
        let mut stack = vec![(root, String::new(), false)];

        while let Some((node, prefix, is_left)) = stack.pop() {
            let (branch, indent) = if is_left {
                ("|-- ", "|   ")
            } else {
                ("\\-- ", "    ")
            };

            unsafe {
                writeln!(
                    f,
                    "{prefix}{branch}({:?}, bf: {})",
                    node.as_ref().key(),
                    AvlTree::balance(node)
                )?;

                let links = AvlTree::links(node);
                let child_prefix = format!("{prefix}{indent}");

                // Right first, so the left subtree is printed first.
                if let Some(right) = links.right() {
                    stack.push((right, child_prefix.clone(), false));
                }
                if let Some(left) = links.left() {
                    stack.push((left, child_prefix, true));
                }
            }
        }

        Ok(())
    }
}

impl<T> fmt::Debug for Dump<'_, T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
