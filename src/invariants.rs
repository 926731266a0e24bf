use core::ptr::NonNull;

use crate::{AvlTree, Links, TreeNode};

/// A broken structural invariant, found by [`AvlTree::check_invariants`].
///
/// Keys are captured with their `Debug` representation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("the root {key} has a parent link")]
    RootHasParent { key: String },

    #[error("{child} is linked below {parent}, but its parent link does not point back")]
    ParentMismatch { parent: String, child: String },

    #[error("{key} is out of order with respect to its ancestors")]
    Unordered { key: String },

    #[error("{key} stores balance factor {stored}, but its subtrees differ in height by {actual}")]
    BalanceMismatch { key: String, stored: i8, actual: isize },

    #[error("{key} has balance factor {balance}, outside of [-1, 1]")]
    Unbalanced { key: String, balance: i8 },

    #[error("the tree records {recorded} elements, but {reachable} are reachable from the root")]
    LenMismatch { recorded: usize, reachable: usize },
}

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Checks every structural invariant of the tree, returning its height.
    ///
    /// The height is computed independently of the stored balance factors, by walking every node.
    /// This takes _O(n)_ time and is meant for tests and debugging.
    pub fn check_invariants(&self) -> Result<usize, InvariantViolation> {
        let Some(root) = self.root else {
            return match self.len {
                0 => Ok(0),
                recorded => Err(InvariantViolation::LenMismatch {
                    recorded,
                    reachable: 0,
                }),
            };
        };

        unsafe {
            if Self::links(root).parent().is_some() {
                return Err(InvariantViolation::RootHasParent {
                    key: Self::describe(root),
                });
            }
        }

        // Post-order walk with an explicit stack. Each entry carries the exclusive key bounds
        // inherited from its ancestors.
        enum Visit<T: ?Sized> {
            Enter {
                node: NonNull<T>,
                lower: Option<NonNull<T>>,
                upper: Option<NonNull<T>>,
            },
            Exit(NonNull<T>),
        }

        let mut heights: Vec<usize> = Vec::new();
        let mut reachable = 0;
        let mut stack = vec![Visit::Enter {
            node: root,
            lower: None,
            upper: None,
        }];

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter { node, lower, upper } => unsafe {
                    let key = node.as_ref().key();
                    let above_lower = lower.map_or(true, |l| l.as_ref().key() < key);
                    let below_upper = upper.map_or(true, |u| key < u.as_ref().key());
                    if !above_lower || !below_upper {
                        return Err(InvariantViolation::Unordered {
                            key: Self::describe(node),
                        });
                    }

                    reachable += 1;
                    if reachable > self.len {
                        // Either `len` is stale or the links contain a cycle.
                        return Err(InvariantViolation::LenMismatch {
                            recorded: self.len,
                            reachable,
                        });
                    }

                    stack.push(Visit::Exit(node));

                    // The left subtree is pushed last and so walked first, leaving the right
                    // subtree's height on top of `heights` when `node` exits.
                    let links = Self::links(node);
                    for (child, lower, upper) in [
                        (links.right(), Some(node), upper),
                        (links.left(), lower, Some(node)),
                    ] {
                        let Some(child) = child else { continue };

                        if Self::links(child).parent() != Some(node) {
                            return Err(InvariantViolation::ParentMismatch {
                                parent: Self::describe(node),
                                child: Self::describe(child),
                            });
                        }

                        stack.push(Visit::Enter {
                            node: child,
                            lower,
                            upper,
                        });
                    }
                },

                Visit::Exit(node) => unsafe {
                    let links = Self::links(node);
                    let right_height = if links.has_right() { pop(&mut heights) } else { 0 };
                    let left_height = if links.has_left() { pop(&mut heights) } else { 0 };

                    let actual = right_height as isize - left_height as isize;
                    let stored = links.balance();
                    if actual != stored as isize {
                        return Err(InvariantViolation::BalanceMismatch {
                            key: Self::describe(node),
                            stored,
                            actual,
                        });
                    }

                    if !(-1..=1).contains(&stored) {
                        return Err(InvariantViolation::Unbalanced {
                            key: Self::describe(node),
                            balance: stored,
                        });
                    }

                    heights.push(1 + left_height.max(right_height));
                },
            }
        }

        if reachable != self.len {
            return Err(InvariantViolation::LenMismatch {
                recorded: self.len,
                reachable,
            });
        }

        Ok(pop(&mut heights))
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        if let Err(violation) = self.check_invariants() {
            panic!("AVL invariant violated: {violation}");
        }
    }

    unsafe fn describe(node: NonNull<T>) -> String {
        unsafe { format!("{:?}", node.as_ref().key()) }
    }
}

fn pop(heights: &mut Vec<usize>) -> usize {
    heights
        .pop()
        .expect("every visited child leaves its height behind")
}
