use core::{borrow::Borrow, ptr::NonNull};

use tracing::trace;

use crate::{AvlTree, Dir, Links, TreeNode};

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Removes the element corresponding to `key` from the tree and returns it.
    ///
    /// Returns `None`, leaving the tree unchanged, if no element corresponds to `key`.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<T::Handle>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.get_raw(key)?;
        Some(unsafe { self.remove_at(node) })
    }

    /// Removes an arbitrary node from the tree.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and not any
    /// other tree.
    pub unsafe fn remove_at(&mut self, node: NonNull<T>) -> T::Handle {
        // There are three possible cases:
        //
        // 1. `node` is a leaf.
        //
        //    It is detached from its parent, whose subtree on that side loses a level.
        //
        // 2. `node` has one child.
        //
        //    By the balance rule the child is a leaf and `node` is 1 or -1 toward it. The child is
        //    elevated into `node`'s place and inherits that balance factor, which is off by exactly
        //    the level the child just lost on its own side.
        //
        // 3. `node` has two children.
        //
        //    `node`'s successor[^1] assumes `node`'s place and balance factor. If the successor is
        //    `node`'s right child, the successor's right subtree is one level shorter than the
        //    subtree it replaces. Otherwise the successor's right child is elevated to replace it,
        //    and the successor's former parent loses a level on its left.
        //
        // In every case the result is a single (node, side) pair where the subtree on `side` of
        // `node` is one level shorter than `node`'s balance factor claims. Rebalancing starts
        // there.
        //
        // [^1]: The successor of a node `a` is the least node in `a`'s right subtree.

        unsafe {
            let parent = Self::links(node).parent();
            let left = Self::links(node).left();
            let right = Self::links(node).right();
            let balance = Self::balance(node);

            let shrunk: Option<(NonNull<T>, Dir)> = match (left, right) {
                (Some(left), Some(right)) => {
                    let successor = Self::find_inorder_successor(node)
                        .expect("a node with two children has a successor");

                    let shrunk = if successor == right {
                        (successor, Dir::Right)
                    } else {
                        let successor_parent = Self::links(successor)
                            .parent()
                            .expect("a relocated successor has a parent");
                        let successor_right = Self::links(successor).right();

                        // Elevate the successor's right child to replace it.
                        Self::links_mut(successor_parent).set_left(successor_right);
                        Self::maybe_set_parent(successor_right, Some(successor_parent));

                        Self::links_mut(successor).set_right(Some(right));
                        Self::links_mut(right).set_parent(Some(successor));

                        (successor_parent, Dir::Left)
                    };

                    self.replace_child_or_set_root(parent, node, Some(successor));

                    // Transfer position and balance factor of `node` to `successor`.
                    Self::links_mut(successor).set_parent(parent);
                    Self::links_mut(successor).set_left(Some(left));
                    Self::links_mut(successor).set_balance(balance);
                    // Right link is updated above iff succ != right.

                    Self::links_mut(left).set_parent(Some(successor));

                    Some(shrunk)
                }

                (Some(child), None) | (None, Some(child)) => {
                    let side = if left.is_some() { Dir::Left } else { Dir::Right };

                    self.replace_child_or_set_root(parent, node, Some(child));
                    Self::links_mut(child).set_parent(parent);
                    Self::links_mut(child).set_balance(balance);

                    Some((child, side))
                }

                (None, None) => {
                    let side = parent.map(|p| Self::which_child(p, node));
                    self.replace_child_or_set_root(parent, node, None);

                    parent.zip(side)
                }
            };

            Self::links_mut(node).clear();
            self.len -= 1;

            if let Some((start, side)) = shrunk {
                self.rebalance_removed(start, side);
            }

            T::from_ptr(node)
        }
    }

    // Performs a bottom-up rebalance of the tree after the subtree on `side` of `node` lost a
    // level.
    //
    // Invariants:
    // - `node`'s balance factor does not yet account for the loss.
    // - Every node below `node` has a correct balance factor.
    unsafe fn rebalance_removed(&mut self, mut node: NonNull<T>, mut side: Dir) {
        loop {
            unsafe {
                let balance = Self::balance(node) - side.sign();
                Self::set_balance(node, balance);

                let top = match balance {
                    // The taller side is untouched; the subtree height is unchanged.
                    -1 | 1 => {
                        trace!(key = ?node.as_ref().key(), "removal absorbed");
                        return;
                    }

                    // The taller side lost a level, so the whole subtree did. Ascend.
                    0 => node,

                    // Rotate the taller side up. The subtree only lost a level if the new root is
                    // balanced.
                    _ => {
                        let child = Self::links(node)
                            .child(!side)
                            .expect("the taller side of an unbalanced node is not empty");
                        let top = self.rotate_unbalanced(node, child);

                        if Self::balance(top) != 0 {
                            return;
                        }

                        top
                    }
                };

                let Some(parent) = Self::links(top).parent() else {
                    return;
                };

                side = Self::which_child(parent, top);
                node = parent;
            }
        }
    }
}
