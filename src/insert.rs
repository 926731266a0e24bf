use core::{cmp::Ordering, ptr::NonNull};

use tracing::trace;

use crate::{AvlTree, Dir, Links, TreeNode};

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Inserts an item into the tree.
    ///
    /// If the tree already contains an element with an equal key, the tree is left unchanged and
    /// `item` is handed back.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, item: T::Handle) -> Option<T::Handle> {
        let ptr = T::into_ptr(item);

        let Some(root) = self.root else {
            // Tree is empty. Set `item` as the root and return.
            unsafe { self.insert_as_root(ptr) };
            return None;
        };

        let mut parent = root;

        // Descend the tree, looking for a vacant child slot.
        loop {
            let ordering = unsafe { ptr.as_ref().key().cmp(parent.as_ref().key()) };

            let dir = match ordering {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return Some(unsafe { T::from_ptr(ptr) }),
                Ordering::Greater => Dir::Right,
            };

            match unsafe { Self::links(parent).child(dir) } {
                // Descend.
                Some(child) => parent = child,

                // Set `item` as child.
                None => {
                    unsafe { self.insert_as_child(parent, dir, ptr) };
                    return None;
                }
            }
        }
    }

    // Links `ptr` as the sole element of an empty tree.
    pub(crate) unsafe fn insert_as_root(&mut self, ptr: NonNull<T>) {
        debug_assert!(self.root.is_none());

        unsafe { Self::links_mut(ptr).clear() };

        self.root = Some(ptr);
        self.len += 1;
    }

    // Links `ptr` as the `dir` child of `parent` and rebalances.
    //
    // # Safety
    //
    // `parent` must be an element of this tree with no `dir` child, and `ptr`'s key must sort
    // between `parent` and its neighbor on the `dir` side.
    pub(crate) unsafe fn insert_as_child(
        &mut self,
        parent: NonNull<T>,
        dir: Dir,
        ptr: NonNull<T>,
    ) {
        unsafe {
            debug_assert!(Self::links(parent).child(dir).is_none());

            let links = Self::links_mut(ptr);
            links.clear();
            links.set_parent(Some(parent));

            Self::links_mut(parent).set_child(dir, Some(ptr));
        }

        self.len += 1;

        unsafe { self.rebalance_inserted(parent, ptr) };
    }

    // Performs a bottom-up rebalance of the tree after `child`'s subtree grew by one level.
    //
    // Invariants:
    // - `child` is a child of `parent`.
    // - `child`'s balance factor is already correct.
    // - `parent`'s balance factor does not yet account for the growth.
    unsafe fn rebalance_inserted(&mut self, mut parent: NonNull<T>, mut child: NonNull<T>) {
        loop {
            unsafe {
                let dir = Self::which_child(parent, child);
                let balance = Self::balance(parent) + dir.sign();
                Self::set_balance(parent, balance);

                match balance {
                    // The shorter side caught up; the subtree height is unchanged.
                    0 => {
                        trace!(key = ?parent.as_ref().key(), "insertion absorbed");
                        return;
                    }

                    // The subtree grew by one level. Ascend.
                    -1 | 1 => match Self::links(parent).parent() {
                        Some(grandparent) => {
                            child = parent;
                            parent = grandparent;
                        }
                        None => return,
                    },

                    // A single rotation restores the subtree to its height before the insertion.
                    _ => {
                        self.rotate_unbalanced(parent, child);
                        return;
                    }
                }
            }
        }
    }
}
