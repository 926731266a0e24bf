use core::ptr::NonNull;

use tracing::trace;

use crate::{AvlTree, Dir, Links, TreeNode};

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    // Restores balance at `node`, whose balance factor is 2 or -2, by rotating it with `child`,
    // the root of its taller subtree.
    //
    // Returns the new root of the subtree.
    pub(crate) unsafe fn rotate_unbalanced(
        &mut self,
        node: NonNull<T>,
        child: NonNull<T>,
    ) -> NonNull<T> {
        let (node_balance, child_balance) = unsafe { (Self::balance(node), Self::balance(child)) };

        unsafe {
            match node_balance {
                2 if child_balance >= 0 => self.rotate_left(node, child),
                2 => self.rotate_right_left(node, child),
                -2 if child_balance <= 0 => self.rotate_right(node, child),
                -2 => self.rotate_left_right(node, child),
                _ => unreachable!("cannot rotate at a node with balance factor {node_balance}"),
            }
        }
    }

    // Single left rotation: `child`, the right child of `parent`, takes `parent`'s place.
    //
    // Returns `child`.
    pub(crate) unsafe fn rotate_left(
        &mut self,
        parent: NonNull<T>,
        child: NonNull<T>,
    ) -> NonNull<T> {
        unsafe {
            assert_eq!(
                Self::links(parent).right(),
                Some(child),
                "left rotation requires the right child"
            );

            self.rotate_at(parent, child);

            // A child balance of 0 only occurs during removal.
            if Self::balance(child) == 0 {
                Self::set_balance(parent, 1);
                Self::set_balance(child, -1);
            } else {
                Self::set_balance(parent, 0);
                Self::set_balance(child, 0);
            }

            trace!(pivot = ?child.as_ref().key(), balance = Self::balance(child), "rotated left");
        }

        child
    }

    // Single right rotation: `child`, the left child of `parent`, takes `parent`'s place.
    //
    // Returns `child`.
    pub(crate) unsafe fn rotate_right(
        &mut self,
        parent: NonNull<T>,
        child: NonNull<T>,
    ) -> NonNull<T> {
        unsafe {
            assert_eq!(
                Self::links(parent).left(),
                Some(child),
                "right rotation requires the left child"
            );

            self.rotate_at(parent, child);

            // A child balance of 0 only occurs during removal.
            if Self::balance(child) == 0 {
                Self::set_balance(parent, -1);
                Self::set_balance(child, 1);
            } else {
                Self::set_balance(parent, 0);
                Self::set_balance(child, 0);
            }

            trace!(pivot = ?child.as_ref().key(), balance = Self::balance(child), "rotated right");
        }

        child
    }

    // Double right-left rotation: the left child of `child` (itself the right child of `parent`)
    // takes `parent`'s place.
    //
    // Returns the new subtree root.
    pub(crate) unsafe fn rotate_right_left(
        &mut self,
        parent: NonNull<T>,
        child: NonNull<T>,
    ) -> NonNull<T> {
        unsafe {
            assert_eq!(
                Self::links(parent).right(),
                Some(child),
                "right-left rotation requires the right child"
            );

            let inner = Self::links(child)
                .left()
                .expect("right-left rotation requires an inner child");
            let inner_balance = Self::balance(inner);

            self.rotate_twice_at(parent, child, inner);

            let (parent_balance, child_balance) = match inner_balance {
                0 => (0, 0),
                b if b > 0 => (-1, 0),
                _ => (0, 1),
            };
            Self::set_balance(parent, parent_balance);
            Self::set_balance(child, child_balance);
            Self::set_balance(inner, 0);

            trace!(pivot = ?inner.as_ref().key(), "rotated right-left");

            inner
        }
    }

    // Double left-right rotation: the right child of `child` (itself the left child of `parent`)
    // takes `parent`'s place.
    //
    // Returns the new subtree root.
    pub(crate) unsafe fn rotate_left_right(
        &mut self,
        parent: NonNull<T>,
        child: NonNull<T>,
    ) -> NonNull<T> {
        unsafe {
            assert_eq!(
                Self::links(parent).left(),
                Some(child),
                "left-right rotation requires the left child"
            );

            let inner = Self::links(child)
                .right()
                .expect("left-right rotation requires an inner child");
            let inner_balance = Self::balance(inner);

            self.rotate_twice_at(parent, child, inner);

            let (parent_balance, child_balance) = match inner_balance {
                0 => (0, 0),
                b if b > 0 => (0, -1),
                _ => (1, 0),
            };
            Self::set_balance(parent, parent_balance);
            Self::set_balance(child, child_balance);
            Self::set_balance(inner, 0);

            trace!(pivot = ?inner.as_ref().key(), "rotated left-right");

            inner
        }
    }

    // Performs a rotation, moving `up` up and its parent `down` down.
    //
    // Balance factors of affected nodes are not updated.
    unsafe fn rotate_at(&mut self, down: NonNull<T>, up: NonNull<T>) {
        unsafe {
            // - `down` becomes the `dir` child of `up`.
            // - `across` goes from the `dir` child of `up` to the `!dir` child of `down`.
            let dir = !Self::which_child(down, up);

            let across = Self::links(up).child(dir);
            Self::links_mut(down).set_child(!dir, across);
            Self::maybe_set_parent(across, Some(down));

            Self::links_mut(up).set_child(dir, Some(down));
            let parent = Self::links_mut(down).set_parent(Some(up));
            Self::links_mut(up).set_parent(parent);

            self.replace_child_or_set_root(parent, down, Some(up));
        }
    }

    // Performs a double rotation, moving `up` (a grandchild of `down_second`) to the top and its
    // parent `down_first` and grandparent `down_second` below it.
    //
    // Balance factors of affected nodes are not updated.
    unsafe fn rotate_twice_at(
        &mut self,
        down_second: NonNull<T>,
        down_first: NonNull<T>,
        up: NonNull<T>,
    ) {
        unsafe {
            let dir = Self::which_child(down_first, up);

            let across_first = Self::links(up).child(!dir);
            let across_second = Self::links(up).child(dir);

            Self::maybe_set_parent(across_first, Some(down_first));
            Self::links_mut(down_first).set_child(dir, across_first);
            Self::links_mut(down_first).set_parent(Some(up));

            Self::maybe_set_parent(across_second, Some(down_second));
            Self::links_mut(down_second).set_child(!dir, across_second);
            let parent = Self::links_mut(down_second).set_parent(Some(up));

            Self::links_mut(up).set_parent(parent);
            Self::links_mut(up).set_child(!dir, Some(down_first));
            Self::links_mut(up).set_child(dir, Some(down_second));

            self.replace_child_or_set_root(parent, down_second, Some(up));
        }
    }
}
