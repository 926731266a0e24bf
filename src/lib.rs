//! An intrusive AVL tree.
//#![no_std]

// Conventions used in comments:
// - The balance factor of a node `x` is `bf(x) = h(right(x)) - h(left(x))`, where `h` of a missing
//   subtree is 0.
// - The parent of a node `x` is denoted `p(x)`.
// - A node is left-heavy if `bf(x) < 0` and right-heavy if `bf(x) > 0`.
//
// The fundamental invariants of an AVL tree are:
// 1. Every key in `left(x)` is less than `x`'s key, and every key in `right(x)` is greater.
// 2. All balance factors are -1, 0 or 1.
//
// Between public operations, every stored balance factor equals the one computed from the subtree
// heights. During a mutation a single node may transiently reach -2 or 2; one rotation at that
// node restores (2).
//
// Corollary: a tree of height `h` holds at least `F(h + 2) - 1` nodes, where `F` is the Fibonacci
// sequence, so `h < 1.4405 * log2(n + 2) - 0.3277`.

use core::{borrow::Borrow, cmp::Ordering, fmt, pin::Pin, ptr::NonNull};

use cordyceps::Linked;

mod debug;
mod insert;
mod invariants;
mod iter;
mod map;
mod node;
mod remove;
mod rotate;
mod set;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use debug::Dump;
pub use invariants::InvariantViolation;
pub use iter::Iter;
pub use map::AvlMap;
pub use node::{Links, NodeRef};
pub use set::{AvlSet, SetNode};

use node::Dir;

pub trait TreeNode<L>: Linked<L> {
    type Key: Ord + fmt::Debug;

    fn key(&self) -> &Self::Key;
}

/// An intrusive AVL tree.
///
/// Elements embed their own [`Links`] and are handed to the tree through their
/// [`Linked::Handle`]. The tree owns every linked element until it is removed, at which point the
/// handle is returned to the caller.
pub struct AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    root: Link<T>,
    len: usize,
}

type Link<T> = Option<NonNull<T>>;

impl<T> AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<T> {
        AvlTree { root: None, len: 0 }
    }

    /// Returns a new tree containing only `item`.
    pub fn with_root(item: T::Handle) -> AvlTree<T> {
        let mut tree = AvlTree::new();
        unsafe { tree.insert_as_root(T::into_ptr(item)) };
        tree
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the root element, if any.
    pub fn root(&self) -> Option<NodeRef<'_, T>> {
        unsafe { NodeRef::from_link(self.root) }
    }

    /// Returns the height of the tree, counted in nodes.
    ///
    /// This follows the heavier side at each level and completes in _O(log(n))_ time.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            height += 1;

            let links = unsafe { Self::links(cur) };
            opt_cur = if links.balance() > 0 {
                links.right()
            } else {
                links.left()
            };
        }

        height
    }

    /// Returns `true` if the tree contains an element with key `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_raw(key).is_some()
    }

    /// Returns a reference to the element corresponding to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<Pin<&T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Returns a pinned mutable reference to the element corresponding to `key`.
    ///
    /// Callers must not change the element's key in a way that alters its ordering; `Pin` keeps
    /// the links out of reach.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<Pin<&mut T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut ptr = self.get_raw(key)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_mut())) }
    }

    /// Searches for the element corresponding to `key`, returning a navigable reference to it.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn find<Q>(&self, key: &Q) -> Option<NodeRef<'_, T>>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        unsafe { NodeRef::from_link(self.get_raw(key)) }
    }

    pub(crate) fn get_raw<Q>(&self, key: &Q) -> Link<T>
    where
        T::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut opt_cur = self.root;

        loop {
            let cur = opt_cur?;

            unsafe {
                match key.cmp(cur.as_ref().key().borrow()) {
                    Ordering::Less => opt_cur = Self::links(cur).left(),
                    Ordering::Equal => return Some(cur),
                    Ordering::Greater => opt_cur = Self::links(cur).right(),
                }
            }
        }
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<Pin<&T>> {
        self.first_raw()
            .map(|first| unsafe { Pin::new_unchecked(first.as_ref()) })
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<Pin<&T>> {
        self.last_raw()
            .map(|last| unsafe { Pin::new_unchecked(last.as_ref()) })
    }

    pub(crate) fn first_raw(&self) -> Link<T> {
        self.root
            .map(|root| unsafe { Self::min_in_subtree(root).0 })
    }

    pub(crate) fn last_raw(&self) -> Link<T> {
        let mut cur = self.root?;

        while let Some(right) = unsafe { Self::links(cur).right() } {
            cur = right;
        }

        Some(cur)
    }

    /// Returns an iterator over the elements of the tree in ascending key order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    // Returns the minimum node in the subtree.
    //
    // If the subtree root is not the minimum, also returns the minimum node's parent.
    #[inline]
    unsafe fn min_in_subtree(root: NonNull<T>) -> (NonNull<T>, Option<NonNull<T>>) {
        let mut parent = None;
        let mut cur = root;

        while let Some(left) = unsafe { Self::links(cur).left() } {
            parent = Some(cur);
            cur = left;
        }

        (cur, parent)
    }

    // Returns the leftmost node of `node`'s right subtree, or `None` if `node` has no right child.
    pub(crate) unsafe fn find_inorder_successor(node: NonNull<T>) -> Link<T> {
        let right = unsafe { Self::links(node).right() }?;
        Some(unsafe { Self::min_in_subtree(right).0 })
    }

    // Returns the node following `node` in key order, anywhere in the tree.
    pub(crate) unsafe fn successor_raw(node: NonNull<T>) -> Link<T> {
        unsafe {
            if let Some(succ) = Self::find_inorder_successor(node) {
                return Some(succ);
            }

            let mut cur = node;
            while let Some(parent) = Self::links(cur).parent() {
                if Self::links(parent).left() == Some(cur) {
                    return Some(parent);
                }
                cur = parent;
            }

            None
        }
    }

    // Returns the node preceding `node` in key order, anywhere in the tree.
    pub(crate) unsafe fn predecessor_raw(node: NonNull<T>) -> Link<T> {
        unsafe {
            if let Some(mut cur) = Self::links(node).left() {
                while let Some(right) = Self::links(cur).right() {
                    cur = right;
                }
                return Some(cur);
            }

            let mut cur = node;
            while let Some(parent) = Self::links(cur).parent() {
                if Self::links(parent).right() == Some(cur) {
                    return Some(parent);
                }
                cur = parent;
            }

            None
        }
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let first = self.first_raw()?;
        Some(unsafe { self.remove_at(first) })
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let last = self.last_raw()?;
        Some(unsafe { self.remove_at(last) })
    }

    /// Clears the tree, removing all elements.
    pub fn clear(&mut self) {
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node.
                let (cur, parent) = Self::min_in_subtree(cur);
                let parent = parent.or_else(|| Self::links(cur).parent());

                let right = Self::links(cur).right();

                // Elevate the node's right child (which may be None).
                self.replace_child_or_set_root(parent, cur, right);
                Self::maybe_set_parent(right, parent);

                // Drop the node.
                Self::links_mut(cur).clear();
                drop(T::from_ptr(cur));
                self.len -= 1;

                // If the node had no right child, climb to the parent. If the node had no parent,
                // the tree is empty.
                opt_cur = right.or(parent);
            }
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len(), 0);
    }

    // Support methods ========================================================

    #[inline]
    pub(crate) unsafe fn links<'a>(node: NonNull<T>) -> &'a Links<T> {
        unsafe { T::links(node).as_ref() }
    }

    #[inline]
    pub(crate) unsafe fn links_mut<'a>(node: NonNull<T>) -> &'a mut Links<T> {
        unsafe { T::links(node).as_mut() }
    }

    #[inline]
    unsafe fn balance(node: NonNull<T>) -> i8 {
        unsafe { Self::links(node).balance() }
    }

    #[inline]
    unsafe fn set_balance(node: NonNull<T>, balance: i8) {
        unsafe { Self::links_mut(node).set_balance(balance) }
    }

    unsafe fn maybe_set_parent(opt_node: Link<T>, parent: Link<T>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { Self::links_mut(node).set_parent(parent) };
    }

    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe { Self::replace_child(parent, old_child, new_child) },
            None => self.root = new_child,
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that the following conditions hold:
    // - `old_child` is a child node of `parent`.
    // - `new_child` is not a child node of `parent`.
    unsafe fn replace_child(parent: NonNull<T>, old_child: NonNull<T>, new_child: Link<T>) {
        unsafe {
            let dir = Self::which_child(parent, old_child);

            debug_assert!(
                new_child.is_none() || Self::links(parent).child(!dir) != new_child,
                "`new_child` must not be a child of `parent`"
            );

            Self::links_mut(parent).set_child(dir, new_child);
        }
    }

    // Returns the side of `parent` on which `child` hangs.
    //
    // Panics in debug builds if `child` is not a child of `parent`.
    pub(crate) unsafe fn which_child(parent: NonNull<T>, child: NonNull<T>) -> Dir {
        unsafe {
            if Self::links(parent).left() == Some(child) {
                Dir::Left
            } else {
                debug_assert_eq!(
                    Self::links(parent).right(),
                    Some(child),
                    "`child` must be a child of `parent`"
                );
                Dir::Right
            }
        }
    }
}

impl<T> Default for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<'tree, T> IntoIterator for &'tree AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    type Item = &'tree T;
    type IntoIter = Iter<'tree, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> fmt::Debug for AvlTree<T>
where
    T: TreeNode<Links<T>> + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|node| node.key())).finish()
    }
}
