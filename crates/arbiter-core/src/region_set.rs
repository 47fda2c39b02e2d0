use std::collections::{HashSet, VecDeque};

/// An ordered multiset of region handles (indices into the owning map's
/// region storage). Cheap to push and pop at both ends; duplicates are
/// allowed until [`RegionSet::remove_dups`] collapses them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionSet {
    handles: VecDeque<usize>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn push_front(&mut self, handle: usize) {
        self.handles.push_front(handle);
    }

    pub fn push_back(&mut self, handle: usize) {
        self.handles.push_back(handle);
    }

    pub fn pop_front(&mut self) -> Option<usize> {
        self.handles.pop_front()
    }

    pub fn pop_back(&mut self) -> Option<usize> {
        self.handles.pop_back()
    }

    pub fn front(&self) -> Option<usize> {
        self.handles.front().copied()
    }

    pub fn back(&self) -> Option<usize> {
        self.handles.back().copied()
    }

    pub fn contains(&self, handle: usize) -> bool {
        self.handles.contains(&handle)
    }

    /// Removes the first occurrence of `handle`. Returns false if absent.
    pub fn remove(&mut self, handle: usize) -> bool {
        let Some(pos) = self.handles.iter().position(|&h| h == handle) else {
            return false;
        };
        self.handles.remove(pos);
        true
    }

    /// Splices every handle of `other` onto the back, draining `other`.
    pub fn merge(&mut self, other: &mut RegionSet) {
        self.handles.append(&mut other.handles);
    }

    /// Appends a copy of every handle of `other`, leaving it untouched.
    pub fn merge_copy(&mut self, other: &RegionSet) {
        self.handles.extend(other.handles.iter().copied());
    }

    /// Keeps only the first occurrence of each handle, preserving order.
    pub fn remove_dups(&mut self) {
        let mut seen = HashSet::with_capacity(self.handles.len());
        self.handles.retain(|&h| seen.insert(h));
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.handles.iter().copied()
    }
}

impl FromIterator<usize> for RegionSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            handles: iter.into_iter().collect(),
        }
    }
}
