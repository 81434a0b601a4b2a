#![forbid(unsafe_code)]

//! Observable `Vec<T>`.
//!
//! Index arguments are clamped to the current length instead of panicking,
//! so an action built against a stale length still applies sensibly.

use std::cmp::Ordering;
use std::fmt;

use crate::dispatcher::{Container, Dispatcher};

/// Mutations accepted by an [`ObservableVec`].
pub enum VecAction<T> {
    /// Append values; yields the new length.
    Push(Vec<T>),
    /// Remove the last element.
    Pop,
    /// Remove the first element.
    Shift,
    /// Prepend values, keeping their order; yields the new length.
    Unshift(Vec<T>),
    /// Remove `delete_count` elements at `start` (all remaining when `None`)
    /// and insert `values` there; yields the removed elements.
    Splice {
        start: usize,
        delete_count: Option<usize>,
        values: Vec<T>,
    },
    /// Reverse in place.
    Reverse,
    /// Stable sort with a comparator.
    SortBy(Box<dyn FnMut(&T, &T) -> Ordering>),
    /// Overwrite `start..end` (to the end when `None`) with clones of `value`.
    Fill {
        value: T,
        start: usize,
        end: Option<usize>,
    },
    /// Copy `start..end` over the elements beginning at `target`, truncated
    /// so the length never changes.
    CopyWithin {
        target: usize,
        start: usize,
        end: Option<usize>,
    },
}

impl<T: fmt::Debug> fmt::Debug for VecAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push(values) => f.debug_tuple("Push").field(values).finish(),
            Self::Pop => f.write_str("Pop"),
            Self::Shift => f.write_str("Shift"),
            Self::Unshift(values) => f.debug_tuple("Unshift").field(values).finish(),
            Self::Splice {
                start,
                delete_count,
                values,
            } => f
                .debug_struct("Splice")
                .field("start", start)
                .field("delete_count", delete_count)
                .field("values", values)
                .finish(),
            Self::Reverse => f.write_str("Reverse"),
            Self::SortBy(_) => f.write_str("SortBy(..)"),
            Self::Fill { value, start, end } => f
                .debug_struct("Fill")
                .field("value", value)
                .field("start", start)
                .field("end", end)
                .finish(),
            Self::CopyWithin { target, start, end } => f
                .debug_struct("CopyWithin")
                .field("target", target)
                .field("start", start)
                .field("end", end)
                .finish(),
        }
    }
}

/// Result of a [`VecAction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VecOutcome<T> {
    /// Length after `Push` / `Unshift`.
    Length(usize),
    /// Element taken by `Pop` / `Shift`.
    Element(Option<T>),
    /// Elements taken by `Splice`.
    Removed(Vec<T>),
    /// In-place reorders and overwrites.
    Done,
}

impl<T> VecOutcome<T> {
    fn into_length(self) -> usize {
        match self {
            Self::Length(len) => len,
            _ => unreachable!("push and unshift yield a length"),
        }
    }

    fn into_element(self) -> Option<T> {
        match self {
            Self::Element(element) => element,
            _ => unreachable!("pop and shift yield an element"),
        }
    }

    fn into_removed(self) -> Vec<T> {
        match self {
            Self::Removed(removed) => removed,
            _ => unreachable!("splice yields removed elements"),
        }
    }
}

fn clamp_range(len: usize, start: usize, end: Option<usize>) -> (usize, usize) {
    let start = start.min(len);
    let end = end.unwrap_or(len).clamp(start, len);
    (start, end)
}

impl<T: Clone + 'static> Container for Vec<T> {
    type Action = VecAction<T>;
    type Outcome = VecOutcome<T>;

    fn apply(&mut self, action: VecAction<T>) -> VecOutcome<T> {
        match action {
            VecAction::Push(values) => {
                self.extend(values);
                VecOutcome::Length(self.len())
            }
            VecAction::Pop => VecOutcome::Element(self.pop()),
            VecAction::Shift => {
                VecOutcome::Element((!self.is_empty()).then(|| self.remove(0)))
            }
            VecAction::Unshift(values) => {
                self.splice(0..0, values);
                VecOutcome::Length(self.len())
            }
            VecAction::Splice {
                start,
                delete_count,
                values,
            } => {
                let start = start.min(self.len());
                let end = match delete_count {
                    Some(count) => start.saturating_add(count).min(self.len()),
                    None => self.len(),
                };
                VecOutcome::Removed(self.splice(start..end, values).collect())
            }
            VecAction::Reverse => {
                self.reverse();
                VecOutcome::Done
            }
            VecAction::SortBy(mut compare) => {
                self.sort_by(|a, b| compare(a, b));
                VecOutcome::Done
            }
            VecAction::Fill { value, start, end } => {
                let (start, end) = clamp_range(self.len(), start, end);
                self[start..end].fill(value);
                VecOutcome::Done
            }
            VecAction::CopyWithin { target, start, end } => {
                let len = self.len();
                let (start, end) = clamp_range(len, start, end);
                let target = target.min(len);
                let count = (end - start).min(len - target);
                let chunk = self[start..start + count].to_vec();
                self[target..target + count].clone_from_slice(&chunk);
                VecOutcome::Done
            }
        }
    }

    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn action_name(action: &VecAction<T>) -> &'static str {
        match action {
            VecAction::Push(_) => "push",
            VecAction::Pop => "pop",
            VecAction::Shift => "shift",
            VecAction::Unshift(_) => "unshift",
            VecAction::Splice { .. } => "splice",
            VecAction::Reverse => "reverse",
            VecAction::SortBy(_) => "sort",
            VecAction::Fill { .. } => "fill",
            VecAction::CopyWithin { .. } => "copy_within",
        }
    }
}

/// Observable sequence.
pub type ObservableVec<T> = Dispatcher<Vec<T>>;

impl<T: Clone + 'static> Dispatcher<Vec<T>> {
    /// Append one value; returns the new length.
    pub fn push(&self, value: T) -> usize {
        self.extend(vec![value])
    }

    /// Append several values; returns the new length.
    pub fn extend(&self, values: Vec<T>) -> usize {
        self.dispatch(VecAction::Push(values)).into_length()
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Option<T> {
        self.dispatch(VecAction::Pop).into_element()
    }

    /// Remove and return the first element.
    pub fn shift(&self) -> Option<T> {
        self.dispatch(VecAction::Shift).into_element()
    }

    /// Prepend values; returns the new length.
    pub fn unshift(&self, values: Vec<T>) -> usize {
        self.dispatch(VecAction::Unshift(values)).into_length()
    }

    /// Replace a range; returns the removed elements.
    pub fn splice(&self, start: usize, delete_count: Option<usize>, values: Vec<T>) -> Vec<T> {
        self.dispatch(VecAction::Splice {
            start,
            delete_count,
            values,
        })
        .into_removed()
    }

    /// Reverse in place.
    pub fn reverse(&self) {
        self.dispatch(VecAction::Reverse);
    }

    /// Stable sort by `compare`.
    pub fn sort_by(&self, compare: impl FnMut(&T, &T) -> Ordering + 'static) {
        self.dispatch(VecAction::SortBy(Box::new(compare)));
    }

    /// Stable sort by `Ord`.
    pub fn sort(&self)
    where
        T: Ord,
    {
        self.sort_by(T::cmp);
    }

    /// Overwrite a range with clones of `value`.
    pub fn fill(&self, value: T, start: usize, end: Option<usize>) {
        self.dispatch(VecAction::Fill { value, start, end });
    }

    /// Copy a range over the elements starting at `target`.
    pub fn copy_within(&self, target: usize, start: usize, end: Option<usize>) {
        self.dispatch(VecAction::CopyWithin { target, start, end });
    }

    /// Clone of the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.with(|items| items.get(index).cloned())
    }

    /// Clone of the whole sequence.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.with(Clone::clone)
    }
}
