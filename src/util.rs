use std::fmt::{Debug, Error, Formatter};
use std::iter::FromIterator;

/// Elements with a width (eg. when used in an [`OffsetVec`])
pub trait Width {
    fn width(&self) -> usize;
}

/// A vector of elements of different logical "widths", where offsets into the vector are
/// given in terms of the sum of the widths of the previous elements (as opposed to the
/// number of preceding elements).
///
/// Class files need this in two places:
///
///   - the constant pool, where `long` and `double` entries occupy two slots
///   - method code, where instructions have different encoded sizes and jump targets
///     are byte offsets
#[derive(Clone)]
pub struct OffsetVec<T: Sized> {
    /// Entries, along with their offset
    entries: Vec<(Offset, T)>,

    /// Offset of the next element to be added
    offset_len: Offset,
}

/// Offset into an [`OffsetVec`]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Offset(pub usize);

impl<T: Sized + Width> OffsetVec<T> {
    /// New empty offset vector
    pub fn new() -> OffsetVec<T> {
        OffsetVec::new_starting_at(Offset(0))
    }

    /// New empty offset vector, with a custom starting offset
    pub fn new_starting_at(initial_offset: Offset) -> OffsetVec<T> {
        OffsetVec {
            entries: vec![],
            offset_len: initial_offset,
        }
    }

    /// Length of the `OffsetVec` (aka. number of entries)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current offset size of the `OffsetVec` (aka. offset of the next element to be added)
    pub fn offset_len(&self) -> Offset {
        self.offset_len
    }

    /// Add an entry to the back, returning the offset it was placed at
    pub fn push(&mut self, elem: T) -> Offset {
        let offset = self.offset_len;
        self.offset_len.0 += elem.width();
        self.entries.push((offset, elem));
        offset
    }

    /// Iterate over the entries and their offsets
    pub fn iter(&self) -> impl Iterator<Item = (Offset, &T)> {
        self.entries.iter().map(|(off, elem)| (*off, elem))
    }
}

impl<T: Width> Default for OffsetVec<T> {
    fn default() -> Self {
        OffsetVec::new()
    }
}

impl<T: Width> FromIterator<T> for OffsetVec<T> {
    fn from_iter<A: IntoIterator<Item = T>>(elems: A) -> Self {
        let mut offset_vec = OffsetVec::new();
        for elem in elems {
            offset_vec.push(elem);
        }
        offset_vec
    }
}

impl<T> IntoIterator for OffsetVec<T> {
    type Item = (Offset, T);
    type IntoIter = std::vec::IntoIter<(Offset, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<T: Debug> Debug for OffsetVec<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let mut list = f.debug_list();
        for (off, elem) in &self.entries {
            list.entry(&format_args!("#{} = {:?}", off.0, elem));
        }
        list.finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    struct Wide(usize);

    impl Width for Wide {
        fn width(&self) -> usize {
            self.0
        }
    }

    #[test]
    fn offsets_accumulate_widths() {
        let elems: OffsetVec<Wide> = vec![Wide(1), Wide(3), Wide(2)].into_iter().collect();
        assert_eq!(elems.len(), 3);
        assert_eq!(elems.offset_len(), Offset(6));
        assert_eq!(
            elems.iter().map(|(off, _)| off).collect::<Vec<_>>(),
            vec![Offset(0), Offset(1), Offset(4)]
        );
    }

    #[test]
    fn custom_starting_offset() {
        let mut elems: OffsetVec<Wide> = OffsetVec::new_starting_at(Offset(1));
        assert_eq!(elems.push(Wide(2)), Offset(1));
        assert_eq!(elems.push(Wide(1)), Offset(3));
    }
}
