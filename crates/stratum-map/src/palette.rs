use std::ops::{Index, IndexMut};

/// An identifier for one of the values in a given [`Palette`]. Id 0 is reserved for "no value."
pub type PaletteId = u32;

pub const EMPTY_ID: PaletteId = 0;

/// An append-only mapping from [`PaletteId`] to type `T`. Ids start at 1 so that a zeroed packed slot means "empty."
///
/// Use [`Index`] and [`IndexMut`] traits for access.
#[derive(Clone, Debug)]
pub struct Palette<T> {
    values: Vec<T>,
}

impl<T> Default for Palette<T> {
    fn default() -> Self {
        Self { values: Vec::new() }
    }
}

impl<T> Palette<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of value slots, live or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Appends `value` and returns its new id.
    #[inline]
    pub fn push(&mut self, value: T) -> PaletteId {
        self.values.push(value);
        self.values.len() as PaletteId
    }

    #[inline]
    pub fn get(&self, id: PaletteId) -> Option<&T> {
        (id as usize).checked_sub(1).and_then(|i| self.values.get(i))
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// All values, where the value of id `i` is at position `i - 1`.
    pub fn into_values(self) -> Vec<T> {
        self.values
    }
}

impl<T> Index<PaletteId> for Palette<T> {
    type Output = T;

    #[inline]
    fn index(&self, id: PaletteId) -> &Self::Output {
        self.values.index(id as usize - 1)
    }
}

impl<T> IndexMut<PaletteId> for Palette<T> {
    #[inline]
    fn index_mut(&mut self, id: PaletteId) -> &mut Self::Output {
        self.values.index_mut(id as usize - 1)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ids_start_at_one() {
        let mut palette = Palette::new();
        assert_eq!(palette.push("a"), 1);
        assert_eq!(palette.push("b"), 2);
        assert_eq!(palette[2], "b");
        assert_eq!(palette.get(EMPTY_ID), None);
        assert_eq!(palette.get(1), Some(&"a"));
        assert_eq!(palette.get(3), None);

        palette[1] = "c";
        assert_eq!(palette.into_values(), ["c", "b"]);
    }
}
