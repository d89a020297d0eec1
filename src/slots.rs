//! Fixed-size slot arena with index handles.
//!
//! Used for pools where a handle is shown to the user (loop handles) or where
//! the index has hardware meaning (interrupt channels). Allocation always
//! hands out the lowest free index. Every removal bumps the slot generation so
//! a worker can tell that the entry it was running has been replaced.

/// Pool of `N` optional entries addressed by index.
#[derive(Debug)]
pub struct SlotArena<T, const N: usize> {
    entries: [Option<T>; N],
    generations: [u32; N],
    /// Free indices, highest first so `pop` yields the lowest
    free: heapless::Vec<u8, N>,
}

impl<T, const N: usize> SlotArena<T, N> {
    /// Create an arena with every slot free.
    pub fn new() -> Self {
        const { assert!(N <= u8::MAX as usize, "slot indices are stored as u8") };

        let mut free = heapless::Vec::new();
        for index in (0..N).rev() {
            let _ = free.push(index as u8);
        }
        Self {
            entries: [const { None }; N],
            generations: [0; N],
            free,
        }
    }

    /// Store `value` in the lowest free slot. Gives the value back if full.
    pub fn insert(&mut self, value: T) -> Result<usize, T> {
        match self.free.pop() {
            Some(index) => {
                let index = usize::from(index);
                self.entries[index] = Some(value);
                Ok(index)
            }
            None => Err(value),
        }
    }

    /// Store `value` in a specific slot. Gives the value back if the slot is
    /// taken or out of range.
    pub fn insert_at(&mut self, index: usize, value: T) -> Result<(), T> {
        match self.free.iter().position(|&free| usize::from(free) == index) {
            Some(position) => {
                self.free.remove(position);
                self.entries[index] = Some(value);
                Ok(())
            }
            None => Err(value),
        }
    }

    /// Take the entry out of a slot and free it.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let value = self.entries.get_mut(index)?.take()?;
        self.generations[index] = self.generations[index].wrapping_add(1);

        // Keep the free list sorted descending
        let position = self
            .free
            .iter()
            .position(|&free| usize::from(free) < index)
            .unwrap_or(self.free.len());
        let _ = self.free.insert(position, index as u8);
        Some(value)
    }

    /// Entry in a slot, if occupied.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)?.as_ref()
    }

    /// Removal counter of a slot (0 for out-of-range indices).
    pub fn generation(&self, index: usize) -> u32 {
        self.generations.get(index).copied().unwrap_or(0)
    }

    /// True if the slot holds an entry.
    pub fn is_occupied(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Occupied slots.
    pub fn len(&self) -> usize {
        N - self.free.len()
    }

    /// True if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.free.len() == N
    }

    /// Total number of slots.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Occupied slots with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.as_ref().map(|value| (index, value)))
    }
}

impl<T, const N: usize> Default for SlotArena<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_free_slot_first() {
        let mut arena: SlotArena<&str, 4> = SlotArena::new();
        assert_eq!(arena.insert("a"), Ok(0));
        assert_eq!(arena.insert("b"), Ok(1));
        assert_eq!(arena.insert("c"), Ok(2));

        assert_eq!(arena.remove(1), Some("b"));
        assert_eq!(arena.remove(0), Some("a"));
        assert_eq!(arena.insert("d"), Ok(0));
        assert_eq!(arena.insert("e"), Ok(1));
        assert_eq!(arena.insert("f"), Ok(3));
        assert_eq!(arena.insert("g"), Err("g"));
        assert_eq!(arena.len(), 4);
    }

    #[test]
    fn test_remove_twice() {
        let mut arena: SlotArena<u32, 2> = SlotArena::new();
        let index = arena.insert(7).unwrap();
        assert_eq!(arena.remove(index), Some(7));
        assert_eq!(arena.remove(index), None);
        assert_eq!(arena.remove(5), None);
        assert!(arena.is_empty());
    }

    #[test]
    fn test_generation_bumps_on_remove() {
        let mut arena: SlotArena<u32, 2> = SlotArena::new();
        let index = arena.insert(1).unwrap();
        assert_eq!(arena.generation(index), 0);
        arena.remove(index);
        assert_eq!(arena.generation(index), 1);
        arena.insert(2).unwrap();
        assert_eq!(arena.generation(index), 1);
    }

    #[test]
    fn test_insert_at() {
        let mut arena: SlotArena<u32, 4> = SlotArena::new();
        assert_eq!(arena.insert_at(2, 20), Ok(()));
        assert_eq!(arena.insert_at(2, 21), Err(21));
        assert_eq!(arena.insert_at(4, 40), Err(40));
        assert_eq!(arena.get(2), Some(&20));
        assert_eq!(arena.insert(1), Ok(0));
        assert_eq!(arena.insert(2), Ok(1));
        assert_eq!(arena.insert(3), Ok(3));
    }

    #[test]
    fn test_iter_occupied() {
        let mut arena: SlotArena<char, 4> = SlotArena::new();
        arena.insert_at(3, 'x').unwrap();
        arena.insert_at(1, 'y').unwrap();
        let mut iter = arena.iter();
        assert_eq!(iter.next(), Some((1, &'y')));
        assert_eq!(iter.next(), Some((3, &'x')));
        assert_eq!(iter.next(), None);
    }
}
