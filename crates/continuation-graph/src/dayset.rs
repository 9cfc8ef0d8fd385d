//! A compact representation of calendar days as a bit vector indexed from a
//! shared epoch. Every `DaySet` produced during one conversion run shares the
//! same epoch and capacity, computed once from the feed's actual day span.

const BITS_PER_WORD: usize = 64;

/// A set of calendar days, offset from a run-wide epoch. Bit `i` is set if
/// day `epoch + i` is a member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DaySet {
    words: Vec<u64>,
    capacity: usize,
}

impl DaySet {
    /// An empty set sized for `capacity` days (offsets `0..capacity`).
    pub fn empty(capacity: usize) -> Self {
        let word_count = capacity.div_ceil(BITS_PER_WORD);
        Self {
            words: vec![0; word_count],
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub fn contains(&self, day_offset: usize) -> bool {
        if day_offset >= self.capacity {
            return false;
        }
        self.words[day_offset / BITS_PER_WORD] & (1u64 << (day_offset % BITS_PER_WORD)) != 0
    }

    pub fn set(&mut self, day_offset: usize) {
        assert!(
            day_offset < self.capacity,
            "day offset {day_offset} outside capacity {}",
            self.capacity
        );
        self.words[day_offset / BITS_PER_WORD] |= 1u64 << (day_offset % BITS_PER_WORD);
    }

    pub fn clear(&mut self, day_offset: usize) {
        if day_offset >= self.capacity {
            return;
        }
        self.words[day_offset / BITS_PER_WORD] &= !(1u64 << (day_offset % BITS_PER_WORD));
    }

    /// Highest set bit offset, if any.
    pub fn last_day(&self) -> Option<usize> {
        for (word_idx, word) in self.words.iter().enumerate().rev() {
            if *word != 0 {
                let bit = BITS_PER_WORD - 1 - word.leading_zeros() as usize;
                return Some(word_idx * BITS_PER_WORD + bit);
            }
        }
        None
    }

    pub fn count(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    pub fn iter_days(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.capacity).filter(move |d| self.contains(*d))
    }

    fn zip_words<'a>(&'a self, other: &'a DaySet) -> impl Iterator<Item = (u64, u64)> + 'a {
        assert_eq!(
            self.capacity, other.capacity,
            "day-sets from different runs cannot be combined"
        );
        self.words.iter().copied().zip(other.words.iter().copied())
    }

    pub fn union(&self, other: &DaySet) -> DaySet {
        let words = self.zip_words(other).map(|(a, b)| a | b).collect();
        DaySet {
            words,
            capacity: self.capacity,
        }
    }

    pub fn union_with(&mut self, other: &DaySet) {
        assert_eq!(self.capacity, other.capacity);
        for (w, o) in self.words.iter_mut().zip(other.words.iter()) {
            *w |= o;
        }
    }

    pub fn intersection(&self, other: &DaySet) -> DaySet {
        let words = self.zip_words(other).map(|(a, b)| a & b).collect();
        DaySet {
            words,
            capacity: self.capacity,
        }
    }

    pub fn difference(&self, other: &DaySet) -> DaySet {
        let words = self.zip_words(other).map(|(a, b)| a & !b).collect();
        DaySet {
            words,
            capacity: self.capacity,
        }
    }

    pub fn is_subset_of(&self, other: &DaySet) -> bool {
        self.zip_words(other).all(|(a, b)| a & !b == 0)
    }

    pub fn is_disjoint(&self, other: &DaySet) -> bool {
        self.zip_words(other).all(|(a, b)| a & b == 0)
    }

    /// Shifts every member day by `offset` (positive moves days later).
    /// Days that would fall outside `[0, capacity)` are dropped.
    pub fn shifted(&self, offset: isize) -> DaySet {
        let mut result = DaySet::empty(self.capacity);
        if offset == 0 {
            result.words.clone_from(&self.words);
            return result;
        }
        for day in self.iter_days() {
            let shifted = day as isize + offset;
            if shifted >= 0 && (shifted as usize) < self.capacity {
                result.set(shifted as usize);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_contains() {
        let mut s = DaySet::empty(10);
        s.set(0);
        s.set(9);
        assert!(s.contains(0));
        assert!(s.contains(9));
        assert!(!s.contains(5));
    }

    #[test]
    fn union_intersection_difference() {
        let mut a = DaySet::empty(8);
        a.set(1);
        a.set(2);
        let mut b = DaySet::empty(8);
        b.set(2);
        b.set(3);

        assert_eq!(a.union(&b).iter_days().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(a.intersection(&b).iter_days().collect::<Vec<_>>(), vec![2]);
        assert_eq!(a.difference(&b).iter_days().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn subset_and_disjoint() {
        let mut a = DaySet::empty(8);
        a.set(1);
        let mut b = DaySet::empty(8);
        b.set(1);
        b.set(2);
        assert!(a.is_subset_of(&b));
        assert!(!a.is_disjoint(&b));

        let mut c = DaySet::empty(8);
        c.set(5);
        assert!(a.is_disjoint(&c));
    }

    #[test]
    fn shift_round_trips_within_capacity() {
        let mut a = DaySet::empty(16);
        a.set(3);
        a.set(10);
        let shifted = a.shifted(1).shifted(-1);
        assert_eq!(a, shifted);
    }

    #[test]
    fn shift_drops_out_of_range_days() {
        let mut a = DaySet::empty(8);
        a.set(7);
        let shifted = a.shifted(1);
        assert!(shifted.is_empty());
    }

    #[test]
    fn last_day_is_highest_set_bit() {
        let mut a = DaySet::empty(200);
        assert_eq!(a.last_day(), None);
        a.set(5);
        a.set(130);
        assert_eq!(a.last_day(), Some(130));
    }
}
