/// Number of selectable patch ranges.
pub const RANGE_COUNT: u8 = 5;

const MAX_PATCH: [u16; RANGE_COUNT as usize] = [127, 199, 299, 799, 998];

/// Index into the fixed table of patch number maxima. Always `< RANGE_COUNT`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PatchRange(u8);

impl PatchRange {
    pub const DEFAULT: PatchRange = PatchRange(0);

    /// Interpret a stored byte, reducing it modulo the number of ranges.
    pub fn from_stored(byte: u8) -> PatchRange {
        PatchRange(byte % RANGE_COUNT)
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    pub fn max_patch(&self) -> u16 {
        MAX_PATCH[self.0 as usize]
    }

    pub fn next(&self) -> PatchRange {
        PatchRange((self.0 + 1) % RANGE_COUNT)
    }

    /// Ranges past the first need a bank select to address every patch.
    pub fn is_default(&self) -> bool {
        self.0 == 0
    }
}

/// Active program number together with the range it lives in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PatchSelection {
    patch: u16,
    range: PatchRange,
}

impl PatchSelection {
    pub fn new(range: PatchRange) -> PatchSelection {
        PatchSelection { patch: 0, range }
    }

    pub fn patch(&self) -> u16 {
        self.patch
    }

    pub fn range(&self) -> PatchRange {
        self.range
    }

    pub fn increment(&mut self) {
        self.patch = if self.patch >= self.range.max_patch() {
            0
        } else {
            self.patch + 1
        };
    }

    pub fn decrement(&mut self) {
        self.patch = if self.patch == 0 {
            self.range.max_patch()
        } else {
            self.patch - 1
        };
    }

    /// Switch range, clamping the patch to the new maximum.
    pub fn set_range(&mut self, range: PatchRange) {
        self.range = range;
        self.patch = self.patch.min(range.max_patch());
    }

    /// Select a patch read back from storage, clamped to the active range.
    pub fn restore(&mut self, patch: u16) {
        self.patch = patch.min(self.range.max_patch());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_from_stored_should_wrap_modulo_range_count() {
        assert_eq!(0, PatchRange::from_stored(0).index());
        assert_eq!(4, PatchRange::from_stored(4).index());
        assert_eq!(0, PatchRange::from_stored(5).index());
        assert_eq!(0, PatchRange::from_stored(0xFF).index());
        assert_eq!(2, PatchRange::from_stored(7).index());
    }

    #[test]
    fn range_next_should_cycle_through_all_maxima() {
        let mut range = PatchRange::DEFAULT;
        let mut maxima = [0u16; 5];
        for max in maxima.iter_mut() {
            *max = range.max_patch();
            range = range.next();
        }
        assert_eq!([127, 199, 299, 799, 998], maxima);
        assert_eq!(PatchRange::DEFAULT, range);
    }

    #[test]
    fn increment_should_wrap_to_zero_past_max() {
        let mut selection = PatchSelection::new(PatchRange::DEFAULT);
        selection.restore(127);
        selection.increment();
        assert_eq!(0, selection.patch());
    }

    #[test]
    fn decrement_should_wrap_to_max_below_zero() {
        let mut selection = PatchSelection::new(PatchRange::from_stored(4));
        selection.decrement();
        assert_eq!(998, selection.patch());
        selection.decrement();
        assert_eq!(997, selection.patch());
    }

    #[test]
    fn set_range_should_clamp_patch() {
        let mut selection = PatchSelection::new(PatchRange::from_stored(3));
        selection.restore(500);
        selection.set_range(PatchRange::from_stored(1));
        assert_eq!(199, selection.patch());
        selection.set_range(PatchRange::from_stored(4));
        assert_eq!(199, selection.patch());
    }

    #[test]
    fn restore_should_clamp_to_active_range() {
        let mut selection = PatchSelection::new(PatchRange::DEFAULT);
        selection.restore(900);
        assert_eq!(127, selection.patch());
        selection.restore(42);
        assert_eq!(42, selection.patch());
    }

    #[test]
    fn stepping_should_stay_within_range_in_both_directions() {
        let mut selection = PatchSelection::new(PatchRange::from_stored(1));
        for _ in 0..450 {
            selection.increment();
            assert!(selection.patch() <= 199);
        }
        for _ in 0..450 {
            selection.decrement();
            assert!(selection.patch() <= 199);
        }
    }
}
