/// Highlighted position over the current list of selectable items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionCursor {
    index: usize,
}

impl SelectionCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Moves by `direction` steps over `len` items, wrapping at both ends.
    /// Does nothing when the list is empty.
    pub fn advance(&mut self, direction: i32, len: usize) {
        if len == 0 {
            return;
        }
        let len = len as i64;
        let next = (self.index as i64 + direction as i64).rem_euclid(len);
        self.index = next as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle_returns_to_start() {
        for len in 1..6 {
            for start in 0..len {
                let mut cursor = SelectionCursor { index: start };
                for _ in 0..len {
                    cursor.advance(1, len);
                }
                assert_eq!(cursor.index(), start);
            }
        }
    }

    #[test]
    fn up_from_first_wraps_to_last() {
        let mut cursor = SelectionCursor::new();
        cursor.advance(-1, 4);
        assert_eq!(cursor.index(), 3);
        cursor.advance(1, 4);
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn empty_list_is_a_no_op() {
        let mut cursor = SelectionCursor::new();
        cursor.advance(1, 0);
        cursor.advance(-1, 0);
        assert_eq!(cursor.index(), 0);
    }
}
