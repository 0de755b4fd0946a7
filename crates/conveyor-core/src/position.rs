//! Position views: a belt narrowed down to a single slot.
//!
//! A worker is handed a [`PositionControl`] rather than the belt, so it can
//! only ever touch the slot it stands at and never carries an index around.

use crate::belt::{BeltError, ConveyorBelt};
use crate::item::Item;

/// Operations available at one fixed belt slot.
pub trait PositionControl {
    fn collect(&mut self) -> Result<Item, BeltError>;
    fn place(&mut self, item: Item) -> Result<(), BeltError>;
    fn is_empty(&self) -> Result<bool, BeltError>;
    fn is_reserved(&self) -> Result<bool, BeltError>;
    fn peek(&self) -> Result<Option<&Item>, BeltError>;

    /// Whether a state-changing operation could still succeed here this
    /// timeslot. Out-of-range positions are never available.
    fn is_available(&self) -> bool {
        !self.is_reserved().unwrap_or(true)
    }
}

impl<P: PositionControl + ?Sized> PositionControl for &mut P {
    fn collect(&mut self) -> Result<Item, BeltError> {
        (**self).collect()
    }
    fn place(&mut self, item: Item) -> Result<(), BeltError> {
        (**self).place(item)
    }
    fn is_empty(&self) -> Result<bool, BeltError> {
        (**self).is_empty()
    }
    fn is_reserved(&self) -> Result<bool, BeltError> {
        (**self).is_reserved()
    }
    fn peek(&self) -> Result<Option<&Item>, BeltError> {
        (**self).peek()
    }
}

/// A belt borrowed for one slot.
///
/// The view borrows the belt exclusively, so it can never outlive it. Views
/// for the two sides of one slot are created one after the other within a
/// timeslot; both read the same reservation flag, so whichever side acts
/// first blocks the other until the next rotation.
#[derive(Debug)]
pub struct PositionView<'b, B: ConveyorBelt + ?Sized> {
    belt: &'b mut B,
    pos: usize,
}

impl<'b, B: ConveyorBelt + ?Sized> PositionView<'b, B> {
    /// Bind a view to slot `pos` of `belt`.
    pub fn new(belt: &'b mut B, pos: usize) -> Result<Self, BeltError> {
        let capacity = belt.capacity();
        if pos >= capacity {
            return Err(BeltError::OutOfRange { pos, capacity });
        }
        Ok(Self { belt, pos })
    }

    /// The slot this view is bound to.
    pub fn pos(&self) -> usize {
        self.pos
    }
}

impl<B: ConveyorBelt + ?Sized> PositionControl for PositionView<'_, B> {
    fn collect(&mut self) -> Result<Item, BeltError> {
        self.belt.collect(self.pos)
    }

    fn place(&mut self, item: Item) -> Result<(), BeltError> {
        self.belt.place(item, self.pos)
    }

    fn is_empty(&self) -> Result<bool, BeltError> {
        self.belt.is_empty(self.pos)
    }

    fn is_reserved(&self) -> Result<bool, BeltError> {
        self.belt.is_reserved(self.pos)
    }

    fn peek(&self) -> Result<Option<&Item>, BeltError> {
        self.belt.peek(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belt::Belt;
    use crate::id::PartId;

    fn item(code: char) -> Item {
        Item::new(PartId::from_char(code))
    }

    #[test]
    fn view_beyond_capacity_rejected() {
        let mut belt = Belt::new(2).unwrap();
        let err = PositionView::new(&mut belt, 2).unwrap_err();
        assert_eq!(err, BeltError::OutOfRange { pos: 2, capacity: 2 });
    }

    #[test]
    fn view_forwards_to_its_slot_only() {
        let mut belt = Belt::new(3).unwrap();
        {
            let mut view = PositionView::new(&mut belt, 1).unwrap();
            assert_eq!(view.pos(), 1);
            assert!(view.is_empty().unwrap());
            view.place(item('A')).unwrap();
            assert!(view.is_reserved().unwrap());
            assert_eq!(view.peek().unwrap(), Some(&item('A')));
        }
        assert!(belt.is_empty(0).unwrap());
        assert_eq!(belt.peek(1).unwrap(), Some(&item('A')));
        assert!(belt.is_empty(2).unwrap());
    }

    #[test]
    fn two_views_share_one_reservation() {
        let mut belt = Belt::new(1).unwrap();
        belt.enqueue(item('A')).unwrap();

        let mut front = PositionView::new(&mut belt, 0).unwrap();
        assert!(front.is_available());
        assert_eq!(front.collect().unwrap(), item('A'));

        let mut back = PositionView::new(&mut belt, 0).unwrap();
        assert!(!back.is_available());
        assert_eq!(back.place(item('P')).unwrap_err(), BeltError::ReservedSlot { pos: 0 });
    }

    #[test]
    fn views_work_over_dyn_belts() {
        let mut belt = Belt::new(2).unwrap();
        let dyn_belt: &mut dyn ConveyorBelt = &mut belt;
        let mut view = PositionView::new(dyn_belt, 0).unwrap();
        view.place(item('B')).unwrap();
        assert_eq!(belt.peek(0).unwrap(), Some(&item('B')));
    }
}
