//! FIFO tests: capacity limits, ordering, and wrap-around.
use super::*;
use crate::protocol::frame::FrameFormat;

fn frame(id: u32) -> CanFrame {
    CanFrame::new(FrameFormat::ClassicStd, id)
}

#[test]
/// N pushes fill the queue; the next one is rejected.
fn test_fill_and_drain() {
    let mut fifo: FifoQueue<4> = FifoQueue::new();
    assert!(fifo.is_empty());

    for id in 0..4 {
        assert_eq!(fifo.push(frame(id)), Ok(()));
    }
    assert!(fifo.is_full());
    assert_eq!(fifo.len(), 4);
    assert_eq!(fifo.push(frame(99)), Err(FifoError::Full));

    for id in 0..4 {
        assert_eq!(fifo.pop().map(|f| f.identifier()), Ok(id));
    }
    assert!(fifo.is_empty());
    assert_eq!(fifo.pop(), Err(FifoError::Empty));
}

#[test]
/// Order is preserved across the wrap-around point.
fn test_wrap_around_keeps_order() {
    let mut fifo: FifoQueue<3> = FifoQueue::new();
    fifo.push(frame(1)).unwrap();
    fifo.push(frame(2)).unwrap();
    assert_eq!(fifo.pop().unwrap().identifier(), 1);
    fifo.push(frame(3)).unwrap();
    fifo.push(frame(4)).unwrap();
    assert!(fifo.is_full());

    assert_eq!(fifo.peek().map(|f| f.identifier()), Some(2));
    let drained = [
        fifo.pop().unwrap().identifier(),
        fifo.pop().unwrap().identifier(),
        fifo.pop().unwrap().identifier(),
    ];
    assert_eq!(drained, [2, 3, 4]);
}

#[test]
/// A zero-capacity queue is both empty and full.
fn test_zero_capacity() {
    let mut fifo: FifoQueue<0> = FifoQueue::new();
    assert!(fifo.is_empty());
    assert!(fifo.is_full());
    assert_eq!(fifo.push(frame(1)), Err(FifoError::Full));
}

#[test]
/// `clear` empties the queue.
fn test_clear() {
    let mut fifo: FifoQueue<2> = FifoQueue::new();
    fifo.push(frame(1)).unwrap();
    fifo.clear();
    assert!(fifo.is_empty());
    assert_eq!(fifo.peek(), None);
}
