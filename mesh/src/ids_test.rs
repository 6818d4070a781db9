use super::*;

#[test]
fn allocates_in_increasing_order() {
    let mut ids = IdAllocator::starting_at(1);
    assert_eq!(ids.allocate(), 1);
    assert_eq!(ids.allocate(), 2);
    assert_eq!(ids.allocate(), 3);
}

#[test]
fn peek_does_not_consume() {
    let mut ids = IdAllocator::starting_at(0);
    assert_eq!(ids.peek(), 0);
    assert_eq!(ids.allocate(), 0);
    assert_eq!(ids.peek(), 1);
}

#[test]
fn observe_skips_past_loaded_ids() {
    let mut ids = IdAllocator::starting_at(1);
    ids.observe(7);
    assert_eq!(ids.allocate(), 8);
}

#[test]
fn observe_lower_id_is_noop() {
    let mut ids = IdAllocator::starting_at(10);
    ids.observe(3);
    assert_eq!(ids.allocate(), 10);
}
