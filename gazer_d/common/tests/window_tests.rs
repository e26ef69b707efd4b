use common::DataWindow;

#[test]
fn test_window_keeps_insertion_order_below_capacity() {
    let mut window = DataWindow::new(5);
    window.push(1);
    window.push(2);
    window.push(3);

    assert_eq!(window.len(), 3);
    assert!(!window.is_full());
    assert_eq!(window.to_vec(), vec![1, 2, 3], "logical order is oldest first");
    assert_eq!(window.get(0), Some(&1));
    assert_eq!(window.get(2), Some(&3));
}

#[test]
fn test_window_wrap_evicts_oldest() {
    let mut window = DataWindow::new(3);
    for value in 1..=5 {
        window.push(value);
    }

    assert!(window.is_full());
    assert_eq!(window.len(), 3);
    assert_eq!(
        window.to_vec(),
        vec![3, 4, 5],
        "pushing past capacity should drop the oldest entries"
    );
    assert_eq!(window.get(0), Some(&3), "index 0 is the oldest survivor");
    assert_eq!(window.get(2), Some(&5), "last index is the newest entry");
}

#[test]
fn test_window_get_out_of_range() {
    let mut window = DataWindow::new(3);
    window.push(7);

    assert_eq!(window.get(1), None);
    assert_eq!(window.get(100), None);
}

#[test]
fn test_window_extend_and_clear() {
    let mut window = DataWindow::new(4);
    window.extend([1, 2, 3, 4, 5, 6]);

    assert_eq!(window.to_vec(), vec![3, 4, 5, 6]);

    window.clear();
    assert!(window.is_empty());
    assert_eq!(window.get(0), None);

    // Reusable after clear, without leftover rotation.
    window.push(9);
    assert_eq!(window.to_vec(), vec![9]);
}

#[test]
fn test_zero_capacity_clamps_to_one() {
    let mut window = DataWindow::new(0);
    window.push(1);
    window.push(2);

    assert_eq!(window.capacity(), 1);
    assert_eq!(window.to_vec(), vec![2]);
}

#[test]
fn test_window_iter_matches_to_vec() {
    let mut window = DataWindow::new(3);
    window.extend([10, 20, 30, 40]);

    let via_iter: Vec<i32> = window.iter().copied().collect();
    assert_eq!(via_iter, window.to_vec());
    assert_eq!(window.capacity(), 3);
}
