//! Line buffer tests

use stepper_diag::shell::line_buffer::{LineBuffer, LINE_SIZE};

#[test]
fn accumulates_pushed_bytes() {
    let mut line = LineBuffer::new();
    for b in b"threads" {
        line.push(*b);
    }
    assert_eq!(line.as_str(), "threads");
    assert_eq!(line.len(), 7);
    assert!(!line.is_empty());
}

#[test]
fn rejects_input_past_capacity() {
    let mut line = LineBuffer::new();
    for _ in 0..LINE_SIZE {
        assert!(line.push(b'x'));
    }
    for _ in 0..10 {
        assert!(!line.push(b'x'));
    }
    assert_eq!(line.len(), LINE_SIZE);
}

#[test]
fn backspace_removes_last_byte() {
    let mut line = LineBuffer::new();
    line.push(b'm');
    line.push(b'e');
    line.push(b'x');
    line.backspace();
    line.push(b'm');
    assert_eq!(line.as_str(), "mem");
}

#[test]
fn backspace_on_empty_is_a_noop() {
    let mut line = LineBuffer::new();
    line.backspace();
    assert!(line.is_empty());
    assert_eq!(line.as_str(), "");
}

#[test]
fn clear_resets_contents() {
    let mut line = LineBuffer::new();
    line.push(b'a');
    line.clear();
    assert!(line.is_empty());
    assert_eq!(line.as_str(), "");
}
