use ordered_float::NotNan;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

// Entries with equal keys come out in the order they were pushed
struct HeapEntry<T> {
    key: NotNan<f64>,
    seq: u64,
    value: T,
}

impl<T> PartialEq for HeapEntry<T> {
    fn eq(&self, other: &HeapEntry<T>) -> bool {
        self.key == other.key && self.seq == other.seq
    }
}

impl<T> Eq for HeapEntry<T> {}

impl<T> PartialOrd for HeapEntry<T> {
    fn partial_cmp(&self, other: &HeapEntry<T>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for HeapEntry<T> {
    fn cmp(&self, other: &HeapEntry<T>) -> Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> HeapEntry<T> {
    fn to_tuple(&self) -> (f64, &T) {
        (self.key.into_inner(), &self.value)
    }
}

pub struct FloatBinaryHeap<T> {
    heap: BinaryHeap<HeapEntry<T>>,
    next_seq: u64,
}

impl<T> Default for FloatBinaryHeap<T> {
    fn default() -> Self {
        FloatBinaryHeap::new()
    }
}

impl<T> FloatBinaryHeap<T> {
    pub fn new() -> FloatBinaryHeap<T> {
        FloatBinaryHeap {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn push(&mut self, key: f64, value: T) {
        let key = match NotNan::new(key) {
            Ok(num) => num,
            Err(_) => panic!("Float is Nan in Heap"),
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(HeapEntry { key, seq, value })
    }

    pub fn peek(&self) -> Option<(f64, &T)> {
        self.heap.peek().map(|r| r.to_tuple())
    }

    pub fn pop(&mut self) -> Option<(f64, T)> {
        self.heap.pop().map(|r| (r.key.into_inner(), r.value))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_smallest_key_first() {
        let mut heap = FloatBinaryHeap::new();
        heap.push(3.0, "c");
        heap.push(1.0, "a");
        heap.push(2.0, "b");

        assert_eq!(heap.peek(), Some((1.0, &"a")));
        assert_eq!(heap.pop(), Some((1.0, "a")));
        assert_eq!(heap.pop(), Some((2.0, "b")));
        assert_eq!(heap.pop(), Some((3.0, "c")));
        assert_eq!(heap.pop(), None);
    }

    #[test]
    fn equal_keys_pop_in_insertion_order() {
        let mut heap = FloatBinaryHeap::new();
        for i in 0..10 {
            heap.push(5.0, i);
        }
        heap.push(4.0, 100);

        assert_eq!(heap.pop(), Some((4.0, 100)));
        let order: Vec<i32> = std::iter::from_fn(|| heap.pop().map(|(_, v)| v)).collect();
        assert_eq!(order, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn clear_empties_heap() {
        let mut heap = FloatBinaryHeap::new();
        heap.push(1.0, ());
        heap.push(2.0, ());
        assert_eq!(heap.len(), 2);

        heap.clear();
        assert!(heap.is_empty());
        assert_eq!(heap.peek(), None);
    }

    #[test]
    #[should_panic(expected = "Float is Nan in Heap")]
    fn nan_key_panics() {
        let mut heap = FloatBinaryHeap::new();
        heap.push(std::f64::NAN, ());
    }
}
