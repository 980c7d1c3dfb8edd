//! Clone-aware binary min-heap.
//!
//! [`CandidateQueue`] orders its items by an injected `priority` function instead of
//! `Ord`, so the same heap serves insertion candidates (keyed by cost) and whole tour
//! branches (keyed by their projected length). Besides the usual push/pop/peek it can
//! scan, bulk-delete and bulk-rewrite its contents, restoring heap order once afterward.

use ordered_float::OrderedFloat;

/// Binary min-heap keyed by `priority(item)`.
#[derive(Clone)]
pub struct CandidateQueue<T> {
    items: Vec<T>,
    priority: fn(&T) -> f64,
}

impl<T: std::fmt::Debug> std::fmt::Debug for CandidateQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateQueue").field("items", &self.items).finish()
    }
}

impl<T> CandidateQueue<T> {
    pub fn new(priority: fn(&T) -> f64) -> Self {
        CandidateQueue {
            items: Vec::new(),
            priority,
        }
    }

    pub fn with_capacity(priority: fn(&T) -> f64, capacity: usize) -> Self {
        CandidateQueue {
            items: Vec::with_capacity(capacity),
            priority,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Priority of an item under this queue's ordering
    pub fn priority_of(&self, item: &T) -> f64 {
        (self.priority)(item)
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.sift_up(self.items.len() - 1);
    }

    /// Append every item, then heapify once.
    pub fn push_all<I: IntoIterator<Item = T>>(&mut self, items: I) {
        self.items.extend(items);
        self.heapify();
    }

    pub fn pop(&mut self) -> Option<T> {
        let last = self.items.pop()?;
        if self.items.is_empty() {
            return Some(last);
        }

        let top = std::mem::replace(&mut self.items[0], last);
        self.sift_down(0);
        Some(top)
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    /// Whether any item satisfies `pred`. Does not mutate.
    pub fn any_match<F: FnMut(&T) -> bool>(&self, pred: F) -> bool {
        self.items.iter().any(pred)
    }

    /// Remove every item satisfying `pred`.
    pub fn delete_all<F: FnMut(&T) -> bool>(&mut self, mut pred: F) {
        self.items.retain(|item| !pred(item));
        self.heapify();
    }

    /// Rewrite the queue: `f` receives each item by value and pushes zero, one or many
    /// replacements into `out`.
    ///
    /// Items are visited in storage order (the order [`CandidateQueue::iter`] yields).
    /// Whatever `f` pushes fully replaces the visited item.
    pub fn replace_all<F: FnMut(T, &mut Vec<T>)>(&mut self, mut f: F) {
        let old = std::mem::take(&mut self.items);
        let mut out = Vec::with_capacity(old.len());
        for item in old {
            f(item, &mut out);
        }
        self.items = out;
        self.heapify();
    }

    /// Items in storage order, not priority order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drains the queue in priority order
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        let mut sorted = Vec::with_capacity(self.items.len());
        while let Some(item) = self.pop() {
            sorted.push(item);
        }
        sorted
    }

    #[inline]
    fn less(&self, i: usize, j: usize) -> bool {
        OrderedFloat((self.priority)(&self.items[i])) < OrderedFloat((self.priority)(&self.items[j]))
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !self.less(i, parent) {
                break;
            }
            self.items.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let n = self.items.len();
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut smallest = i;

            if left < n && self.less(left, smallest) {
                smallest = left;
            }
            if right < n && self.less(right, smallest) {
                smallest = right;
            }
            if smallest == i {
                break;
            }

            self.items.swap(i, smallest);
            i = smallest;
        }
    }

    fn heapify(&mut self) {
        for i in (0..self.items.len() / 2).rev() {
            self.sift_down(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_value(x: &f64) -> f64 {
        *x
    }

    fn by_first(x: &(f64, char)) -> f64 {
        x.0
    }

    fn is_heap(q: &CandidateQueue<f64>) -> bool {
        let items: Vec<f64> = q.iter().copied().collect();
        (1..items.len()).all(|i| items[(i - 1) / 2] <= items[i])
    }

    #[test]
    fn test_pop_in_priority_order() {
        let mut q = CandidateQueue::new(by_value);
        for x in [5.0, 1.0, 4.0, -2.0, 3.0] {
            q.push(x);
        }
        assert_eq!(q.peek(), Some(&-2.0));
        assert_eq!(q.into_sorted_vec(), vec![-2.0, 1.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_empty_queue_yields_none() {
        let mut q: CandidateQueue<f64> = CandidateQueue::new(by_value);
        assert!(q.peek().is_none());
        assert!(q.pop().is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn test_push_all_heapifies() {
        let mut q = CandidateQueue::new(by_value);
        q.push_all(vec![9.0, 7.0, 8.0, 1.0, 6.0, 2.0, 0.5]);
        assert!(is_heap(&q));
        assert_eq!(q.pop(), Some(0.5));
        assert_eq!(q.len(), 6);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut q = CandidateQueue::new(by_value);
        q.push_all(vec![3.0, 1.0, 2.0]);
        let mut copy = q.clone();
        copy.pop();
        copy.push(-1.0);

        assert_eq!(q.len(), 3);
        assert_eq!(q.peek(), Some(&1.0));
        assert_eq!(copy.peek(), Some(&-1.0));
    }

    #[test]
    fn test_any_match_and_delete_all() {
        let mut q = CandidateQueue::new(by_first);
        q.push_all(vec![(1.0, 'a'), (2.0, 'b'), (0.5, 'a'), (3.0, 'c')]);
        assert!(q.any_match(|x| x.1 == 'c'));
        assert!(!q.any_match(|x| x.1 == 'z'));

        q.delete_all(|x| x.1 == 'a');
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some((2.0, 'b')));
    }

    #[test]
    fn test_replace_all_expands_drops_and_reorders() {
        let mut q = CandidateQueue::new(by_value);
        q.push_all(vec![1.0, 2.0, 3.0, 4.0]);

        // drop 1, split 4 into two cheap items, pass the rest through
        q.replace_all(|x, out| {
            if x == 1.0 {
                return;
            }
            if x == 4.0 {
                out.push(0.25);
                out.push(10.0);
                return;
            }
            out.push(x);
        });

        assert!(is_heap(&q));
        assert_eq!(q.into_sorted_vec(), vec![0.25, 2.0, 3.0, 10.0]);
    }

    #[test]
    fn test_nan_priorities_do_not_break_order() {
        let mut q = CandidateQueue::new(by_value);
        q.push_all(vec![f64::NAN, 1.0, 0.0]);
        assert_eq!(q.pop(), Some(0.0));
        assert_eq!(q.pop(), Some(1.0));
        assert!(q.pop().unwrap().is_nan());
    }
}
