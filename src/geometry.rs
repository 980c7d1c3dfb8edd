//! Segments and closed tours.
//!
//! A [`Tour`] never owns points: it stores successor/predecessor ids in flat arrays
//! indexed by point id, so cloning a tour is a plain array copy and every edge lookup
//! is O(1).

use crate::instance::Point;

/// A directed tour edge `start -> end`.
///
/// Equality only looks at the endpoint ids; `length` is derived from them.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub length: f64,
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.start.id == other.start.id && self.end.id == other.end.id
    }
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Segment {
            start,
            end,
            length: start.distance_to(&end),
        }
    }

    /// Length increase from splicing `point` between `start` and `end`
    #[inline]
    pub fn insertion_cost(&self, point: &Point) -> f64 {
        self.start.distance_to(point) + point.distance_to(&self.end) - self.length
    }

    /// The two segments that replace this one once `point` is spliced in
    pub fn split(&self, point: &Point) -> (Segment, Segment) {
        (Segment::new(self.start, *point), Segment::new(*point, self.end))
    }

    /// Whether `id` is one of the endpoints
    #[inline]
    pub fn touches(&self, id: usize) -> bool {
        self.start.id == id || self.end.id == id
    }
}

/// Result of detaching a point from a tour
#[derive(Debug, Clone, Copy)]
pub struct Merge {
    /// `prev -> point`
    pub removed_a: Segment,
    /// `point -> next`
    pub removed_b: Segment,
    /// `prev -> next`
    pub merged: Segment,
}

/// A closed ordered sequence of point ids.
#[derive(Debug, Clone)]
pub struct Tour {
    next: Vec<Option<usize>>,
    prev: Vec<Option<usize>>,
    anchor: Option<usize>,
    len: usize,
}

impl Tour {
    /// Empty tour able to hold ids `0..capacity`
    pub fn new(capacity: usize) -> Self {
        Tour {
            next: vec![None; capacity],
            prev: vec![None; capacity],
            anchor: None,
            len: 0,
        }
    }

    /// Closed tour visiting `order` in sequence
    pub fn from_order(capacity: usize, order: &[usize]) -> Self {
        let mut tour = Tour::new(capacity);
        let n = order.len();
        for (i, &id) in order.iter().enumerate() {
            let next = order[(i + 1) % n];
            tour.next[id] = Some(next);
            tour.prev[next] = Some(id);
        }
        tour.anchor = order.first().copied();
        tour.len = n;
        tour
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, id: usize) -> bool {
        self.next.get(id).map_or(false, |n| n.is_some())
    }

    pub fn successor(&self, id: usize) -> Option<usize> {
        self.next.get(id).copied().flatten()
    }

    pub fn predecessor(&self, id: usize) -> Option<usize> {
        self.prev.get(id).copied().flatten()
    }

    /// Whether `segment` is currently an edge of this tour
    pub fn has_segment(&self, segment: &Segment) -> bool {
        self.successor(segment.start.id) == Some(segment.end.id)
    }

    /// Point ids in tour order, starting from the anchor
    pub fn order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.len);
        let Some(start) = self.anchor else {
            return order;
        };

        let mut current = start;
        loop {
            order.push(current);
            match self.successor(current) {
                Some(next) if next != start => current = next,
                _ => break,
            }
        }
        order
    }

    /// Edges in tour order
    pub fn segments(&self, points: &[Point]) -> Vec<Segment> {
        self.order()
            .into_iter()
            .filter_map(|id| {
                self.successor(id)
                    .map(|next| Segment::new(points[id], points[next]))
            })
            .collect()
    }

    /// Sum of edge lengths, recomputed from scratch
    pub fn length(&self, points: &[Point]) -> f64 {
        self.segments(points).iter().map(|s| s.length).sum()
    }

    /// Splice `point` into `segment`.
    ///
    /// # Panics
    ///
    /// If `segment` is not an edge of the tour. That only happens when the candidate
    /// bookkeeping of the caller is broken.
    pub fn split(&mut self, segment: &Segment, point: &Point) -> (Segment, Segment) {
        if !self.has_segment(segment) {
            panic!(
                "segment not found: {} -> {} is not an edge of the tour",
                segment.start.id, segment.end.id
            );
        }
        debug_assert!(!self.contains(point.id), "point {} already attached", point.id);

        let (a, b) = (segment.start.id, segment.end.id);
        self.next[a] = Some(point.id);
        self.prev[point.id] = Some(a);
        self.next[point.id] = Some(b);
        self.prev[b] = Some(point.id);
        self.len += 1;

        segment.split(point)
    }

    /// Detach `id` and close the gap between its neighbours.
    ///
    /// # Panics
    ///
    /// If `id` is not part of the tour.
    pub fn merge(&mut self, points: &[Point], id: usize) -> Merge {
        let (Some(prev), Some(next)) = (self.predecessor(id), self.successor(id)) else {
            panic!("point {} is not part of the tour", id);
        };

        self.next[prev] = Some(next);
        self.prev[next] = Some(prev);
        self.next[id] = None;
        self.prev[id] = None;
        self.len -= 1;
        if self.anchor == Some(id) {
            self.anchor = if self.len == 0 { None } else { Some(next) };
        }

        Merge {
            removed_a: Segment::new(points[prev], points[id]),
            removed_b: Segment::new(points[id], points[next]),
            merged: Segment::new(points[prev], points[next]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0, 0.0, 0.0),
            Point::new(1, 4.0, 0.0),
            Point::new(2, 4.0, 3.0),
            Point::new(3, 0.0, 3.0),
            Point::new(4, 2.0, 1.0),
        ]
    }

    #[test]
    fn test_insertion_cost_is_triangle_excess() {
        let pts = square();
        let seg = Segment::new(pts[0], pts[1]);
        let expected = 2.0 * (5.0f64).sqrt() - 4.0;
        assert!((seg.insertion_cost(&pts[4]) - expected).abs() < 1e-12);
        assert!(seg.insertion_cost(&pts[0]).abs() < 1e-12);
    }

    #[test]
    fn test_segment_equality_is_directed() {
        let pts = square();
        assert_eq!(Segment::new(pts[0], pts[1]), Segment::new(pts[0], pts[1]));
        assert_ne!(Segment::new(pts[0], pts[1]), Segment::new(pts[1], pts[0]));
    }

    #[test]
    fn test_split_and_merge_keep_tour_closed() {
        let pts = square();
        let mut tour = Tour::from_order(pts.len(), &[0, 1, 2, 3]);
        assert!((tour.length(&pts) - 14.0).abs() < 1e-12);

        let (left, right) = tour.split(&Segment::new(pts[0], pts[1]), &pts[4]);
        assert_eq!(left, Segment::new(pts[0], pts[4]));
        assert_eq!(right, Segment::new(pts[4], pts[1]));
        assert_eq!(tour.order(), vec![0, 4, 1, 2, 3]);
        assert_eq!(tour.len(), 5);

        let merge = tour.merge(&pts, 4);
        assert_eq!(merge.merged, Segment::new(pts[0], pts[1]));
        assert_eq!(merge.removed_a, left);
        assert_eq!(merge.removed_b, right);
        assert_eq!(tour.order(), vec![0, 1, 2, 3]);
        assert!(!tour.contains(4));
    }

    #[test]
    fn test_merging_the_anchor_moves_it() {
        let pts = square();
        let mut tour = Tour::from_order(pts.len(), &[0, 1, 2]);
        tour.merge(&pts, 0);
        assert_eq!(tour.order(), vec![1, 2]);
    }

    #[test]
    fn test_single_point_tour_is_a_self_loop() {
        let pts = square();
        let mut tour = Tour::from_order(pts.len(), &[2]);
        assert_eq!(tour.segments(&pts).len(), 1);
        assert_eq!(tour.length(&pts), 0.0);

        tour.split(&Segment::new(pts[2], pts[2]), &pts[0]);
        assert_eq!(tour.order(), vec![2, 0]);
        assert!((tour.length(&pts) - 10.0).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "segment not found")]
    fn test_split_on_missing_segment_panics() {
        let pts = square();
        let mut tour = Tour::from_order(pts.len(), &[0, 1, 2, 3]);
        tour.split(&Segment::new(pts[1], pts[0]), &pts[4]);
    }
}
