//! Region quadtree used as the per-frame broad phase
//!
//! The tree stores copies of small handles (entity indices), never the
//! entities themselves. It is cleared and rebuilt every frame, so there is
//! no removal or update path.
//!
//! Containment is strict at the midlines: a box touching a quadrant
//! boundary stays at the parent. Retrieval is conservative and may return
//! handles whose boxes do not overlap the query, so callers run an exact
//! shape test on every candidate.

use super::bounds::Aabb;

/// A quadtree node; the root is just a node at level 0
#[derive(Debug, Clone)]
pub struct Quadtree<T> {
    bounds: Aabb,
    max_objects: usize,
    max_levels: u32,
    level: u32,
    objects: Vec<(Aabb, T)>,
    /// Children in NE, NW, SW, SE order
    nodes: Option<Box<[Quadtree<T>; 4]>>,
}

impl<T: Copy> Quadtree<T> {
    pub fn new(bounds: Aabb, max_objects: usize, max_levels: u32) -> Self {
        Self::with_level(bounds, max_objects, max_levels, 0)
    }

    fn with_level(bounds: Aabb, max_objects: usize, max_levels: u32, level: u32) -> Self {
        Self {
            bounds,
            max_objects,
            max_levels,
            level,
            objects: Vec::new(),
            nodes: None,
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Drop every stored handle and every child node
    pub fn clear(&mut self) {
        self.objects.clear();
        self.nodes = None;
    }

    /// Total number of handles reachable from this node
    pub fn len(&self) -> usize {
        self.objects.len()
            + self
                .nodes
                .as_ref()
                .map_or(0, |nodes| nodes.iter().map(Quadtree::len).sum())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deepest level that currently has a node
    pub fn depth(&self) -> u32 {
        match &self.nodes {
            Some(nodes) => nodes.iter().map(Quadtree::depth).max().unwrap_or(self.level),
            None => self.level,
        }
    }

    /// Handles stored directly at this node (not in children)
    pub fn direct_len(&self) -> usize {
        self.objects.len()
    }

    /// Which child quadrant fully contains `rect`, if exactly one does
    fn index_of(&self, rect: &Aabb) -> Option<usize> {
        let b = &self.bounds;
        let inside = rect.x >= b.x && rect.y >= b.y && rect.right() <= b.right() && rect.bottom() <= b.bottom();
        if !inside {
            return None;
        }

        let vertical_mid = b.x + b.width / 2.0;
        let horizontal_mid = b.y + b.height / 2.0;

        let top = rect.bottom() < horizontal_mid;
        let bottom = rect.y > horizontal_mid;
        let left = rect.right() < vertical_mid;
        let right = rect.x > vertical_mid;

        match (left, right, top, bottom) {
            (false, true, true, false) => Some(0),
            (true, false, true, false) => Some(1),
            (true, false, false, true) => Some(2),
            (false, true, false, true) => Some(3),
            _ => None,
        }
    }

    fn split(&mut self) {
        let level = self.level + 1;
        let [ne, nw, sw, se] = self.bounds.quadrants();
        let make = |b| Quadtree::with_level(b, self.max_objects, self.max_levels, level);
        self.nodes = Some(Box::new([make(ne), make(nw), make(sw), make(se)]));
    }

    /// Insert a handle with its bounding box
    pub fn insert(&mut self, rect: Aabb, handle: T) {
        if let Some(index) = self.index_of(&rect) {
            if let Some(nodes) = self.nodes.as_mut() {
                nodes[index].insert(rect, handle);
                return;
            }
        }

        self.objects.push((rect, handle));

        if self.objects.len() > self.max_objects && self.level < self.max_levels {
            if self.nodes.is_none() {
                self.split();
            }
            let held = std::mem::take(&mut self.objects);
            for (rect, handle) in held {
                match self.index_of(&rect) {
                    Some(index) => {
                        if let Some(nodes) = self.nodes.as_mut() {
                            nodes[index].insert(rect, handle);
                        }
                    }
                    None => self.objects.push((rect, handle)),
                }
            }
        }
    }

    /// Candidate handles whose boxes may overlap `area`
    pub fn retrieve(&self, area: &Aabb) -> Vec<T> {
        let mut out = Vec::new();
        self.retrieve_into(area, &mut out);
        out
    }

    /// Like [`Quadtree::retrieve`] but appends into a reusable buffer
    pub fn retrieve_into(&self, area: &Aabb, out: &mut Vec<T>) {
        out.extend(self.objects.iter().map(|(_, handle)| *handle));

        if let Some(nodes) = &self.nodes {
            match self.index_of(area) {
                Some(index) => nodes[index].retrieve_into(area, out),
                None => {
                    for node in nodes.iter() {
                        node.retrieve_into(area, out);
                    }
                }
            }
        }
    }
}
