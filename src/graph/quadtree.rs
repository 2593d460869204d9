//! Barnes-Hut quadtree for O(n log n) repulsion.
//!
//! Every body has unit mass. A distant cell pushes like a single body of
//! `count` mass at its centroid instead of visiting each member.

use egui::{Pos2, Vec2};

/// Padding added around the node bounding box
const PADDING: f32 = 100.0;

/// Recursion cap for coincident points; deeper bodies only count toward
/// their ancestors' centroids
const MAX_DEPTH: u32 = 50;

/// Square region of the plane
#[derive(Debug, Clone, Copy)]
struct Cell {
    center: Pos2,
    half: f32,
}

impl Cell {
    fn contains(&self, p: Pos2) -> bool {
        (p.x - self.center.x).abs() <= self.half && (p.y - self.center.y).abs() <= self.half
    }

    /// Child slot for `p`: bit 0 set east of center, bit 1 set south of it
    fn slot(&self, p: Pos2) -> usize {
        usize::from(p.x >= self.center.x) | usize::from(p.y >= self.center.y) << 1
    }

    fn child(&self, slot: usize) -> Cell {
        let q = self.half / 2.0;
        let dx = if slot & 1 == 1 { q } else { -q };
        let dy = if slot & 2 == 2 { q } else { -q };
        Cell {
            center: self.center + Vec2::new(dx, dy),
            half: q,
        }
    }
}

#[derive(Debug, Default)]
enum Body {
    #[default]
    Empty,
    One(Pos2),
    Many {
        /// Sum of member positions; centroid is `sum / count`
        sum: Vec2,
        count: u32,
        children: Box<[Body; 4]>,
    },
}

pub struct Quadtree {
    root: Body,
    cell: Cell,
    /// Cell width / distance below which a cell is approximated.
    /// Higher = faster but less accurate.
    theta: f32,
}

impl Quadtree {
    pub fn build(positions: &[Pos2], theta: f32) -> Self {
        let mut tree = Self {
            root: Body::Empty,
            cell: Cell {
                center: Pos2::ZERO,
                half: 0.0,
            },
            theta,
        };
        let Some(&first) = positions.first() else {
            return tree;
        };

        let (min, max) = positions
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        let extent = (max - min).max_elem();
        tree.cell = Cell {
            center: min + (max - min) / 2.0,
            half: extent / 2.0 + PADDING,
        };
        for &pos in positions {
            insert(&mut tree.root, tree.cell, pos, 0);
        }
        tree
    }

    /// Velocity change pushing a body at `pos` away from every other body.
    ///
    /// A cell containing `pos` is always opened, so a body never feels its
    /// own mass. Bodies at exactly the same position contribute nothing.
    pub fn calculate_force(&self, pos: Pos2, repulsion: f32) -> Vec2 {
        self.force_from(&self.root, self.cell, pos, repulsion)
    }

    fn force_from(&self, body: &Body, cell: Cell, pos: Pos2, repulsion: f32) -> Vec2 {
        match body {
            Body::Empty => Vec2::ZERO,
            Body::One(other) => push(pos, *other, repulsion),
            Body::Many { sum, count, children } => {
                let centroid = (*sum / *count as f32).to_pos2();
                let distance = pos.distance(centroid);
                let far = distance > 0.0 && cell.half * 2.0 / distance < self.theta;
                if far && !cell.contains(pos) {
                    push(pos, centroid, repulsion * *count as f32)
                } else {
                    children
                        .iter()
                        .enumerate()
                        .map(|(slot, child)| self.force_from(child, cell.child(slot), pos, repulsion))
                        .fold(Vec2::ZERO, |acc, f| acc + f)
                }
            }
        }
    }
}

fn insert(body: &mut Body, cell: Cell, pos: Pos2, depth: u32) {
    if depth > MAX_DEPTH {
        return;
    }
    match body {
        Body::Empty => *body = Body::One(pos),
        Body::One(existing) => {
            let existing = *existing;
            let mut children: Box<[Body; 4]> = Box::default();
            children[cell.slot(existing)] = Body::One(existing);
            *body = Body::Many {
                sum: existing.to_vec2(),
                count: 1,
                children,
            };
            insert(body, cell, pos, depth);
        }
        Body::Many { sum, count, children } => {
            *sum += pos.to_vec2();
            *count += 1;
            let slot = cell.slot(pos);
            insert(&mut children[slot], cell.child(slot), pos, depth + 1);
        }
    }
}

/// Inverse-square push of `pos` away from `from`
fn push(pos: Pos2, from: Pos2, strength: f32) -> Vec2 {
    let delta = pos - from;
    let distance = delta.length();
    if distance <= 0.0 {
        return Vec2::ZERO;
    }
    delta / distance * (strength / (distance * distance))
}
