//! Skyline rectangle packer
//!
//! Packs axis-aligned rectangles into a fixed square region.
//! The skyline is a staircase of horizontal segments covering the full
//! width; each rectangle is dropped onto the lowest segment run it fits on.
//! Placed rectangles are never moved. A full packer only answers `None`,
//! growing the region is the owner's job.

/// One horizontal segment of the skyline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SkylineNode {
    x: u32,
    /// Top of the occupied area below this segment
    y: u32,
    width: u32,
}

/// Bottom-left skyline packer over a `side_length` x `side_length` square
#[derive(Debug, Clone)]
pub struct SkylinePacker {
    side_length: u32,
    skyline: Vec<SkylineNode>,
    placed: usize,
    used_area: u64,
}

impl SkylinePacker {
    pub fn new(side_length: u32) -> Self {
        let mut packer = Self {
            side_length,
            skyline: Vec::new(),
            placed: 0,
            used_area: 0,
        };
        packer.reset(side_length);
        packer
    }

    /// Discard all placements and start over on an empty square
    pub fn reset(&mut self, side_length: u32) {
        self.side_length = side_length;
        self.skyline.clear();
        self.skyline.push(SkylineNode {
            x: 0,
            y: 0,
            width: side_length,
        });
        self.placed = 0;
        self.used_area = 0;
    }

    pub fn side_length(&self) -> u32 {
        self.side_length
    }

    /// Number of non-empty rectangles placed since the last reset
    pub fn placed(&self) -> usize {
        self.placed
    }

    /// Total area of placed rectangles
    pub fn used_area(&self) -> u64 {
        self.used_area
    }

    /// Fraction of the square covered by placed rectangles (0.0-1.0)
    pub fn occupancy(&self) -> f32 {
        let total = self.side_length as u64 * self.side_length as u64;
        if total == 0 {
            return 0.0;
        }
        self.used_area as f32 / total as f32
    }

    /// Place a `width` x `height` rectangle, returning its top-left corner.
    ///
    /// Returns `None` when no free spot is large enough. Zero-area requests
    /// succeed at (0, 0) without reserving anything.
    pub fn try_place(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        if width == 0 || height == 0 {
            return Some((0, 0));
        }
        if width > self.side_length || height > self.side_length {
            return None;
        }

        // (node index, y, wasted area)
        let mut best: Option<(usize, u32, u64)> = None;
        for idx in 0..self.skyline.len() {
            if let Some((y, waste)) = self.fit(idx, width, height) {
                let better = match best {
                    None => true,
                    Some((_, best_y, best_waste)) => {
                        y < best_y || (y == best_y && waste < best_waste)
                    }
                };
                if better {
                    best = Some((idx, y, waste));
                }
            }
        }

        let (idx, y, _) = best?;
        let x = self.skyline[idx].x;
        self.occupy(idx, x, y, width, height);

        self.placed += 1;
        self.used_area += width as u64 * height as u64;
        Some((x, y))
    }

    /// Resting height and wasted area if a rectangle starts at node `idx`
    fn fit(&self, idx: usize, width: u32, height: u32) -> Option<(u32, u64)> {
        let x = self.skyline[idx].x;
        let right = x + width;
        if right > self.side_length {
            return None;
        }

        let mut end = idx;
        let mut y = 0;
        while end < self.skyline.len() && self.skyline[end].x < right {
            y = y.max(self.skyline[end].y);
            end += 1;
        }
        if y + height > self.side_length {
            return None;
        }

        let waste = self.skyline[idx..end]
            .iter()
            .map(|node| {
                let covered = (node.x + node.width).min(right) - node.x;
                covered as u64 * (y - node.y) as u64
            })
            .sum();

        Some((y, waste))
    }

    /// Raise the skyline over `[x, x + width)` to `y + height`
    fn occupy(&mut self, idx: usize, x: u32, y: u32, width: u32, height: u32) {
        let right = x + width;

        let j = idx;
        while j < self.skyline.len() && self.skyline[j].x < right {
            let node = self.skyline[j];
            let node_right = node.x + node.width;
            if node_right <= right {
                self.skyline.remove(j);
            } else {
                self.skyline[j] = SkylineNode {
                    x: right,
                    y: node.y,
                    width: node_right - right,
                };
                break;
            }
        }

        self.skyline.insert(
            idx,
            SkylineNode {
                x,
                y: y + height,
                width,
            },
        );

        // Merge neighbours at the same height
        let mut i = 0;
        while i + 1 < self.skyline.len() {
            if self.skyline[i].y == self.skyline[i + 1].y {
                self.skyline[i].width += self.skyline[i + 1].width;
                self.skyline.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }
}
