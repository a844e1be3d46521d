//! Binary occupancy masks on the detector's output grid.

/// Per-cell boolean occupancy, stored row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl Mask {
    /// An all-empty mask of the given size.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    /// Wraps row-major cells. Returns `None` when the length does not match.
    pub fn from_cells(width: u32, height: u32, cells: Vec<bool>) -> Option<Self> {
        (cells.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            cells,
        })
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    /// A mask with the half-open cell rectangle `[x1, x2) x [y1, y2)` set.
    pub fn from_rect(width: u32, height: u32, x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self::from_fn(width, height, |x, y| x >= x1 && x < x2 && y >= y1 && y < y2)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Occupancy at `(x, y)`; cells outside the grid read as empty.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[y as usize * self.width as usize + x as usize]
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Number of occupied cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|&c| c)
    }

    /// Nearest-neighbour lookup of target pixel `(x, y)` when this mask is
    /// stretched to `target_width x target_height`.
    ///
    /// Source cell is `floor(dst * src_dim / dst_dim)`, which keeps hard edges
    /// and never yields fractional occupancy.
    #[inline]
    pub fn sample_nearest(&self, x: u32, y: u32, target_width: u32, target_height: u32) -> bool {
        if self.width == 0 || self.height == 0 || target_width == 0 || target_height == 0 {
            return false;
        }
        let sx = (u64::from(x) * u64::from(self.width) / u64::from(target_width)) as u32;
        let sy = (u64::from(y) * u64::from(self.height) / u64::from(target_height)) as u32;
        self.get(sx.min(self.width - 1), sy.min(self.height - 1))
    }
}

impl std::fmt::Debug for Mask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mask")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("occupied", &self.count())
            .finish()
    }
}

/// Intersection-over-union of two masks, in `[0, 1]`.
///
/// Two empty masks score 0. Grids of different sizes are overlaid at the
/// origin on their combined extent, cells outside a grid reading as empty.
pub fn mask_iou(a: &Mask, b: &Mask) -> f64 {
    let (intersection, union) = if a.dimensions() == b.dimensions() {
        a.cells
            .iter()
            .zip(&b.cells)
            .fold((0usize, 0usize), |(i, u), (&ca, &cb)| {
                (i + usize::from(ca && cb), u + usize::from(ca || cb))
            })
    } else {
        let mut i = 0usize;
        let mut u = 0usize;
        let width = a.width.max(b.width);
        let height = a.height.max(b.height);
        for y in 0..height {
            for x in 0..width {
                let (ca, cb) = (a.get(x, y), b.get(x, y));
                i += usize::from(ca && cb);
                u += usize::from(ca || cb);
            }
        }
        (i, u)
    };

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}
