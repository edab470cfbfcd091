use glam::UVec2;

/// A rectangular window of a grid that accumulates intensity per cell.
///
/// For each cell this buffer stores:
///
/// - An intensity byte, accumulated with saturating addition.
/// - An alpha byte, `255` once the cell has received any contribution and
///   `0` otherwise.
///
/// Cells are addressed in grid coordinates; the buffer only covers
/// `origin .. origin + size`. A density field uses one full-size buffer as
/// its grid and one small buffer per attraction point, then folds the
/// small ones in with [`IntensityBuffer::merge_from`].
#[derive(Clone, Debug, PartialEq)]
pub struct IntensityBuffer {
    origin: UVec2,
    size: UVec2,
    /// Row-major intensity values.
    value: Vec<u8>,
    /// Row-major alpha values.
    alpha: Vec<u8>,
}

impl IntensityBuffer {
    /// Creates a zeroed buffer covering `origin .. origin + size`.
    ///
    /// ### Parameters
    /// - `origin` - Grid coordinate of the top-left cell.
    /// - `size` - Width and height in cells.
    ///
    /// ### Returns
    /// A new [`IntensityBuffer`] with every value and alpha set to `0`.
    pub fn with_region(origin: UVec2, size: UVec2) -> Self {
        let len = (size.x as usize) * (size.y as usize);
        Self {
            origin,
            size,
            value: vec![0; len],
            alpha: vec![0; len],
        }
    }

    /// Creates a zeroed buffer covering a whole `size` grid.
    pub fn with_size(size: UVec2) -> Self {
        Self::with_region(UVec2::ZERO, size)
    }

    #[inline]
    pub fn origin(&self) -> UVec2 {
        self.origin
    }

    #[inline]
    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Row-major intensity values of the covered region.
    #[inline]
    pub fn values(&self) -> &[u8] {
        &self.value
    }

    /// Row-major alpha values of the covered region.
    #[inline]
    pub fn alphas(&self) -> &[u8] {
        &self.alpha
    }

    /// Resets every cell to zero, keeping the region.
    pub fn clear(&mut self) {
        self.value.fill(0);
        self.alpha.fill(0);
    }

    /// Returns the storage index for a grid coordinate, or `None` if the
    /// cell lies outside this buffer.
    #[inline]
    pub fn index(&self, cell: UVec2) -> Option<usize> {
        if cell.x < self.origin.x || cell.y < self.origin.y {
            return None;
        }
        let local = cell - self.origin;
        if local.x < self.size.x && local.y < self.size.y {
            Some(local.y as usize * self.size.x as usize + local.x as usize)
        } else {
            None
        }
    }

    /// Adds `amount` to a cell and marks it as touched.
    ///
    /// ### Panics
    /// Panics if `cell` is outside this buffer.
    #[inline]
    pub fn add(&mut self, cell: UVec2, amount: u8) {
        let i = self
            .index(cell)
            .unwrap_or_else(|| panic!("cell {cell} outside buffer at {} size {}", self.origin, self.size));
        self.value[i] = self.value[i].saturating_add(amount);
        self.alpha[i] = u8::MAX;
    }

    /// Intensity at a grid coordinate; `0` outside the buffer.
    #[inline]
    pub fn get(&self, cell: UVec2) -> u8 {
        self.index(cell).map_or(0, |i| self.value[i])
    }

    /// Alpha at a grid coordinate; `0` outside the buffer.
    #[inline]
    pub fn alpha(&self, cell: UVec2) -> u8 {
        self.index(cell).map_or(0, |i| self.alpha[i])
    }

    /// Returns `true` if the given cell has received any contribution.
    #[inline]
    pub fn is_touched(&self, cell: UVec2) -> bool {
        self.alpha(cell) > 0
    }

    /// Sum of all intensity values.
    pub fn total(&self) -> u64 {
        self.value.iter().map(|&v| v as u64).sum()
    }

    /// Merges another buffer into this one.
    ///
    /// Each cell of `other` is added to the matching cell of `self` with
    /// saturating addition, and touched cells become touched here. Since
    /// saturating addition of non-negative values is commutative and
    /// associative, merge order does not change the result.
    ///
    /// ### Parameters
    /// - `other` - The source buffer; its region must lie inside `self`.
    ///
    /// ### Panics
    /// Panics if `other` extends beyond this buffer's region.
    pub fn merge_from(&mut self, other: &IntensityBuffer) {
        let other_end = other.origin + other.size;
        let self_end = self.origin + self.size;
        assert!(
            other.origin.cmpge(self.origin).all() && other_end.cmple(self_end).all(),
            "merged region {}..{} outside {}..{}",
            other.origin,
            other_end,
            self.origin,
            self_end
        );

        let w = other.size.x as usize;
        if w == 0 {
            return;
        }
        for (row, (src_v, src_a)) in other
            .value
            .chunks_exact(w)
            .zip(other.alpha.chunks_exact(w))
            .enumerate()
        {
            let Some(start) = self.index(other.origin + UVec2::new(0, row as u32)) else {
                continue;
            };
            let dst_v = &mut self.value[start..start + w];
            for (d, &s) in dst_v.iter_mut().zip(src_v) {
                *d = d.saturating_add(s);
            }
            let dst_a = &mut self.alpha[start..start + w];
            for (d, &s) in dst_a.iter_mut().zip(src_a) {
                *d = (*d).max(s);
            }
        }
    }
}
