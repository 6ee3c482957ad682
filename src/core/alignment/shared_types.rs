//! Lane-major storage shared by the batch loader and the vector kernels.
//!
//! Every buffer is a `(row, lane)` grid over one contiguous `Vec`, indexed as
//! `row * lanes + lane`, so a single unaligned vector load reads one row for
//! all lanes.

/// Row-by-lane grid backed by a single owned buffer.
///
/// `reshape` only grows the backing storage; a workspace that already holds a
/// large enough grid is cleared in place.
#[derive(Debug, Clone, Default)]
pub struct LaneMatrix<T> {
    data: Vec<T>,
    rows: usize,
    lanes: usize,
}

impl<T: Copy + Default> LaneMatrix<T> {
    pub fn new() -> Self {
        LaneMatrix {
            data: Vec::new(),
            rows: 0,
            lanes: 0,
        }
    }

    pub fn with_capacity(rows: usize, lanes: usize) -> Self {
        let mut m = Self::new();
        m.data.reserve_exact(rows * lanes);
        m
    }

    /// Sets the logical shape and zero-fills the used region.
    pub fn reshape(&mut self, rows: usize, lanes: usize) {
        let len = rows * lanes;
        if self.data.len() < len {
            self.data.resize(len, T::default());
        }
        self.data[..len].fill(T::default());
        self.rows = rows;
        self.lanes = lanes;
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn lanes(&self) -> usize {
        self.lanes
    }

    /// Elements the backing buffer holds without reallocating.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    #[inline(always)]
    pub fn get(&self, row: usize, lane: usize) -> T {
        debug_assert!(row < self.rows && lane < self.lanes);
        self.data[row * self.lanes + lane]
    }

    #[inline(always)]
    pub fn set(&mut self, row: usize, lane: usize, v: T) {
        debug_assert!(row < self.rows && lane < self.lanes);
        self.data[row * self.lanes + lane] = v;
    }

    #[inline(always)]
    pub fn row(&self, row: usize) -> &[T] {
        let start = row * self.lanes;
        &self.data[start..start + self.lanes]
    }

    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr()
    }

    /// Pointer to the first lane of `row`; valid for `lanes` elements.
    #[inline(always)]
    pub fn row_ptr(&self, row: usize) -> *const T {
        debug_assert!(row < self.rows);
        // SAFETY: row < rows, so the offset stays inside the used region
        unsafe { self.data.as_ptr().add(row * self.lanes) }
    }
}

/// H and E rows of the banded DP, one column per matrix row entry.
///
/// Row `j` of each grid holds, for every lane, the value the next DP row reads
/// at query column `j`: H of the previous row at column `j - 1` and E entering
/// column `j`.
#[derive(Debug, Clone, Default)]
pub struct DpRows<T> {
    pub h: LaneMatrix<T>,
    pub e: LaneMatrix<T>,
}

impl<T: Copy + Default> DpRows<T> {
    pub fn new() -> Self {
        DpRows {
            h: LaneMatrix::new(),
            e: LaneMatrix::new(),
        }
    }

    pub fn with_capacity(cols: usize, lanes: usize) -> Self {
        DpRows {
            h: LaneMatrix::with_capacity(cols, lanes),
            e: LaneMatrix::with_capacity(cols, lanes),
        }
    }

    pub fn reshape(&mut self, cols: usize, lanes: usize) {
        self.h.reshape(cols, lanes);
        self.e.reshape(cols, lanes);
    }
}
