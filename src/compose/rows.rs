use rayon::prelude::*;

use crate::foundation::core::{PixelBuffer, pixel_count};
use crate::foundation::error::{RepackError, RepackResult};

/// Coarse progress of a full-resolution job, reported per band of rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Rows finished so far.
    pub rows_done: u32,
    /// Total rows in the output.
    pub rows_total: u32,
}

impl Progress {
    /// Completed fraction in `[0, 1]`.
    pub fn fraction(self) -> f32 {
        if self.rows_total == 0 {
            return 1.0;
        }
        self.rows_done as f32 / self.rows_total as f32
    }
}

/// Roughly this many progress reports per job.
const PROGRESS_BANDS: u32 = 20;

/// Fills an output buffer row by row, optionally on a rayon pool, reporting progress
/// between bands of rows.
///
/// Rows are independent: `fill_row` must only depend on `y`, so sequential and parallel
/// runs produce identical buffers.
pub(crate) struct RowDriver<'a> {
    pool: Option<&'a rayon::ThreadPool>,
    progress: Option<&'a mut (dyn FnMut(Progress) + 'a)>,
}

impl<'a> RowDriver<'a> {
    pub(crate) fn new(
        pool: Option<&'a rayon::ThreadPool>,
        progress: Option<&'a mut (dyn FnMut(Progress) + 'a)>,
    ) -> Self {
        Self { pool, progress }
    }

    pub(crate) fn sequential() -> Self {
        Self {
            pool: None,
            progress: None,
        }
    }

    pub(crate) fn run<F>(
        &mut self,
        width: u32,
        height: u32,
        fill_row: F,
    ) -> RepackResult<PixelBuffer>
    where
        F: Fn(u32, &mut [f32]) + Sync,
    {
        let n = pixel_count(width, height)?;
        let row_len = width as usize * 4;
        let mut data = vec![0.0f32; n * 4];

        let band_rows = (height / PROGRESS_BANDS).max(1) as usize;
        let mut rows_done = 0u32;
        for band in data.chunks_mut(row_len * band_rows) {
            let first_row = rows_done;
            match self.pool {
                Some(pool) => pool.install(|| {
                    band.par_chunks_mut(row_len)
                        .enumerate()
                        .for_each(|(i, row)| fill_row(first_row + i as u32, row));
                }),
                None => {
                    for (i, row) in band.chunks_mut(row_len).enumerate() {
                        fill_row(first_row + i as u32, row);
                    }
                }
            }
            rows_done += (band.len() / row_len) as u32;
            if let Some(report) = self.progress.as_deref_mut() {
                report(Progress {
                    rows_done,
                    rows_total: height,
                });
            }
        }

        PixelBuffer::from_rgba(width, height, data)
    }
}

/// Build a dedicated rayon pool for parallel export.
pub(crate) fn build_thread_pool(threads: Option<usize>) -> RepackResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(RepackError::validation(
            "export 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| RepackError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/compose/rows.rs"]
mod tests;
