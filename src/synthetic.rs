//! Synthetic point cloud source.
//!
//! [`SyntheticCloud`] yields an endless sequence of deterministic scans: a
//! ring of points sampled around the sensor whose radius breathes from frame
//! to frame, with an intensity column derived from the bearing. It stands in
//! for recorded captures when exercising the pipeline.

use std::f32::consts::TAU;

use crate::frame::{ElementType, Payload, PointBlock, RowWidth};

/// Rows per synthetic scan unless configured otherwise.
pub const DEFAULT_POINTS_PER_FRAME: usize = 2_000;

/// Infinite iterator of synthetic scans.
#[derive(Clone, Debug)]
pub struct SyntheticCloud {
    points_per_frame: usize,
    row_width: RowWidth,
    frame: u64,
}

impl Default for SyntheticCloud {
    fn default() -> Self { Self::new(DEFAULT_POINTS_PER_FRAME, RowWidth::Xyzi) }
}

impl SyntheticCloud {
    /// Create a source producing `points_per_frame` rows of `row_width`
    /// columns.
    #[must_use]
    pub const fn new(points_per_frame: usize, row_width: RowWidth) -> Self {
        Self {
            points_per_frame,
            row_width,
            frame: 0,
        }
    }

    /// Index of the next scan.
    #[must_use]
    pub const fn frame(&self) -> u64 { self.frame }

    /// Generate the next scan as a point block.
    #[expect(
        clippy::cast_precision_loss,
        reason = "synthetic coordinates tolerate rounding"
    )]
    pub fn next_block(&mut self) -> PointBlock {
        let phase = (self.frame % 64) as f32 / 64.0 * TAU;
        let radius = 10.0 + 2.0 * phase.sin();
        let count = self.points_per_frame.max(1) as f32;
        let with_intensity = self.row_width == RowWidth::Xyzi;

        let mut values = Vec::with_capacity(self.points_per_frame * self.row_width.columns());
        for i in 0..self.points_per_frame {
            let bearing = i as f32 / count * TAU;
            values.push(radius * bearing.cos());
            values.push(radius * bearing.sin());
            values.push(0.5 * (bearing * 4.0 + phase).sin());
            if with_intensity {
                values.push((bearing + phase).cos().abs());
            }
        }
        self.frame += 1;
        PointBlock::from_f32_rows(self.row_width, &values)
            .unwrap_or_else(|_| PointBlock::empty(ElementType::F32, self.row_width))
    }
}

impl Iterator for SyntheticCloud {
    type Item = Payload;

    fn next(&mut self) -> Option<Payload> { Some(Payload::Points(self.next_block())) }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(RowWidth::Xyz, 12)]
    #[case(RowWidth::Xyzi, 16)]
    fn scans_have_the_requested_shape(#[case] row_width: RowWidth, #[case] row_size: usize) {
        let mut source = SyntheticCloud::new(100, row_width);
        let block = source.next_block();
        assert_eq!(block.row_count(), 100);
        assert_eq!(block.row_size(), row_size);
        assert_eq!(block.element_type(), ElementType::F32);
        assert_eq!(source.frame(), 1);
    }

    #[test]
    fn scans_are_deterministic_and_evolve() {
        let first: Vec<Payload> = SyntheticCloud::new(50, RowWidth::Xyzi).take(2).collect();
        let again: Vec<Payload> = SyntheticCloud::new(50, RowWidth::Xyzi).take(2).collect();
        assert_eq!(first, again);
        assert_ne!(first[0], first[1]);
    }

    #[test]
    fn zero_points_yield_empty_frames() {
        let mut source = SyntheticCloud::new(0, RowWidth::Xyz);
        assert!(source.next_block().is_empty());
    }
}
