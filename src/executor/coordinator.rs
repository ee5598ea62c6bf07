// Normalized (0..1000) <-> physical pixel mapping.
use crate::executor::args::COORD_MAX;

/// Maps a normalized coordinate onto a `width`×`height` screen.
/// 0 lands on the first pixel, 1000 on the last one.
pub fn normalized_to_physical(xn: f64, yn: f64, width: u32, height: u32) -> (i32, i32) {
    let span = |n: f64, extent: u32| -> i32 {
        let last = extent.saturating_sub(1) as f64;
        (n.clamp(0.0, COORD_MAX) / COORD_MAX * last).round() as i32
    };
    (span(xn, width), span(yn, height))
}

/// Inverse of [`normalized_to_physical`], rounded to whole units and clamped.
pub fn physical_to_normalized(px: i32, py: i32, width: u32, height: u32) -> (i32, i32) {
    let norm = |p: i32, extent: u32| -> i32 {
        let last = extent.saturating_sub(1);
        if last == 0 {
            return 0;
        }
        let n = (p as f64 / last as f64 * COORD_MAX).round();
        n.clamp(0.0, COORD_MAX) as i32
    };
    (norm(px, width), norm(py, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_map_to_edge_pixels() {
        assert_eq!(normalized_to_physical(0.0, 0.0, 1920, 1080), (0, 0));
        assert_eq!(normalized_to_physical(1000.0, 1000.0, 1920, 1080), (1919, 1079));
        assert_eq!(normalized_to_physical(500.0, 500.0, 1921, 1081), (960, 540));
    }

    #[test]
    fn normalizes_back() {
        assert_eq!(physical_to_normalized(0, 0, 1920, 1080), (0, 0));
        assert_eq!(physical_to_normalized(1919, 1079, 1920, 1080), (1000, 1000));
        // cursor on a second monitor to the right is still reported in range
        assert_eq!(physical_to_normalized(2500, -10, 1920, 1080), (1000, 0));
    }

    #[test]
    fn degenerate_screen_does_not_divide_by_zero() {
        assert_eq!(physical_to_normalized(5, 5, 1, 0), (0, 0));
        assert_eq!(normalized_to_physical(700.0, 700.0, 0, 1), (0, 0));
    }
}
