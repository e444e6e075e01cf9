/// Builds the point grid: `resolution × resolution` coordinates in
/// `[0,1]²`, row-major, one per texel lookup. The grid is immutable
/// once built; a resolution change replaces it wholesale rather than
/// patching it in place.
///
/// Callers must uphold `resolution >= 2`; the parameter surface clamps
/// before this is ever reached, so a violation here is a programming
/// error rather than bad user input.
pub fn point_grid(resolution: u32) -> Vec<[f32; 2]> {
    debug_assert!(resolution >= 2, "grid resolution must be at least 2");
    let resolution = resolution.max(2);
    let step = 1.0 / (resolution - 1) as f32;
    let mut points = Vec::with_capacity((resolution * resolution) as usize);
    for row in 0..resolution {
        let y = row as f32 * step;
        for col in 0..resolution {
            points.push([col as f32 * step, y]);
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_resolution_squared_points() {
        for resolution in [2u32, 3, 17, 64] {
            let grid = point_grid(resolution);
            assert_eq!(grid.len(), (resolution * resolution) as usize);
        }
    }

    #[test]
    fn corners_span_the_unit_square() {
        let grid = point_grid(5);
        assert_eq!(grid[0], [0.0, 0.0]);
        let last = grid[grid.len() - 1];
        assert!((last[0] - 1.0).abs() < f32::EPSILON);
        assert!((last[1] - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rows_are_major() {
        let grid = point_grid(3);
        // Second entry advances x, not y.
        assert_eq!(grid[1], [0.5, 0.0]);
        // Fourth entry starts the second row.
        assert_eq!(grid[3], [0.0, 0.5]);
    }

    #[test]
    fn minimum_resolution_still_covers_both_ends() {
        let grid = point_grid(2);
        assert_eq!(grid, vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
    }
}
