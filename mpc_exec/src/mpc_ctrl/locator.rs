//! Waypoint locator

use nalgebra::Vector2;

/// Find the index of the path point closest to the position.
///
/// The first index wins ties. Returns `None` if the path is empty or no
/// finite distance exists.
pub fn find_closest(path: &[Vector2<f64>], position_m: &Vector2<f64>) -> Option<usize> {
    let mut closest = None;
    let mut closest_dist_sq = std::f64::INFINITY;

    for (i, point) in path.iter().enumerate() {
        let dist_sq = (point - position_m).norm_squared();

        if dist_sq < closest_dist_sq {
            closest = Some(i);
            closest_dist_sq = dist_sq;
        }
    }

    closest
}

/// Index to start resampling from, `lookback` points behind the closest
/// point. May be negative, wrapping is left to the resampler.
pub fn lookback_start(closest: usize, lookback: usize) -> i64 {
    closest as i64 - lookback as i64
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_find_closest() {
        let path = vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(2.0, 0.0),
            Vector2::new(3.0, 1.0),
        ];

        assert_eq!(find_closest(&path, &Vector2::new(1.1, 0.5)), Some(1));
        assert_eq!(find_closest(&path, &Vector2::new(10.0, 2.0)), Some(3));
        assert_eq!(find_closest(&path, &Vector2::new(-4.0, 0.0)), Some(0));
        assert_eq!(find_closest(&[], &Vector2::new(0.0, 0.0)), None);
    }

    #[test]
    fn test_find_closest_ties() {
        // Equidistant from every point of a unit square
        let path = vec![
            Vector2::new(1.0, 1.0),
            Vector2::new(-1.0, 1.0),
            Vector2::new(-1.0, -1.0),
            Vector2::new(1.0, -1.0),
        ];
        assert_eq!(find_closest(&path, &Vector2::zeros()), Some(0));

        // Tie between later points, the lower one wins
        let path = vec![
            Vector2::new(5.0, 5.0),
            Vector2::new(0.0, 1.0),
            Vector2::new(0.0, -1.0),
        ];
        assert_eq!(find_closest(&path, &Vector2::zeros()), Some(1));
    }

    #[test]
    fn test_find_closest_nan() {
        let path = vec![Vector2::new(std::f64::NAN, 0.0)];
        assert_eq!(find_closest(&path, &Vector2::zeros()), None);
    }

    #[test]
    fn test_lookback_start() {
        assert_eq!(lookback_start(10, 2), 8);
        assert_eq!(lookback_start(1, 2), -1);
        assert_eq!(lookback_start(0, 0), 0);
    }
}
