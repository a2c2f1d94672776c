use crate::series::TimeSeriesPoint;
use chrono::NaiveDate;

/// First present candidate in priority order, else `default`. Pure precedence: values are
/// never blended.
pub fn select_latest_with_fallback<T, I>(candidates: I, default: T) -> T
where
    I: IntoIterator<Item = Option<T>>,
{
    candidates.into_iter().flatten().next().unwrap_or(default)
}

/// Most recent point of an ascending series.
pub fn latest_point(points: &[TimeSeriesPoint]) -> Option<TimeSeriesPoint> {
    points.last().copied()
}

/// Point nearest to `target` by whole days; the earlier point wins a tie.
pub fn closest_to(points: &[TimeSeriesPoint], target: NaiveDate) -> Option<TimeSeriesPoint> {
    points
        .iter()
        .copied()
        .min_by_key(|p| ((p.date - target).num_days().abs(), p.date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(date: &str, value: f64) -> TimeSeriesPoint {
        TimeSeriesPoint {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            value,
        }
    }

    #[test]
    fn picks_first_present_candidate() {
        assert_eq!(select_latest_with_fallback([None, Some(5), Some(3)], 0), 5);
        assert_eq!(select_latest_with_fallback([None, None], 7), 7);
        assert_eq!(select_latest_with_fallback(Vec::<Option<i32>>::new(), 1), 1);
    }

    #[test]
    fn zero_is_a_present_candidate() {
        assert_eq!(select_latest_with_fallback([Some(0.0), Some(9.0)], 1.0), 0.0);
    }

    #[test]
    fn latest_is_last_point() {
        let points = [p("2025-01-01", 1.0), p("2025-02-01", 2.0)];
        assert_eq!(latest_point(&points).map(|p| p.value), Some(2.0));
        assert_eq!(latest_point(&[]), None);
    }

    #[test]
    fn closest_prefers_exact_then_nearest_then_earlier() {
        let target = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        let points = [p("2024-12-07", 0.1), p("2024-12-21", 0.2), p("2024-12-29", 0.3)];
        assert_eq!(closest_to(&points, target).map(|p| p.value), Some(0.2));

        let exact = [p("2024-12-21", 0.2), p("2024-12-25", 0.5)];
        assert_eq!(closest_to(&exact, target).map(|p| p.value), Some(0.5));

        assert_eq!(closest_to(&[], target), None);
    }
}
