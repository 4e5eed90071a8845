//! Point awards for claims

use rand::Rng;

/// Smallest award a claim can produce
pub const MIN_CLAIM_POINTS: i64 = 1;
/// Largest award a claim can produce
pub const MAX_CLAIM_POINTS: i64 = 10;

/// Decides how many points a claim is worth
pub trait PointsSource: Send + Sync {
    fn roll(&self) -> i64;
}

/// Uniform award in `MIN_CLAIM_POINTS..=MAX_CLAIM_POINTS`
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPoints;

impl PointsSource for RandomPoints {
    fn roll(&self) -> i64 {
        rand::thread_rng().gen_range(MIN_CLAIM_POINTS..=MAX_CLAIM_POINTS)
    }
}

/// Always awards the same amount
#[derive(Debug, Clone, Copy)]
pub struct FixedPoints(pub i64);

impl PointsSource for FixedPoints {
    fn roll(&self) -> i64 {
        self.0
    }
}
