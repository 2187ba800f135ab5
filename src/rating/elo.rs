// Logistic Elo arithmetic. Side ratings for doubles are the mean of the members.

use super::types::RatingValue;

/// Expected score of `rating` against `opponent_rating`
pub fn expected_score(rating: RatingValue, opponent_rating: RatingValue) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((opponent_rating - rating) / 400.0))
}

/// Rating delta for one side; `actual` is 1.0 for a win and 0.0 for a loss
pub fn rating_delta(
    k: f64,
    rating: RatingValue,
    opponent_rating: RatingValue,
    actual: f64,
) -> RatingValue {
    k * (actual - expected_score(rating, opponent_rating))
}

/// Rating a side plays at
pub fn side_rating(member_ratings: &[RatingValue]) -> RatingValue {
    if member_ratings.is_empty() {
        return 0.0;
    }
    member_ratings.iter().sum::<f64>() / member_ratings.len() as f64
}
