use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub handler_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Mean review rating rounded to one decimal, or `None` with no reviews.
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }

    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    let mean = f64::from(sum) / reviews.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{average_rating, Review};

    fn review(rating: u8) -> Review {
        Review {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            handler_id: Uuid::from_u128(7),
            rating,
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn no_reviews_has_no_average() {
        assert_eq!(average_rating(&[]), None);
    }

    #[test]
    fn average_is_rounded_to_one_decimal() {
        let reviews = [review(5), review(4), review(4)];
        assert_eq!(average_rating(&reviews), Some(4.3));
    }
}
