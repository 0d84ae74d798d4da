use std::cmp::Ordering;

use uuid::Uuid;

use crate::geo::{distance_or_sentinel, GeoPoint};
use crate::models::assignment::ScoreBreakdown;
use crate::models::handler::Handler;

const SKILL_MATCH_POINTS: f64 = 40.0;
const RATING_MAX_POINTS: f64 = 20.0;
const AVAILABILITY_POINTS: f64 = 10.0;
const WORKLOAD_PENALTY_PER_JOB: f64 = 5.0;
const MAX_RATING: f64 = 5.0;

/// (exclusive upper bound in miles, points) in ascending distance order.
const PROXIMITY_TIERS: [(f64, f64); 3] = [(5.0, 30.0), (10.0, 20.0), (20.0, 10.0)];

/// Candidates must score strictly above this to be assigned.
pub const MIN_ASSIGNMENT_SCORE: f64 = 20.0;

/// What a booking needs from a handler.
#[derive(Debug, Clone)]
pub struct JobSite<'a> {
    pub category: &'a str,
    pub location: Option<&'a GeoPoint>,
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub handler_id: Uuid,
    pub handler_name: String,
    pub active_jobs: usize,
    pub distance_miles: f64,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

pub fn compute_score(handler: &Handler, site: &JobSite<'_>, active_jobs: usize) -> Candidate {
    let distance_miles = distance_or_sentinel(site.location, handler.location.as_ref());

    let breakdown = ScoreBreakdown {
        skill_score: skill_score(&handler.skills, site.category),
        proximity_score: proximity_score(distance_miles),
        rating_score: rating_score(handler.rating),
        availability_score: availability_score(handler.available),
        workload_penalty: workload_penalty(active_jobs),
    };

    Candidate {
        handler_id: handler.id,
        handler_name: handler.name.clone(),
        active_jobs,
        distance_miles,
        score: breakdown.total(),
        breakdown,
    }
}

/// Exact match, or a case-insensitive containment either way to absorb
/// naming drift like "Plumbing" vs "Emergency Plumbing".
pub fn skill_matches(skills: &[String], category: &str) -> bool {
    let category_key = category.trim().to_lowercase();
    if category_key.is_empty() {
        return false;
    }

    skills.iter().any(|skill| {
        let skill_key = skill.trim().to_lowercase();
        !skill_key.is_empty()
            && (skill == category
                || category_key.contains(&skill_key)
                || skill_key.contains(&category_key))
    })
}

fn skill_score(skills: &[String], category: &str) -> f64 {
    if skill_matches(skills, category) {
        SKILL_MATCH_POINTS
    } else {
        0.0
    }
}

pub fn proximity_score(distance_miles: f64) -> f64 {
    PROXIMITY_TIERS
        .iter()
        .find(|(limit, _)| distance_miles < *limit)
        .map(|(_, points)| *points)
        .unwrap_or(0.0)
}

fn rating_score(rating: f64) -> f64 {
    (rating / MAX_RATING).clamp(0.0, 1.0) * RATING_MAX_POINTS
}

fn availability_score(available: bool) -> f64 {
    if available { AVAILABILITY_POINTS } else { 0.0 }
}

fn workload_penalty(active_jobs: usize) -> f64 {
    active_jobs as f64 * WORKLOAD_PENALTY_PER_JOB
}

/// Best first. Equal scores go to the lighter workload, then the nearer
/// handler, then the lower handler id.
pub fn rank_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(compare_candidates);
}

fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(a.active_jobs.cmp(&b.active_jobs))
        .then(a.distance_miles.total_cmp(&b.distance_miles))
        .then(a.handler_id.cmp(&b.handler_id))
}

pub fn clears_threshold(score: f64, min_score: f64) -> bool {
    score > min_score
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{
        clears_threshold, compute_score, proximity_score, rank_candidates, skill_matches, JobSite,
        MIN_ASSIGNMENT_SCORE,
    };
    use crate::geo::GeoPoint;
    use crate::models::handler::Handler;

    const BOOKING: GeoPoint = GeoPoint {
        lat: 40.7128,
        lng: -74.0060,
    };

    fn handler(seed: u128, skills: &[&str], location: Option<GeoPoint>, rating: f64) -> Handler {
        let mut handler = Handler::new(format!("handler-{seed}"));
        handler.id = Uuid::from_u128(seed);
        handler.skills = skills.iter().map(|s| s.to_string()).collect();
        handler.location = location;
        handler.rating = rating;
        handler
    }

    fn plumbing_site() -> JobSite<'static> {
        JobSite {
            category: "Plumbing",
            location: Some(&BOOKING),
        }
    }

    // Roughly `miles` due north of the booking.
    fn north_of_booking(miles: f64) -> GeoPoint {
        GeoPoint::new(BOOKING.lat + miles / 69.0966, BOOKING.lng)
    }

    #[test]
    fn nearby_skilled_handler_scores_full_marks() {
        let h = handler(1, &["Plumbing"], Some(north_of_booking(2.0)), 5.0);
        let candidate = compute_score(&h, &plumbing_site(), 0);

        assert_eq!(candidate.breakdown.skill_score, 40.0);
        assert_eq!(candidate.breakdown.proximity_score, 30.0);
        assert_eq!(candidate.breakdown.rating_score, 20.0);
        assert_eq!(candidate.breakdown.availability_score, 10.0);
        assert_eq!(candidate.breakdown.workload_penalty, 0.0);
        assert!((candidate.score - 100.0).abs() < 1e-9);
        assert!((candidate.distance_miles - 2.0).abs() < 0.01);
    }

    #[test]
    fn distant_unskilled_busy_handler_stays_below_threshold() {
        let h = handler(1, &["Electrical"], Some(north_of_booking(50.0)), 3.0);
        let candidate = compute_score(&h, &plumbing_site(), 2);

        assert!((candidate.score - 12.0).abs() < 1e-9);
        assert!(!clears_threshold(candidate.score, MIN_ASSIGNMENT_SCORE));
    }

    #[test]
    fn proximity_tiers() {
        assert_eq!(proximity_score(0.0), 30.0);
        assert_eq!(proximity_score(4.99), 30.0);
        assert_eq!(proximity_score(5.0), 20.0);
        assert_eq!(proximity_score(9.99), 20.0);
        assert_eq!(proximity_score(10.0), 10.0);
        assert_eq!(proximity_score(19.99), 10.0);
        assert_eq!(proximity_score(20.0), 0.0);
        assert_eq!(proximity_score(999.0), 0.0);
    }

    #[test]
    fn closer_never_scores_a_lower_tier() {
        let mut previous = f64::INFINITY;
        for step in 0..=60 {
            let points = proximity_score(step as f64 * 0.5);
            assert!(points <= previous);
            previous = points;
        }
    }

    #[test]
    fn each_active_job_costs_five_points() {
        let h = handler(1, &["Plumbing"], Some(north_of_booking(7.0)), 4.2);
        for jobs in 0..6 {
            let current = compute_score(&h, &plumbing_site(), jobs).score;
            let next = compute_score(&h, &plumbing_site(), jobs + 1).score;
            assert!((current - next - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn unlocated_handler_gets_no_proximity_points() {
        let h = handler(1, &["Plumbing"], None, 5.0);
        let candidate = compute_score(&h, &plumbing_site(), 0);

        assert_eq!(candidate.distance_miles, 999.0);
        assert_eq!(candidate.breakdown.proximity_score, 0.0);
        assert!((candidate.score - 70.0).abs() < 1e-9);
    }

    #[test]
    fn zeroed_location_counts_as_unlocated() {
        let h = handler(1, &["Plumbing"], Some(GeoPoint::new(0.0, 0.0)), 5.0);
        let candidate = compute_score(&h, &plumbing_site(), 0);
        assert_eq!(candidate.breakdown.proximity_score, 0.0);
    }

    #[test]
    fn unavailable_handler_loses_availability_points() {
        let mut h = handler(1, &["Plumbing"], Some(north_of_booking(1.0)), 5.0);
        h.available = false;
        let candidate = compute_score(&h, &plumbing_site(), 0);
        assert_eq!(candidate.breakdown.availability_score, 0.0);
    }

    #[test]
    fn skill_matching_is_loose() {
        let skills = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert!(skill_matches(&skills(&["Plumbing"]), "Plumbing"));
        assert!(skill_matches(&skills(&["plumbing"]), "Emergency Plumbing"));
        assert!(skill_matches(&skills(&["Home Cleaning Deep"]), "cleaning"));
        assert!(!skill_matches(&skills(&["Electrical"]), "Plumbing"));
        assert!(!skill_matches(&skills(&[]), "Plumbing"));
        assert!(!skill_matches(&skills(&["  "]), "Plumbing"));
        assert!(!skill_matches(&skills(&[""]), ""));
        assert!(!skill_matches(&skills(&["Plumbing"]), "  "));
    }

    #[test]
    fn threshold_is_strict() {
        assert!(!clears_threshold(20.0, MIN_ASSIGNMENT_SCORE));
        assert!(clears_threshold(20.01, MIN_ASSIGNMENT_SCORE));
    }

    #[test]
    fn ranking_prefers_total_score_over_workload() {
        let busy_close = handler(1, &["Plumbing"], Some(north_of_booking(1.0)), 5.0);
        let idle_far = handler(2, &["Plumbing"], Some(north_of_booking(15.0)), 4.0);

        let mut candidates = vec![
            compute_score(&idle_far, &plumbing_site(), 0),
            compute_score(&busy_close, &plumbing_site(), 1),
        ];
        rank_candidates(&mut candidates);

        // 40 + 30 + 20 + 10 - 5 = 95 beats 40 + 10 + 16 + 10 = 76
        assert_eq!(candidates[0].handler_id, busy_close.id);
    }

    #[test]
    fn equal_scores_go_to_the_lighter_workload() {
        // 40 + 0 + 20 + 10 - 5 = 65 against 40 + 0 + 15 + 10 - 0 = 65.
        let busy = handler(1, &["Plumbing"], None, 5.0);
        let idle = handler(2, &["Plumbing"], None, 3.75);

        let mut candidates = vec![
            compute_score(&busy, &plumbing_site(), 1),
            compute_score(&idle, &plumbing_site(), 0),
        ];
        assert_eq!(candidates[0].score, 65.0);
        assert_eq!(candidates[1].score, 65.0);

        rank_candidates(&mut candidates);
        assert_eq!(candidates[0].handler_id, idle.id);
    }

    #[test]
    fn equal_scores_and_workloads_break_on_distance_then_id() {
        // All three score 40 + 30 + 20 + 10 - 5 = 95.
        let a = handler(3, &["Plumbing"], Some(north_of_booking(1.0)), 5.0);
        let b = handler(2, &["Plumbing"], Some(north_of_booking(3.0)), 5.0);
        let c = handler(1, &["Plumbing"], Some(north_of_booking(3.0)), 5.0);

        let mut candidates = vec![
            compute_score(&a, &plumbing_site(), 1),
            compute_score(&b, &plumbing_site(), 1),
            compute_score(&c, &plumbing_site(), 1),
        ];
        rank_candidates(&mut candidates);

        let order: Vec<Uuid> = candidates.iter().map(|c| c.handler_id).collect();
        assert_eq!(order, vec![a.id, c.id, b.id]);
    }
}
