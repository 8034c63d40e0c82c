use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::ledger::models::{Profile, ScanWithProduct};

/// Days covered by the dashboard's daily points series, including today
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// A profile's position in the ranked set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based rank, or None when the user is absent from the set
    pub rank: Option<usize>,
    pub total: usize,
}

/// Leaderboard ordering: eco_score descending; ties rank the
/// longer-standing profile (earlier created_at) higher, with profile id as
/// the final deterministic tiebreak
fn compare_profiles(a: &Profile, b: &Profile) -> Ordering {
    b.eco_score
        .cmp(&a.eco_score)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sorts a profile snapshot into leaderboard order
pub fn ranked(mut profiles: Vec<Profile>) -> Vec<Profile> {
    profiles.sort_by(compare_profiles);
    profiles
}

/// Computes the 1-based rank of `user_id` within the snapshot
pub fn rank(profiles: &[Profile], user_id: &str) -> Standing {
    let mut ordered: Vec<&Profile> = profiles.iter().collect();
    ordered.sort_by(|a, b| compare_profiles(a, b));

    Standing {
        rank: ordered
            .iter()
            .position(|p| p.id == user_id)
            .map(|index| index + 1),
        total: profiles.len(),
    }
}

/// Points earned, bucketed by the scanned product's overall score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    /// Products scored 70 and above
    pub high: i64,
    /// Products scored 40-69
    pub medium: i64,
    /// Products scored below 40
    pub low: i64,
}

/// Sums points_earned per score bucket over the given scans
pub fn score_distribution(scans: &[ScanWithProduct]) -> ScoreDistribution {
    let mut distribution = ScoreDistribution::default();
    for scan in scans {
        let points = scan.record.points_earned as i64;
        match scan.product.overall_score {
            score if score >= 70 => distribution.high += points,
            score if score >= 40 => distribution.medium += points,
            _ => distribution.low += points,
        }
    }
    distribution
}

/// One day of the dashboard's points series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPoints {
    pub date: NaiveDate,
    pub points: i64,
}

/// Points per calendar day over the trailing window ending `today`
///
/// Always returns `window_days` entries oldest to newest, zero-filling days
/// with no scans.
pub fn daily_series(
    scans: &[ScanWithProduct],
    window_days: u32,
    today: NaiveDate,
) -> Vec<DailyPoints> {
    let mut by_day: HashMap<NaiveDate, i64> = HashMap::new();
    for scan in scans {
        let day = scan.record.created_at.date_naive();
        *by_day.entry(day).or_insert(0) += scan.record.points_earned as i64;
    }

    (0..window_days)
        .rev()
        .map(|offset| {
            let date = today - chrono::Duration::days(offset as i64);
            DailyPoints {
                date,
                points: by_day.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}
