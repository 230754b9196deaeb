use crate::models::{
    CategoryAverage, CategoryLine, ChartSummary, DaySummary, JournalData, KnownPoint,
    PointAverage, PointStatus, Rating, StatsResponse, TrashEntry, TrendPoint,
};
use crate::clock::{Clock, SystemClock};
use crate::range::{resolve_range_at, DateRange, Period};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_TREND_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    total: f64,
    count: usize,
}

impl Tally {
    fn add(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    /// Zero when nothing was tallied, never NaN.
    fn average(self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

pub fn build_stats_at(data: &JournalData, today: NaiveDate, period: Period) -> StatsResponse {
    let range = resolve_range_at(today, period);

    StatsResponse {
        range,
        points: active_point_averages(data, range),
        categories: averages_by_category(data, range),
        deleted: deleted_point_historical_averages(data),
        trend: weekly_trend_at(data, today, DEFAULT_TREND_WINDOW_DAYS),
        summary: chart_summary(data, range),
        days: day_summaries(data, range),
    }
}

fn score_tallies<'a>(ratings: impl Iterator<Item = &'a Rating>) -> HashMap<&'a str, Tally> {
    let mut tallies: HashMap<&str, Tally> = HashMap::new();
    for rating in ratings {
        for score in &rating.scores {
            tallies
                .entry(score.point_id.as_str())
                .or_default()
                .add(f64::from(score.value));
        }
    }
    tallies
}

fn ratings_in(data: &JournalData, range: DateRange) -> impl Iterator<Item = &Rating> {
    data.ratings.iter().filter(move |rating| range.contains(rating.date))
}

fn point_average(known: KnownPoint<'_>, tally: Tally) -> PointAverage {
    PointAverage {
        point: known.point().clone(),
        status: known.status(),
        average: tally.average(),
        count: tally.count,
    }
}

/// Every point ever known, active and trashed, with its scores in `range`.
/// Points without scores report `count == 0`.
pub fn averages_by_point(data: &JournalData, range: DateRange) -> Vec<PointAverage> {
    let tallies = score_tallies(ratings_in(data, range));

    data.all_points_ever_known()
        .map(|known| {
            let tally = tallies.get(known.point().id.as_str()).copied().unwrap_or_default();
            point_average(known, tally)
        })
        .collect()
}

/// Per-category rollup over active points only; trashed points never count
/// toward a category.
pub fn averages_by_category(data: &JournalData, range: DateRange) -> Vec<CategoryAverage> {
    let owner: HashMap<&str, &str> = data
        .points
        .iter()
        .map(|point| (point.id.as_str(), point.category_id.as_str()))
        .collect();

    let mut tallies: HashMap<&str, Tally> = HashMap::new();
    for rating in ratings_in(data, range) {
        for score in &rating.scores {
            if let Some(&category_id) = owner.get(score.point_id.as_str()) {
                tallies.entry(category_id).or_default().add(f64::from(score.value));
            }
        }
    }

    data.categories
        .iter()
        .map(|category| {
            let tally = tallies.get(category.id.as_str()).copied().unwrap_or_default();
            CategoryAverage {
                category: category.clone(),
                average: tally.average(),
                count: tally.count,
            }
        })
        .collect()
}

pub fn active_point_averages(data: &JournalData, range: DateRange) -> Vec<PointAverage> {
    let mut averages: Vec<PointAverage> = averages_by_point(data, range)
        .into_iter()
        .filter(|average| average.status == PointStatus::Active && average.count > 0)
        .collect();
    sort_for_display(data, &mut averages);
    averages
}

/// Lifetime averages for trashed points, ignoring any date range. Points that
/// were never scored are left out.
pub fn deleted_point_historical_averages(data: &JournalData) -> Vec<PointAverage> {
    let tallies = score_tallies(data.ratings.iter());

    let mut averages: Vec<PointAverage> = data
        .deleted_points
        .iter()
        .filter_map(|deleted| {
            let tally = tallies.get(deleted.point.id.as_str()).copied()?;
            Some(point_average(KnownPoint::Deleted(deleted), tally))
        })
        .collect();
    sort_for_display(data, &mut averages);
    averages
}

// Category stored order first, then point name. Orphaned points go last.
fn sort_for_display(data: &JournalData, averages: &mut [PointAverage]) {
    averages.sort_by(|a, b| {
        let rank_a = data.category_index(&a.point.category_id).unwrap_or(usize::MAX);
        let rank_b = data.category_index(&b.point.category_id).unwrap_or(usize::MAX);
        rank_a
            .cmp(&rank_b)
            .then_with(|| a.point.name.cmp(&b.point.name))
    });
}

/// Average score per ISO week over `[today - window_days, today]`. Each day's
/// scores are pooled into a day mean, and a week averages its day means.
pub fn weekly_trend(data: &JournalData, window_days: i64) -> Vec<TrendPoint> {
    weekly_trend_at(data, SystemClock.today(), window_days)
}

/// [`weekly_trend`] anchored on an explicit `today`.
pub fn weekly_trend_at(data: &JournalData, today: NaiveDate, window_days: i64) -> Vec<TrendPoint> {
    let window = DateRange::new(today - Duration::days(window_days), today);

    let mut days: BTreeMap<NaiveDate, Tally> = BTreeMap::new();
    for rating in ratings_in(data, window) {
        let day = days.entry(rating.date).or_default();
        for score in &rating.scores {
            day.add(f64::from(score.value));
        }
    }

    let mut weeks: BTreeMap<(i32, u32), Tally> = BTreeMap::new();
    for (date, day) in days {
        if day.count == 0 {
            continue;
        }
        let iso = date.iso_week();
        weeks
            .entry((iso.year(), iso.week()))
            .or_default()
            .add(day.average());
    }

    weeks
        .into_iter()
        .map(|((year, week), tally)| TrendPoint {
            year,
            week,
            label: format!("{year}-W{week:02}"),
            average: tally.average(),
            days: tally.count,
        })
        .collect()
}

pub fn chart_summary(data: &JournalData, range: DateRange) -> ChartSummary {
    let averages = active_point_averages(data, range);

    let total_entries = averages.iter().map(|average| average.count).sum();
    let overall_average = if averages.is_empty() {
        0.0
    } else {
        averages.iter().map(|average| average.average).sum::<f64>() / averages.len() as f64
    };

    // Ties keep the first point in display order.
    let highest = averages
        .iter()
        .fold(None::<&PointAverage>, |best, item| match best {
            Some(best) if best.average >= item.average => Some(best),
            _ => Some(item),
        })
        .cloned();
    let lowest = averages
        .iter()
        .fold(None::<&PointAverage>, |best, item| match best {
            Some(best) if best.average <= item.average => Some(best),
            _ => Some(item),
        })
        .cloned();

    ChartSummary {
        total_points: averages.len(),
        total_entries,
        overall_average,
        highest,
        lowest,
        categories: data.categories.len(),
        range,
    }
}

/// Ratings in `range` grouped by day, newest first.
pub fn day_summaries(data: &JournalData, range: DateRange) -> Vec<DaySummary> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&Rating>> = BTreeMap::new();
    for rating in ratings_in(data, range) {
        by_day.entry(rating.date).or_default().push(rating);
    }

    by_day
        .into_iter()
        .rev()
        .map(|(date, ratings)| {
            let mut tally = Tally::default();
            let mut categories: Vec<CategoryLine> = Vec::new();

            for score in ratings.iter().flat_map(|rating| &rating.scores) {
                tally.add(f64::from(score.value));

                let Some(point) = data.active_point(&score.point_id) else {
                    continue;
                };
                let Some(category) = data.category(&point.category_id) else {
                    continue;
                };
                let line = format!("{}: {}", point.name, score.value);
                match categories.iter_mut().find(|entry| entry.category == category.name) {
                    Some(entry) => entry.scores.push(line),
                    None => categories.push(CategoryLine {
                        category: category.name.clone(),
                        color: category.color.clone(),
                        scores: vec![line],
                    }),
                }
            }

            DaySummary {
                date,
                entries: ratings.len(),
                average: tally.average(),
                categories,
            }
        })
        .collect()
}

/// Trashed points in stored order with their lifetime averages.
pub fn trash_bin(data: &JournalData) -> Vec<TrashEntry> {
    let tallies = score_tallies(data.ratings.iter());

    data.deleted_points
        .iter()
        .map(|deleted| {
            let tally = tallies.get(deleted.point.id.as_str()).copied().unwrap_or_default();
            TrashEntry {
                point: deleted.point.clone(),
                category_name: data
                    .category(&deleted.point.category_id)
                    .map(|category| category.name.clone()),
                deleted_at: deleted.deleted_at,
                average: tally.average(),
                count: tally.count,
            }
        })
        .collect()
}
