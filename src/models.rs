use crate::range::DateRange;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub created_at: DateTime<Utc>,
}

/// A point that was moved to the trash. Serializes flat, as the point's
/// fields plus `deletedAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedPoint {
    #[serde(flatten)]
    pub point: Point,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub point_id: String,
    pub value: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: String,
    pub date: NaiveDate,
    pub scores: Vec<Score>,
    pub created_at: DateTime<Utc>,
}

/// The four persisted collections, in stored order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalData {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
    #[serde(default)]
    pub deleted_points: Vec<DeletedPoint>,
}

impl JournalData {
    pub fn active_points(&self) -> impl Iterator<Item = KnownPoint<'_>> {
        self.points.iter().map(KnownPoint::Active)
    }

    /// Active points first, then the trash. Historical views read from here.
    pub fn all_points_ever_known(&self) -> impl Iterator<Item = KnownPoint<'_>> {
        self.active_points()
            .chain(self.deleted_points.iter().map(KnownPoint::Deleted))
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// Stored position of a category; display order follows it.
    pub fn category_index(&self, id: &str) -> Option<usize> {
        self.categories.iter().position(|category| category.id == id)
    }

    pub fn active_point(&self, id: &str) -> Option<&Point> {
        self.points.iter().find(|point| point.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KnownPoint<'a> {
    Active(&'a Point),
    Deleted(&'a DeletedPoint),
}

impl<'a> KnownPoint<'a> {
    pub fn point(&self) -> &'a Point {
        match *self {
            KnownPoint::Active(point) => point,
            KnownPoint::Deleted(deleted) => &deleted.point,
        }
    }

    pub fn status(&self) -> PointStatus {
        match self {
            KnownPoint::Active(_) => PointStatus::Active,
            KnownPoint::Deleted(deleted) => PointStatus::Deleted {
                deleted_at: deleted.deleted_at,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PointStatus {
    Active,
    Deleted {
        #[serde(rename = "deletedAt")]
        deleted_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(flatten)]
    pub data: JournalData,
    pub exported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPoint {
    pub name: String,
    pub category_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointPatch {
    pub name: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRating {
    pub date: NaiveDate,
    pub scores: Vec<Score>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointAverage {
    pub point: Point,
    pub status: PointStatus,
    pub average: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAverage {
    pub category: Category,
    pub average: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: i32,
    pub week: u32,
    pub label: String,
    pub average: f64,
    pub days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryLine {
    pub category: String,
    pub color: String,
    pub scores: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub entries: usize,
    pub average: f64,
    pub categories: Vec<CategoryLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashEntry {
    pub point: Point,
    pub category_name: Option<String>,
    pub deleted_at: DateTime<Utc>,
    pub average: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSummary {
    pub total_points: usize,
    pub total_entries: usize,
    pub overall_average: f64,
    pub highest: Option<PointAverage>,
    pub lowest: Option<PointAverage>,
    pub categories: usize,
    pub range: DateRange,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub range: DateRange,
    pub points: Vec<PointAverage>,
    pub categories: Vec<CategoryAverage>,
    pub deleted: Vec<PointAverage>,
    pub trend: Vec<TrendPoint>,
    pub summary: ChartSummary,
    pub days: Vec<DaySummary>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub period: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct RatingsQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Removed {
    pub removed: usize,
}
