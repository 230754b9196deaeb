//! The journal repository: CRUD over categories, points, ratings and the
//! point trash, persisted through a [`KeyValueStore`].
//!
//! Every mutation is staged on a copy of the collections, written to the
//! store, and only then committed in memory. A failed write leaves the
//! journal exactly as it was.

use crate::clock::{Clock, SystemClock};
use crate::errors::{JournalError, StorageError};
use crate::models::{
    Category, CategoryPatch, DeletedPoint, JournalData, KnownPoint, NewCategory, NewPoint,
    NewRating, Point, PointPatch, Rating, Score, Snapshot,
};
use crate::storage::{CollectionKey, KeyValueStore};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;
const DEFAULT_COLOR: &str = "#2196F3";

pub struct Journal<S> {
    store: S,
    clock: Box<dyn Clock>,
    data: JournalData,
}

impl<S: KeyValueStore> Journal<S> {
    pub fn open(store: S) -> Result<Self, JournalError> {
        Self::open_with_clock(store, SystemClock)
    }

    /// Loads all four collections; an absent key reads as empty.
    pub fn open_with_clock(store: S, clock: impl Clock + 'static) -> Result<Self, JournalError> {
        let data = JournalData {
            categories: load_collection(&store, CollectionKey::Categories)?,
            points: load_collection(&store, CollectionKey::Points)?,
            ratings: load_collection(&store, CollectionKey::Ratings)?,
            deleted_points: load_collection(&store, CollectionKey::DeletedPoints)?,
        };

        info!(
            categories = data.categories.len(),
            points = data.points.len(),
            ratings = data.ratings.len(),
            deleted_points = data.deleted_points.len(),
            "journal loaded"
        );

        Ok(Self {
            store,
            clock: Box::new(clock),
            data,
        })
    }

    pub fn data(&self) -> &JournalData {
        &self.data
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // Categories

    pub fn categories(&self) -> &[Category] {
        &self.data.categories
    }

    pub fn category_by_id(&self, id: &str) -> Option<&Category> {
        self.data.category(id)
    }

    pub fn add_category(&mut self, new: NewCategory) -> Result<Category, JournalError> {
        let category = Category {
            id: generate_id(),
            name: required_name(&new.name, "category")?,
            color: color_or_default(&new.color),
            created_at: self.now(),
        };

        let mut next = self.data.clone();
        next.categories.push(category.clone());
        self.commit(next, &[CollectionKey::Categories])?;

        info!(id = %category.id, name = %category.name, "category added");
        Ok(category)
    }

    pub fn update_category(
        &mut self,
        id: &str,
        patch: CategoryPatch,
    ) -> Result<Category, JournalError> {
        let mut next = self.data.clone();
        let Some(category) = next.categories.iter_mut().find(|category| category.id == id) else {
            warn!(id, "update of unknown category");
            return Err(JournalError::not_found("category", id));
        };

        if let Some(name) = patch.name {
            category.name = required_name(&name, "category")?;
        }
        if let Some(color) = patch.color {
            category.color = color_or_default(&color);
        }
        let updated = category.clone();

        self.commit(next, &[CollectionKey::Categories])?;
        info!(id, "category updated");
        Ok(updated)
    }

    /// Removes the category and hard-deletes its active points. Ratings and
    /// already-trashed points are left alone. Returns the number of points
    /// removed.
    pub fn delete_category(&mut self, id: &str) -> Result<usize, JournalError> {
        if self.data.category(id).is_none() {
            warn!(id, "delete of unknown category");
            return Err(JournalError::not_found("category", id));
        }

        let mut next = self.data.clone();
        next.categories.retain(|category| category.id != id);
        let before = next.points.len();
        next.points.retain(|point| point.category_id != id);
        let removed = before - next.points.len();

        self.commit(next, &[CollectionKey::Categories, CollectionKey::Points])?;
        info!(id, removed_points = removed, "category deleted");
        Ok(removed)
    }

    // Points

    pub fn active_points(&self) -> &[Point] {
        &self.data.points
    }

    pub fn deleted_points(&self) -> &[DeletedPoint] {
        &self.data.deleted_points
    }

    pub fn all_points_ever_known(&self) -> Vec<KnownPoint<'_>> {
        self.data.all_points_ever_known().collect()
    }

    pub fn point_by_id(&self, id: &str) -> Option<&Point> {
        self.data.active_point(id)
    }

    pub fn points_by_category(&self, category_id: &str) -> Vec<&Point> {
        self.data
            .points
            .iter()
            .filter(|point| point.category_id == category_id)
            .collect()
    }

    pub fn add_point(&mut self, new: NewPoint) -> Result<Point, JournalError> {
        let name = required_name(&new.name, "point")?;
        if self.data.category(&new.category_id).is_none() {
            return Err(JournalError::not_found("category", new.category_id));
        }

        let point = Point {
            id: generate_id(),
            name,
            category_id: new.category_id,
            created_at: self.now(),
        };

        let mut next = self.data.clone();
        next.points.push(point.clone());
        self.commit(next, &[CollectionKey::Points])?;

        info!(id = %point.id, category_id = %point.category_id, "point added");
        Ok(point)
    }

    pub fn update_point(&mut self, id: &str, patch: PointPatch) -> Result<Point, JournalError> {
        if let Some(category_id) = &patch.category_id {
            if self.data.category(category_id).is_none() {
                return Err(JournalError::not_found("category", category_id.as_str()));
            }
        }

        let mut next = self.data.clone();
        let Some(point) = next.points.iter_mut().find(|point| point.id == id) else {
            warn!(id, "update of unknown point");
            return Err(JournalError::not_found("point", id));
        };

        if let Some(name) = patch.name {
            point.name = required_name(&name, "point")?;
        }
        if let Some(category_id) = patch.category_id {
            point.category_id = category_id;
        }
        let updated = point.clone();

        self.commit(next, &[CollectionKey::Points])?;
        info!(id, "point updated");
        Ok(updated)
    }

    /// Moves an active point to the trash, stamping `deleted_at`.
    pub fn delete_point(&mut self, id: &str) -> Result<DeletedPoint, JournalError> {
        let mut next = self.data.clone();
        let Some(index) = next.points.iter().position(|point| point.id == id) else {
            warn!(id, "delete of unknown point");
            return Err(JournalError::not_found("point", id));
        };

        let deleted = DeletedPoint {
            point: next.points.remove(index),
            deleted_at: self.now(),
        };
        next.deleted_points.push(deleted.clone());

        self.commit(next, &[CollectionKey::DeletedPoints, CollectionKey::Points])?;
        info!(id, "point moved to trash");
        Ok(deleted)
    }

    /// Moves a trashed point back to the active collection.
    pub fn restore_point(&mut self, id: &str) -> Result<Point, JournalError> {
        let mut next = self.data.clone();
        let Some(index) = next.deleted_points.iter().position(|deleted| deleted.point.id == id)
        else {
            warn!(id, "restore of point not in trash");
            return Err(JournalError::not_found("deleted point", id));
        };

        let point = next.deleted_points.remove(index).point;
        next.points.push(point.clone());

        self.commit(next, &[CollectionKey::DeletedPoints, CollectionKey::Points])?;
        info!(id, "point restored");
        Ok(point)
    }

    /// Purges a point from the trash. Succeeds with `false` when the point is
    /// not in the trash; active points are never touched.
    pub fn permanently_delete_point(&mut self, id: &str) -> Result<bool, JournalError> {
        if !self.data.deleted_points.iter().any(|deleted| deleted.point.id == id) {
            info!(id, "purge skipped, point not in trash");
            return Ok(false);
        }

        let mut next = self.data.clone();
        next.deleted_points.retain(|deleted| deleted.point.id != id);
        self.commit(next, &[CollectionKey::DeletedPoints])?;
        info!(id, "point purged");
        Ok(true)
    }

    // Ratings

    pub fn ratings(&self) -> &[Rating] {
        &self.data.ratings
    }

    pub fn ratings_by_date(&self, date: NaiveDate) -> Vec<&Rating> {
        self.data
            .ratings
            .iter()
            .filter(|rating| rating.date == date)
            .collect()
    }

    /// Ratings dated within `[start, end]`, in stored order.
    pub fn ratings_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<&Rating> {
        self.data
            .ratings
            .iter()
            .filter(|rating| start <= rating.date && rating.date <= end)
            .collect()
    }

    /// Most recent dates first; ratings sharing a date keep stored order.
    pub fn latest_ratings(&self, limit: usize) -> Vec<&Rating> {
        let mut ratings: Vec<&Rating> = self.data.ratings.iter().collect();
        ratings.sort_by(|a, b| b.date.cmp(&a.date));
        ratings.truncate(limit);
        ratings
    }

    pub fn add_rating(&mut self, new: NewRating) -> Result<Rating, JournalError> {
        validate_scores(&new.scores)?;

        let rating = Rating {
            id: generate_id(),
            date: new.date,
            scores: new.scores,
            created_at: self.now(),
        };

        let mut next = self.data.clone();
        next.ratings.push(rating.clone());
        self.commit(next, &[CollectionKey::Ratings])?;

        info!(id = %rating.id, date = %rating.date, scores = rating.scores.len(), "rating added");
        Ok(rating)
    }

    pub fn delete_rating(&mut self, id: &str) -> Result<(), JournalError> {
        if !self.data.ratings.iter().any(|rating| rating.id == id) {
            warn!(id, "delete of unknown rating");
            return Err(JournalError::not_found("rating", id));
        }

        let mut next = self.data.clone();
        next.ratings.retain(|rating| rating.id != id);
        self.commit(next, &[CollectionKey::Ratings])?;
        info!(id, "rating deleted");
        Ok(())
    }

    /// Removes every rating recorded on `date`; zero matches is not an error.
    pub fn delete_ratings_by_date(&mut self, date: NaiveDate) -> Result<usize, JournalError> {
        let mut next = self.data.clone();
        next.ratings.retain(|rating| rating.date != date);
        let removed = self.data.ratings.len() - next.ratings.len();

        if removed > 0 {
            self.commit(next, &[CollectionKey::Ratings])?;
        }
        info!(%date, removed, "ratings deleted for day");
        Ok(removed)
    }

    // Snapshots

    pub fn export(&self) -> Snapshot {
        Snapshot {
            data: self.data.clone(),
            exported_at: self.now(),
        }
    }

    /// Replaces all four collections wholesale.
    pub fn import(&mut self, data: JournalData) -> Result<(), JournalError> {
        validate_snapshot(&data)?;

        self.commit(data, &CollectionKey::ALL)?;
        info!(
            categories = self.data.categories.len(),
            points = self.data.points.len(),
            ratings = self.data.ratings.len(),
            deleted_points = self.data.deleted_points.len(),
            "journal imported"
        );
        Ok(())
    }

    /// Writes every collection as empty; a failed write restores the rest.
    pub fn clear_all(&mut self) -> Result<(), JournalError> {
        self.commit(JournalData::default(), &CollectionKey::ALL)?;
        info!("journal cleared");
        Ok(())
    }

    /// Writes `keys` from `next`, then swaps `next` in. When a later write
    /// fails, keys already written are restored from the current data.
    fn commit(&mut self, next: JournalData, keys: &[CollectionKey]) -> Result<(), JournalError> {
        for (index, &key) in keys.iter().enumerate() {
            if let Err(err) = write_collection(&mut self.store, key, &next) {
                error!(%key, error = %err, "failed to persist collection");
                for &written in &keys[..index] {
                    warn!(key = %written, "rolling back collection");
                    if let Err(rollback) = write_collection(&mut self.store, written, &self.data) {
                        error!(key = %written, error = %rollback, "rollback failed");
                    }
                }
                return Err(err.into());
            }
        }

        self.data = next;
        Ok(())
    }
}

fn load_collection<S, T>(store: &S, key: CollectionKey) -> Result<Vec<T>, JournalError>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    let value = store.get(key).inspect_err(|err| {
        error!(%key, error = %err, "failed to read collection");
    })?;

    match value {
        None => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value).map_err(|source| {
            error!(%key, error = %source, "failed to parse collection");
            StorageError::Corrupt { key, source }.into()
        }),
    }
}

fn write_collection<S: KeyValueStore>(
    store: &mut S,
    key: CollectionKey,
    data: &JournalData,
) -> Result<(), StorageError> {
    let value = match key {
        CollectionKey::Categories => serde_json::to_value(&data.categories),
        CollectionKey::Points => serde_json::to_value(&data.points),
        CollectionKey::Ratings => serde_json::to_value(&data.ratings),
        CollectionKey::DeletedPoints => serde_json::to_value(&data.deleted_points),
    }
    .map_err(|source| StorageError::Serialize { key, source })?;

    store.set(key, value)
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

fn required_name(name: &str, entity: &str) -> Result<String, JournalError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(JournalError::validation(format!("{entity} name is required")));
    }
    Ok(trimmed.to_string())
}

fn color_or_default(color: &str) -> String {
    let trimmed = color.trim();
    if trimmed.is_empty() {
        DEFAULT_COLOR.to_string()
    } else {
        trimmed.to_string()
    }
}

fn validate_scores(scores: &[Score]) -> Result<(), JournalError> {
    if scores.is_empty() {
        return Err(JournalError::validation("a rating needs at least one score"));
    }

    let mut seen = HashSet::new();
    for score in scores {
        if score.point_id.trim().is_empty() {
            return Err(JournalError::validation("score is missing its point id"));
        }
        if !(MIN_SCORE..=MAX_SCORE).contains(&score.value) {
            return Err(JournalError::validation(format!(
                "score {} for point {} is outside {MIN_SCORE}..={MAX_SCORE}",
                score.value, score.point_id
            )));
        }
        if !seen.insert(score.point_id.as_str()) {
            return Err(JournalError::validation(format!(
                "point {} is scored twice in one rating",
                score.point_id
            )));
        }
    }
    Ok(())
}

/// Point ids are unique across active and deleted points; ratings follow
/// the same rules as `add_rating`.
fn validate_snapshot(data: &JournalData) -> Result<(), JournalError> {
    let mut category_ids = HashSet::new();
    for category in &data.categories {
        if !category_ids.insert(category.id.as_str()) {
            return Err(JournalError::validation(format!(
                "category {} appears twice",
                category.id
            )));
        }
    }

    let mut point_ids = HashSet::new();
    for point in data.all_points_ever_known() {
        let id = point.point().id.as_str();
        if !point_ids.insert(id) {
            return Err(JournalError::validation(format!(
                "point {id} appears more than once across active and deleted points"
            )));
        }
    }

    let mut rating_ids = HashSet::new();
    for rating in &data.ratings {
        if !rating_ids.insert(rating.id.as_str()) {
            return Err(JournalError::validation(format!(
                "rating {} appears twice",
                rating.id
            )));
        }
        validate_scores(&rating.scores).map_err(|err| match err {
            JournalError::Validation(message) => {
                JournalError::validation(format!("rating {}: {message}", rating.id))
            }
            other => other,
        })?;
    }
    Ok(())
}
