//! Form snapshot and the derived listing record.
//!
//! The UI surface hands the pipeline an explicit `FormSnapshot` value; the
//! collector derives a flat `ListingRecord` from it (broker resolution, date
//! formatting, photo normalization). Every record field is a `String` that
//! defaults to empty, so placeholder substitution never leaves a known token
//! unfilled.

use serde::Deserialize;

use crate::broker;
use crate::datefmt;
use crate::normalize::{self, NormalizedPhoto};
use crate::StudioConfig;

/// Raw user input for one generation request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FormSnapshot {
    pub broker: String,
    pub headline: String,
    pub subheadline: String,
    pub subheadline2: String,
    pub city: String,
    pub suburb: String,
    pub tag1: String,
    pub tag2: String,
    /// `YYYY-MM-DD` or `YYYY/MM/DD`
    pub date: String,
    /// 24-hour `HH:MM`
    pub time: String,
    pub address: String,
    pub feat1: String,
    pub feat2: String,
    pub feat3: String,
    /// Raw uploaded photo bytes; not part of the JSON form surface
    #[serde(skip)]
    pub photo: Option<Vec<u8>>,
}

/// The flat record substituted into templates. Constructed fresh per
/// generation, never persisted.
#[derive(Debug, Clone, Default)]
pub struct ListingRecord {
    pub broker_id: String,
    pub broker_name: String,
    pub broker_phone: String,
    pub broker_email: String,
    pub headline: String,
    pub subheadline: String,
    pub subheadline2: String,
    pub city: String,
    pub suburb: String,
    pub tag1: String,
    pub tag2: String,
    /// Formatted display date, empty when the inputs were malformed
    pub date: String,
    /// Raw time string, echoed verbatim
    pub time: String,
    pub address: String,
    pub feat1: String,
    pub feat2: String,
    pub feat3: String,
    /// JPEG data URL of the normalized photo, empty when absent
    pub property_image: String,
    /// Normalized bitmap for canvas compositing
    pub photo: Option<NormalizedPhoto>,
}

impl ListingRecord {
    /// Derive the record from a snapshot. The second element carries the
    /// single user-facing warning from photo validation, if any.
    pub fn collect(snapshot: &FormSnapshot, config: &StudioConfig) -> (Self, Option<String>) {
        let broker = broker::resolve(Some(snapshot.broker.as_str()));
        let outcome = normalize::normalize_photo(snapshot.photo.as_deref(), &config.image_limits);
        let property_image = outcome
            .photo
            .as_ref()
            .map(|p| p.data_url())
            .unwrap_or_default();

        let record = Self {
            broker_id: broker.id.to_string(),
            broker_name: broker.name.to_string(),
            broker_phone: broker.phone.to_string(),
            broker_email: broker.email.to_string(),
            headline: snapshot.headline.clone(),
            subheadline: snapshot.subheadline.clone(),
            subheadline2: snapshot.subheadline2.clone(),
            city: snapshot.city.clone(),
            suburb: snapshot.suburb.clone(),
            tag1: snapshot.tag1.clone(),
            tag2: snapshot.tag2.clone(),
            date: datefmt::format_event_date(&snapshot.date, &snapshot.time),
            time: snapshot.time.clone(),
            address: snapshot.address.clone(),
            feat1: snapshot.feat1.clone(),
            feat2: snapshot.feat2.clone(),
            feat3: snapshot.feat3.clone(),
            property_image,
            photo: outcome.photo,
        };
        (record, outcome.warning)
    }

    /// Token name to value, in the order templates reference them
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("brokerId", &self.broker_id),
            ("brokerName", &self.broker_name),
            ("brokerPhone", &self.broker_phone),
            ("brokerEmail", &self.broker_email),
            ("headline", &self.headline),
            ("subheadline", &self.subheadline),
            ("subheadline2", &self.subheadline2),
            ("city", &self.city),
            ("suburb", &self.suburb),
            ("tag1", &self.tag1),
            ("tag2", &self.tag2),
            ("date", &self.date),
            ("time", &self.time),
            ("address", &self.address),
            ("feat1", &self.feat1),
            ("feat2", &self.feat2),
            ("feat3", &self.feat3),
            ("propertyImage", &self.property_image),
        ]
    }

    /// Labeled fields for the summary document, in the fixed export order
    pub fn summary_fields(&self, raw_date: &str, raw_time: &str) -> Vec<(String, String)> {
        let day = datefmt::format_event_day(raw_date);
        let date_time = if !day.is_empty() && !raw_time.trim().is_empty() {
            format!("{} @ {}", day, raw_time.trim())
        } else {
            String::new()
        };
        vec![
            (
                "Broker".to_string(),
                format!("{} | {} | {}", self.broker_name, self.broker_phone, self.broker_email),
            ),
            ("Headline".to_string(), self.headline.clone()),
            ("City".to_string(), self.city.clone()),
            ("Suburb".to_string(), self.suburb.clone()),
            ("Tagline 1".to_string(), self.tag1.clone()),
            ("Tagline 2".to_string(), self.tag2.clone()),
            ("Date & Time".to_string(), date_time),
            ("Feature 1".to_string(), self.feat1.clone()),
            ("Feature 2".to_string(), self.feat2.clone()),
            ("Feature 3".to_string(), self.feat3.clone()),
        ]
    }
}
