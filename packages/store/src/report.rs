//! Report retrieval.
//!
//! Image paths for the known metric kinds depend only on the project and
//! the area, so the area row, the metric series and those signed image URLs
//! are requested together. Stored metrics with other names get one more
//! signing request once the series is in. Images are attached to metric
//! cards by metric name.

use std::collections::BTreeMap;

use skyfarm_api::Session;
use skyfarm_area::presentation::{AreaDetails, MetricView, PresentationModel, present};
use skyfarm_area_models::MetricKind;
use thiserror::Error;

use crate::{ReportStore, SignedUrl, StoreError};

/// Banner shown when any part of a report fails to load.
pub const DATA_FETCH_MESSAGE: &str = "an error occurred while fetching the data";

/// A report could not be loaded. Displays as [`DATA_FETCH_MESSAGE`]; the
/// failing request is kept as the source.
#[derive(Debug, Error)]
#[error("{}", DATA_FETCH_MESSAGE)]
pub struct DataFetchError {
    #[source]
    source: StoreError,
}

impl DataFetchError {
    /// The store error that failed the report.
    #[must_use]
    pub const fn store_error(&self) -> &StoreError {
        &self.source
    }
}

impl From<StoreError> for DataFetchError {
    fn from(source: StoreError) -> Self {
        Self { source }
    }
}

/// Everything a report screen shows for one area.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Area header block.
    pub details: AreaDetails,
    /// Metric cards.
    pub model: PresentationModel,
    /// Signed image URLs keyed by the metric name in the object path.
    pub images: BTreeMap<String, String>,
}

impl Report {
    /// Image for a metric card, if one was rendered. An exact name match
    /// wins over a case-insensitive one.
    #[must_use]
    pub fn image_for(&self, metric_name: &str) -> Option<&str> {
        let name = metric_name.trim();
        self.images
            .get(name)
            .or_else(|| {
                self.images
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, url)| url)
            })
            .map(String::as_str)
    }

    /// Metric cards paired with their images, in card order.
    pub fn cards(&self) -> impl Iterator<Item = (&MetricView, Option<&str>)> {
        self.model
            .metrics
            .iter()
            .map(|view| (view, self.image_for(&view.name)))
    }
}

/// Object path of a metric's rendered image.
#[must_use]
pub fn image_path(project_id: &str, area_id: &str, metric_name: &str) -> String {
    format!("{project_id}/{area_id}/{metric_name}.png")
}

/// Loads an area's report.
///
/// # Errors
///
/// Returns [`DataFetchError`] if the area, its metrics, or either image
/// batch cannot be read. A single failure fails the whole report.
pub async fn load_report<S: ReportStore + ?Sized>(
    store: &S,
    project_id: &str,
    area_id: &str,
    session: &Session,
) -> Result<Report, DataFetchError> {
    let paths: Vec<String> = MetricKind::all()
        .iter()
        .map(|kind| image_path(project_id, area_id, kind.as_ref()))
        .collect();

    let fail = |e: StoreError| {
        log::warn!("Failed to load report for area {area_id}: {e}");
        DataFetchError::from(e)
    };

    let (area, series, mut urls) = tokio::try_join!(
        store.area(area_id, session),
        store.metrics(area_id, session),
        store.signed_urls(&paths, session),
    )
    .map_err(fail)?;

    let mut extra: Vec<String> = vec![];
    for row in &series.metrics {
        let path = image_path(project_id, area_id, &row.name);
        if !paths.contains(&path) && !extra.contains(&path) {
            extra.push(path);
        }
    }
    if !extra.is_empty() {
        log::debug!("Signing {} images for other stored metrics", extra.len());
        urls.extend(store.signed_urls(&extra, session).await.map_err(fail)?);
    }

    let images = images_by_metric(urls);
    log::debug!(
        "Loaded report for area {area_id}: {} metrics, {} images",
        series.metrics.len(),
        images.len()
    );

    Ok(Report {
        details: AreaDetails::from(&area),
        model: present(&series),
        images,
    })
}

/// Keys signed URLs by the metric name in their object path. Entries
/// without a URL are dropped.
fn images_by_metric(urls: Vec<SignedUrl>) -> BTreeMap<String, String> {
    urls.into_iter()
        .filter_map(|entry| {
            let url = entry.signed_url?;
            let name = entry
                .path
                .as_deref()
                .and_then(|path| path.rsplit('/').next())
                .and_then(|file| file.strip_suffix(".png"))?
                .to_string();
            Some((name, url))
        })
        .collect()
}
