use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

pub const DEFAULT_ATLAS_URL: &str =
    "https://raw.githubusercontent.com/datasets/geo-countries/master/data/countries.geojson";

/// One closed landmass outline as (longitude, latitude) pairs.
pub type Ring = Vec<(f64, f64)>;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed dataset: {0}")]
    Malformed(&'static str),
}

/// World-outline load state. `Failed` is terminal for the session: the
/// globe keeps rendering without geography and no retry is attempted.
#[derive(Debug, Default)]
pub enum Atlas {
    #[default]
    Loading,
    Ready(Vec<Ring>),
    Failed,
}

impl Atlas {
    pub fn rings(&self) -> Option<&[Ring]> {
        match self {
            Atlas::Ready(rings) => Some(rings),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Atlas::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Atlas::Failed)
    }
}

#[derive(Debug)]
pub enum AtlasEvent {
    Loaded(Vec<Ring>),
    Failed(String),
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Option<Vec<Feature>>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

/// Flatten a GeoJSON feature collection into boundary rings. `Polygon`
/// contributes its rings, `MultiPolygon` every ring of every member
/// polygon; other geometry kinds are skipped. Rings with fewer than two
/// usable points are dropped at ingest.
pub fn parse_rings(doc: &str) -> Result<Vec<Ring>, AtlasError> {
    let collection: FeatureCollection =
        serde_json::from_str(doc).map_err(|_| AtlasError::Malformed("not a feature collection"))?;
    let features = collection
        .features
        .ok_or(AtlasError::Malformed("missing features"))?;

    let mut rings = Vec::new();
    for feature in &features {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        match geometry.kind.as_str() {
            "Polygon" => collect_polygon(&geometry.coordinates, &mut rings),
            "MultiPolygon" => {
                if let Value::Array(polygons) = &geometry.coordinates {
                    for polygon in polygons {
                        collect_polygon(polygon, &mut rings);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(rings)
}

fn collect_polygon(coordinates: &Value, rings: &mut Vec<Ring>) {
    let Value::Array(raw_rings) = coordinates else {
        return;
    };
    for raw in raw_rings {
        if let Some(ring) = ring_from_value(raw) {
            rings.push(ring);
        }
    }
}

fn ring_from_value(value: &Value) -> Option<Ring> {
    let points = value.as_array()?;
    let ring: Ring = points
        .iter()
        .filter_map(|point| {
            let pair = point.as_array()?;
            Some((pair.first()?.as_f64()?, pair.get(1)?.as_f64()?))
        })
        .collect();
    (ring.len() >= 2).then_some(ring)
}

/// Fetch and flatten the world outlines, reporting the outcome over the
/// app's event channel. Issued exactly once at startup; any failure is
/// logged here and leaves the renderer in degraded mode for good.
pub async fn fetch_world(url: String, events: mpsc::Sender<AtlasEvent>) {
    let event = match load(&url).await {
        Ok(rings) => {
            tracing::info!(rings = rings.len(), "world outlines loaded");
            AtlasEvent::Loaded(rings)
        }
        Err(err) => {
            tracing::warn!(url = %url, error = %err, "world outline fetch failed");
            AtlasEvent::Failed(err.to_string())
        }
    };
    let _ = events.send(event).await;
}

async fn load(url: &str) -> Result<Vec<Ring>, AtlasError> {
    let body = reqwest::get(url).await?.error_for_status()?.text().await?;
    parse_rings(&body)
}
