//! Load command - admit markers from a JSON file and render them.
//!
//! The marker file is a JSON array:
//!
//! ```json
//! [
//!   { "id": "home", "lat": 45.0, "lon": 5.0, "title": "Base" },
//!   { "lat": 45.001, "lon": 5.0, "scale": 1.5, "attributes": { "category": "peak" } }
//! ]
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use markerlayer::config::{CoreConfig, DEFAULT_CONFIG_FILENAME};
use markerlayer::geo::GeoPoint;
use markerlayer::layer::{MarkerLayer, MarkerSurface};
use markerlayer::poi::{Admission, Attributes, PoiCandidate, VisualPatch};
use markerlayer::render::SchedulerSnapshot;

use crate::error::CliError;
use crate::surface::LogSurface;

/// Arguments for the load command.
pub struct LoadArgs {
    pub file: PathBuf,
    pub config: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub max_concurrent: Option<usize>,
    pub steady: bool,
}

/// One entry of the marker file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkerRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl MarkerRecord {
    /// Converts the record into an admission candidate.
    pub fn to_candidate(&self) -> Result<PoiCandidate, CliError> {
        let mut candidate = PoiCandidate::new(GeoPoint::new(self.lat, self.lon)?);
        if let Some(id) = &self.id {
            candidate = candidate.with_id(id.as_str());
        }
        if let Some(title) = &self.title {
            candidate = candidate.with_title(title.as_str());
        }
        candidate = candidate.with_visual(VisualPatch {
            scale: self.scale,
            visible: self.visible,
            ..VisualPatch::default()
        });
        candidate.attributes = self.attributes.clone();
        Ok(candidate)
    }
}

/// Result of loading a marker file.
#[derive(Debug, Clone)]
pub struct LoadSummary {
    pub admitted: usize,
    /// `(entry index, reason)` for every rejected entry.
    pub rejected: Vec<(usize, String)>,
    /// Draw calls that reached the surface.
    pub drawn: usize,
    pub render: SchedulerSnapshot,
}

/// Run the load command.
pub fn run(args: LoadArgs) -> Result<(), CliError> {
    let records = read_markers(&args.file)?;
    let config = resolve_config(&args)?;
    info!(
        file = %args.file.display(),
        markers = records.len(),
        threshold_m = config.store.proximity_threshold_m,
        max_concurrent = config.scheduler.max_concurrent,
        "Loading markers"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let summary = runtime.block_on(load_markers(records, config))?;

    print_summary(&args.file, &summary);
    Ok(())
}

/// Reads and parses a marker file.
pub fn read_markers(path: &Path) -> Result<Vec<MarkerRecord>, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::MarkerFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Config file (explicit or default name in the working directory), then
/// command-line overrides. The merged store settings are validated.
fn resolve_config(args: &LoadArgs) -> Result<CoreConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => CoreConfig::load(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILENAME);
            if default_path.is_file() {
                CoreConfig::load(default_path)?
            } else {
                CoreConfig::default()
            }
        }
    };

    if let Some(threshold) = args.threshold {
        config.store.proximity_threshold_m = threshold;
    }
    if let Some(max) = args.max_concurrent {
        config.scheduler = config.scheduler.with_max_concurrent(max);
    }
    if args.steady {
        config.scheduler.steady_state = true;
    }
    config.store.validate()?;
    Ok(config)
}

/// Admits every record in order and waits for the renders to settle.
pub async fn load_markers(
    records: Vec<MarkerRecord>,
    config: CoreConfig,
) -> Result<LoadSummary, CliError> {
    let surface = Arc::new(LogSurface::default());
    let layer = MarkerLayer::new(config, Arc::clone(&surface) as Arc<dyn MarkerSurface>)?;

    let mut admitted = 0;
    let mut rejected = Vec::new();
    for (index, record) in records.iter().enumerate() {
        let candidate = match record.to_candidate() {
            Ok(candidate) => candidate,
            Err(e) => {
                rejected.push((index, e.to_string()));
                continue;
            }
        };
        match layer.place(candidate) {
            Admission::Admitted(poi) => {
                debug!(index, poi_id = %poi.id, "Marker admitted");
                admitted += 1;
            }
            Admission::Rejected(reason) => rejected.push((index, reason.to_string())),
        }
    }

    // Loading is the startup phase; switch to the short delay once done.
    layer.mark_steady_state();
    layer.wait_idle().await;
    let render = layer.render_snapshot();
    layer.shutdown();

    Ok(LoadSummary {
        admitted,
        rejected,
        drawn: surface.draws(),
        render,
    })
}

fn print_summary(file: &Path, summary: &LoadSummary) {
    println!("Loaded {}", file.display());
    println!("  Admitted: {}", summary.admitted);
    println!("  Rejected: {}", summary.rejected.len());
    for (index, reason) in &summary.rejected {
        println!("    #{}: {}", index, reason);
    }
    println!("  Drawn:    {}", summary.drawn);
    println!("  Renders:  {}", summary.render);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    use markerlayer::poi::PoiError;
    use markerlayer::render::SchedulerConfig;

    const MARKERS: &str = r#"[
        { "id": "a", "lat": 45.0, "lon": 5.0, "title": "A" },
        { "id": "b", "lat": 45.00003, "lon": 5.0 },
        { "id": "c", "lat": 45.001, "lon": 5.0, "scale": 2.0, "attributes": { "category": "peak" } },
        { "lat": 95.0, "lon": 5.0 }
    ]"#;

    fn fast_config() -> CoreConfig {
        CoreConfig::default().with_scheduler(
            SchedulerConfig::default()
                .with_delays(Duration::from_millis(1), Duration::from_millis(1)),
        )
    }

    #[test]
    fn test_read_markers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MARKERS.as_bytes()).unwrap();

        let records = read_markers(file.path()).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].id.as_deref(), Some("a"));
        assert_eq!(records[2].scale, Some(2.0));
        assert_eq!(records[2].attributes["category"], "peak");
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(matches!(
            read_markers(file.path()),
            Err(CliError::MarkerFile { .. })
        ));
    }

    #[test]
    fn test_to_candidate() {
        let record: MarkerRecord =
            serde_json::from_str(r#"{ "id": "x", "lat": 1.0, "lon": 2.0, "visible": false }"#)
                .unwrap();
        let candidate = record.to_candidate().unwrap();
        assert_eq!(candidate.id.unwrap().as_str(), "x");
        assert_eq!(candidate.position.lat(), 1.0);
        assert_eq!(candidate.visual.visible, Some(false));
    }

    #[test]
    fn test_cli_overrides_config() {
        let args = LoadArgs {
            file: PathBuf::from("unused.json"),
            config: None,
            threshold: Some(10.0),
            max_concurrent: Some(0),
            steady: true,
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.store.proximity_threshold_m, 10.0);
        assert_eq!(config.scheduler.max_concurrent, 1);
        assert!(config.scheduler.steady_state);
    }

    #[test]
    fn test_invalid_threshold_flag_rejected() {
        for threshold in [f64::NAN, -10.0] {
            let args = LoadArgs {
                file: PathBuf::from("unused.json"),
                config: None,
                threshold: Some(threshold),
                max_concurrent: None,
                steady: false,
            };
            assert!(matches!(
                resolve_config(&args),
                Err(CliError::Store(PoiError::InvalidThreshold(_)))
            ));
        }
    }

    #[tokio::test]
    async fn test_load_markers_summary() {
        let records: Vec<MarkerRecord> = serde_json::from_str(MARKERS).unwrap();
        let summary = load_markers(records, fast_config()).await.unwrap();

        assert_eq!(summary.admitted, 2);
        let indices: Vec<_> = summary.rejected.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![1, 3]);
        assert!(summary.rejected[0].1.contains("too close"));
        assert_eq!(summary.drawn, 2);
        assert_eq!(summary.render.succeeded, 2);
        assert!(summary.render.is_idle());
    }
}
