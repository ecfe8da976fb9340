//! Operation counters for the LFU cache (feature `metrics`).
//!
//! ## Example Usage
//!
//! ```
//! use freqcache::metrics::exporter::PrometheusTextExporter;
//! use freqcache::metrics::traits::MetricsExporter;
//! use freqcache::policy::lfu::LfuCore;
//!
//! let mut cache = LfuCore::new(2);
//! cache.insert("a", 1);
//! cache.get(&"a");
//! cache.get(&"missing");
//!
//! let snapshot = cache.metrics_snapshot();
//! assert_eq!(snapshot.get_hits, 1);
//! assert_eq!(snapshot.get_misses, 1);
//!
//! let exporter = PrometheusTextExporter::new("freqcache", Vec::new());
//! exporter.export(&snapshot);
//! let text = String::from_utf8(exporter.into_inner()).unwrap();
//! assert!(text.contains("freqcache_get_hits_total 1"));
//! ```

pub mod cell;
pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;

pub use exporter::PrometheusTextExporter;
pub use metrics_impl::LfuMetrics;
pub use snapshot::LfuMetricsSnapshot;
pub use traits::{MetricsExporter, MetricsSnapshotProvider};
