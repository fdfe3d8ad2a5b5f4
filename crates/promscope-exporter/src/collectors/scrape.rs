//! Self-instrumentation of the scrape endpoint.
//!
//! Requests are counted in a regular counter vector; the response size is a
//! bare atomic exposed as a const counter sample at collect time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use promscope_core::collector::{DescIter, SampleIter};
use promscope_core::error::Result;
use promscope_core::{Collector, CounterVec, Desc, MetricKind, Opts, Sample};

pub const REQUESTS: &str = "promscope_http_requests_total";
pub const RESPONSE_SIZE: &str = "promscope_http_response_size_bytes_total";

pub struct ScrapeStats {
    requests: CounterVec,
    size_desc: Arc<Desc>,
    size_bytes: AtomicU64,
}

impl ScrapeStats {
    pub fn new() -> Result<Self> {
        let requests = CounterVec::new(
            Opts::new(REQUESTS, "Scrape requests by status code and method."),
            &["code", "method"],
        )?;
        let size_desc = Opts::new(RESPONSE_SIZE, "Bytes served by successful scrapes.").describe(&[])?;
        Ok(Self {
            requests,
            size_desc: Arc::new(size_desc),
            size_bytes: AtomicU64::new(0),
        })
    }

    /// Count one request. Method is lowercased.
    pub fn record(&self, code: u16, method: &str) {
        let code = code.to_string();
        let method = method.to_ascii_lowercase();
        if let Ok(c) = self.requests.with_label_values(&[&code, &method]) {
            c.inc();
        }
    }

    pub fn add_response_size(&self, bytes: usize) {
        self.size_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn response_size(&self) -> u64 {
        self.size_bytes.load(Ordering::Relaxed)
    }
}

impl Collector for ScrapeStats {
    fn name(&self) -> &str {
        "scrape_stats"
    }

    fn describe(&self) -> DescIter<'_> {
        Box::new(
            [Arc::clone(self.requests.desc()), Arc::clone(&self.size_desc)].into_iter(),
        )
    }

    fn collect(&self) -> SampleIter<'_> {
        let size = Sample::new_const(
            Arc::clone(&self.size_desc),
            MetricKind::Counter,
            self.response_size() as f64,
            Vec::new(),
        );
        Box::new(self.requests.samples().map(Ok).chain(std::iter::once(size)))
    }
}
