use std::io::{self, Read};

/// Reader adapter that logs download-style progress.
///
/// A line is logged each time the whole-percent value advances. With an
/// unknown (zero) total nothing is logged.
pub struct ProgressReader<R> {
    inner: R,
    label: String,
    loaded: u64,
    total: u64,
    last_percent: Option<u64>,
    /// Progress lines logged so far.
    reports: u32,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(inner: R, total: u64, label: impl Into<String>) -> Self {
        Self {
            inner,
            label: label.into(),
            loaded: 0,
            total,
            last_percent: None,
            reports: 0,
        }
    }

    pub fn loaded(&self) -> u64 {
        self.loaded
    }

    /// Percent complete, or `None` when the total is unknown.
    pub fn percent(&self) -> Option<f64> {
        (self.total > 0).then(|| self.loaded as f64 / self.total as f64 * 100.0)
    }

    fn report(&mut self) {
        let Some(pct) = self.percent() else { return };
        let whole = self.loaded * 100 / self.total;
        if self.last_percent == Some(whole) {
            return;
        }
        if self.reports == 0 {
            log::debug!("{}: reading {} bytes", self.label, self.total);
        }
        self.last_percent = Some(whole);
        self.reports += 1;
        log::info!("{}: {:.2}% downloaded", self.label, pct);
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.loaded += n as u64;
            self.report();
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_bytes_and_percent() {
        let data = vec![7u8; 1000];
        let mut r = ProgressReader::new(&data[..], data.len() as u64, "blob");
        let mut buf = [0u8; 250];

        r.read_exact(&mut buf).unwrap();
        assert_eq!(r.loaded(), 250);
        assert_eq!(r.percent(), Some(25.0));

        let mut rest = Vec::new();
        r.read_to_end(&mut rest).unwrap();
        assert_eq!(rest.len(), 750);
        assert_eq!(r.percent(), Some(100.0));
    }

    #[test]
    fn unknown_total_has_no_percent() {
        let data = b"abc";
        let mut r = ProgressReader::new(&data[..], 0, "stream");
        let mut out = String::new();
        r.read_to_string(&mut out).unwrap();
        assert_eq!(out, "abc");
        assert_eq!(r.percent(), None);
        assert_eq!(r.reports, 0);
    }

    // ── reporting cadence ─────────────────────────────────────────────────

    fn drain_in_chunks(r: &mut ProgressReader<&[u8]>, chunk: usize) {
        let mut buf = vec![0u8; chunk];
        while r.read(&mut buf).unwrap() > 0 {}
    }

    #[test]
    fn reports_once_per_whole_percent() {
        // 5-byte reads over 1000 bytes: two reads per percent step.
        let data = vec![0u8; 1000];
        let mut r = ProgressReader::new(&data[..], 1000, "mesh");
        drain_in_chunks(&mut r, 5);
        assert_eq!(r.loaded(), 1000);
        // 0.5% (floor 0) through 100%.
        assert_eq!(r.reports, 101);
    }

    #[test]
    fn coarse_reads_report_each_read() {
        let data = vec![0u8; 1000];
        let mut r = ProgressReader::new(&data[..], 1000, "mesh");
        drain_in_chunks(&mut r, 250);
        assert_eq!(r.reports, 4);
    }

    #[test]
    fn zero_total_never_reports() {
        let data = vec![0u8; 64];
        let mut r = ProgressReader::new(&data[..], 0, "stream");
        drain_in_chunks(&mut r, 1);
        assert_eq!(r.loaded(), 64);
        assert_eq!(r.reports, 0);
    }
}
