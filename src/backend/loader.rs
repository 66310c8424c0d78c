use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use memmap2::Mmap;
use reqwest::header::{CACHE_CONTROL, HeaderValue};
use tracing::{debug, info, warn};

use super::error::{LoadError, LoadResult};
use super::headers::HeaderMap;
use super::parser::{CsvParser, delimiter_name};
use super::record::{CountCell, Record, RowNormalizer};

/// Where a dataset comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum DataSource {
    Remote(String),
    Local(PathBuf),
}

impl DataSource {
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DataSource::Remote(trimmed.to_string())
        } else {
            DataSource::Local(PathBuf::from(trimmed))
        }
    }

    pub fn display(&self) -> String {
        match self {
            DataSource::Remote(url) => url.clone(),
            DataSource::Local(path) => path.to_string_lossy().into_owned(),
        }
    }
}

/// A fully loaded complaint dataset. Immutable once built.
#[derive(Clone, Debug)]
pub struct Dataset {
    source: String,
    records: Vec<Record>,
    delimiter: char,
    header_map: HeaderMap,
    coerced_counts: usize,
}

impl Dataset {
    /// Runs the text pipeline: BOM and CR removal, line split, delimiter
    /// detection, header mapping and row normalization.
    pub fn parse(source: &str, text: &str) -> LoadResult<Self> {
        // The BOM has to go before splitting, or a quoted first header keeps it
        // outside its quotes and the quote layer is never stripped.
        let text = text.strip_prefix('\u{feff}').unwrap_or(text).replace('\r', "");
        if text.trim().is_empty() {
            return Err(LoadError::Empty(source.to_string()));
        }

        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        // Non-empty after trim guarantees at least one line.
        let header_line = lines.next().unwrap_or_default();

        let delimiter = CsvParser::detect_delimiter(header_line);
        let headers = CsvParser::parse_line(header_line, delimiter);
        let header_map = HeaderMap::resolve(&headers)?;
        let normalizer = RowNormalizer::new(&header_map);

        let mut records = Vec::new();
        let mut coerced_counts = 0;
        for line in lines {
            let cells = CsvParser::parse_line(line, delimiter);
            let (record, count) = normalizer.normalize(&cells);
            if count == CountCell::Coerced {
                coerced_counts += 1;
            }
            records.push(record);
        }

        Ok(Self {
            source: source.to_string(),
            records,
            delimiter,
            header_map,
            coerced_counts,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn header_map(&self) -> &HeaderMap {
        &self.header_map
    }

    /// Number of count cells that had content but could not be parsed.
    pub fn coerced_counts(&self) -> usize {
        self.coerced_counts
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LoadOptions {
    pub cache_bust: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { cache_bust: true }
    }
}

pub struct DatasetLoader {
    client: reqwest::Client,
    options: LoadOptions,
}

impl DatasetLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            client: reqwest::Client::new(),
            options,
        }
    }

    /// Fetches `path` and turns it into a dataset. Every failure is folded
    /// into a single `LoadError`.
    pub async fn load(&self, path: &str) -> LoadResult<Dataset> {
        let source = DataSource::parse(path);
        let name = source.display();

        let result = self.load_source(&source, &name).await;

        match &result {
            Ok(dataset) => {
                info!(
                    source = %name,
                    rows = dataset.len(),
                    delimiter = delimiter_name(dataset.delimiter()),
                    "dataset loaded"
                );
                if dataset.coerced_counts() > 0 {
                    debug!(cells = dataset.coerced_counts(), "non-numeric count cells read as 0");
                }
            }
            Err(e) => warn!(source = %name, kind = e.kind(), "dataset load failed: {}", e),
        }
        result
    }

    async fn load_source(&self, source: &DataSource, name: &str) -> LoadResult<Dataset> {
        match source {
            DataSource::Remote(url) => {
                let bytes = self.fetch_remote(url).await?;
                Dataset::parse(name, decode(&bytes)?)
            }
            DataSource::Local(path) => {
                let path = path.clone();
                let owned = name.to_string();
                tokio::task::spawn_blocking(move || parse_local(&path, &owned))
                    .await
                    .map_err(|e| LoadError::fetch(name, e.to_string()))?
            }
        }
    }

    async fn fetch_remote(&self, url: &str) -> LoadResult<Vec<u8>> {
        let target = if self.options.cache_bust {
            cache_busted_url(url, unix_millis())
        } else {
            url.to_string()
        };
        debug!(url = %target, "fetching dataset");

        let mut request = self.client.get(&target);
        if self.options.cache_bust {
            request = request.header(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| LoadError::fetch(url, format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::fetch(url, format!("server returned {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LoadError::fetch(url, format!("failed to read body: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new(LoadOptions::default())
    }
}

/// Maps the file and parses straight out of the mapping. Records own their
/// strings, so nothing borrowed from the map outlives this call.
fn parse_local(path: &Path, name: &str) -> LoadResult<Dataset> {
    let file = File::open(path).map_err(|e| LoadError::fetch(name, e.to_string()))?;
    let len = file
        .metadata()
        .map_err(|e| LoadError::fetch(name, e.to_string()))?
        .len();
    if len == 0 {
        // Zero-length files cannot be mapped.
        return Err(LoadError::Empty(name.to_string()));
    }
    // SAFETY: the mapping is read-only and dropped before returning. Another
    // process truncating or rewriting the file while it is mapped is not
    // guarded against; the result is garbled text or SIGBUS.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| LoadError::fetch(name, e.to_string()))?;
    Dataset::parse(name, decode(&mmap)?)
}

fn decode(bytes: &[u8]) -> LoadResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| LoadError::Decode(e.to_string()))
}

/// Appends a `_=<millis>` query parameter so intermediaries never serve a
/// stale copy.
pub fn cache_busted_url(url: &str, millis: u128) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}_={}", url, separator, millis)
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headers::CanonicalField;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    const SAMPLE: &str = "연령,성별,분야,건수\n20대,남성,교통,5\n30대,여성,환경,3\n20대,여성,교통,2\n";

    /// Serves one canned HTTP response on a loopback port. The receiver yields
    /// the request head the client sent.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> Result<(String, oneshot::Receiver<String>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = tx.send(String::from_utf8_lossy(&head).into_owned());
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: text/csv; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        Ok((format!("http://{}/data.csv", addr), rx))
    }

    #[test]
    fn test_parse_sample() -> Result<()> {
        let dataset = Dataset::parse("sample", SAMPLE)?;
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.delimiter(), ',');
        assert_eq!(dataset.records()[0].category, "교통");
        assert_eq!(dataset.records()[2].count, 2);
        Ok(())
    }

    #[test]
    fn test_parse_crlf_semicolon_and_blank_lines() -> Result<()> {
        let text = "\u{feff}Age;Sex;Type;Cnt\r\n\r\n20대;남성;교통;N/A\r\n  \r\n30대;여성\r\n";
        let dataset = Dataset::parse("sample", text)?;
        assert_eq!(dataset.delimiter(), ';');
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0].count, 0);
        assert_eq!(dataset.coerced_counts(), 1);
        assert_eq!(dataset.records()[1].category, "");
        Ok(())
    }

    #[test]
    fn test_parse_bom_before_quoted_headers() -> Result<()> {
        let text = "\u{feff}\"연령\",\"성별\",\"분야\",\"건수\"\n\"20대\",\"남성\",\"교통\",\"5\"\n";
        let dataset = Dataset::parse("x", text)?;
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].category, "교통");
        assert_eq!(dataset.records()[0].count, 5);
        assert_eq!(dataset.header_map().header(CanonicalField::Age), "연령");
        Ok(())
    }

    #[test]
    fn test_parse_empty_text() {
        let err = Dataset::parse("blank", " \r\n\n ").unwrap_err();
        assert!(matches!(err, LoadError::Empty(_)));
    }

    #[test]
    fn test_parse_missing_count_header() {
        let err = Dataset::parse("x", "연령,성별,분야\n20대,남성,교통").unwrap_err();
        match err {
            LoadError::Headers { missing, .. } => assert_eq!(missing, vec!["count".to_string()]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_header_only_dataset_is_valid() -> Result<()> {
        let dataset = Dataset::parse("x", "age,gender,category,count\n")?;
        assert!(dataset.is_empty());
        Ok(())
    }

    #[test]
    fn test_data_source_parse() {
        assert_eq!(
            DataSource::parse(" https://example.com/a.csv "),
            DataSource::Remote("https://example.com/a.csv".into())
        );
        assert_eq!(
            DataSource::parse("data/a.csv"),
            DataSource::Local(PathBuf::from("data/a.csv"))
        );
    }

    #[test]
    fn test_cache_busted_url() {
        assert_eq!(cache_busted_url("http://h/a.csv", 42), "http://h/a.csv?_=42");
        assert_eq!(cache_busted_url("http://h/a.csv?v=1", 42), "http://h/a.csv?v=1&_=42");
    }

    #[tokio::test]
    async fn test_load_local_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{}", SAMPLE)?;

        let dataset = DatasetLoader::default()
            .load(&file.path().to_string_lossy())
            .await?;
        assert_eq!(dataset.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_empty_local_file() -> Result<()> {
        let file = NamedTempFile::new()?;
        let err = DatasetLoader::default()
            .load(&file.path().to_string_lossy())
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Empty(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_missing_local_file() {
        let err = DatasetLoader::default()
            .load("/definitely/not/here.csv")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "fetch");
    }

    #[tokio::test]
    async fn test_load_invalid_utf8() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(&[0xff, 0xfe, 0x00, b'a'])?;
        let err = DatasetLoader::default()
            .load(&file.path().to_string_lossy())
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_remote() -> Result<()> {
        crate::logging::init_test();
        let (url, request) = serve_once("200 OK", SAMPLE).await?;
        let dataset = DatasetLoader::default().load(&url).await?;
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.source(), url);

        let head = request.await?;
        let request_line = head.lines().next().unwrap_or_default();
        assert!(request_line.starts_with("GET /data.csv?_="), "{request_line}");
        assert!(head.to_ascii_lowercase().contains("cache-control: no-cache"), "{head}");
        Ok(())
    }

    #[tokio::test]
    async fn test_load_remote_without_cache_bust() -> Result<()> {
        let (url, request) = serve_once("200 OK", SAMPLE).await?;
        let loader = DatasetLoader::new(LoadOptions { cache_bust: false });
        loader.load(&url).await?;

        let head = request.await?;
        assert!(head.starts_with("GET /data.csv HTTP/1.1"), "{head}");
        assert!(!head.to_ascii_lowercase().contains("cache-control"), "{head}");
        Ok(())
    }

    #[tokio::test]
    async fn test_load_remote_error_status() -> Result<()> {
        let (url, _request) = serve_once("404 Not Found", "").await?;
        let err = DatasetLoader::default().load(&url).await.unwrap_err();
        match err {
            LoadError::Fetch { message, .. } => assert!(message.contains("404")),
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }
}
