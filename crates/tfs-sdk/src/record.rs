use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tfs_types::{ContentId, FileKind, Timestamp};

use crate::error::SdkError;

/// Metadata of a file in a tenant tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Virtual path relative to the tenant root.
    pub path: String,
    pub name: String,
    pub size: u64,
    pub modified: Timestamp,
    pub kind: FileKind,
    pub mime: String,
    /// SHA-256 of the contents, when it was computed (uploads and writes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<ContentId>,
}

/// Where a download reads from: a tenant path or a content-store object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Locator {
    Path(String),
    Content(ContentId),
}

impl Locator {
    const CID_PREFIX: &'static str = "cid:";

    /// `cid:<64 hex>` names a content object; anything else is a path.
    pub fn parse(s: &str) -> Result<Self, SdkError> {
        match s.strip_prefix(Self::CID_PREFIX) {
            Some(hex) => Ok(Self::Content(tfs_store::object::parse_content_id(hex)?)),
            None => Ok(Self::Path(s.to_string())),
        }
    }
}

impl FromStr for Locator {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{p}"),
            Self::Content(cid) => write!(f, "{}{cid}", Self::CID_PREFIX),
        }
    }
}

impl From<ContentId> for Locator {
    fn from(cid: ContentId) -> Self {
        Self::Content(cid)
    }
}

/// An open download: metadata plus a byte stream.
pub struct Download {
    pub name: String,
    pub size: u64,
    pub mime: &'static str,
    reader: Box<dyn Read + Send>,
}

impl Download {
    pub(crate) fn new(
        name: String,
        size: u64,
        mime: &'static str,
        reader: Box<dyn Read + Send>,
    ) -> Self {
        Self {
            name,
            size,
            mime,
            reader,
        }
    }

    pub fn into_reader(self) -> Box<dyn Read + Send> {
        self.reader
    }

    /// Read the whole stream into memory.
    pub fn read_all(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(usize::try_from(self.size).unwrap_or(0));
        self.reader.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Read for Download {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Download")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("mime", &self.mime)
            .finish_non_exhaustive()
    }
}

/// Requested page, 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl PageRequest {
    pub const DEFAULT_PER_PAGE: usize = 5;

    pub fn new(page: usize, per_page: usize) -> Self {
        Self { page, per_page }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PER_PAGE)
    }
}

/// One page of results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Cut `items` into pages. There is always at least one (possibly empty)
    /// page, and out-of-range page numbers are clamped into range.
    pub fn paginate(items: Vec<T>, request: PageRequest) -> Self {
        let per_page = request.per_page.max(1);
        let total_items = items.len();
        let total_pages = total_items.div_ceil(per_page).max(1);
        let page = request.page.clamp(1, total_pages);
        let items = items
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();
        Self {
            items,
            page,
            per_page,
            total_items,
            total_pages,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_parsing() {
        let cid = ContentId::of(b"hello");
        assert_eq!(
            Locator::parse(&format!("cid:{}", cid.to_hex())).unwrap(),
            Locator::Content(cid)
        );
        assert_eq!(
            Locator::parse("docs/a.txt").unwrap(),
            Locator::Path("docs/a.txt".into())
        );
        assert!(Locator::parse("cid:xyz").is_err());
        assert_eq!(
            Locator::Content(cid).to_string(),
            format!("cid:{}", cid.to_hex())
        );
    }

    #[test]
    fn pagination_clamps() {
        let items: Vec<u32> = (1..=12).collect();
        let p = Page::paginate(items.clone(), PageRequest::new(2, 5));
        assert_eq!(p.items, [6, 7, 8, 9, 10]);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_prev() && p.has_next());

        let last = Page::paginate(items.clone(), PageRequest::new(99, 5));
        assert_eq!(last.page, 3);
        assert_eq!(last.items, [11, 12]);
        assert!(!last.has_next());

        let first = Page::paginate(items, PageRequest::new(0, 5));
        assert_eq!(first.page, 1);
    }

    #[test]
    fn empty_input_has_one_page() {
        let p: Page<u32> = Page::paginate(Vec::new(), PageRequest::default());
        assert_eq!(p.total_pages, 1);
        assert_eq!(p.page, 1);
        assert!(p.items.is_empty());
    }

    #[test]
    fn download_reads_stream() {
        let d = Download::new(
            "a.txt".into(),
            3,
            "text/plain",
            Box::new(io::Cursor::new(b"abc".to_vec())),
        );
        assert_eq!(d.read_all().unwrap(), b"abc");
    }
}
