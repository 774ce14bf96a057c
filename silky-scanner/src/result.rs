use serde::{Deserialize, Serialize};

/// Longest body text kept on a page record.
pub const MAX_CONTENT_CHARS: usize = 50_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub h1_tags: Vec<String>,
    pub depth: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub load_time_ms: u64,
}

impl PageRecord {
    pub fn new(url: String, depth: usize) -> Self {
        Self {
            url,
            title: String::new(),
            content: String::new(),
            meta_description: String::new(),
            h1_tags: Vec::new(),
            depth,
            content_type: None,
            load_time_ms: 0,
        }
    }

    /// Stores the page text, cut at [`MAX_CONTENT_CHARS`] characters.
    pub fn with_content(mut self, text: &str) -> Self {
        self.content = text.chars().take(MAX_CONTENT_CHARS).collect();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    ImgTag,
    CssBackground,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::ImgTag => "img_tag",
            ImageKind::CssBackground => "css_background",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub url: String,
    pub source_page: String,
    pub depth: usize,
    pub image_type: ImageKind,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub dimensions: Option<(u32, u32)>,
}

/// One entry of the collected data: either a scraped page or an image found on one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CollectedRecord {
    Page(PageRecord),
    Image(ImageRecord),
}

impl CollectedRecord {
    pub fn url(&self) -> &str {
        match self {
            CollectedRecord::Page(page) => &page.url,
            CollectedRecord::Image(image) => &image.url,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            CollectedRecord::Page(page) => page.depth,
            CollectedRecord::Image(image) => image.depth,
        }
    }

    pub fn as_page(&self) -> Option<&PageRecord> {
        match self {
            CollectedRecord::Page(page) => Some(page),
            CollectedRecord::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageRecord> {
        match self {
            CollectedRecord::Image(image) => Some(image),
            CollectedRecord::Page(_) => None,
        }
    }
}
