use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use common::pricing::CasualSize;
use common::{AdType, SizeType};
use lopdf::Document;
use tracing::{debug, info, instrument};

use crate::annotations::{AdFlags, Mark, MarkKind, resolve_color_mark};
use crate::canvas::{Fonts, PageCanvas};
use crate::error::LayoutError;
use crate::font::FontCache;
use crate::format::{
    MAX_WRAPPED_LINES, WRAP_WIDTH_CHARS, abbreviate_name, color_label, digit_slots,
    normalize_phone, wrap_lines,
};
use crate::grid::layout_text;
use crate::publisher::{Point, PublisherProfile, PublisherRegistry};
use crate::template::{FilesystemTemplateStore, TemplateStore};

/// Everything printed for one advertisement.
#[derive(Debug, Clone, PartialEq)]
pub struct AdSnapshot {
    pub reference_number: String,
    pub publisher: Option<String>,
    /// Newspaper key used by edition-specific annotation rows.
    pub edition_key: String,
    pub ad_type: AdType,
    pub classification: String,
    pub subcategory: Option<String>,
    pub publish_date: NaiveDate,
    /// Stored text, priority marker included.
    pub ad_text: String,
    pub price: f64,
    pub advertiser_name: String,
    pub address: Option<String>,
    pub email: String,
    pub phone: String,
    pub nic: Option<String>,
    pub special_notes: Option<String>,
    pub flags: AdFlags,
    pub casual: Option<CasualSize>,
}

pub struct LayoutEngine {
    templates: Arc<dyn TemplateStore>,
    publishers: PublisherRegistry,
    fonts: FontCache,
    strict_publishers: bool,
}

impl LayoutEngine {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        publishers: PublisherRegistry,
        fonts: FontCache,
    ) -> Self {
        Self {
            templates,
            publishers,
            fonts,
            strict_publishers: false,
        }
    }

    /// Templates under `{dir}/{publisher}/` and fonts under `{dir}/fonts/`.
    pub fn from_dir(dir: &Path, publishers: PublisherRegistry) -> Self {
        Self::new(
            Arc::new(FilesystemTemplateStore::new(dir)),
            publishers,
            FontCache::new(dir.join("fonts")),
        )
    }

    /// Fail on publishers without their own profile instead of using the default.
    pub fn strict_publishers(mut self, strict: bool) -> Self {
        self.strict_publishers = strict;
        self
    }

    pub fn publishers(&self) -> &PublisherRegistry {
        &self.publishers
    }

    fn profile_for(&self, publisher: &str) -> Result<&PublisherProfile, LayoutError> {
        if self.strict_publishers {
            self.publishers.resolve_strict(publisher)
        } else {
            Ok(self.publishers.resolve(publisher).profile())
        }
    }

    /// Render the print PDF for one advertisement.
    #[instrument(skip(self, snapshot), fields(reference = %snapshot.reference_number))]
    pub fn render(&self, snapshot: &AdSnapshot) -> Result<Vec<u8>, LayoutError> {
        let publisher = snapshot
            .publisher
            .as_deref()
            .ok_or(LayoutError::NoPublisherMapped)?;
        let profile = self.profile_for(publisher)?;

        let template = self
            .templates
            .load(publisher, snapshot.ad_type)?
            .ok_or_else(|| LayoutError::TemplateNotFound {
                publisher: publisher.to_string(),
                ad_type: snapshot.ad_type,
            })?;
        let mut doc = Document::load_mem(&template)?;

        let canvas = compose(profile, snapshot);
        let fonts = Fonts {
            latin: match &profile.latin_font {
                Some(file) => self.fonts.get(file)?,
                None => None,
            },
            sinhala: if canvas.needs_sinhala() {
                Some(self.fonts.require(&profile.sinhala_font)?)
            } else {
                None
            },
        };
        debug!(operations = canvas.len(), "Composed print page");
        canvas.apply(&mut doc, &fonts)?;

        let mut out = Vec::new();
        doc.save_to(&mut out)?;
        info!(publisher, bytes = out.len(), "Rendered print PDF");
        Ok(out)
    }

    /// [`render`](Self::render) on the blocking thread pool.
    pub async fn render_async(self: Arc<Self>, snapshot: AdSnapshot) -> Result<Vec<u8>, LayoutError> {
        tokio::task::spawn_blocking(move || self.render(&snapshot))
            .await
            .map_err(|e| LayoutError::Task(e.to_string()))?
    }
}

/// Lay out every field, the body text and the marks of one ad.
pub fn compose(profile: &PublisherProfile, snapshot: &AdSnapshot) -> PageCanvas {
    let mut canvas = PageCanvas::new();
    let size = profile.font_size;
    let fields = &profile.fields;

    let classification = match &snapshot.subcategory {
        Some(sub) if !sub.is_empty() => format!("{} / {}", snapshot.classification, sub),
        _ => snapshot.classification.clone(),
    };
    let simple = [
        (fields.reference, Some(snapshot.reference_number.clone())),
        (
            fields.publish_date,
            Some(snapshot.publish_date.format("%Y-%m-%d").to_string()),
        ),
        (fields.classification, Some(classification)),
        (fields.price, Some(format!("{:.2}", snapshot.price))),
        (fields.name, Some(abbreviate_name(&snapshot.advertiser_name))),
        (fields.address, snapshot.address.clone()),
        (fields.email, Some(snapshot.email.clone())),
        (fields.notes, snapshot.special_notes.clone()),
    ];
    for (slot, value) in simple {
        if let (Some(at), Some(value)) = (slot, value) {
            canvas.text(at, size, value);
        }
    }

    if let Some(slots) = &fields.phone_digits {
        for p in digit_slots(&normalize_phone(&snapshot.phone), slots) {
            canvas.text(p.at, size, p.text);
        }
    }
    if let (Some(slots), Some(nic)) = (&fields.nic_digits, &snapshot.nic) {
        for p in digit_slots(&nic.to_uppercase(), slots) {
            canvas.text(p.at, size, p.text);
        }
    }

    if snapshot.ad_type.is_casual() {
        compose_casual(profile, snapshot, &mut canvas);
    } else {
        for p in layout_text(&snapshot.ad_text, profile) {
            canvas.text(p.at, size, p.text);
        }
    }

    for mark in profile
        .annotations
        .marks_for(&snapshot.edition_key, &snapshot.flags)
    {
        canvas.mark(mark);
    }
    if let Some(at) = snapshot
        .flags
        .color
        .and_then(|color| resolve_color_mark(profile, color))
    {
        canvas.mark(Mark {
            kind: MarkKind::Cross,
            at,
        });
    }
    canvas
}

fn compose_casual(profile: &PublisherProfile, snapshot: &AdSnapshot, canvas: &mut PageCanvas) {
    let size = profile.font_size;
    let fields = &profile.fields;

    if let Some(block) = &fields.casual_text {
        let lines = wrap_lines(
            &snapshot.ad_text,
            block.width_chars.unwrap_or(WRAP_WIDTH_CHARS),
            block.max_lines.unwrap_or(MAX_WRAPPED_LINES),
        );
        for (i, line) in lines.into_iter().enumerate() {
            let at = Point {
                x: block.x,
                y: block.y - block.line_height * i as f32,
            };
            canvas.text(at, size, line);
        }
    }

    if let Some(casual) = &snapshot.casual {
        if let Some(at) = fields.casual_dimensions {
            let dimensions = match casual.size_type {
                SizeType::Full => "Full page".to_string(),
                SizeType::Custom => format!("{} col x {} cm", casual.columns, casual.height_cm),
            };
            canvas.text(at, size, dimensions);
        }
        if let Some(at) = fields.casual_color_label {
            canvas.text(at, size, color_label(casual.color));
        }
    }
}
