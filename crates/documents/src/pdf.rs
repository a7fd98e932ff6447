//! HTML to PDF conversion.
//!
//! The converter understands the small subset of HTML the summary layout uses: headings,
//! paragraphs with `<br>` line breaks, two-column tables, lists, horizontal rules and
//! images on A4 pages. Text is set in the configured TrueType font when there is one, and in
//! the built-in Helvetica faces otherwise. The built-in faces only cover WinAnsiEncoding, so
//! without a font file any other character fails the conversion rather than vanishing.

use crate::resolver::{ResolvedResource, ResourceKind, ResourceLocation, ResourceResolver};
use crate::{RenderError, RenderResult};
use printpdf::image_crate::{self, DynamicImage, GenericImageView};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point,
};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;
use std::fs;
use std::io::BufWriter;
use std::path::Path;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 18.0;
const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
const LABEL_COLUMN_MM: f32 = 48.0;
const CELL_PADDING_MM: f32 = 2.0;
const MAX_IMAGE_HEIGHT_MM: f32 = 22.0;
const PT_TO_MM: f32 = 0.352_778;
const BODY_SIZE: f32 = 10.0;

/// Characters of WinAnsiEncoding outside the Latin-1 ranges.
const WIN_ANSI_EXTRAS: &[char] = &[
    '€', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', 'Ž', '‘', '’', '“', '”', '•',
    '–', '—', '˜', '™', 'š', '›', 'œ', 'ž', 'Ÿ',
];

const EMBEDDABLE_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif", "image/bmp"];

/// Output of a successful conversion.
#[derive(Debug)]
pub struct Conversion {
    pub bytes: Vec<u8>,
    pub resources: Vec<ResolvedResource>,
}

fn conversion_error(err: impl std::fmt::Display) -> RenderError {
    RenderError::Conversion(err.to_string())
}

fn selector(css: &str) -> RenderResult<Selector> {
    Selector::parse(css).map_err(|err| conversion_error(format!("invalid selector {css}: {err:?}")))
}

/// Converts an HTML document to PDF bytes.
///
/// Stylesheets are resolved and recorded but not applied. Images are embedded when they
/// resolve to a local PNG, JPEG, GIF or BMP file.
pub fn convert(html: &str, title: &str, resolver: &ResourceResolver) -> RenderResult<Conversion> {
    let document = Html::parse_document(html);

    let body_selector = selector("body")?;
    let body = document
        .select(&body_selector)
        .next()
        .ok_or_else(|| conversion_error("document has no <body>"))?;

    let mut resources = Vec::new();

    let link_selector = selector("link[href]")?;
    for link in document.select(&link_selector) {
        let is_stylesheet = link
            .value()
            .attr("rel")
            .map(|rel| {
                rel.split_whitespace()
                    .any(|token| token.eq_ignore_ascii_case("stylesheet"))
            })
            .unwrap_or(false);
        if let (true, Some(href)) = (is_stylesheet, link.value().attr("href")) {
            resources.push(ResolvedResource {
                uri: href.to_string(),
                kind: ResourceKind::Stylesheet,
                location: resolver.resolve(href),
            });
        }
    }

    let image_selector = selector("img[src]")?;
    let mut images = HashMap::new();
    for image in body.select(&image_selector) {
        if let Some(src) = image.value().attr("src") {
            let location = resolver.resolve(src);
            images.insert(src.trim().to_string(), location.clone());
            resources.push(ResolvedResource {
                uri: src.to_string(),
                kind: ResourceKind::Image,
                location,
            });
        }
    }

    let (doc, page, layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let (regular, bold) = match resolver.font_file() {
        Some(path) => {
            let font = load_font(&doc, path)?;
            (font.clone(), font)
        }
        None => {
            check_builtin_encodable(body)?;
            let regular = doc
                .add_builtin_font(BuiltinFont::Helvetica)
                .map_err(conversion_error)?;
            let bold = doc
                .add_builtin_font(BuiltinFont::HelveticaBold)
                .map_err(conversion_error)?;
            (regular, bold)
        }
    };

    {
        let mut writer = PageWriter {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            regular,
            bold,
            y: PAGE_HEIGHT_MM - MARGIN_MM,
            pages: 1,
            images: &images,
        };
        writer.children(body)?;
        tracing::debug!(pages = writer.pages, "laid out document");
    }

    let mut buffer = BufWriter::new(Vec::new());
    doc.save(&mut buffer).map_err(conversion_error)?;
    let bytes = buffer
        .into_inner()
        .map_err(|err| conversion_error(err.error()))?;

    if bytes.is_empty() {
        return Err(conversion_error("converter produced an empty document"));
    }

    Ok(Conversion { bytes, resources })
}

/// Cursor over the current page. `y` is the top of the next line, in millimetres from the
/// bottom edge.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
    images: &'a HashMap<String, ResourceLocation>,
}

impl PageWriter<'_> {
    fn children(&mut self, element: ElementRef<'_>) -> RenderResult<()> {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => {
                    let text = collapse_whitespace(text);
                    if !text.is_empty() {
                        self.paragraph(&text, BODY_SIZE, false);
                    }
                }
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.element(child)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn element(&mut self, element: ElementRef<'_>) -> RenderResult<()> {
        match element.value().name() {
            "h1" => self.heading(&inline_text(element), 16.0),
            "h2" => self.heading(&inline_text(element), 12.5),
            "h3" | "h4" | "h5" | "h6" => self.heading(&inline_text(element), 11.0),
            "p" => {
                self.paragraph(&inline_text(element), BODY_SIZE, false);
                self.gap(1.5);
            }
            "table" => self.table(element)?,
            "ul" | "ol" => {
                for item in element.children().filter_map(ElementRef::wrap) {
                    if item.value().name() == "li" {
                        self.paragraph(&format!("- {}", inline_text(item)), BODY_SIZE, false);
                    }
                }
                self.gap(1.5);
            }
            "hr" => self.rule(),
            "br" => self.gap(leading(BODY_SIZE)),
            "img" => self.image(element),
            "head" | "title" | "meta" | "link" | "style" | "script" => {}
            _ => self.children(element)?,
        }
        Ok(())
    }

    fn heading(&mut self, text: &str, size: f32) {
        self.gap(size * PT_TO_MM * 0.5);
        self.paragraph(text, size, true);
        self.gap(1.0);
    }

    fn paragraph(&mut self, text: &str, size: f32, bold: bool) {
        if text.trim().is_empty() {
            return;
        }
        let line_height = leading(size);
        for line in wrap(text, size, bold, CONTENT_WIDTH_MM) {
            self.ensure_space(line_height);
            self.draw_text(&line, size, bold, MARGIN_MM);
            self.y -= line_height;
        }
    }

    fn table(&mut self, table: ElementRef<'_>) -> RenderResult<()> {
        let row_selector = selector("tr")?;
        for row in table.select(&row_selector) {
            let cells: Vec<(bool, String)> = row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "th" | "td"))
                .map(|cell| (cell.value().name() == "th", inline_text(cell)))
                .collect();
            self.table_row(&cells);
        }
        self.gap(2.0);
        Ok(())
    }

    fn table_row(&mut self, cells: &[(bool, String)]) {
        if cells.is_empty() {
            return;
        }

        let columns: Vec<(f32, f32)> = if cells.len() == 2 {
            vec![
                (MARGIN_MM, LABEL_COLUMN_MM),
                (MARGIN_MM + LABEL_COLUMN_MM, CONTENT_WIDTH_MM - LABEL_COLUMN_MM),
            ]
        } else {
            let width = CONTENT_WIDTH_MM / cells.len() as f32;
            (0..cells.len())
                .map(|i| (MARGIN_MM + width * i as f32, width))
                .collect()
        };

        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .zip(&columns)
            .map(|((bold, text), (_, width))| {
                wrap(text, BODY_SIZE, *bold, width - CELL_PADDING_MM)
            })
            .collect();
        let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let line_height = leading(BODY_SIZE);

        // Line by line so that long cells continue on the next page.
        for index in 0..line_count {
            self.ensure_space(line_height);
            for (((bold, _), (x, _)), lines) in cells.iter().zip(&columns).zip(&wrapped) {
                if let Some(line) = lines.get(index) {
                    self.draw_text(line, BODY_SIZE, *bold, *x);
                }
            }
            self.y -= line_height;
        }
        self.gap(0.8);
    }

    fn rule(&mut self) {
        self.ensure_space(4.0);
        self.y -= 2.0;
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN_MM), Mm(self.y)), false),
                (Point::new(Mm(PAGE_WIDTH_MM - MARGIN_MM), Mm(self.y)), false),
            ],
            is_closed: false,
        });
        self.y -= 2.0;
    }

    fn image(&mut self, element: ElementRef<'_>) {
        let Some(src) = element.value().attr("src") else {
            return;
        };

        match self.images.get(src.trim()) {
            Some(ResourceLocation::Path(path)) => match load_raster(path) {
                Ok(image) => self.draw_image(&image),
                Err(reason) => {
                    tracing::warn!(path = %path.display(), "image not embedded: {reason}");
                }
            },
            Some(ResourceLocation::Url(url)) => {
                tracing::debug!(%url, "remote image left out of document");
            }
            None => {}
        }
    }

    fn draw_image(&mut self, image: &DynamicImage) {
        let (width_px, height_px) = image.dimensions();
        if width_px == 0 || height_px == 0 {
            return;
        }
        let aspect = width_px as f32 / height_px as f32;

        // Natural size at 150 dpi, capped in height and then in width.
        let mut height = (height_px as f32 * 25.4 / 150.0).min(MAX_IMAGE_HEIGHT_MM);
        let mut width = height * aspect;
        if width > CONTENT_WIDTH_MM {
            width = CONTENT_WIDTH_MM;
            height = width / aspect;
        }

        self.ensure_space(height + 2.0);
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        Image::from_dynamic_image(&rgb).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN_MM)),
                translate_y: Some(Mm(self.y - height)),
                dpi: Some(width_px as f32 * 25.4 / width),
                ..Default::default()
            },
        );
        self.y -= height + 2.0;
    }

    fn draw_text(&self, text: &str, size: f32, bold: bool, x: f32) {
        let font = if bold { &self.bold } else { &self.regular };
        let baseline = self.y - size * PT_TO_MM;
        self.layer.use_text(text, size, Mm(x), Mm(baseline), font);
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn ensure_space(&mut self, height: f32) {
        if self.y - height >= MARGIN_MM {
            return;
        }
        self.pages += 1;
        let (page, layer) = self.doc.add_page(
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            format!("Layer {}", self.pages),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT_MM - MARGIN_MM;
    }
}

fn load_font(doc: &PdfDocumentReference, path: &Path) -> RenderResult<IndirectFontRef> {
    let file = fs::File::open(path)
        .map_err(|err| conversion_error(format!("cannot open font {}: {err}", path.display())))?;
    doc.add_external_font(file).map_err(|err| {
        conversion_error(format!("cannot load font {}: {err}", path.display()))
    })
}

fn is_win_ansi(ch: char) -> bool {
    matches!(ch, ' '..='~' | '\u{a0}'..='\u{ff}')
        || ch.is_whitespace()
        || WIN_ANSI_EXTRAS.contains(&ch)
}

/// Fails on the first text node the built-in fonts cannot set.
fn check_builtin_encodable(body: ElementRef<'_>) -> RenderResult<()> {
    for text in body.text() {
        if let Some(ch) = text.chars().find(|ch| !is_win_ansi(*ch)) {
            return Err(conversion_error(format!(
                "character {ch:?} in \"{}\" is not available in the built-in fonts; configure a Unicode font file",
                text.trim()
            )));
        }
    }
    Ok(())
}

fn load_raster(path: &Path) -> Result<DynamicImage, String> {
    let bytes = fs::read(path).map_err(|err| err.to_string())?;
    match infer::get(&bytes) {
        Some(kind) if EMBEDDABLE_IMAGE_TYPES.contains(&kind.mime_type()) => {}
        Some(kind) => return Err(format!("unsupported image type {}", kind.mime_type())),
        None => return Err("unrecognised image data".into()),
    }
    image_crate::load_from_memory(&bytes).map_err(|err| err.to_string())
}

fn leading(size: f32) -> f32 {
    size * PT_TO_MM * 1.4
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text content of an element with `<br>` kept as `\n` and other whitespace collapsed.
fn inline_text(element: ElementRef<'_>) -> String {
    fn collect(element: ElementRef<'_>, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.extend(
                    text.chars()
                        .map(|ch| if ch.is_whitespace() { ' ' } else { ch }),
                ),
                Node::Element(el) if el.name() == "br" => out.push('\n'),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        collect(child, out);
                    }
                }
                _ => {}
            }
        }
    }

    let mut raw = String::new();
    collect(element, &mut raw);
    raw.split('\n')
        .map(collapse_whitespace)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Approximate Helvetica advance width in ems.
fn char_width_em(ch: char) -> f32 {
    match ch {
        'i' | 'j' | 'l' => 0.222,
        ' ' | 'f' | 't' | 'I' | '!' | '.' | ',' | ':' | ';' | '\'' | '|' | '/' => 0.278,
        'r' | '(' | ')' | '-' => 0.333,
        'm' | 'M' => 0.833,
        'w' => 0.722,
        'W' => 0.944,
        'A'..='Z' => 0.667,
        _ => 0.556,
    }
}

fn text_width_mm(text: &str, size: f32, bold: bool) -> f32 {
    let ems: f32 = text.chars().map(char_width_em).sum();
    let factor = if bold { 1.05 } else { 1.0 };
    ems * factor * size * PT_TO_MM
}

/// Greedy word wrap. Each `\n` starts a new line; words wider than a line are split.
fn wrap(text: &str, size: f32, bold: bool, width_mm: f32) -> Vec<String> {
    let fits = |candidate: &str| text_width_mm(candidate, size, bold) <= width_mm;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if fits(&candidate) {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for ch in word.chars() {
                current.push(ch);
                if !fits(&current) && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                }
            }
        }
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::AssetPaths;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use url::Url;

    fn resolver(root: &Path) -> ResourceResolver {
        ResourceResolver::new(
            AssetPaths::under_base(root.to_path_buf()),
            Url::parse("http://127.0.0.1:3000/").unwrap(),
        )
    }

    fn resolver_with_font(root: &Path, font_file: PathBuf) -> ResourceResolver {
        let mut assets = AssetPaths::under_base(root.to_path_buf());
        assets.font_file = Some(font_file);
        ResourceResolver::new(assets, Url::parse("http://127.0.0.1:3000/").unwrap())
    }

    const DEVANAGARI_NAME: &str = "मीरा नायर — Zoë ≥ 😀";

    #[test]
    fn test_wrap_respects_width_and_explicit_breaks() {
        let text = "alpha beta gamma delta epsilon zeta eta theta\nsecond line";
        let lines = wrap(text, BODY_SIZE, false, 40.0);

        assert!(lines.len() > 2);
        assert_eq!(lines.last().map(String::as_str), Some("second line"));
        for line in &lines {
            assert!(text_width_mm(line, BODY_SIZE, false) <= 40.0, "{line}");
        }
    }

    #[test]
    fn test_wrap_splits_overlong_words() {
        let word = "x".repeat(200);
        let lines = wrap(&word, BODY_SIZE, false, 30.0);

        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_inline_text_keeps_br_and_collapses_whitespace() {
        let html = Html::parse_fragment("<p>  first\n   part<br>second <b>bold</b></p>");
        let p = html.select(&selector("p").unwrap()).next().unwrap();

        assert_eq!(inline_text(p), "first part\nsecond bold");
    }

    #[test]
    fn test_long_document_spans_pages() {
        let temp_dir = TempDir::new().unwrap();
        let paragraph = "Observation recorded during the ward round. ".repeat(40);
        let body: String = (0..20).map(|_| format!("<p>{paragraph}</p>")).collect();
        let html = format!("<html><body><h1>Notes</h1>{body}</body></html>");

        let conversion = convert(&html, "Notes", &resolver(temp_dir.path())).unwrap();

        assert!(conversion.bytes.starts_with(b"%PDF-"));
        assert!(conversion.resources.is_empty());
    }

    #[test]
    fn test_local_png_is_embedded_and_recorded_as_path() {
        let temp_dir = TempDir::new().unwrap();
        let logo = temp_dir.path().join("static/img/logo.png");
        fs::create_dir_all(logo.parent().unwrap()).unwrap();
        let pixels = image_crate::RgbImage::from_pixel(40, 20, image_crate::Rgb([10, 120, 200]));
        DynamicImage::ImageRgb8(pixels)
            .save_with_format(&logo, image_crate::ImageFormat::Png)
            .unwrap();

        let html = r#"<html><head><link rel="stylesheet" href="/static/css/missing.css"></head>
            <body><img src="/static/img/logo.png"><p>Body</p></body></html>"#;
        let conversion = convert(html, "Logo", &resolver(temp_dir.path())).unwrap();

        assert_eq!(conversion.resources.len(), 2);
        assert_eq!(conversion.resources[0].kind, ResourceKind::Stylesheet);
        assert!(matches!(conversion.resources[0].location, ResourceLocation::Url(_)));
        assert_eq!(conversion.resources[1].kind, ResourceKind::Image);
        assert_eq!(
            conversion.resources[1].location,
            ResourceLocation::Path(fs::canonicalize(&logo).unwrap())
        );
        assert!(conversion.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_non_image_file_is_skipped_without_failing() {
        let temp_dir = TempDir::new().unwrap();
        let fake = temp_dir.path().join("static/img/logo.png");
        fs::create_dir_all(fake.parent().unwrap()).unwrap();
        fs::write(&fake, b"not really a png").unwrap();

        let html = r#"<html><body><img src="/static/img/logo.png"></body></html>"#;
        let conversion = convert(html, "Fake", &resolver(temp_dir.path())).unwrap();

        assert!(conversion.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_text_outside_builtin_fonts_fails_instead_of_vanishing() {
        let temp_dir = TempDir::new().unwrap();
        let html = format!("<html><body><h1>Patient</h1><p>{DEVANAGARI_NAME}</p></body></html>");

        let err = convert(&html, "Patient", &resolver(temp_dir.path())).unwrap_err();

        let RenderError::Conversion(message) = err else {
            panic!("expected a conversion error");
        };
        assert!(message.contains("'म'"), "{message}");
        assert!(message.contains(DEVANAGARI_NAME), "{message}");
    }

    #[test]
    fn test_western_european_text_uses_builtin_fonts() {
        let temp_dir = TempDir::new().unwrap();
        let html = "<html><body><p>Zoë Müller — café bill €12 “paid”</p></body></html>";

        let conversion = convert(html, "Receipt", &resolver(temp_dir.path())).unwrap();

        assert!(conversion.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_missing_font_file_is_a_conversion_error() {
        let temp_dir = TempDir::new().unwrap();
        let font = temp_dir.path().join("fonts/NotoSans-Regular.ttf");
        let html = "<html><body><p>Body</p></body></html>";

        let err = convert(html, "Body", &resolver_with_font(temp_dir.path(), font)).unwrap_err();

        assert!(matches!(err, RenderError::Conversion(ref m) if m.contains("NotoSans-Regular.ttf")));
    }

    #[test]
    fn test_configured_font_sets_text_beyond_builtin_fonts() {
        // Uses whichever Unicode TrueType font the machine provides.
        let candidates = [
            "/usr/share/fonts/truetype/noto/NotoSansDevanagari-Regular.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/Library/Fonts/Arial Unicode.ttf",
        ];
        let Some(font) = candidates.iter().map(PathBuf::from).find(|p| p.is_file()) else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let html = format!("<html><body><h1>Patient</h1><p>{DEVANAGARI_NAME}</p></body></html>");

        let conversion = convert(&html, "Patient", &resolver_with_font(temp_dir.path(), font)).unwrap();

        assert!(conversion.bytes.starts_with(b"%PDF-"));
    }
}
