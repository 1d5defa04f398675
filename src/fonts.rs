use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::OnceLock;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::model::{ParagraphRole, ParagraphStyle};
use crate::template::Template;

/// (lowercase family name, bold, italic) -> (file path, face index within TTC)
type FontLookup = HashMap<(String, bool, bool), (PathBuf, u32)>;

static FONT_INDEX: OnceLock<FontLookup> = OnceLock::new();

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn read_font_style(data: &[u8], face_index: u32) -> Option<(String, bool, bool)> {
    let face = Face::parse(data, face_index).ok()?;
    let family = font_family_name(&face)?;
    Some((family, face.is_bold(), face.is_italic()))
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    // User-configured directories come first so they win over system fonts.
    if let Ok(val) = std::env::var("CELLFLOW_FONTS") {
        let sep = if cfg!(windows) { ';' } else { ':' };
        for part in val.split(sep) {
            let trimmed = part.trim();
            if !trimmed.is_empty() {
                dirs.push(PathBuf::from(trimmed));
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        } else {
            dirs.push("C:\\Windows\\Fonts".into());
        }
    }

    dirs
}

fn is_font_file(path: &std::path::Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc")
    )
}

fn is_font_collection(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttc"))
}

fn scan_font_dirs() -> FontLookup {
    let t0 = std::time::Instant::now();
    let mut index = FontLookup::new();
    let mut files_scanned = 0u32;
    let mut visited_dirs: HashSet<PathBuf> = HashSet::new();

    let mut stack: Vec<PathBuf> = font_directories();
    stack.reverse();
    while let Some(dir) = stack.pop() {
        if !visited_dirs.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if !is_font_file(&path) {
                continue;
            }
            files_scanned += 1;
            let Ok(file) = std::fs::File::open(&path) else {
                continue;
            };
            let Ok(data) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            let face_count = if is_font_collection(&path) {
                ttf_parser::fonts_in_collection(&data).unwrap_or(1)
            } else {
                1
            };
            for face_idx in 0..face_count {
                if let Some((family, bold, italic)) = read_font_style(&data, face_idx) {
                    index
                        .entry((family.to_lowercase(), bold, italic))
                        .or_insert((path.clone(), face_idx));
                }
            }
        }
    }

    log::info!(
        "Font scan: {:.1}ms, {} files parsed -> {} entries",
        t0.elapsed().as_secs_f64() * 1000.0,
        files_scanned,
        index.len(),
    );

    index
}

/// Look up a font file by family name and style.
/// Falls back to the regular variant if the requested bold/italic is not available.
fn find_font_file(font_name: &str, bold: bool, italic: bool) -> Option<(PathBuf, u32)> {
    let index = FONT_INDEX.get_or_init(scan_font_dirs);
    let key = font_name.to_lowercase();
    index
        .get(&(key.clone(), bold, italic))
        .or_else(|| {
            if bold || italic {
                index.get(&(key, false, false))
            } else {
                None
            }
        })
        .cloned()
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
/// Bytes 0x80-0x9F are remapped; all others map directly to their Unicode codepoint.
fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Map a single Unicode char to its WinAnsi byte, or `None` if unmappable.
fn char_to_winansi(c: char) -> Option<u8> {
    match c as u32 {
        0x0020..=0x007E | 0x00A0..=0x00FF => Some(c as u8),
        _ => (0x80u8..=0x9F).find(|&b| winansi_to_char(b) == c && b as u32 != c as u32),
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Unmappable characters are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars().filter_map(char_to_winansi).collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
fn helvetica_widths(bold: bool) -> Vec<f32> {
    let widen = if bold { 1.05 } else { 1.0 };
    (32u8..=255u8)
        .map(|b| {
            let w: f32 = match b {
                32 | 160 => 278.0,                    // space, no-break space
                33..=47 => 333.0,                     // punctuation
                48..=57 => 556.0,                     // digits
                58..=64 => 333.0,                     // more punctuation
                73 | 74 => 278.0,                     // I J (narrow uppercase)
                77 => 833.0,                          // M (wide)
                65..=90 => 667.0,                     // uppercase A-Z (average)
                91..=96 => 333.0,                     // brackets etc.
                102 | 105 | 106 | 108 | 116 => 278.0, // narrow lowercase: f i j l t
                109 | 119 => 833.0,                   // m w (wide)
                97..=122 => 556.0,                    // lowercase a-z (average)
                _ => 556.0,
            };
            w * widen
        })
        .collect()
}

struct FontSource {
    data: Vec<u8>,
    face_index: u32,
}

/// Horizontal and vertical metrics of one font face, used both to lay text
/// out and to embed the face in the PDF.
pub struct FontMetrics {
    family: String,
    bold: bool,
    italic: bool,
    source: Option<FontSource>,
    widths_1000: Vec<f32>,
    ascender_ratio: f32,
    line_h_ratio: f32,
    cap_height_ratio: f32,
}

impl FontMetrics {
    /// Built-in Helvetica metrics; the face is written as a standard Type1 font.
    pub fn helvetica(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            bold,
            italic,
            source: None,
            widths_1000: helvetica_widths(bold),
            ascender_ratio: 0.75,
            line_h_ratio: 1.2,
            cap_height_ratio: 0.7,
        }
    }

    fn from_data(family: &str, bold: bool, italic: bool, data: Vec<u8>, face_index: u32) -> Option<Self> {
        let face = Face::parse(&data, face_index).ok()?;
        let units = face.units_per_em() as f32;
        let widths_1000: Vec<f32> = (32u8..=255u8)
            .map(|byte| {
                face.glyph_index(winansi_to_char(byte))
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| adv as f32 / units * 1000.0)
                    .unwrap_or(0.0)
            })
            .collect();
        let line_gap = face.line_gap() as f32;
        let line_h_ratio = (face.ascender() as f32 - face.descender() as f32 + line_gap) / units;
        let ascender_ratio = face.ascender() as f32 / units;
        let cap_height_ratio = face
            .capital_height()
            .map(|h| h as f32 / units)
            .unwrap_or(ascender_ratio * 0.9);
        drop(face);
        Some(Self {
            family: family.to_string(),
            bold,
            italic,
            source: Some(FontSource { data, face_index }),
            widths_1000,
            ascender_ratio,
            line_h_ratio,
            cap_height_ratio,
        })
    }

    /// Load the face from the system font directories, or fall back to
    /// Helvetica metrics when it cannot be found.
    pub fn load(family: &str, bold: bool, italic: bool) -> Self {
        let found = find_font_file(family, bold, italic).and_then(|(path, face_index)| {
            let data = std::fs::read(&path).ok()?;
            Self::from_data(family, bold, italic, data, face_index)
        });
        found.unwrap_or_else(|| {
            log::warn!("Font not found: {family} bold={bold} italic={italic} - using Helvetica");
            Self::helvetica(family, bold, italic)
        })
    }

    /// Width of a single character in 1000-units. Characters outside WinAnsi
    /// get an average width.
    pub fn char_width_1000(&self, ch: char) -> f32 {
        match char_to_winansi(ch) {
            Some(byte) => self.widths_1000[(byte - 32) as usize],
            None => 500.0,
        }
    }

    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub fn space_width(&self, font_size: f32) -> f32 {
        self.char_width_1000(' ') * font_size / 1000.0
    }

    pub fn line_height(&self, font_size: f32) -> f32 {
        font_size * self.line_h_ratio
    }

    pub fn ascent(&self, font_size: f32) -> f32 {
        font_size * self.ascender_ratio
    }

    pub fn cap_height(&self, font_size: f32) -> f32 {
        font_size * self.cap_height_ratio
    }
}

/// Metrics for the fonts of every paragraph style in a template.
pub struct FontBook {
    faces: Vec<FontMetrics>,
    by_role: HashMap<ParagraphRole, usize>,
}

impl FontBook {
    fn build(template: &Template, load: impl Fn(&ParagraphStyle) -> FontMetrics) -> Self {
        let mut faces: Vec<FontMetrics> = Vec::new();
        let mut by_role = HashMap::new();
        for role in ParagraphRole::ALL {
            let style = template.style(role);
            let existing = faces.iter().position(|f| {
                f.family.eq_ignore_ascii_case(&style.font_name)
                    && f.bold == style.bold
                    && f.italic == style.italic
            });
            let idx = existing.unwrap_or_else(|| {
                faces.push(load(style));
                faces.len() - 1
            });
            by_role.insert(role, idx);
        }
        Self { faces, by_role }
    }

    /// Resolve each style's font from the system font directories.
    pub fn system(template: &Template) -> Self {
        Self::build(template, |s| FontMetrics::load(&s.font_name, s.bold, s.italic))
    }

    /// Use built-in Helvetica metrics for every style; no font files are read.
    pub fn builtin(template: &Template) -> Self {
        Self::build(template, |s| FontMetrics::helvetica(&s.font_name, s.bold, s.italic))
    }

    pub fn metrics(&self, role: ParagraphRole) -> &FontMetrics {
        &self.faces[self.by_role[&role]]
    }

    pub(crate) fn face_index(&self, role: ParagraphRole) -> usize {
        self.by_role[&role]
    }

    pub(crate) fn faces(&self) -> &[FontMetrics] {
        &self.faces
    }
}

/// A font written into the PDF.
pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    pub(crate) char_to_gid: Option<HashMap<char, u16>>,
}

impl FontEntry {
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

fn standard_helvetica(bold: bool, italic: bool) -> &'static [u8] {
    match (bold, italic) {
        (true, true) => b"Helvetica-BoldOblique",
        (true, false) => b"Helvetica-Bold",
        (false, true) => b"Helvetica-Oblique",
        (false, false) => b"Helvetica",
    }
}

/// Embed a TrueType/OpenType face as a CIDFont (Type0 composite) with Identity-H
/// encoding, subsetted to `used_chars`.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    font_name: &str,
    source: &FontSource,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<HashMap<char, u16>> {
    let face = Face::parse(&source.data, source.face_index).ok()?;
    let descriptor_ref = alloc();
    let data_ref = alloc();

    let units = face.units_per_em() as f32;
    let to_1000 = |v: i16| v as f32 / units * 1000.0;
    let cap_height = face.capital_height().map(to_1000).unwrap_or(700.0);
    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        to_1000(bb.x_min),
        to_1000(bb.y_min),
        to_1000(bb.x_max),
        to_1000(bb.y_max),
    );

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut gid_widths: Vec<(u16, f32)> = Vec::new();
    let mut chars: Vec<char> = used_chars.iter().copied().collect();
    chars.sort_unstable();
    for ch in chars {
        if let Some(gid) = face.glyph_index(ch) {
            let new_gid = remapper.remap(gid.0);
            char_to_gid.insert(ch, new_gid);
            let w = face
                .glyph_hor_advance(gid)
                .map(|adv| adv as f32 / units * 1000.0)
                .unwrap_or(0.0);
            gid_widths.push((new_gid, w));
        }
    }
    gid_widths.sort_by_key(|&(gid, _)| gid);
    gid_widths.dedup_by_key(|&mut (gid, _)| gid);

    let subset_data = subsetter::subset(&source.data, source.face_index, &remapper)
        .unwrap_or_else(|e| {
            log::warn!("Font subsetting failed for {font_name}: {e} - embedding full font");
            source.data.clone()
        });
    let data_len = i32::try_from(subset_data.len()).ok()?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = font_name.replace(' ', "");

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(to_1000(face.ascender()))
        .descent(to_1000(face.descender()))
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let system_info = pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };

    let cid_font_ref = alloc();
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info);
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), system_info);
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Some(char_to_gid)
}

/// Write `metrics`' face into the PDF under `pdf_name`.
pub(crate) fn register_font(
    pdf: &mut Pdf,
    metrics: &FontMetrics,
    pdf_name: String,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> FontEntry {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();

    let char_to_gid = metrics.source.as_ref().and_then(|source| {
        embed_truetype(pdf, font_ref, &metrics.family, source, used_chars, alloc)
    });
    if char_to_gid.is_none() {
        pdf.type1_font(font_ref)
            .base_font(Name(standard_helvetica(metrics.bold, metrics.italic)))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    log::debug!(
        "register_font: {} bold={} italic={} -> {:.1}ms",
        metrics.family,
        metrics.bold,
        metrics.italic,
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    FontEntry {
        pdf_name,
        font_ref,
        char_to_gid,
    }
}
