//! Template documents: page geometry and the named paragraph styles groups are
//! typeset with, read from a DOCX file.

mod styles;

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

use crate::error::Error;
use crate::model::{Alignment, PageGeometry, ParagraphRole, ParagraphStyle};

use styles::{StyleDefaults, StylesInfo, parse_styles, parse_theme};

pub(super) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(super) const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

pub(super) fn twips_to_pts(twips: f32) -> f32 {
    twips / 20.0
}

pub(super) fn parse_hex_color(val: &str) -> Option<[u8; 3]> {
    if val == "auto" || val.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&val[0..2], 16).ok()?;
    let g = u8::from_str_radix(&val[2..4], 16).ok()?;
    let b = u8::from_str_radix(&val[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Parse a WML boolean toggle element (e.g., w:b, w:i, w:mirrorMargins).
/// Present with no val or val != "0"/"false" means true.
pub(super) fn wml_bool(parent: roxmltree::Node, name: &str) -> Option<bool> {
    wml(parent, name).map(|n| {
        n.attribute((WML_NS, "val"))
            .is_none_or(|v| v != "0" && v != "false")
    })
}

pub(super) fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(WML_NS))
}

pub(super) fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

pub(super) fn twips_attr(node: roxmltree::Node, attr: &str) -> Option<f32> {
    node.attribute((WML_NS, attr))
        .and_then(|v| v.parse::<f32>().ok())
        .map(twips_to_pts)
}

pub(super) fn read_zip_text<R: Read + Seek>(zip: &mut zip::ZipArchive<R>, name: &str) -> Option<String> {
    let mut content = String::new();
    zip.by_name(name).ok()?.read_to_string(&mut content).ok()?;
    Some(content)
}

const LETTER: PageGeometry = PageGeometry {
    page_width: 612.0,
    page_height: 792.0,
    margin_top: 72.0,
    margin_bottom: 72.0,
    margin_left: 72.0,
    margin_right: 72.0,
    mirror_margins: false,
};

fn builtin_style(role: ParagraphRole) -> ParagraphStyle {
    let (font_size, bold, italic, space_after) = match role {
        ParagraphRole::Demographics => (16.0, true, false, 0.0),
        ParagraphRole::Disease => (16.0, false, false, 2.0),
        ParagraphRole::Names => (10.0, false, true, 0.0),
        ParagraphRole::Spacer => (12.0, false, false, 0.0),
    };
    ParagraphStyle {
        name: role.style_name().to_string(),
        font_name: "Helvetica".to_string(),
        bold,
        italic,
        font_size,
        color: None,
        alignment: Alignment::Left,
        space_before: 0.0,
        space_after,
    }
}

/// Page geometry plus one paragraph style per [`ParagraphRole`].
#[derive(Clone, Debug)]
pub struct Template {
    pub geometry: PageGeometry,
    /// Pages the template already has before any content is flowed.
    pub initial_pages: usize,
    styles: HashMap<ParagraphRole, ParagraphStyle>,
}

impl Default for Template {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Template {
    /// US Letter, 72pt margins, Helvetica styles.
    pub fn builtin() -> Self {
        Self {
            geometry: LETTER,
            initial_pages: 1,
            styles: ParagraphRole::ALL
                .into_iter()
                .map(|role| (role, builtin_style(role)))
                .collect(),
        }
    }

    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
                std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
            ),
            _ => Error::Io(e),
        })?;
        let template = Self::from_reader(file)?;
        log::info!(
            "Template {}: {:.0}x{:.0}pt, {} page(s)",
            path.display(),
            template.geometry.page_width,
            template.geometry.page_height,
            template.initial_pages,
        );
        Ok(template)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Self::from_reader(std::io::Cursor::new(bytes))
    }

    fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, Error> {
        let mut zip = zip::ZipArchive::new(reader)
            .map_err(|_| Error::InvalidTemplate("file is not a ZIP archive".into()))?;

        let theme = parse_theme(&mut zip);
        let styles_info = parse_styles(&mut zip, &theme);
        let mirror_margins = read_zip_text(&mut zip, "word/settings.xml")
            .and_then(|xml| {
                let doc = roxmltree::Document::parse(&xml).ok()?;
                wml_bool(doc.root_element(), "mirrorMargins")
            })
            .unwrap_or(false);

        let xml_content = read_zip_text(&mut zip, "word/document.xml").ok_or_else(|| {
            Error::InvalidTemplate("missing word/document.xml (is this a DOCX file?)".into())
        })?;
        let xml = roxmltree::Document::parse(&xml_content)
            .map_err(|e| Error::InvalidTemplate(format!("word/document.xml: {e}")))?;
        let body = wml(xml.root_element(), "body")
            .ok_or_else(|| Error::InvalidTemplate("missing w:body".into()))?;

        let mut geometry = parse_page_geometry(wml(body, "sectPr"));
        geometry.mirror_margins = mirror_margins;

        let page_breaks = body
            .descendants()
            .filter(|n| {
                n.tag_name().name() == "br"
                    && n.tag_name().namespace() == Some(WML_NS)
                    && n.attribute((WML_NS, "type")) == Some("page")
            })
            .count();

        let styles = ParagraphRole::ALL
            .into_iter()
            .map(|role| (role, resolve_style(&styles_info, role)))
            .collect();

        Ok(Self {
            geometry,
            initial_pages: page_breaks + 1,
            styles,
        })
    }

    pub fn style(&self, role: ParagraphRole) -> &ParagraphStyle {
        // Every role is inserted on construction.
        &self.styles[&role]
    }

    pub fn with_style(mut self, role: ParagraphRole, style: ParagraphStyle) -> Self {
        self.styles.insert(role, style);
        self
    }

    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }
}

fn parse_page_geometry(sect_node: Option<roxmltree::Node>) -> PageGeometry {
    let pg_sz = sect_node.and_then(|n| wml(n, "pgSz"));
    let pg_mar = sect_node.and_then(|n| wml(n, "pgMar"));
    PageGeometry {
        page_width: pg_sz.and_then(|n| twips_attr(n, "w")).unwrap_or(LETTER.page_width),
        page_height: pg_sz.and_then(|n| twips_attr(n, "h")).unwrap_or(LETTER.page_height),
        margin_top: pg_mar.and_then(|n| twips_attr(n, "top")).unwrap_or(LETTER.margin_top),
        margin_bottom: pg_mar
            .and_then(|n| twips_attr(n, "bottom"))
            .unwrap_or(LETTER.margin_bottom),
        margin_left: pg_mar.and_then(|n| twips_attr(n, "left")).unwrap_or(LETTER.margin_left),
        margin_right: pg_mar
            .and_then(|n| twips_attr(n, "right"))
            .unwrap_or(LETTER.margin_right),
        mirror_margins: false,
    }
}

fn resolve_style(info: &StylesInfo, role: ParagraphRole) -> ParagraphStyle {
    let name = role.style_name();
    let Some(declared) = info.by_name(name) else {
        log::warn!("Template has no paragraph style named '{name}', using the built-in one");
        return builtin_style(role);
    };
    let StyleDefaults {
        font_size,
        font_name,
        space_before,
        space_after,
    } = &info.defaults;
    ParagraphStyle {
        name: name.to_string(),
        font_name: declared.font_name.clone().unwrap_or_else(|| font_name.clone()),
        bold: declared.bold.unwrap_or(false),
        italic: declared.italic.unwrap_or(false),
        font_size: declared.font_size.unwrap_or(*font_size),
        color: declared.color,
        alignment: declared.alignment.unwrap_or(Alignment::Left),
        space_before: declared.space_before.unwrap_or(*space_before),
        space_after: declared.space_after.unwrap_or(*space_after),
    }
}
