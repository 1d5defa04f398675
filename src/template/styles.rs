use std::collections::HashMap;
use std::io::{Read, Seek};

use crate::model::Alignment;

use super::{DML_NS, WML_NS, parse_hex_color, read_zip_text, twips_attr, wml, wml_attr, wml_bool};

fn dml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(DML_NS))
}

fn latin_typeface<'a>(node: roxmltree::Node<'a, 'a>) -> Option<&'a str> {
    dml(node, "latin")
        .and_then(|n| n.attribute("typeface"))
        .filter(|tf| !tf.is_empty())
}

pub(super) struct ThemeFonts {
    pub(super) major: String,
    pub(super) minor: String,
}

pub(super) struct StyleDefaults {
    pub(super) font_size: f32,
    pub(super) font_name: String,
    pub(super) space_before: f32,
    pub(super) space_after: f32,
}

/// A paragraph style as declared in styles.xml. Unset properties are `None`
/// until `resolve_based_on` fills them from the style's ancestors.
#[derive(Clone, Default)]
pub(super) struct DeclaredStyle {
    pub(super) name: Option<String>,
    pub(super) font_size: Option<f32>,
    pub(super) font_name: Option<String>,
    pub(super) bold: Option<bool>,
    pub(super) italic: Option<bool>,
    pub(super) color: Option<[u8; 3]>,
    pub(super) space_before: Option<f32>,
    pub(super) space_after: Option<f32>,
    pub(super) alignment: Option<Alignment>,
    pub(super) based_on: Option<String>,
}

pub(super) struct StylesInfo {
    pub(super) defaults: StyleDefaults,
    /// Keyed by styleId.
    pub(super) paragraph_styles: HashMap<String, DeclaredStyle>,
}

impl StylesInfo {
    /// Find a paragraph style by its display name (case-insensitive), falling
    /// back to the styleId.
    pub(super) fn by_name(&self, name: &str) -> Option<&DeclaredStyle> {
        self.paragraph_styles
            .values()
            .find(|s| s.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name)))
            .or_else(|| self.paragraph_styles.get(name))
    }
}

pub(super) fn parse_alignment(val: &str) -> Alignment {
    match val {
        "center" => Alignment::Center,
        "right" | "end" => Alignment::Right,
        "both" | "distribute" => Alignment::Justify,
        _ => Alignment::Left,
    }
}

pub(super) fn parse_theme<R: Read + Seek>(zip: &mut zip::ZipArchive<R>) -> ThemeFonts {
    let mut major = String::from("Helvetica");
    let mut minor = String::from("Helvetica");

    let theme_name = zip
        .file_names()
        .find(|n| n.starts_with("word/theme/") && n.ends_with(".xml"))
        .map(String::from);
    let Some(xml_content) = theme_name.and_then(|name| read_zip_text(zip, &name)) else {
        return ThemeFonts { major, minor };
    };
    let Ok(xml) = roxmltree::Document::parse(&xml_content) else {
        return ThemeFonts { major, minor };
    };

    for node in xml.descendants() {
        if node.tag_name().namespace() != Some(DML_NS) {
            continue;
        }
        match node.tag_name().name() {
            "majorFont" => {
                if let Some(tf) = latin_typeface(node) {
                    major = tf.to_string();
                }
            }
            "minorFont" => {
                if let Some(tf) = latin_typeface(node) {
                    minor = tf.to_string();
                }
            }
            _ => {}
        }
    }

    ThemeFonts { major, minor }
}

fn resolve_font_from_node(rfonts: roxmltree::Node, theme: &ThemeFonts, default_font: &str) -> String {
    if let Some(f) = rfonts.attribute((WML_NS, "ascii")) {
        return f.to_string();
    }
    match rfonts.attribute((WML_NS, "asciiTheme")) {
        Some("majorHAnsi") => theme.major.clone(),
        Some("minorHAnsi") => theme.minor.clone(),
        _ => default_font.to_string(),
    }
}

pub(super) fn parse_styles<R: Read + Seek>(
    zip: &mut zip::ZipArchive<R>,
    theme: &ThemeFonts,
) -> StylesInfo {
    let mut defaults = StyleDefaults {
        font_size: 12.0,
        font_name: theme.minor.clone(),
        space_before: 0.0,
        space_after: 0.0,
    };
    let mut paragraph_styles = HashMap::new();

    let Some(xml_content) = read_zip_text(zip, "word/styles.xml") else {
        return StylesInfo {
            defaults,
            paragraph_styles,
        };
    };
    let Ok(xml) = roxmltree::Document::parse(&xml_content) else {
        log::warn!("word/styles.xml is not well-formed, using built-in styles");
        return StylesInfo {
            defaults,
            paragraph_styles,
        };
    };

    let root = xml.root_element();

    if let Some(doc_defaults) = wml(root, "docDefaults") {
        if let Some(rpr) = wml(doc_defaults, "rPrDefault").and_then(|n| wml(n, "rPr")) {
            if let Some(sz_val) = wml_attr(rpr, "sz").and_then(|v| v.parse::<f32>().ok()) {
                defaults.font_size = sz_val / 2.0;
            }
            if let Some(rfonts) = wml(rpr, "rFonts") {
                defaults.font_name = resolve_font_from_node(rfonts, theme, &theme.minor);
            }
        }
        let default_spacing = wml(doc_defaults, "pPrDefault")
            .and_then(|n| wml(n, "pPr"))
            .and_then(|n| wml(n, "spacing"));
        if let Some(spacing) = default_spacing {
            if let Some(before) = twips_attr(spacing, "before") {
                defaults.space_before = before;
            }
            if let Some(after) = twips_attr(spacing, "after") {
                defaults.space_after = after;
            }
        }
    }

    for style_node in root.children() {
        if style_node.tag_name().name() != "style"
            || style_node.tag_name().namespace() != Some(WML_NS)
            || style_node.attribute((WML_NS, "type")) != Some("paragraph")
        {
            continue;
        }
        let Some(style_id) = style_node.attribute((WML_NS, "styleId")) else {
            continue;
        };

        let ppr = wml(style_node, "pPr");
        let spacing = ppr.and_then(|n| wml(n, "spacing"));
        let rpr = wml(style_node, "rPr");

        let declared = DeclaredStyle {
            name: wml_attr(style_node, "name").map(String::from),
            font_size: rpr
                .and_then(|n| wml_attr(n, "sz"))
                .and_then(|v| v.parse::<f32>().ok())
                .map(|hp| hp / 2.0),
            font_name: rpr
                .and_then(|n| wml(n, "rFonts"))
                .map(|rfonts| resolve_font_from_node(rfonts, theme, &defaults.font_name)),
            bold: rpr.and_then(|n| wml_bool(n, "b")),
            italic: rpr.and_then(|n| wml_bool(n, "i")),
            color: rpr
                .and_then(|n| wml_attr(n, "color"))
                .and_then(parse_hex_color),
            space_before: spacing.and_then(|n| twips_attr(n, "before")),
            space_after: spacing.and_then(|n| twips_attr(n, "after")),
            alignment: ppr.and_then(|ppr| wml_attr(ppr, "jc")).map(parse_alignment),
            based_on: wml_attr(style_node, "basedOn").map(String::from),
        };
        paragraph_styles.insert(style_id.to_string(), declared);
    }

    resolve_based_on(&mut paragraph_styles);

    StylesInfo {
        defaults,
        paragraph_styles,
    }
}

fn resolve_based_on(styles: &mut HashMap<String, DeclaredStyle>) {
    let ids: Vec<String> = styles.keys().cloned().collect();
    for id in ids {
        let mut chain: Vec<String> = Vec::new();
        let mut current = id.clone();
        loop {
            if chain.contains(&current) {
                break;
            }
            chain.push(current.clone());
            match styles.get(&current).and_then(|s| s.based_on.clone()) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        // Closer ancestors override further ones.
        let mut inh = DeclaredStyle::default();
        for ancestor_id in chain.iter().skip(1).rev() {
            if let Some(s) = styles.get(ancestor_id) {
                inh.font_name = s.font_name.clone().or(inh.font_name);
                inh.font_size = s.font_size.or(inh.font_size);
                inh.bold = s.bold.or(inh.bold);
                inh.italic = s.italic.or(inh.italic);
                inh.color = s.color.or(inh.color);
                inh.alignment = s.alignment.or(inh.alignment);
                inh.space_before = s.space_before.or(inh.space_before);
                inh.space_after = s.space_after.or(inh.space_after);
            }
        }

        if let Some(s) = styles.get_mut(&id) {
            s.font_name = s.font_name.take().or(inh.font_name);
            s.font_size = s.font_size.or(inh.font_size);
            s.bold = s.bold.or(inh.bold);
            s.italic = s.italic.or(inh.italic);
            s.color = s.color.or(inh.color);
            s.alignment = s.alignment.or(inh.alignment);
            s.space_before = s.space_before.or(inh.space_before);
            s.space_after = s.space_after.or(inh.space_after);
        }
    }
}
