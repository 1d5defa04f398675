mod flow;
mod layout;

use std::collections::HashSet;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref};

use crate::error::Error;
use crate::fonts::{FontEntry, register_font};
use crate::model::ParagraphRole;
use crate::surface::TextFlow;

pub use flow::PdfSurface;

use layout::render_lines;

/// Write every page of the surface as a PDF document. Pages the template
/// provides but no frame reached are written blank.
pub fn render(surface: &PdfSurface) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    // Phase 1: embed each face with the characters it actually draws
    let faces = surface.fonts.faces();
    let mut used_chars: Vec<HashSet<char>> = vec![HashSet::new(); faces.len()];
    for para in &surface.paragraphs {
        if para.role == ParagraphRole::Spacer {
            continue;
        }
        used_chars[surface.fonts.face_index(para.role)].extend(para.text.chars());
    }
    let font_entries: Vec<FontEntry> = faces
        .iter()
        .zip(&used_chars)
        .enumerate()
        .map(|(i, (metrics, chars))| register_font(&mut pdf, metrics, format!("F{}", i + 1), chars, &mut alloc))
        .collect();

    let t_fonts = t0.elapsed();

    // Phase 2: lay out each frame on its page
    let geometry = surface.template.geometry;
    let frame_count = surface.frame_count();
    let n = surface.page_count().max(frame_count);
    let mut overset = 0usize;
    let mut all_contents: Vec<Content> = (0..n).map(|_| Content::new()).collect();

    for (frame, content) in all_contents.iter_mut().enumerate().take(frame_count) {
        let bounds = surface.frame_bounds(frame);
        let frame_top = geometry.page_height - bounds.y1;
        for slot in surface.layout_frame(frame) {
            let para = &surface.paragraphs[slot.index];
            if para.role == ParagraphRole::Spacer {
                continue;
            }
            if slot.bottom > bounds.height() + 0.01 {
                overset += 1;
            }
            let style = surface.template.style(para.role);
            let font = &font_entries[surface.fonts.face_index(para.role)];
            render_lines(
                content,
                &para.lines,
                style.alignment,
                bounds.x1,
                bounds.width(),
                frame_top - slot.first_baseline,
                slot.line_pitch,
                font,
                para.point_size,
                style.color,
            );
        }
    }
    if overset > 0 {
        log::warn!("{overset} paragraph(s) run past the bottom of their frame");
    }

    let t_layout = t0.elapsed();

    // Phase 3: allocate page and content IDs now that page count is known
    let page_total = i32::try_from(n).map_err(|_| Error::Pdf(format!("too many pages: {n}")))?;
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, c) in all_contents.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_total);

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, geometry.page_width, geometry.page_height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        let mut fonts = resources.fonts();
        for entry in &font_entries {
            fonts.pair(Name(entry.pdf_name.as_bytes()), entry.font_ref);
        }
    }

    let t_assembly = t0.elapsed();

    log::info!(
        "Render phases: font_embed={:.1}ms, layout={:.1}ms, assembly={:.1}ms ({} pages)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_layout - t_fonts).as_secs_f64() * 1000.0,
        (t_assembly - t_layout).as_secs_f64() * 1000.0,
        n,
    );

    Ok(pdf.finish())
}
