#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::PathBuf;

use cellflow_pdf::SurfaceError;
use cellflow_pdf::model::{ParagraphRole, RenderGroup};
use cellflow_pdf::surface::{Advance, LineCount, OverflowQuery, ParagraphId, PointSize, TextFlow};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Scratch directory: tests/output/<name>/
pub fn output_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("tests/output").join(name);
    std::fs::create_dir_all(&dir).expect("create output dir");
    dir
}

pub fn group(demographics: Option<&str>, disease: Option<&str>, names: Option<&str>) -> RenderGroup {
    RenderGroup {
        demographics: demographics.map(String::from),
        disease: disease.map(String::from),
        names: names.map(String::from),
    }
}

#[derive(Clone, Debug)]
pub struct MockPara {
    pub role: ParagraphRole,
    pub text: String,
    pub size: f32,
    pub break_before: bool,
}

/// A predictable surface: every character (spaces included) is half an em
/// wide and lines are 1.2 em tall. Text wraps greedily at spaces; a word
/// wider than `measure` sits on a line of its own and overhangs.
pub struct MockSurface {
    pub measure: f32,
    pub frame_height: f32,
    pub spacing: f32,
    pub paras: Vec<MockPara>,
    pub frame_starts: Vec<usize>,
    pub pages: usize,
    pub checkpoints: usize,
    pub fail_checkpoint: bool,
}

impl MockSurface {
    pub fn new(measure: f32, frame_height: f32) -> Self {
        Self {
            measure,
            frame_height,
            spacing: 10.0,
            paras: Vec::new(),
            frame_starts: vec![0],
            pages: 1,
            checkpoints: 0,
            fail_checkpoint: false,
        }
    }

    pub fn default_size(role: ParagraphRole) -> f32 {
        match role {
            ParagraphRole::Demographics | ParagraphRole::Disease => 16.0,
            ParagraphRole::Names => 10.0,
            ParagraphRole::Spacer => 12.0,
        }
    }

    /// Add a paragraph without going through the paginator.
    pub fn push(&mut self, role: ParagraphRole, text: &str, size: f32) -> ParagraphId {
        self.paras.push(MockPara {
            role,
            text: text.to_string(),
            size,
            break_before: false,
        });
        ParagraphId(self.paras.len() - 1)
    }

    /// Greedy wrap: each line's words and width.
    fn wrap<'a>(&self, p: &'a MockPara) -> Vec<(Vec<&'a str>, f32)> {
        let em = p.size * 0.5;
        let mut lines: Vec<(Vec<&'a str>, f32)> = Vec::new();
        for word in p.text.split(' ').filter(|w| !w.is_empty()) {
            let width = word.chars().count() as f32 * em;
            if let Some((words, w)) = lines
                .last_mut()
                .filter(|(_, w)| *w + em + width <= self.measure + 1e-4)
            {
                words.push(word);
                *w += em + width;
            } else {
                lines.push((vec![word], width));
            }
        }
        if lines.is_empty() {
            lines.push((Vec::new(), 0.0));
        }
        lines
    }

    fn line_total(&self, p: &MockPara) -> usize {
        self.wrap(p).len()
    }

    fn current(&self) -> usize {
        self.frame_starts.len() - 1
    }

    pub fn frame_range(&self, frame: usize) -> std::ops::Range<usize> {
        let start = self.frame_starts[frame];
        let end = match self.frame_starts.get(frame + 1) {
            Some(&next) => next,
            None => (start + 1..self.paras.len())
                .find(|&i| self.paras[i].break_before)
                .unwrap_or(self.paras.len()),
        };
        start..end
    }

    pub fn frame_of(&self, id: ParagraphId) -> Option<usize> {
        (0..self.frame_starts.len()).find(|&f| self.frame_range(f).contains(&id.0))
    }

    /// Texts in the given frame, spacers left out.
    pub fn frame_texts(&self, frame: usize) -> Vec<String> {
        self.frame_range(frame)
            .filter(|&i| self.paras[i].role != ParagraphRole::Spacer)
            .map(|i| self.paras[i].text.clone())
            .collect()
    }

    /// Bottom edge of each paragraph in the current frame.
    fn bottoms(&self) -> Vec<(usize, f32)> {
        let range = self.frame_range(self.current());
        let start = range.start;
        let mut y = 0.0;
        range
            .map(|i| {
                let p = &self.paras[i];
                y += if p.role == ParagraphRole::Spacer {
                    if i == start { 0.0 } else { self.spacing }
                } else {
                    self.line_total(p) as f32 * p.size * 1.2
                };
                (i, y)
            })
            .collect()
    }

    fn measurable(&self, id: ParagraphId) -> Option<&MockPara> {
        let (_, bottom) = self.bottoms().into_iter().find(|&(i, _)| i == id.0)?;
        (bottom <= self.frame_height).then(|| &self.paras[id.0])
    }
}

impl OverflowQuery for MockSurface {
    fn overflows(&self) -> bool {
        self.frame_range(self.current()).end < self.paras.len()
            || self.bottoms().iter().any(|&(_, b)| b > self.frame_height)
    }
}

impl LineCount for MockSurface {
    fn line_count(&self, id: ParagraphId) -> Option<usize> {
        self.measurable(id).map(|p| self.line_total(p))
    }

    fn lines(&self, id: ParagraphId) -> Option<Vec<String>> {
        let p = self.measurable(id)?;
        Some(self.wrap(p).into_iter().map(|(words, _)| words.join(" ")).collect())
    }

    fn widest_line(&self, id: ParagraphId) -> Option<(usize, f32)> {
        let p = self.paras.get(id.0)?;
        self.wrap(p)
            .into_iter()
            .map(|(_, w)| w)
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn overhangs(&self, id: ParagraphId) -> bool {
        self.paras
            .get(id.0)
            .is_some_and(|p| self.wrap(p).iter().any(|&(_, w)| w > self.measure + 1e-4))
    }
}

impl PointSize for MockSurface {
    fn point_size(&self, id: ParagraphId) -> f32 {
        self.paras[id.0].size
    }

    fn set_point_size(&mut self, id: ParagraphId, size: f32) {
        self.paras[id.0].size = size;
    }
}

impl TextFlow for MockSurface {
    fn append_paragraph(&mut self, role: ParagraphRole, text: &str) -> ParagraphId {
        self.push(role, text, Self::default_size(role))
    }

    fn contents(&self, id: ParagraphId) -> Option<String> {
        self.paras.get(id.0).map(|p| p.text.clone())
    }

    fn insert_frame_break(&mut self, before: ParagraphId) -> Result<(), SurfaceError> {
        let range = self.frame_range(self.current());
        if before.0 == range.start {
            return Err(SurfaceError::BreakAtFrameStart(before.0));
        }
        if !range.contains(&before.0) {
            return Err(SurfaceError::NotInCurrentFrame(before.0));
        }
        self.paras[before.0].break_before = true;
        Ok(())
    }

    fn advance(&mut self) -> Advance {
        let next = self.frame_range(self.current()).end;
        self.frame_starts.push(next);
        if self.frame_starts.len() > self.pages {
            self.pages += 1;
            Advance::NewPage
        } else {
            Advance::ExistingPage
        }
    }

    fn frame_count(&self) -> usize {
        self.frame_starts.len()
    }

    fn checkpoint(&mut self) -> Result<(), cellflow_pdf::Error> {
        if self.fail_checkpoint {
            return Err(cellflow_pdf::Error::Io(std::io::Error::other("disk full")));
        }
        self.checkpoints += 1;
        Ok(())
    }
}

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// A `w:style` element for a paragraph style. `size` is in points.
pub fn paragraph_style(id: &str, name: &str, font: &str, size: f32, bold: bool, italic: bool) -> String {
    format!(
        r#"<w:style w:type="paragraph" w:styleId="{id}"><w:name w:val="{name}"/><w:rPr><w:rFonts w:ascii="{font}"/>{b}{i}<w:sz w:val="{sz}"/></w:rPr></w:style>"#,
        b = if bold { "<w:b/>" } else { "" },
        i = if italic { "<w:i/>" } else { "" },
        sz = (size * 2.0) as u32,
    )
}

/// Build a minimal DOCX in memory. Sizes are in twips.
pub fn build_docx(
    styles: &[String],
    page: (u32, u32),
    margins: (u32, u32, u32, u32),
    page_breaks: usize,
    mirror_margins: bool,
) -> Vec<u8> {
    let (w, h) = page;
    let (top, right, bottom, left) = margins;
    let breaks: String = (0..page_breaks)
        .map(|_| r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#)
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="{W_NS}"><w:body><w:p/>{breaks}<w:sectPr><w:pgSz w:w="{w}" w:h="{h}"/><w:pgMar w:top="{top}" w:right="{right}" w:bottom="{bottom}" w:left="{left}"/></w:sectPr></w:body></w:document>"#
    );
    let styles_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:styles xmlns:w="{W_NS}"><w:docDefaults><w:rPrDefault><w:rPr><w:sz w:val="24"/></w:rPr></w:rPrDefault></w:docDefaults>{}</w:styles>"#,
        styles.concat()
    );
    let settings = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:settings xmlns:w="{W_NS}">{}</w:settings>"#,
        if mirror_margins { "<w:mirrorMargins/>" } else { "" }
    );

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, body) in [
        ("word/document.xml", document),
        ("word/styles.xml", styles_xml),
        ("word/settings.xml", settings),
    ] {
        zip.start_file(name, options).expect("start zip entry");
        zip.write_all(body.as_bytes()).expect("write zip entry");
    }
    zip.finish().expect("finish zip").into_inner()
}

/// Count page objects in a PDF written by the renderer.
pub fn count_pages(pdf: &[u8]) -> usize {
    let needle = b"/Type /Page";
    pdf.windows(needle.len() + 1)
        .filter(|w| &w[..needle.len()] == needle && w[needle.len()] != b's')
        .count()
}
