#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

/// One row of the data file. Empty columns are `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    pub age: Option<String>,
    pub population: Option<String>,
    pub sex: Option<String>,
    pub disease: Option<String>,
    pub name: Option<String>,
    pub synonyms: Option<String>,
    pub tissue_of_origin: Option<String>,
}

/// The paragraph styles a group is typeset with. Each maps to a named
/// paragraph style in the template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParagraphRole {
    Demographics,
    Disease,
    Names,
    Spacer,
}

impl ParagraphRole {
    pub const ALL: [ParagraphRole; 4] = [
        ParagraphRole::Demographics,
        ParagraphRole::Disease,
        ParagraphRole::Names,
        ParagraphRole::Spacer,
    ];

    pub fn style_name(self) -> &'static str {
        match self {
            ParagraphRole::Demographics => "age-population-sex",
            ParagraphRole::Disease => "disease",
            ParagraphRole::Names => "names",
            ParagraphRole::Spacer => "space between",
        }
    }
}

/// Up to three display lines composed from one record. Absent lines are
/// `None`, never empty strings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderGroup {
    pub demographics: Option<String>,
    pub disease: Option<String>,
    pub names: Option<String>,
}

impl RenderGroup {
    /// Present lines in display order.
    pub fn lines(&self) -> impl Iterator<Item = (ParagraphRole, &str)> {
        [
            (ParagraphRole::Demographics, self.demographics.as_deref()),
            (ParagraphRole::Disease, self.disease.as_deref()),
            (ParagraphRole::Names, self.names.as_deref()),
        ]
        .into_iter()
        .filter_map(|(role, text)| text.map(|t| (role, t)))
    }

    pub fn line_count(&self) -> usize {
        self.lines().count()
    }

    pub fn is_empty(&self) -> bool {
        self.line_count() == 0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParagraphStyle {
    pub name: String,
    pub font_name: String,
    pub bold: bool,
    pub italic: bool,
    pub font_size: f32,
    pub color: Option<[u8; 3]>, // None = automatic (black)
    pub alignment: Alignment,
    pub space_before: f32,
    pub space_after: f32,
}

/// Page size and margins, in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    /// Left/right margins are inside/outside and swap on left-hand pages.
    pub mirror_margins: bool,
}

/// Text area of one page in top-down coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameBounds {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl FrameBounds {
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

impl PageGeometry {
    /// Bounds of a text frame filling the margins of the page at `page_index`
    /// (0-based). With mirror margins the first page is right-hand and every
    /// odd index is a left-hand page.
    pub fn frame_bounds(&self, page_index: usize) -> FrameBounds {
        let left_hand = self.mirror_margins && page_index % 2 == 1;
        let (x1, x2) = if left_hand {
            (self.margin_right, self.page_width - self.margin_left)
        } else {
            (self.margin_left, self.page_width - self.margin_right)
        };
        FrameBounds {
            x1,
            y1: self.margin_top,
            x2,
            y2: self.page_height - self.margin_bottom,
        }
    }
}
