//! A4 document assembly on top of `lopdf`.
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use thiserror::Error;

pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;

const FONT_NAME: &str = "F1";

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image has zero width or height")]
    EmptyImage,
}

/// A JPEG-encoded page image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size_pt: f32,
    /// 0 is black, 255 is white.
    pub gray: u8,
}

/// Page-oriented document builder. Coordinates are millimetres measured from
/// the top-left corner of the current page.
pub trait DocumentAssembler {
    fn page_size_mm(&self) -> (f64, f64);

    fn add_image(
        &mut self,
        image: &JpegImage,
        x_mm: f64,
        y_mm: f64,
        width_mm: f64,
        height_mm: f64,
    ) -> Result<(), AssembleError>;

    /// Draw a line centred on `x_mm`; `y_mm` is the baseline.
    fn text(&mut self, text: &str, x_mm: f64, y_mm: f64, style: TextStyle) -> Result<(), AssembleError>;

    fn add_page(&mut self);

    fn save(self) -> Result<Vec<u8>, AssembleError>
    where
        Self: Sized;
}

#[derive(Default)]
struct PageBuf {
    operations: Vec<Operation>,
    images: Vec<(String, ObjectId)>,
}

/// Portrait A4 PDF with Helvetica text. Starts with one empty page.
pub struct A4Document {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    pages: Vec<PageBuf>,
    image_count: usize,
}

impl A4Document {
    pub fn new(title: &str) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Producer" => Object::string_literal(concat!("clip-saver ", env!("CARGO_PKG_VERSION"))),
        });
        doc.trailer.set("Info", info_id);
        Self {
            doc,
            pages_id,
            font_id,
            pages: vec![PageBuf::default()],
            image_count: 0,
        }
    }

    fn current(&mut self) -> &mut PageBuf {
        if self.pages.is_empty() {
            self.pages.push(PageBuf::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }
}

impl DocumentAssembler for A4Document {
    fn page_size_mm(&self) -> (f64, f64) {
        (A4_WIDTH_MM, A4_HEIGHT_MM)
    }

    fn add_image(
        &mut self,
        image: &JpegImage,
        x_mm: f64,
        y_mm: f64,
        width_mm: f64,
        height_mm: f64,
    ) -> Result<(), AssembleError> {
        if image.width == 0 || image.height == 0 {
            return Err(AssembleError::EmptyImage);
        }
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            image.data.clone(),
        );
        let image_id = self.doc.add_object(stream);
        self.image_count += 1;
        let name = format!("Im{}", self.image_count);

        // PDF space has its origin at the bottom-left.
        let w = mm_to_pt(width_mm);
        let h = mm_to_pt(height_mm);
        let x = mm_to_pt(x_mm);
        let y = mm_to_pt(A4_HEIGHT_MM - y_mm - height_mm);
        let page = self.current();
        page.operations.push(Operation::new("q", vec![]));
        page.operations.push(Operation::new(
            "cm",
            vec![w.into(), 0.into(), 0.into(), h.into(), x.into(), y.into()],
        ));
        page.operations
            .push(Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]));
        page.operations.push(Operation::new("Q", vec![]));
        page.images.push((name, image_id));
        Ok(())
    }

    fn text(&mut self, text: &str, x_mm: f64, y_mm: f64, style: TextStyle) -> Result<(), AssembleError> {
        let width_pt = helvetica_width(text, style.size_pt);
        let x = mm_to_pt(x_mm) - width_pt / 2.0;
        let y = mm_to_pt(A4_HEIGHT_MM - y_mm);
        let gray = style.gray as f32 / 255.0;
        let page = self.current();
        page.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_NAME.into(), style.size_pt.into()]),
            Operation::new("g", vec![gray.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
        Ok(())
    }

    fn add_page(&mut self) {
        self.pages.push(PageBuf::default());
    }

    fn save(mut self) -> Result<Vec<u8>, AssembleError> {
        let media_box: Vec<Object> = vec![
            0.into(),
            0.into(),
            mm_to_pt(A4_WIDTH_MM).into(),
            mm_to_pt(A4_HEIGHT_MM).into(),
        ];
        let mut kids = Vec::with_capacity(self.pages.len());
        for page in std::mem::take(&mut self.pages) {
            let content = Content {
                operations: page.operations,
            };
            let content_id = self.doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let mut xobjects = lopdf::Dictionary::new();
            for (name, id) in page.images {
                xobjects.set(name, id);
            }
            let resources = dictionary! {
                "Font" => dictionary! { FONT_NAME => self.font_id },
                "XObject" => xobjects,
            };
            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => self.pages_id,
                "Contents" => content_id,
                "Resources" => resources,
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => media_box,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        self.doc.save_to(&mut out)?;
        Ok(out)
    }
}

pub fn mm_to_pt(mm: f64) -> f32 {
    (mm * 72.0 / 25.4) as f32
}

/// Advance width of `text` in Helvetica, in points. Only the footer glyphs
/// are tabulated; everything else gets the digit width of 556 units.
pub fn helvetica_width(text: &str, size_pt: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| match c {
            ' ' => 278,
            'P' => 667,
            _ => 556,
        })
        .sum();
    units as f32 * size_pt / 1000.0
}
