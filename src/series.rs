use std::fmt::{self, Write};
use std::path::{Path, PathBuf};

use dicom::core::dictionary::{DataDictionary, DataDictionaryEntry};
use dicom::core::header::Header;
use dicom::core::value::Value;
use dicom::core::VR;
use dicom::object::{FileDicomObject, InMemDicomObject};
use dicom_dictionary_std::{StandardDataDictionary, tags};
use ndarray::{Array3, ArrayView3, Axis};

use crate::windowing::Window;

const MAX_VALUE_LEN: usize = 64;

/// One file of a series with its decoded pixel stack
pub struct SeriesImage {
    pub path: PathBuf,
    pub object: FileDicomObject<InMemDicomObject>,
    /// Stored pixel values as (frames, rows, columns), signed or unsigned
    pub pixels: Array3<i32>,
}

impl SeriesImage {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn pixels(&self) -> ArrayView3<'_, i32> {
        self.pixels.view()
    }

    /// A single-frame file is shown as a plain 2D image
    pub fn is_single_frame(&self) -> bool {
        self.pixels.len_of(Axis(0)) == 1
    }

    pub fn instance_number(&self) -> Option<i32> {
        self.object
            .element(tags::INSTANCE_NUMBER)
            .ok()?
            .to_int::<i32>()
            .ok()
    }
}

/// Files of a DICOM folder in acquisition order
pub struct DicomSeries {
    pub folder: PathBuf,
    pub images: Vec<SeriesImage>,
    pub min_pixel_value: f32,
    pub max_pixel_value: f32,
    /// Largest value representable with the first file's BitsStored
    pub max_range: f32,
    pub can_demosaic: bool,
}

impl DicomSeries {
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, file_no: usize) -> Option<&SeriesImage> {
        self.images.get(file_no)
    }

    pub fn file_name(&self, file_no: usize) -> Option<String> {
        self.get(file_no).map(SeriesImage::file_name)
    }

    /// Pixel stack dimensions (frames, rows, columns)
    pub fn dim(&self, file_no: usize) -> Option<(usize, usize, usize)> {
        self.get(file_no).map(|image| image.pixels.dim())
    }

    /// Number of axes a frame can be taken along: 2 for single-frame files
    pub fn axis_count(&self, file_no: usize) -> Option<usize> {
        self.get(file_no)
            .map(|image| if image.is_single_frame() { 2 } else { 3 })
    }

    /// Number of planes along `axis` of a file's pixel stack
    pub fn frame_count(&self, file_no: usize, axis: usize) -> Option<usize> {
        let image = self.get(file_no)?;
        if image.is_single_frame() {
            return Some(1);
        }
        (axis < 3).then(|| image.pixels.len_of(Axis(axis)))
    }

    pub fn can_demosaic(&self) -> bool {
        self.can_demosaic
    }

    /// The brightest pixel sits at the top of the bit range, so intensities
    /// may have been clipped
    pub fn is_possibly_clipped(&self) -> bool {
        self.max_pixel_value >= self.max_range
    }

    pub fn default_window(&self) -> Window {
        Window::new(self.min_pixel_value, self.max_pixel_value)
    }

    /// Text listing of a file's meta group and data set
    pub fn dump_header(&self, file_no: usize) -> Option<String> {
        let image = self.get(file_no)?;
        let mut out = String::new();
        write_header(&mut out, image).ok()?;
        Some(out)
    }
}

fn write_header(out: &mut String, image: &SeriesImage) -> fmt::Result {
    let meta = image.object.meta();
    writeln!(out, "# {}", image.path.display())?;
    writeln!(out, "# Transfer Syntax: {}", meta.transfer_syntax())?;
    writeln!(
        out,
        "# Media Storage SOP Class UID: {}",
        meta.media_storage_sop_class_uid()
    )?;
    writeln!(
        out,
        "# Media Storage SOP Instance UID: {}",
        meta.media_storage_sop_instance_uid()
    )?;

    for element in image.object.iter() {
        let tag = element.tag();
        let alias = StandardDataDictionary
            .by_tag(tag)
            .map(|entry| entry.alias())
            .unwrap_or("Unknown");
        writeln!(
            out,
            "{} {:?} {:<32} {}",
            tag,
            element.vr(),
            alias,
            describe_value(element.vr(), element.value())
        )?;
    }
    Ok(())
}

fn describe_value(vr: VR, value: &Value<InMemDicomObject>) -> String {
    match value {
        Value::Sequence(sequence) => format!("<sequence of {} items>", sequence.items().len()),
        Value::PixelSequence(_) => "<encapsulated pixel data>".to_string(),
        Value::Primitive(primitive) => {
            if matches!(
                vr,
                VR::OB | VR::OD | VR::OF | VR::OL | VR::OV | VR::OW | VR::UN
            ) {
                return format!("<binary, {} bytes>", primitive.calculate_byte_len());
            }
            let text = primitive.to_str();
            let text = text.trim_end_matches(['\0', ' ']);
            if text.chars().count() > MAX_VALUE_LEN {
                let truncated: String = text.chars().take(MAX_VALUE_LEN).collect();
                format!("{truncated}...")
            } else {
                text.to_string()
            }
        }
    }
}
