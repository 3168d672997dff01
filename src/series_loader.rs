use crate::{
    enums::SortBy,
    series::{DicomSeries, SeriesImage},
};

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder},
};
use dicom_dictionary_std::{tags, uids};
use log::{debug, info, warn};
use ndarray::{Array3, s};
use rayon::prelude::*;
use std::{
    fs::{self, File},
    io::{self, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};
use thiserror::Error;
use web_time::Instant;

const PREAMBLE_LEN: u64 = 128;
const DICOM_MAGIC: &[u8; 4] = b"DICM";

#[derive(Debug, Error)]
pub enum SeriesLoaderError {
    #[error("No valid DICOM images found")]
    NoValidImages,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),

    #[error("Background load failed: {0}")]
    BackgroundTask(#[from] tokio::task::JoinError),
}

pub struct SeriesLoader;

impl SeriesLoader {
    /// Load a series from parsed DICOM files
    ///
    /// # Arguments
    ///
    /// * `dicom_objects` - Parsed files with the path they were read from
    /// * `sort_by` - Key used to order the files
    ///
    /// # Errors
    ///
    /// Returns error if none of the objects carries decodable pixel data
    pub fn load_from_dicom_objects(
        dicom_objects: Vec<(PathBuf, FileDicomObject<InMemDicomObject>)>,
        sort_by: SortBy,
    ) -> Result<DicomSeries, SeriesLoaderError> {
        let mut images_with_order: Vec<_> = dicom_objects
            .into_par_iter()
            .filter_map(|(path, object)| Self::extract_image_with_order(path, object, &sort_by))
            .collect();

        if images_with_order.is_empty() {
            return Err(SeriesLoaderError::NoValidImages);
        }

        Self::sort_images(&mut images_with_order, sort_by);

        let images: Vec<_> = images_with_order
            .into_iter()
            .map(|(_, image)| image)
            .collect();

        let folder = images[0]
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let (min_pixel_value, max_pixel_value) = Self::get_pixel_range(&images);
        let max_range = Self::get_max_range(&images[0].object);
        let can_demosaic = Self::is_enhanced_mr(&images[0].object);

        Ok(DicomSeries {
            folder,
            images,
            min_pixel_value,
            max_pixel_value,
            max_range,
            can_demosaic,
        })
    }

    /// Load a series from file paths
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path> + Sync],
        sort_by: SortBy,
    ) -> Result<DicomSeries, SeriesLoaderError> {
        let objects: Result<Vec<_>, _> = paths
            .par_iter()
            .map(|path| {
                let path = path.as_ref();
                open_file(path).map(|object| (path.to_path_buf(), object))
            })
            .collect();

        Self::load_from_dicom_objects(objects?, sort_by)
    }

    /// Load a series from every DICOM file in a directory. Files are
    /// recognized by content, not by extension.
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<DicomSeries, SeriesLoaderError> {
        let start = Instant::now();
        let mut paths: Vec<_> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| match Self::is_dicom(path) {
                Ok(is_dicom) => is_dicom,
                Err(err) => {
                    debug!("Skipping {}: {err}", path.display());
                    false
                }
            })
            .collect();

        if paths.is_empty() {
            return Err(SeriesLoaderError::NoValidImages);
        }
        paths.sort();

        let series = Self::load_from_file_paths(&paths, sort_by)?;

        info!(
            "Loaded {} of {} DICOM files from {} in {:?}",
            series.len(),
            paths.len(),
            path.as_ref().display(),
            start.elapsed()
        );
        if series.is_possibly_clipped() {
            warn!(
                "Brightest pixel ({}) is at max range. Image intensity values may be clipped.",
                series.max_pixel_value
            );
        }

        Ok(series)
    }

    /// Load a directory on tokio's blocking pool
    pub async fn load_in_background(
        path: PathBuf,
        sort_by: SortBy,
    ) -> Result<DicomSeries, SeriesLoaderError> {
        tokio::task::spawn_blocking(move || Self::load_from_directory(path, sort_by)).await?
    }

    /// Checks for the DICM magic following the 128 byte preamble
    pub fn is_dicom(path: impl AsRef<Path>) -> io::Result<bool> {
        let mut file = File::open(path)?;
        let mut magic = [0u8; 4];
        file.seek(SeekFrom::Start(PREAMBLE_LEN))?;
        match file.read_exact(&mut magic) {
            Ok(()) => Ok(&magic == DICOM_MAGIC),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn extract_image_with_order(
        path: PathBuf,
        object: FileDicomObject<InMemDicomObject>,
        sort_by: &SortBy,
    ) -> Option<(Option<f32>, SeriesImage)> {
        let order = Self::get_sort_order(&object, sort_by);
        let Some(pixels) = Self::decode_image(&object) else {
            debug!("Skipping {}: no decodable pixel data", path.display());
            return None;
        };
        Some((
            order,
            SeriesImage {
                path,
                object,
                pixels,
            },
        ))
    }

    fn get_sort_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: &SortBy,
    ) -> Option<f32> {
        match sort_by {
            SortBy::ImagePositionPatient => dicom_object
                .element(tags::IMAGE_POSITION_PATIENT)
                .ok()?
                .to_multi_float32()
                .ok()?
                .get(2)
                .copied(),
            SortBy::TablePosition => dicom_object
                .element(tags::TABLE_POSITION)
                .ok()?
                .to_float32()
                .ok(),
            SortBy::InstanceNumber => dicom_object
                .element(tags::INSTANCE_NUMBER)
                .ok()?
                .to_int::<i32>()
                .ok()
                .map(|n| n as f32),
            SortBy::None => Some(0.0),
        }
    }

    /// Raw stored values as (frames, rows, columns), first sample only.
    /// Signed and unsigned samples both fit in `i32`.
    fn decode_image(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<Array3<i32>> {
        let pixel_data = dicom_object.decode_pixel_data().ok()?;
        let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
        pixel_data
            .to_ndarray_with_options::<i32>(&options)
            .ok()
            .map(|arr| arr.slice_move(s![.., .., .., 0]))
    }

    fn sort_images(images_with_order: &mut [(Option<f32>, SeriesImage)], sort_by: SortBy) {
        if matches!(sort_by, SortBy::None) {
            return;
        }
        // ascending, missing keys first; stable sort keeps file name order
        // for equal keys
        images_with_order
            .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    }

    /// Series-wide (min, max) from the Smallest/LargestImagePixelValue tags,
    /// falling back to the decoded pixels of files that lack them
    fn get_pixel_range(images: &[SeriesImage]) -> (f32, f32) {
        images
            .iter()
            .map(|image| {
                let min = Self::get_int(&image.object, tags::SMALLEST_IMAGE_PIXEL_VALUE)
                    .or_else(|| image.pixels.iter().min().copied())
                    .unwrap_or(0);
                let max = Self::get_int(&image.object, tags::LARGEST_IMAGE_PIXEL_VALUE)
                    .or_else(|| image.pixels.iter().max().copied())
                    .unwrap_or(0);
                (min as f32, max as f32)
            })
            .fold((f32::MAX, f32::MIN), |(lo, hi), (min, max)| {
                (lo.min(min), hi.max(max))
            })
    }

    /// Largest storable value; signed samples lose one bit to the sign
    fn get_max_range(dicom_object: &FileDicomObject<InMemDicomObject>) -> f32 {
        let bits_stored = Self::get_int(dicom_object, tags::BITS_STORED)
            .map(|bits| bits.clamp(1, 32) as u32)
            .unwrap_or(16);
        let signed = Self::get_int(dicom_object, tags::PIXEL_REPRESENTATION) == Some(1);
        let magnitude_bits = if signed { bits_stored - 1 } else { bits_stored };
        ((1u64 << magnitude_bits) - 1) as f32
    }

    fn get_int(dicom_object: &FileDicomObject<InMemDicomObject>, tag: dicom::core::Tag) -> Option<i32> {
        dicom_object.element(tag).ok()?.to_int::<i32>().ok()
    }

    fn is_enhanced_mr(dicom_object: &FileDicomObject<InMemDicomObject>) -> bool {
        dicom_object
            .element(tags::SOP_CLASS_UID)
            .ok()
            .and_then(|element| element.to_str().ok())
            .is_some_and(|uid| {
                uid.trim_end_matches(['\0', ' ']) == uids::ENHANCED_MR_IMAGE_STORAGE
            })
    }
}
