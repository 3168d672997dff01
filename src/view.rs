//! Viewer state and rendering.
//!
//! [`ViewState`] holds everything the viewer needs to draw one image: the
//! selected file and frame, the axis frames are taken along, whether
//! multi-frame files are shown as a mosaic, the rotation and the intensity
//! window. Every user action is a method that keeps the selection valid for
//! the loaded [`DicomSeries`]; [`render`] turns the state into an image.

use image::GrayImage;
use ndarray::{Array2, Axis};
use thiserror::Error;

use crate::{
    enums::DisplayMode,
    frame::{rotate90, take_frame},
    mosaic::{MosaicError, mosaic_stack},
    series::DicomSeries,
    windowing::Window,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("File {file_no} is out of range for a series of {len} files")]
    FileOutOfRange { file_no: usize, len: usize },

    #[error("Frame {frame_no} along axis {axis} is out of range")]
    FrameOutOfRange { frame_no: usize, axis: usize },

    #[error("Rendered image has unsupported dimensions")]
    InvalidDimensions,

    #[error("Mosaic error: {0}")]
    Mosaic(#[from] MosaicError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub file_no: usize,
    pub frame_no: usize,
    pub axis: usize,
    pub mode: DisplayMode,
    /// Counter-clockwise quarter turns, 0..4
    pub rotation: u8,
    pub window: Window,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            file_no: 0,
            frame_no: 0,
            axis: 0,
            mode: DisplayMode::Mosaic,
            rotation: 0,
            window: Window::default(),
        }
    }
}

impl ViewState {
    /// Initial state after a series has been loaded
    pub fn for_series(series: &DicomSeries) -> Self {
        Self {
            window: series.default_window(),
            ..Self::default()
        }
    }

    pub fn is_mosaic(&self) -> bool {
        self.mode == DisplayMode::Mosaic
    }

    /// Number of frames the frame selector offers for the current file
    pub fn frame_choices(&self, series: &DicomSeries) -> usize {
        if self.is_mosaic() {
            return 1;
        }
        series.frame_count(self.file_no, self.axis).unwrap_or(1)
    }

    /// Selects a file, falling back to the first file when out of range. The
    /// frame is reset when the new file has fewer frames.
    pub fn select_file(&mut self, series: &DicomSeries, file_no: usize) {
        self.file_no = if file_no < series.len() { file_no } else { 0 };
        let frames = series.frame_count(self.file_no, self.axis).unwrap_or(1);
        if self.frame_no >= frames {
            self.frame_no = 0;
        }
    }

    /// Out-of-range frames are ignored; returns whether the frame changed
    pub fn select_frame(&mut self, series: &DicomSeries, frame_no: usize) -> bool {
        if frame_no >= self.frame_choices(series) {
            return false;
        }
        self.frame_no = frame_no;
        true
    }

    /// Changes the axis frames are taken along. Has no effect in mosaic mode.
    pub fn select_axis(&mut self, series: &DicomSeries, axis: usize) -> bool {
        let axes = series.axis_count(self.file_no).unwrap_or(0);
        if self.is_mosaic() || axis >= axes {
            return false;
        }
        self.axis = axis;
        self.frame_no = 0;
        true
    }

    pub fn rotate(&mut self) {
        self.rotation = (self.rotation + 1) % 4;
    }

    /// Switches between mosaic and single-frame display. Only series that
    /// support demosaicing can leave mosaic mode.
    pub fn toggle_mosaic(&mut self, series: &DicomSeries) -> bool {
        match self.mode {
            DisplayMode::Mosaic if !series.can_demosaic() => return false,
            DisplayMode::Mosaic => self.mode = DisplayMode::Frame,
            DisplayMode::Frame => {
                self.mode = DisplayMode::Mosaic;
                self.rotation = 0;
            }
        }
        self.frame_no = 0;
        true
    }

    pub fn set_vmin(&mut self, vmin: f32) {
        self.window.set_vmin(vmin);
    }

    pub fn set_vmax(&mut self, vmax: f32) {
        self.window.set_vmax(vmax);
    }
}

/// An image ready for display
pub struct RenderedImage {
    pub title: String,
    pub image: GrayImage,
}

/// Plane of the current file the state selects, before windowing
pub fn select_plane(series: &DicomSeries, state: &ViewState) -> Result<Array2<i32>, RenderError> {
    let image = series
        .get(state.file_no)
        .ok_or(RenderError::FileOutOfRange {
            file_no: state.file_no,
            len: series.len(),
        })?;
    let pixels = image.pixels();

    if image.is_single_frame() {
        return Ok(pixels.index_axis(Axis(0), 0).to_owned());
    }
    if state.is_mosaic() {
        return Ok(mosaic_stack(pixels)?);
    }

    let frame = take_frame(&pixels, state.axis, state.frame_no).ok_or(
        RenderError::FrameOutOfRange {
            frame_no: state.frame_no,
            axis: state.axis,
        },
    )?;
    Ok(rotate90(frame, state.rotation))
}

pub fn render(series: &DicomSeries, state: &ViewState) -> Result<RenderedImage, RenderError> {
    let plane = select_plane(series, state)?;
    let image = state
        .window
        .render(plane.view())
        .ok_or(RenderError::InvalidDimensions)?;
    let title = series.file_name(state.file_no).unwrap_or_default();
    Ok(RenderedImage { title, image })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::SeriesImage;
    use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
    use dicom_dictionary_std::uids;
    use ndarray::{Array3, arr2, s};
    use std::path::PathBuf;

    fn series_image(name: &str, pixels: Array3<i32>) -> SeriesImage {
        let object = InMemDicomObject::new_empty()
            .with_meta(
                FileMetaTableBuilder::new()
                    .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                    .media_storage_sop_class_uid(uids::ENHANCED_MR_IMAGE_STORAGE)
                    .media_storage_sop_instance_uid("1.2.826.0.1.3680043.2.1125.1"),
            )
            .unwrap();
        SeriesImage {
            path: PathBuf::from("/data").join(name),
            object,
            pixels,
        }
    }

    fn series(can_demosaic: bool) -> DicomSeries {
        let multi = Array3::from_shape_fn((4, 2, 3), |(z, y, x)| (z * 100 + y * 10 + x) as i32);
        let single = Array3::from_shape_fn((1, 2, 2), |(_, y, x)| (y * 2 + x) as i32);
        DicomSeries {
            folder: PathBuf::from("/data"),
            images: vec![series_image("multi.dcm", multi), series_image("single.dcm", single)],
            min_pixel_value: 0.0,
            max_pixel_value: 312.0,
            max_range: 4095.0,
            can_demosaic,
        }
    }

    #[test]
    fn starts_in_mosaic_mode_with_series_window() {
        let series = series(true);
        let state = ViewState::for_series(&series);
        assert!(state.is_mosaic());
        assert_eq!((state.file_no, state.frame_no, state.axis, state.rotation), (0, 0, 0, 0));
        assert_eq!(state.window.vmin(), 0.0);
        assert_eq!(state.window.vmax(), 312.0);
        assert_eq!(state.frame_choices(&series), 1);
    }

    #[test]
    fn mosaic_mode_packs_all_frames() {
        let series = series(true);
        let state = ViewState::for_series(&series);
        let plane = select_plane(&series, &state).unwrap();
        assert_eq!(plane.dim(), (4, 6));
        assert_eq!(plane[[0, 3]], 100);
        assert_eq!(plane[[2, 0]], 200);
        assert_eq!(plane[[3, 5]], 312);
    }

    #[test]
    fn single_frame_files_bypass_the_mosaic() {
        let series = series(true);
        let mut state = ViewState::for_series(&series);
        state.select_file(&series, 1);
        let plane = select_plane(&series, &state).unwrap();
        assert_eq!(plane, arr2(&[[0i32, 1], [2, 3]]));
    }

    #[test]
    fn demosaic_shows_frames_along_the_axis() {
        let series = series(true);
        let mut state = ViewState::for_series(&series);
        assert!(state.toggle_mosaic(&series));
        assert_eq!(state.frame_choices(&series), 4);

        assert!(state.select_frame(&series, 2));
        let plane = select_plane(&series, &state).unwrap();
        assert_eq!(plane, series.images[0].pixels.slice(s![2, .., ..]));

        assert!(state.select_axis(&series, 2));
        assert_eq!(state.frame_no, 0);
        assert_eq!(state.frame_choices(&series), 3);
        assert!(!state.select_frame(&series, 3));
        let plane = select_plane(&series, &state).unwrap();
        assert_eq!(plane.dim(), (4, 2));
    }

    #[test]
    fn rotation_applies_to_single_frames() {
        let series = series(true);
        let mut state = ViewState::for_series(&series);
        state.toggle_mosaic(&series);
        state.rotate();
        let plane = select_plane(&series, &state).unwrap();
        assert_eq!(plane, arr2(&[[2i32, 12], [1, 11], [0, 10]]));

        for _ in 0..3 {
            state.rotate();
        }
        assert_eq!(state.rotation, 0);
    }

    #[test]
    fn returning_to_mosaic_resets_rotation() {
        let series = series(true);
        let mut state = ViewState::for_series(&series);
        state.toggle_mosaic(&series);
        state.select_frame(&series, 3);
        state.rotate();
        assert!(state.toggle_mosaic(&series));
        assert!(state.is_mosaic());
        assert_eq!((state.rotation, state.frame_no), (0, 0));
    }

    #[test]
    fn demosaic_requires_support() {
        let series = series(false);
        let mut state = ViewState::for_series(&series);
        assert!(!state.toggle_mosaic(&series));
        assert!(state.is_mosaic());
    }

    #[test]
    fn axis_is_locked_in_mosaic_mode() {
        let series = series(true);
        let mut state = ViewState::for_series(&series);
        assert!(!state.select_axis(&series, 1));
        assert_eq!(state.axis, 0);
    }

    #[test]
    fn invalid_file_falls_back_to_first() {
        let series = series(true);
        let mut state = ViewState::for_series(&series);
        state.toggle_mosaic(&series);
        state.select_frame(&series, 3);
        state.select_file(&series, 1);
        assert_eq!((state.file_no, state.frame_no), (1, 0));

        state.select_file(&series, 7);
        assert_eq!(state.file_no, 0);
    }

    #[test]
    fn render_windows_the_plane() {
        let series = series(true);
        let mut state = ViewState::for_series(&series);
        state.select_file(&series, 1);
        state.set_vmin(1.0);
        state.set_vmax(3.0);
        let rendered = render(&series, &state).unwrap();
        assert_eq!(rendered.title, "single.dcm");
        assert_eq!(rendered.image.dimensions(), (2, 2));
        assert_eq!(rendered.image.get_pixel(0, 0).0[0], 0);
        assert_eq!(rendered.image.get_pixel(0, 1).0[0], 128);
        assert_eq!(rendered.image.get_pixel(1, 1).0[0], 255);
    }

    #[test]
    fn window_bounds_clamp_instead_of_swapping() {
        let series = series(true);
        let mut state = ViewState::for_series(&series);
        state.set_vmin(500.0);
        assert_eq!((state.window.vmin(), state.window.vmax()), (312.0, 312.0));
        state.set_vmax(100.0);
        assert_eq!((state.window.vmin(), state.window.vmax()), (312.0, 312.0));
    }

    #[test]
    fn out_of_range_state_is_an_error() {
        let series = series(true);
        let state = ViewState {
            file_no: 9,
            ..ViewState::for_series(&series)
        };
        assert!(matches!(
            render(&series, &state),
            Err(RenderError::FileOutOfRange { file_no: 9, len: 2 })
        ));

        let state = ViewState {
            mode: DisplayMode::Frame,
            frame_no: 10,
            ..ViewState::for_series(&series)
        };
        assert_eq!(
            select_plane(&series, &state),
            Err(RenderError::FrameOutOfRange { frame_no: 10, axis: 0 })
        );
    }
}
