//! # DICOM-mosaic library
//!
//! This crate serves a small API for browsing folders of (multi-frame) DICOM
//! files.
//!
//! This library is part of the dicom-rs ecosystem and leverages its
//! components to load every DICOM file of a folder, order the files by
//! acquisition (InstanceNumber by default) and render a chosen file as an
//! 8-bit grayscale image. Files are recognized by content (the "DICM" magic
//! after the preamble) and parsed in parallel using rayon.
//!
//! Multi-frame files are displayed as a mosaic: all frames are packed into a
//! near-square grid, read left to right and top to bottom. Enhanced MR series
//! can be demosaiced to show a single frame along any of the three axes,
//! optionally rotated in quarter turns. Brightness and contrast are set with
//! an intensity window (vmin/vmax) whose bounds never cross.
//!
//! # Examples
//!
//! ## Rendering the first file of a folder
//!
//! ```no_run
//! # use dicom_mosaic::{SeriesLoader, SortBy, ViewState, render};
//! let series = SeriesLoader::load_from_directory("dicom", SortBy::InstanceNumber)
//!     .expect("should have loaded files from directory");
//! let mut state = ViewState::for_series(&series);
//! state.set_vmax(series.max_pixel_value / 2.0);
//! let rendered = render(&series, &state).expect("should have rendered first file");
//! rendered.image.save("result.png");
//! ```
//!
//! ## Packing tiles into a mosaic
//!
//! ```
//! # use dicom_mosaic::mosaic::mosaic;
//! # use ndarray::Array2;
//! let tiles: Vec<Array2<u16>> = (1..=4).map(|v| Array2::from_elem((2, 2), v)).collect();
//! let views: Vec<_> = tiles.iter().map(|tile| tile.view()).collect();
//! let canvas = mosaic(&views).unwrap();
//! assert_eq!(canvas.dim(), (4, 4));
//! assert_eq!(canvas[[3, 3]], 4);
//! ```

pub mod enums;
pub mod frame;
pub mod logging;
pub mod mosaic;
pub mod series;
pub mod series_loader;
pub mod settings;
pub mod view;
pub mod windowing;

pub use enums::{DisplayMode, SortBy};
pub use series::{DicomSeries, SeriesImage};
pub use series_loader::{SeriesLoader, SeriesLoaderError};
pub use settings::Settings;
pub use view::{RenderError, RenderedImage, ViewState, render};
pub use windowing::{ClampPolicy, Window};
