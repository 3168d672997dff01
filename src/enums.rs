use clap::ValueEnum;

/// Key used to order the files of a series
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortBy {
    #[default]
    InstanceNumber,
    ImagePositionPatient,
    TablePosition,
    /// Keep file name order
    None,
}

/// How a multi-frame file is displayed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// All frames packed into one grid image
    #[default]
    Mosaic,
    /// One frame along the selected axis
    Frame,
}
