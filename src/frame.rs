use ndarray::{Array2, ArrayView2, ArrayView3, Axis};

/// Plane at `index` along `axis` of a (frames, rows, columns) stack
pub fn take_frame<'a, A>(
    stack: &ArrayView3<'a, A>,
    axis: usize,
    index: usize,
) -> Option<ArrayView2<'a, A>> {
    if axis >= stack.ndim() || index >= stack.len_of(Axis(axis)) {
        return None;
    }
    Some(stack.clone().index_axis_move(Axis(axis), index))
}

/// Rotates counter-clockwise by `quarter_turns` steps of 90 degrees
pub fn rotate90<A: Clone>(image: ArrayView2<'_, A>, quarter_turns: u8) -> Array2<A> {
    let mut view = image;
    for _ in 0..quarter_turns % 4 {
        view.swap_axes(0, 1);
        view.invert_axis(Axis(0));
    }
    view.as_standard_layout().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, arr2};

    #[test]
    fn takes_planes_along_each_axis() {
        let stack = Array3::from_shape_fn((2, 3, 4), |(z, y, x)| (z * 100 + y * 10 + x) as u16);
        let view = stack.view();

        let axial = take_frame(&view, 0, 1).unwrap();
        assert_eq!(axial.dim(), (3, 4));
        assert_eq!(axial[[2, 3]], 123);

        let coronal = take_frame(&view, 1, 2).unwrap();
        assert_eq!(coronal.dim(), (2, 4));
        assert_eq!(coronal[[1, 0]], 120);

        let sagittal = take_frame(&view, 2, 3).unwrap();
        assert_eq!(sagittal.dim(), (2, 3));
        assert_eq!(sagittal[[0, 1]], 13);
    }

    #[test]
    fn out_of_range_frames_are_none() {
        let stack = Array3::<u16>::zeros((2, 3, 4));
        let view = stack.view();
        assert!(take_frame(&view, 0, 2).is_none());
        assert!(take_frame(&view, 2, 4).is_none());
        assert!(take_frame(&view, 3, 0).is_none());
    }

    #[test]
    fn rotates_counter_clockwise() {
        let image = arr2(&[[1u16, 2, 3], [4, 5, 6]]);

        assert_eq!(rotate90(image.view(), 0), image);
        assert_eq!(rotate90(image.view(), 1), arr2(&[[3, 6], [2, 5], [1, 4]]));
        assert_eq!(
            rotate90(image.view(), 2),
            arr2(&[[6, 5, 4], [3, 2, 1]])
        );
        assert_eq!(
            rotate90(image.view(), 3),
            arr2(&[[4, 1], [5, 2], [6, 3]])
        );
        assert_eq!(rotate90(image.view(), 4), image);
    }
}
