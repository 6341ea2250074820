use approx::assert_relative_eq;
use glam::{Affine2, Mat4, Vec2, Vec4};
use warpkit_image::{CpuAllocator, Image, ImageSize, Rectangle};
use warpkit_imgproc::{
    crop::crop,
    error::TransformError,
    interpolation::{
        premultiply, unpremultiply, BicubicKernel, BoxKernel, CubicKernel, Kernel, KernelMap,
        LanczosKernel, Resampler, TriangleKernel, WelchKernel,
    },
    parallel::ParallelExecutionSettings,
    resize::resize,
    warp::{
        create_rotation, rotate, skew, swizzle, taper, transformed_canvas_size, warp_affine,
        warp_perspective, AffineStep, AffineTransformBuilder, AffineTransformPlan, TaperCorner,
        TaperSide, TransformMatrix, TransposeSwizzler,
    },
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn gradient(size: ImageSize) -> Result<Image<u8, 4>, TransformError> {
    let data = (0..size.area())
        .flat_map(|i| {
            let (x, y) = (i % size.width, i / size.width);
            [(x * 13) as u8, (y * 7) as u8, (x + y) as u8, 255]
        })
        .collect();
    Ok(Image::new(size, data)?)
}

#[test]
fn identity_is_pixel_exact_for_every_resampler() -> Result<(), TransformError> {
    init_logger();
    let src = gradient([7, 5].into())?;
    let settings = ParallelExecutionSettings::default();

    for resampler in Resampler::ALL {
        let mut affine = Image::<u8, 4>::from_size_val(src.size(), 0)?;
        warp_affine(&src, &mut affine, &Affine2::IDENTITY, resampler, &settings)?;
        assert_eq!(affine, src, "{resampler:?}");

        let mut projective = Image::<u8, 4>::from_size_val(src.size(), 0)?;
        warp_perspective(&src, &mut projective, &Mat4::IDENTITY, resampler, &settings)?;
        assert_eq!(projective, src, "{resampler:?}");
    }
    Ok(())
}

#[test]
fn rotation_canvas_round_trip() -> Result<(), TransformError> {
    init_logger();
    let size = ImageSize {
        width: 31,
        height: 17,
    };
    for (degrees, expected) in [(90.0, [17, 31]), (180.0, [31, 17]), (270.0, [17, 31])] {
        let m = create_rotation(degrees, size);
        assert_eq!(
            transformed_canvas_size(&m, size, true),
            ImageSize::from(expected)
        );
    }

    let src = gradient(size)?;
    let settings = ParallelExecutionSettings::default();
    for resampler in [
        Resampler::NearestNeighbor,
        Resampler::Bicubic,
        Resampler::Lanczos3,
    ] {
        let full_turn = rotate(&src, 360.0, resampler, &settings)?;
        assert_eq!(full_turn, src, "{resampler:?}");
    }
    Ok(())
}

#[test]
fn rotation_quarter_turns_compose() -> Result<(), TransformError> {
    init_logger();
    let src = gradient([12, 5].into())?;
    let settings = ParallelExecutionSettings::serial();

    let quarter = rotate(&src, 90.0, Resampler::NearestNeighbor, &settings)?;
    assert_eq!(quarter.size(), ImageSize::from([5, 12]));

    let back = rotate(&quarter, 270.0, Resampler::NearestNeighbor, &settings)?;
    assert_eq!(back, src);
    Ok(())
}

#[test]
fn red_square_rotated_stays_red() -> Result<(), TransformError> {
    init_logger();
    let src = Image::<u8, 4>::new([10, 10].into(), [255u8, 0, 0, 255].repeat(100))?;

    let dst = rotate(
        &src,
        90.0,
        Resampler::NearestNeighbor,
        &ParallelExecutionSettings::default(),
    )?;

    assert_eq!(dst.size(), src.size());
    assert_eq!(dst, src);
    Ok(())
}

#[test]
fn nearest_translation_copies_exact_pixels() -> Result<(), TransformError> {
    init_logger();
    let src = gradient([9, 6].into())?;
    let mut dst = Image::<u8, 4>::from_size_val(src.size(), 0)?;
    let (dx, dy) = (3usize, 2usize);

    warp_affine(
        &src,
        &mut dst,
        &Affine2::from_translation(Vec2::new(dx as f32, dy as f32)),
        Resampler::NearestNeighbor,
        &ParallelExecutionSettings::default(),
    )?;

    for y in dy..dst.height() {
        for x in dx..dst.width() {
            assert_eq!(dst.pixel(x, y), src.pixel(x - dx, y - dy), "({x}, {y})");
        }
    }
    Ok(())
}

#[test]
fn degenerate_matrix_is_rejected() -> Result<(), TransformError> {
    init_logger();
    let src = gradient([4, 4].into())?;
    let mut dst = Image::<u8, 4>::from_size_val([6, 6].into(), 7)?;
    let flat = Affine2::from_scale(Vec2::new(0.0, 1.0));

    assert!(flat.is_degenerate());
    for resampler in [Resampler::NearestNeighbor, Resampler::Bicubic] {
        assert_eq!(
            warp_affine(&src, &mut dst, &flat, resampler, &Default::default()),
            Err(TransformError::DegenerateTransform)
        );
    }
    assert!(dst.as_slice().iter().all(|&v| v == 7));
    assert_eq!(
        AffineTransformPlan::new(flat, src.size(), Resampler::Bicubic),
        Err(TransformError::DegenerateTransform)
    );
    Ok(())
}

fn check_kernel_map<K: Kernel>(kernel: &K) -> Result<(), TransformError> {
    let allocator = CpuAllocator::default();
    for (dst, src) in [(3, 17), (17, 3), (8, 8), (1, 5), (40, 7)] {
        let map = KernelMap::build(kernel, dst, src, &allocator)?;
        for i in 0..dst {
            let window = map.window(i);
            assert!(!window.weights.is_empty());
            assert!(window.left + window.weights.len() <= src);
            let sum: f32 = window.weights.iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-4);
        }
    }
    Ok(())
}

#[test]
fn kernel_maps_are_normalized_and_bounded() -> Result<(), TransformError> {
    check_kernel_map(&BoxKernel)?;
    check_kernel_map(&TriangleKernel)?;
    check_kernel_map(&BicubicKernel)?;
    check_kernel_map(&CubicKernel::MITCHELL_NETRAVALI)?;
    check_kernel_map(&CubicKernel::ROBIDOUX_SHARP)?;
    check_kernel_map(&LanczosKernel { radius: 3.0 })?;
    check_kernel_map(&WelchKernel)?;
    Ok(())
}

#[test]
fn premultiply_round_trip() {
    for v in [
        Vec4::new(0.2, 0.4, 0.6, 1.0),
        Vec4::new(1.0, 0.5, 0.0, 0.25),
        Vec4::new(0.3, 0.3, 0.9, 0.001),
    ] {
        let back = unpremultiply(premultiply(v));
        assert_relative_eq!(back.x, v.x, epsilon = 1e-4);
        assert_relative_eq!(back.y, v.y, epsilon = 1e-4);
        assert_relative_eq!(back.z, v.z, epsilon = 1e-4);
        assert_relative_eq!(back.w, v.w, epsilon = 1e-6);
    }
    assert_eq!(unpremultiply(Vec4::new(0.5, 0.5, 0.5, 0.0)), Vec4::ZERO);
}

#[test]
fn quadrant_resize_averages_blocks() -> Result<(), TransformError> {
    init_logger();
    // each 2x2 quadrant is uniform
    #[rustfmt::skip]
    let src = Image::<u8, 1>::new(
        [4, 4].into(),
        vec![
            90, 90, 90, 90,
            90, 90, 90, 90,
            30, 30, 30, 30,
            30, 30, 30, 30,
        ],
    )?;
    let mut dst = Image::<u8, 1>::from_size_val([2, 2].into(), 0)?;

    resize(&src, &mut dst, Resampler::Box, &Default::default())?;
    assert_eq!(dst.as_slice(), &[90, 90, 30, 30]);
    Ok(())
}

#[test]
fn skew_taper_and_swizzle_produce_images() -> Result<(), TransformError> {
    init_logger();
    let src = gradient([16, 8].into())?;
    let settings = ParallelExecutionSettings::default();

    let skewed = skew(&src, 20.0, 0.0, Resampler::Bicubic, &settings)?;
    assert!(skewed.width() > src.width());
    assert_eq!(skewed.height(), src.height());

    let tapered = taper(
        &src,
        TaperSide::Right,
        TaperCorner::Both,
        0.5,
        Resampler::Triangle,
        &settings,
    )?;
    assert_eq!(tapered.size(), src.size());

    let transposed = swizzle(&src, &TransposeSwizzler::new(src.size()), &settings)?;
    assert_eq!(transposed.size(), ImageSize::from([8, 16]));
    assert_eq!(transposed.pixel(3, 11), src.pixel(11, 3));
    Ok(())
}

#[test]
fn builder_plan_crop_pipeline() -> Result<(), TransformError> {
    init_logger();
    let src = gradient([20, 20].into())?;
    let settings = ParallelExecutionSettings::default();

    let region = crop(&src, Rectangle::new(4, 4, 8, 8), &settings)?;
    assert_eq!(region.pixel(0, 0), src.pixel(4, 4));

    let builder = AffineTransformBuilder::new()
        .append(AffineStep::Scale(Vec2::splat(2.0)))
        .append(AffineStep::Translation(Vec2::new(1.0, 0.0)));
    let plan = AffineTransformPlan::from_builder(
        &builder,
        Rectangle::from(region.size()),
        Resampler::NearestNeighbor,
    )?;
    assert_eq!(plan.destination_size(), ImageSize::from([17, 16]));

    let scaled = plan.execute(&region, &settings)?;
    assert_eq!(scaled.pixel(1, 0), region.pixel(0, 0));
    assert_eq!(scaled.pixel(16, 15), region.pixel(7, 7));
    Ok(())
}
