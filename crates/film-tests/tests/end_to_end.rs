//! Full renders through the public pipeline API.

use film_core::{ChannelOrder, Image};
use film_pipeline::{render_film, FilmPipeline, PipelineError, RenderOptions};
use film_profile::{create_film_profile_from_iso, FromIsoSpec, PhysicsMode, ProfileError};
use film_tests::{bright_square, grey_ramp, uniform_u8};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn native() -> RenderOptions {
    RenderOptions::native_size()
}

fn channel_stats(data: &[u8]) -> [(f64, f64); 3] {
    std::array::from_fn(|c| {
        let values: Vec<f64> = data.iter().skip(c).step_by(3).map(|&v| v as f64 / 255.0).collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        (mean, var.sqrt())
    })
}

#[test]
fn grey_stays_neutral_standard_400() {
    init_tracing();
    let profile = create_film_profile_from_iso(&FromIsoSpec::new("Standard400", 400.0)).unwrap();
    assert_eq!(profile.physics_mode(), PhysicsMode::Artistic);
    let pipeline = FilmPipeline::new(profile, native()).unwrap();

    let input = uniform_u8(512, 512, [128; 3], ChannelOrder::Rgb);
    let out = pipeline.render_u8(&input, 512, 512).unwrap();
    assert_eq!((out.width, out.height), (512, 512));

    let expected = 128.0 / 255.0;
    for (c, (mean, _)) in channel_stats(&out.data).into_iter().enumerate() {
        let rel = (mean - expected).abs() / expected;
        assert!(rel < 0.05, "channel {c}: mean {mean:.4}, off by {:.1}%", rel * 100.0);
    }
}

#[test]
fn grey_stays_neutral_builtin_presets() {
    let options = RenderOptions {
        grain: false,
        ..native()
    };
    for name in ["NC200", "Portra400", "Ektar100", "CineStill800T", "Standard400", "Cine500"] {
        let frame = Image::filled(64, 64, &[0.5, 0.5, 0.5]).unwrap();
        let out = render_film(name, &frame, options.clone()).unwrap();
        for (c, mean) in out.image.channel_means().into_iter().enumerate() {
            assert!((mean - 0.5).abs() < 0.025, "{name} channel {c}: {mean}");
        }
    }
}

#[test]
fn bgr_boundary_round_trip() {
    // A coloured frame rendered as RGB and as BGR must agree after
    // swapping the channels back.
    let rgb = uniform_u8(32, 32, [200, 120, 40], ChannelOrder::Rgb);
    let bgr = uniform_u8(32, 32, [200, 120, 40], ChannelOrder::Bgr);

    let options = RenderOptions {
        grain: false,
        ..native()
    };
    let p_rgb = FilmPipeline::for_film("Portra400", options.clone()).unwrap();
    let p_bgr = FilmPipeline::for_film(
        "Portra400",
        RenderOptions {
            channel_order: ChannelOrder::Bgr,
            ..options
        },
    )
    .unwrap();

    let a = p_rgb.render_u8(&rgb, 32, 32).unwrap().data;
    let b = p_bgr.render_u8(&bgr, 32, 32).unwrap().data;
    for (pa, pb) in a.chunks_exact(3).zip(b.chunks_exact(3)) {
        assert_eq!(pa, [pb[2], pb[1], pb[0]]);
    }
    // warm input stays warm: red above blue in RGB order
    assert!(a[0] > a[2]);
}

#[test]
fn seeded_grain_is_deterministic() {
    let frame = grey_ramp(96, 64).unwrap();
    for name in ["Portra400", "HP5Plus400"] {
        let options = RenderOptions {
            seed: 7,
            ..native()
        };
        let a = render_film(name, &frame, options.clone()).unwrap();
        let b = render_film(name, &frame, options.clone()).unwrap();
        assert_eq!(a.image, b.image, "{name}");

        let c = render_film(name, &frame, RenderOptions { seed: 8, ..options }).unwrap();
        assert_ne!(a.image, c.image, "{name}");
    }
}

#[test]
fn grain_off_is_smooth() {
    let options = RenderOptions {
        grain: false,
        ..native()
    };
    let out = render_film("NC200", &Image::filled(48, 48, &[0.4, 0.4, 0.4]).unwrap(), options).unwrap();
    let first = out.image.pixel(0, 0).to_vec();
    for y in 0..48 {
        for x in 0..48 {
            for (a, b) in out.image.pixel(x, y).iter().zip(&first) {
                assert!((a - b).abs() < 1e-4);
            }
        }
    }
    assert!(!out.diagnostics.stages.contains(&"grain"));
}

#[test]
fn monochrome_output_is_grey() {
    let frame = grey_ramp(64, 32).unwrap();
    let out = render_film("HP5Plus400", &frame, native()).unwrap();
    for px in out.image.data().chunks_exact(3) {
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }
    assert!(out.diagnostics.stages.contains(&"hd_curve"));
}

#[test]
fn black_and_white_frames_are_finite() {
    for name in ["Portra400", "HP5Plus400", "Cine500", "AS100"] {
        for value in [0.0f32, 1.0] {
            let frame = Image::filled(40, 40, &[value; 3]).unwrap();
            let out = render_film(name, &frame, native()).unwrap();
            assert!(
                out.image.data().iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)),
                "{name} at {value}"
            );
            if let Some(err) = out.diagnostics.energy_error {
                assert!(err < 1e-4, "{name} at {value}: {err}");
            }
        }
    }
}

#[test]
fn physical_optics_conserve_energy() {
    let frame = bright_square(128, 6, 0.05, 1.0).unwrap();
    let options = RenderOptions {
        grain: false,
        ..native()
    };
    let out = render_film("Cine500", &frame, options).unwrap();
    let err = out.diagnostics.energy_error.unwrap();
    assert!(err < 1e-4, "energy error {err}");
    assert!(out.diagnostics.stages.contains(&"halation"));
}

#[test]
fn standardization_resizes_to_even_edges() {
    let frame = Image::filled(301, 200, &[0.3, 0.3, 0.3]).unwrap();
    let options = RenderOptions {
        min_edge: Some(101),
        grain: false,
        ..RenderOptions::default()
    };
    let out = render_film("Portra400", &frame, options).unwrap();
    let (w, h) = out.diagnostics.output_size;
    assert_eq!(out.image.dimensions(), (w, h));
    assert!(w % 2 == 0 && h % 2 == 0);
    assert_eq!(h, 100);
    assert_eq!(out.diagnostics.stages.first(), Some(&"standardize"));
}

#[test]
fn errors_propagate_unmodified() {
    let frame = Image::filled(8, 8, &[0.5; 3]).unwrap();
    let err = render_film("Velvia50", &frame, native()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Profile(ProfileError::UnknownFilm { .. })
    ));

    let pipeline = FilmPipeline::for_film("NC200", native()).unwrap();
    assert!(matches!(
        pipeline.render_u8(&[0u8; 10], 4, 4),
        Err(PipelineError::Image(_))
    ));
}

#[test]
fn tone_override_changes_output() {
    let frame = grey_ramp(64, 8).unwrap();
    let base = RenderOptions {
        grain: false,
        calibrate: false,
        ..native()
    };
    let filmic = render_film("Portra400", &frame, base.clone()).unwrap();
    let reinhard = render_film(
        "Portra400",
        &frame,
        RenderOptions {
            tone_style: Some(film_emulsion::ToneStyle::Reinhard),
            ..base
        },
    )
    .unwrap();
    assert_ne!(filmic.image, reinhard.image);
}
